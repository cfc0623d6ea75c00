//  Copyright 2024 groupcache-rs Authors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use std::fmt;

use bytes::Bytes;

/// An immutable, length-known view over cached bytes.
///
/// Backed by `bytes::Bytes`, which is itself a refcounted, immutable buffer:
/// there is no API on `ByteView` that hands out a mutable reference to the
/// underlying storage, so "readers must not be able to mutate the underlying
/// storage after a view is created" holds structurally.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ByteView(Bytes);

impl ByteView {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Copies `bytes` into a freshly owned buffer. Use this when the source
    /// slice is borrowed from something the cache must not alias (e.g. a
    /// loader's scratch buffer).
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<String> for ByteView {
    fn from(value: String) -> Self {
        Self(Bytes::from(value.into_bytes()))
    }
}

impl From<&'static [u8]> for ByteView {
    fn from(value: &'static [u8]) -> Self {
        Self(Bytes::from_static(value))
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteView").field(&self.0.len()).finish()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Ok(s) => f.write_str(s),
            Err(_) => write!(f, "<{} bytes>", self.len()),
        }
    }
}
