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

use crate::view::ByteView;

/// Capability bundle for values the LRU store can account for.
///
/// The store must not know the concrete representation of a cached value,
/// only that it can report its own byte length — this is the Rust rendering
/// of the source's `Value` interface (`Len() int`).
pub trait CacheValue: Clone + Send + Sync + 'static {
    fn cache_len(&self) -> usize;
}

impl CacheValue for ByteView {
    fn cache_len(&self) -> usize {
        self.len()
    }
}

impl CacheValue for String {
    fn cache_len(&self) -> usize {
        self.len()
    }
}

impl CacheValue for Vec<u8> {
    fn cache_len(&self) -> usize {
        self.len()
    }
}
