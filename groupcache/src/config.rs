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

use groupcache_hash::HashFn;

use crate::peer_pool::DEFAULT_REPLICAS;

/// Construction-time configuration for a [`crate::Group`], in the same
/// plain-struct style as `foyer-memory`'s `GenericCacheConfig`.
pub struct GroupConfig {
    /// Maximum accounted bytes for the group's local LRU store. Zero means
    /// unbounded.
    pub cache_bytes: usize,
}

impl GroupConfig {
    pub fn new(cache_bytes: usize) -> Self {
        Self { cache_bytes }
    }
}

/// Construction-time configuration for a [`crate::peer_pool::PeerPool`]'s
/// consistent-hash ring.
pub struct RingConfig {
    /// Virtual nodes per peer. Defaults to 50.
    pub replicas: usize,
    /// Overrides the ring's default CRC32 hash. All peers in a deployment
    /// must agree on whichever function is configured.
    pub hash: Option<HashFn>,
}

impl RingConfig {
    pub fn new() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            hash: None,
        }
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::new()
    }
}
