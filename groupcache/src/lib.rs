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

//! `groupcache`: the user-facing facade crate. Composes
//! [`groupcache_memory`]'s bounded LRU store, a single-flight coordinator,
//! a user-supplied loader, and an optional consistent-hash peer selector
//! into [`Group`], the cache namespace applications interact with, plus a
//! process-wide [`Group`] registry and a reference [`PeerPool`] peer
//! selector over [`groupcache_hash::ConsistentHashRing`].

mod config;
mod group;
mod peer_pool;
mod registry;
mod singleflight;

pub use config::{GroupConfig, RingConfig};
pub use group::{loader_fn, Group, Loader, LoaderFn, PeerFetcher, PeerPicker};
pub use peer_pool::{PeerPool, DEFAULT_REPLICAS};
pub use registry::{get_group, new_group};

pub use groupcache_common::{ByteView, GroupCacheError, Result};
pub use groupcache_hash::{ConsistentHashRing, HashFn};
