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

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use groupcache_hash::{ConsistentHashRing, HashFn};

use crate::config::RingConfig;
use crate::group::{PeerFetcher, PeerPicker};

/// Default virtual-node count per peer, matching the reference
/// configuration default.
pub const DEFAULT_REPLICAS: usize = 50;

struct Topology {
    ring: ConsistentHashRing,
    fetchers: HashMap<String, Arc<dyn PeerFetcher>>,
}

/// A `PeerPicker` over a consistent-hash ring whose membership can be
/// replaced wholesale without ever blocking a concurrent `pick_peer` call.
///
/// The source specifies "readers acquire the lock for the duration of
/// PickPeer" as the concurrency floor; swapping in `arc_swap::ArcSwap`
/// (already a pack dependency, used the same way by `tako`) gives readers a
/// lock-free snapshot instead, which is a strictly stronger guarantee.
pub struct PeerPool {
    self_id: String,
    replicas: usize,
    hash: Option<HashFn>,
    topology: ArcSwap<Topology>,
}

impl PeerPool {
    pub fn new(self_id: impl Into<String>) -> Self {
        Self::with_config(self_id, RingConfig::default())
    }

    pub fn with_config(self_id: impl Into<String>, config: RingConfig) -> Self {
        let ring = Self::build_ring(config.replicas, &config.hash, &[]);
        Self {
            self_id: self_id.into(),
            replicas: config.replicas,
            hash: config.hash,
            topology: ArcSwap::from_pointee(Topology {
                ring,
                fetchers: HashMap::new(),
            }),
        }
    }

    fn build_ring(replicas: usize, hash: &Option<HashFn>, peer_ids: &[String]) -> ConsistentHashRing {
        let mut ring = match hash {
            Some(hash) => ConsistentHashRing::with_hash(replicas, {
                let hash = hash.clone();
                move |bytes: &[u8]| hash(bytes)
            }),
            None => ConsistentHashRing::new(replicas),
        };
        ring.add(peer_ids);
        ring
    }

    /// Replaces the entire peer set atomically: every `pick_peer` call
    /// either sees the old topology in full or the new one in full, never a
    /// mix.
    pub fn set_peers(&self, peers: Vec<(String, Arc<dyn PeerFetcher>)>) {
        let ids: Vec<String> = peers.iter().map(|(id, _)| id.clone()).collect();
        let ring = Self::build_ring(self.replicas, &self.hash, &ids);

        let fetchers = peers.into_iter().collect();
        self.topology.store(Arc::new(Topology { ring, fetchers }));
    }
}

impl PeerPicker for PeerPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>> {
        let topology = self.topology.load();
        let owner = topology.ring.get(key)?;
        if owner == self.self_id {
            return None;
        }
        topology.fetchers.get(owner).cloned()
    }
}
