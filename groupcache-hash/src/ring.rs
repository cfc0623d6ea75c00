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

use std::sync::Arc;

/// A pluggable hash function from an arbitrary byte sequence to a 64-bit
/// position. All peers in a deployment must agree on the same function.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u64 + Send + Sync>;

fn crc32_hash(bytes: &[u8]) -> u64 {
    crc32fast::hash(bytes) as u64
}

/// Maps arbitrary keys onto a ring of peer identifiers by consistent
/// hashing, so that adding or removing a peer only reshuffles the keys
/// whose hash falls in the arcs adjacent to that peer's virtual positions.
///
/// Positions are kept as a sorted `(hash, peer)` vector rather than a map
/// keyed by hash alone: ties (two virtual nodes landing on the same hash)
/// are broken by peer identifier so ring construction is fully
/// deterministic, matching the stated ordering invariant.
pub struct ConsistentHashRing {
    replicas: usize,
    hash_fn: HashFn,
    positions: Vec<(u64, String)>,
}

impl ConsistentHashRing {
    /// `replicas` virtual nodes are created per peer. Uses CRC32 of the
    /// virtual key's ASCII bytes as the default hash; all peers in a
    /// cluster must use the same hash to agree on ownership.
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, crc32_hash)
    }

    pub fn with_hash(replicas: usize, hash_fn: impl Fn(&[u8]) -> u64 + Send + Sync + 'static) -> Self {
        Self {
            replicas,
            hash_fn: Arc::new(hash_fn),
            positions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Adds virtual positions for each peer in `peers`. Adding the same peer
    /// twice duplicates its positions; callers wanting a clean membership
    /// change should call [`set`](Self::set) instead.
    pub fn add(&mut self, peers: &[String]) {
        for peer in peers {
            for i in 0..self.replicas {
                let virtual_key = format!("{i}{peer}");
                let position = (self.hash_fn)(virtual_key.as_bytes());
                self.positions.push((position, peer.clone()));
            }
        }
        self.positions.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    }

    /// Replaces the entire ring with `peers` atomically from the caller's
    /// point of view (no intermediate state is observable through `&self`).
    pub fn set(&mut self, peers: &[String]) {
        self.positions.clear();
        self.add(peers);
    }

    /// Returns the peer owning `key`, or `None` if the ring has no peers.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hash_fn)(key.as_bytes());
        let idx = self.positions.partition_point(|(position, _)| *position < hash);
        let idx = if idx == self.positions.len() { 0 } else { idx };
        Some(&self.positions[idx].1)
    }
}
