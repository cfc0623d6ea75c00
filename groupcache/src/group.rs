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

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use groupcache_common::{ByteView, GroupCacheError, Result};
use groupcache_memory::LruStore;
use parking_lot::Mutex as PlMutex;
use tokio::sync::OnceCell;

use crate::config::GroupConfig;
use crate::singleflight::SingleFlight;

/// A source of truth for cache misses. Consumed by `Group::get` whenever a
/// key is neither resident locally nor owned by a remote peer.
///
/// Returns `anyhow::Result` rather than the core's own `GroupCacheError`:
/// user code should be free to use `?` with whatever error types its own
/// backing store produces, and `Group` stringifies the failure into
/// `GroupCacheError::LoaderFailed` at the boundary.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    async fn load(&self, key: &str) -> anyhow::Result<ByteView>;
}

/// Adapts a plain async closure into a [`Loader`], mirroring the source's
/// `GetterFunc` convenience wrapper around the `Getter` interface.
pub struct LoaderFn<F> {
    f: F,
}

pub fn loader_fn<F, Fut>(f: F) -> LoaderFn<F>
where
    F: Fn(&str) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ByteView>> + Send + 'static,
{
    LoaderFn { f }
}

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(&str) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ByteView>> + Send + 'static,
{
    async fn load(&self, key: &str) -> anyhow::Result<ByteView> {
        (self.f)(key).await
    }
}

/// Remote half of the peer-fetch contract: what a `Group` calls once the
/// peer selector has picked a remote owner for a key.
#[async_trait]
pub trait PeerFetcher: Send + Sync + 'static {
    async fn fetch(&self, group: &str, key: &str) -> anyhow::Result<ByteView>;
}

/// Capability a `Group` consumes to decide whether a key is owned locally
/// or by some other peer.
pub trait PeerPicker: Send + Sync + 'static {
    /// `None` means the key is owned by this node (or the ring is empty);
    /// `Some` carries the fetcher for the remote owner.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>>;
}

type BoxedResult = std::result::Result<ByteView, GroupCacheError>;

/// The user-facing cache namespace: composes a bounded LRU store, a
/// single-flight coordinator, a loader, and an optional peer selector to
/// answer `get` with local-hit / remote-fetch / local-load semantics.
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    store: PlMutex<LruStore<ByteView>>,
    flight: Arc<SingleFlight<ByteView, GroupCacheError>>,
    peers: OnceCell<Arc<dyn PeerPicker>>,
}

impl Group {
    pub(crate) fn new(name: String, config: GroupConfig, loader: Arc<dyn Loader>) -> Arc<Self> {
        Arc::new(Self {
            name,
            loader,
            store: PlMutex::new(LruStore::new(config.cache_bytes)),
            flight: Arc::new(SingleFlight::new()),
            peers: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installs the peer selector. Fails if one is already registered: a
    /// `Group`'s peer topology is set once, at wiring time.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<()> {
        self.peers
            .set(peers)
            .map_err(|_| GroupCacheError::PeersAlreadyRegistered(self.name.clone()))
    }

    /// Returns the cached value for `key`, loading it (locally or via a
    /// remote peer) on a miss. Concurrent misses for the same key are
    /// coalesced: the loader or fetcher runs at most once per in-flight
    /// window.
    pub async fn get(self: &Arc<Self>, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(GroupCacheError::KeyRequired);
        }

        if let Some(value) = self.store.lock().get(key).cloned() {
            return Ok(value);
        }

        self.load(key).await
    }

    async fn load(self: &Arc<Self>, key: &str) -> Result<ByteView> {
        let this = self.clone();
        let key_owned = key.to_string();

        self.flight
            .do_call(key, move || {
                let this = this.clone();
                let key = key_owned;
                Box::pin(async move { this.load_once(&key).await }) as Pin<Box<dyn Future<Output = BoxedResult> + Send>>
            })
            .await
    }

    /// Runs exactly once per in-flight window, under the single-flight
    /// coordinator: tries the remote peer first (if one owns the key),
    /// falling back to the local loader when there is no peer, or when the
    /// peer fetch itself fails.
    async fn load_once(self: &Arc<Self>, key: &str) -> BoxedResult {
        if let Some(peers) = self.peers.get() {
            if let Some(fetcher) = peers.pick_peer(key) {
                match fetcher.fetch(&self.name, key).await {
                    Ok(value) => return Ok(value),
                    Err(err) => {
                        tracing::warn!(group = %self.name, %key, error = %err, "peer fetch failed, falling back to local load");
                    }
                }
            }
        }

        self.load_locally(key).await
    }

    async fn load_locally(&self, key: &str) -> BoxedResult {
        let bytes = self.loader.load(key).await.map_err(|err| GroupCacheError::LoaderFailed {
            group: self.name.clone(),
            message: err.to_string(),
        })?;

        self.store.lock().add(key.to_string(), bytes.clone());
        Ok(bytes)
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }
}
