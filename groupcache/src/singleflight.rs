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
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Per-key call deduplication: at most one outstanding future per key, late
/// callers join the in-flight call and receive its result.
///
/// Grounded on the waiter-coalescing in `foyer-memory`'s
/// `GenericCache::entry()`: a `HashMap<key, Vec<oneshot::Sender<_>>>` records
/// followers, and the leader's work runs inside a detached `tokio::spawn`
/// task so followers dropping out (or the leader's own caller being
/// cancelled) never cancels the work itself.
pub struct SingleFlight<V, E> {
    calls: Mutex<HashMap<String, Vec<oneshot::Sender<Result<V, E>>>>>,
}

impl<V, E> Default for SingleFlight<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> SingleFlight<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` for `key` if no call for that key is already in flight, or
    /// joins the in-flight call otherwise. Followers never invoke `f`; all
    /// callers that entered while a call was in flight observe the identical
    /// result the leader produced.
    pub async fn do_call<F, Fut>(self: &Arc<Self>, key: &str, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        enum Role<V, E> {
            Follower(oneshot::Receiver<Result<V, E>>),
            Leader,
        }

        let role = {
            let mut calls = self.calls.lock();
            match calls.get_mut(key) {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Role::Follower(rx)
                }
                None => {
                    calls.insert(key.to_string(), Vec::new());
                    Role::Leader
                }
            }
        };

        match role {
            Role::Follower(rx) => rx.await.expect("single-flight leader dropped without sending a result"),
            Role::Leader => {
                let coordinator = self.clone();
                let key = key.to_string();
                let future = f();
                let handle = tokio::spawn(async move {
                    let result = future.await;
                    let waiters = coordinator.calls.lock().remove(&key).unwrap_or_default();
                    for waiter in waiters {
                        let _ = waiter.send(result.clone());
                    }
                    result
                });
                handle.await.expect("single-flight leader task panicked")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn concurrent_callers_see_one_invocation_and_identical_results() {
        let flight: Arc<SingleFlight<String, String>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let flight = flight.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .do_call("Tom", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(150)).await;
                        Ok::<_, String>("630".to_string())
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result, Ok("630".to_string()));
        }
    }

    #[tokio::test]
    async fn errors_are_delivered_unchanged_to_all_waiters() {
        let flight: Arc<SingleFlight<String, String>> = Arc::new(SingleFlight::new());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let flight = flight.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .do_call("missing", || async { Err::<String, _>("not found".to_string()) })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Err("not found".to_string()));
        }
    }

    #[tokio::test]
    async fn a_fresh_call_starts_after_the_in_flight_one_completes() {
        let flight: Arc<SingleFlight<u32, String>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let calls = calls.clone();
            flight
                .do_call("k", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(1)
                })
                .await
                .unwrap();
        }
        assert!(flight.calls.lock().is_empty());

        {
            let calls = calls.clone();
            flight
                .do_call("k", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(2)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
