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
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::config::GroupConfig;
use crate::group::{Group, Loader};

fn registry() -> &'static RwLock<HashMap<String, Arc<Group>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<Group>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Creates a `Group`, registers it process-wide under `name`, and returns
/// it. Registering the same name twice panics: a name → group binding is
/// meant to be immutable for the process lifetime, not a runtime error a
/// caller is expected to recover from.
pub fn new_group(name: impl Into<String>, cache_bytes: usize, loader: Arc<dyn Loader>) -> Arc<Group> {
    let name = name.into();
    assert!(!name.is_empty(), "group name must not be empty");

    let group = Group::new(name.clone(), GroupConfig::new(cache_bytes), loader);

    let mut groups = registry().write();
    assert!(!groups.contains_key(&name), "group {name:?} is already registered");
    groups.insert(name, group.clone());
    group
}

/// Looks up a previously registered group. Reads take a shared lock and
/// never block one another.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    registry().read().get(name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::loader_fn;
    use groupcache_common::ByteView;

    fn noop_loader() -> Arc<dyn Loader> {
        Arc::new(loader_fn(|_key: &str| async { Ok(ByteView::from("v".to_string())) }))
    }

    #[test]
    fn get_group_sees_a_group_registered_by_new_group() {
        let unique_name = "registry-test-sees-registration";
        new_group(unique_name, 0, noop_loader());
        assert!(get_group(unique_name).is_some());
    }

    #[test]
    fn get_group_returns_none_for_unknown_name() {
        assert!(get_group("registry-test-never-registered").is_none());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registering_the_same_name_twice_panics() {
        let unique_name = "registry-test-duplicate";
        new_group(unique_name, 0, noop_loader());
        new_group(unique_name, 0, noop_loader());
    }
}
