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

//! Shared vocabulary types for the groupcache workspace: the immutable byte
//! view returned to callers, the "sized value" capability the LRU store
//! accounts bytes against, and the error taxonomy used across crates.

pub mod error;
pub mod sized;
pub mod view;

pub use error::{GroupCacheError, Result};
pub use sized::CacheValue;
pub use view::ByteView;
