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

use thiserror::Error;

/// Error taxonomy for the groupcache core.
///
/// `Clone` is load-bearing: the single-flight coordinator hands the exact
/// same error value to every follower of an in-flight call, which requires
/// the error type itself to be cheaply duplicable rather than type-erased.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GroupCacheError {
    /// `Group::get` was called with an empty key.
    #[error("key must not be empty")]
    KeyRequired,

    /// Registry lookup missed at the transport boundary. Not raised by the
    /// core itself; transports surface this when `get_group` returns `None`.
    #[error("group {0:?} is not registered")]
    GroupUnknown(String),

    /// The user-supplied loader returned an error.
    #[error("loader failed for group {group:?}: {message}")]
    LoaderFailed { group: String, message: String },

    /// The remote fetcher returned an error or a non-success status. Recovered
    /// internally by `Group::get` falling back to the local loader; surfaced
    /// to a caller only if the subsequent local load also fails (in which
    /// case `LoaderFailed` is what propagates, not this variant).
    #[error("peer fetch failed for group {group:?}: {message}")]
    PeerFetchFailed { group: String, message: String },

    /// `Group::register_peers` was called more than once on the same group.
    #[error("peers already registered for group {0:?}")]
    PeersAlreadyRegistered(String),
}

pub type Result<T> = std::result::Result<T, GroupCacheError>;
