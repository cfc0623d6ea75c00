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

//! Wire schema for the peer fetch protocol: a length-delimited `Request`
//! (group, key) and `Response` (value bytes), generated from
//! `proto/groupcache.proto` so that every peer in a deployment is
//! guaranteed to agree on field numbers.

mod pb {
    include!(concat!(env!("OUT_DIR"), "/groupcache.rs"));
}

pub use pb::{Request, Response};

/// URL-safe percent-encoding for the group name and key path segments of
/// any transport built on top of this schema.
pub fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segment_encodes_reserved_characters() {
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn request_round_trips_through_prost_encoding() {
        let request = Request {
            group: "scores".to_string(),
            key: "Tom".to_string(),
        };
        let mut buf = Vec::new();
        prost::Message::encode(&request, &mut buf).expect("encode");
        let decoded = <Request as prost::Message>::decode(buf.as_slice()).expect("decode");
        assert_eq!(decoded, request);
    }
}
