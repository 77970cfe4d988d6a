// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use crate::{cfg::config::Config, pubsub::PubSub, store::Store, utils::generate_replid};

/// Identity this node reports through `INFO replication`.
#[derive(Debug)]
pub struct ReplicationInfo {
    pub replid: String,
    pub offset: u64,
}

/// Process-wide singletons of the core: the keyspace and the pub/sub
/// registry, shared by every session task through an `Arc`. Tests reset
/// the world by building a fresh state.
#[derive(Debug)]
pub struct ServerState {
    pub store: Store,
    pub pubsub: PubSub,
    pub replication: ReplicationInfo,
    /// Upper bound on one socket write before the session is dropped.
    pub write_timeout: Duration,
}

impl ServerState {
    pub fn new(cfg: &Config) -> Self {
        Self {
            store: Store::new(),
            pubsub: PubSub::new(),
            replication: ReplicationInfo {
                replid: generate_replid().1,
                offset: 0,
            },
            write_timeout: cfg.runtime.timeout_write,
        }
    }
}
