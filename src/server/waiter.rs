// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Bounded polling for the two blocking read commands. Between polls the
//! session holds no locks at all; every scan re-acquires the keyspace
//! entry locks it needs.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use crate::{
    commands::stream::{encode_streams_reply, read_streams},
    resp::frame::Frame,
    server::state::ServerState,
    store::stream::StreamId,
};

const LIST_POLL_INTERVAL: Duration = Duration::from_millis(10);
const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A wait requested by an executor. `timeout: None` blocks until data
/// arrives or the server shuts down.
#[derive(Debug)]
pub enum BlockingJob {
    ListPop {
        keys: Vec<String>,
        timeout: Option<Duration>,
    },
    StreamRead {
        keys: Vec<String>,
        ids: Vec<StreamId>,
        timeout: Option<Duration>,
    },
}

/// One non-blocking scan. `None` means nothing was available.
pub fn try_once(state: &ServerState, job: &BlockingJob) -> Option<Frame> {
    match job {
        BlockingJob::ListPop { keys, .. } => {
            for key in keys {
                // Keys holding another kind are skipped, never errors.
                if let Ok(Some(elem)) = state.store.pop_front(key) {
                    return Some(Frame::Array(vec![
                        Frame::bulk(key.clone()),
                        Frame::Bulk(elem),
                    ]));
                }
            }
            None
        },
        BlockingJob::StreamRead { keys, ids, .. } => {
            let results = read_streams(&state.store, keys, ids);
            (!results.is_empty()).then(|| encode_streams_reply(&results))
        },
    }
}

/// Polls until data shows up or the deadline (computed once at entry)
/// passes. Blocking commands never fail: shutdown and timeout both
/// surface as a null bulk.
pub async fn run(
    state: &ServerState,
    job: BlockingJob,
    cancel: &CancellationToken,
) -> Frame {
    let (timeout, base_interval) = match &job {
        BlockingJob::ListPop { timeout, .. } => (*timeout, LIST_POLL_INTERVAL),
        BlockingJob::StreamRead { timeout, .. } => (*timeout, STREAM_POLL_INTERVAL),
    };
    let deadline = timeout.map(|t| Instant::now() + t);

    loop {
        if let Some(frame) = try_once(state, &job) {
            return frame;
        }

        let mut interval = base_interval;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                return Frame::NullBulk;
            }
            interval = interval.min(deadline - now);
        }

        tokio::select! {
            _ = cancel.cancelled() => return Frame::NullBulk,
            _ = sleep(interval) => {},
        }
    }
}
