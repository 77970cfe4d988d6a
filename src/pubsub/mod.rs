// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Channel registry and publish fan-out.
//!
//! Delivery goes through per-session mailboxes: `publish` encodes the
//! message frame once and pushes the bytes into every subscriber's
//! unbounded sender while holding the channel entry lock, so two messages
//! from one publisher can never be reordered for one subscriber. The
//! session task drains its mailbox and flushes its own socket; the
//! registry never touches another session's writer directly.

use std::collections::HashMap;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::resp::frame::message_frame;

pub type SessionId = u64;

/// `channel → subscribers`. Sessions are held as ids plus mailbox handles,
/// never as owning references; dropping a session invalidates its senders.
#[derive(Debug, Default)]
pub struct PubSub {
    channels: DashMap<String, HashMap<SessionId, UnboundedSender<Bytes>>>,
}

impl PubSub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub fn subscribe(
        &self,
        session: SessionId,
        mailbox: UnboundedSender<Bytes>,
        channel: &str,
    ) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(session, mailbox);
    }

    pub fn unsubscribe(&self, session: SessionId, channel: &str) {
        if let Some(mut subscribers) = self.channels.get_mut(channel) {
            subscribers.remove(&session);
        }
        // Dead channels are pruned so publishing to them stays O(1).
        self.channels.remove_if(channel, |_, subs| subs.is_empty());
    }

    /// Sends `["message", channel, payload]` to every subscriber of
    /// `channel` and returns how many sessions received it. Publishing to
    /// an unknown channel returns 0 without allocating.
    pub fn publish(&self, channel: &str, payload: &str) -> usize {
        let Some(mut subscribers) = self.channels.get_mut(channel) else {
            return 0;
        };

        let encoded = message_frame(channel, payload).encode();
        let mut delivered = 0;
        let mut gone = Vec::new();
        for (id, mailbox) in subscribers.iter() {
            if mailbox.send(encoded.clone()).is_ok() {
                delivered += 1;
            } else {
                gone.push(*id);
            }
        }
        for id in &gone {
            subscribers.remove(id);
        }
        let emptied = subscribers.is_empty();
        drop(subscribers);
        if emptied {
            self.channels.remove_if(channel, |_, subs| subs.is_empty());
        }

        debug!(channel, delivered, "publish fan-out");
        delivered
    }

    /// Removes a disconnecting session from the channels it was in.
    pub fn drop_session<'a>(
        &self,
        session: SessionId,
        channels: impl IntoIterator<Item = &'a String>,
    ) {
        for channel in channels {
            self.unsubscribe(session, channel);
        }
    }
}
