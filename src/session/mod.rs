// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::HashSet;

use anyhow::Result;
use bytes::{Bytes, BytesMut};
use tokio::{
    io::AsyncWriteExt,
    net::tcp::OwnedWriteHalf,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::{pubsub::SessionId, resp::frame::Frame};

/// A command captured inside a transaction, not yet executed.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub label: String,
    pub args: Vec<String>,
}

/// All per-connection state: the output side of the socket, the
/// transaction queue, the subscription set and the acknowledged-bytes
/// counter. The read half stays with the dispatcher task.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    writer: OwnedWriteHalf,
    out: BytesMut,
    /// Wire bytes consumed by decoded requests, reported by
    /// `REPLCONF getack`.
    pub bytes_read: u64,

    in_transaction: bool,
    queued: Vec<QueuedCommand>,

    subscribed: HashSet<String>,
    /// Handed to the pub/sub registry on subscribe; fan-out lands in the
    /// paired receiver owned by the dispatcher.
    mailbox_tx: UnboundedSender<Bytes>,
}

impl Session {
    pub fn new(id: SessionId, writer: OwnedWriteHalf) -> (Self, UnboundedReceiver<Bytes>) {
        let (mailbox_tx, mailbox_rx) = mpsc::unbounded_channel();
        (
            Self {
                id,
                writer,
                out: BytesMut::with_capacity(4096),
                bytes_read: 0,
                in_transaction: false,
                queued: Vec::new(),
                subscribed: HashSet::new(),
                mailbox_tx,
            },
            mailbox_rx,
        )
    }

    pub fn mailbox_sender(&self) -> UnboundedSender<Bytes> {
        self.mailbox_tx.clone()
    }

    // ── output ───────────────────────────────────────────────────────────

    pub fn write_frame(&mut self, frame: &Frame) {
        frame.encode_into(&mut self.out);
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub async fn flush(&mut self) -> Result<()> {
        if !self.out.is_empty() {
            self.writer.write_all(&self.out).await?;
            self.out.clear();
        }
        Ok(())
    }

    // ── transactions ─────────────────────────────────────────────────────

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn start_transaction(&mut self) {
        self.in_transaction = true;
        self.queued.clear();
    }

    pub fn discard_transaction(&mut self) {
        self.in_transaction = false;
        self.queued.clear();
    }

    pub fn queue_command(&mut self, label: String, args: Vec<String>) {
        self.queued.push(QueuedCommand { label, args });
    }

    /// Ends the transaction and hands back the queue in FIFO order.
    pub fn take_queued(&mut self) -> Vec<QueuedCommand> {
        self.in_transaction = false;
        std::mem::take(&mut self.queued)
    }

    // ── subscriptions ────────────────────────────────────────────────────

    pub fn is_subscribed(&self) -> bool {
        !self.subscribed.is_empty()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscribed.len()
    }

    pub fn add_subscription(&mut self, channel: &str) -> usize {
        self.subscribed.insert(channel.to_string());
        self.subscribed.len()
    }

    pub fn remove_subscription(&mut self, channel: &str) -> usize {
        self.subscribed.remove(channel);
        self.subscribed.len()
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &String> {
        self.subscribed.iter()
    }

    pub fn clear_subscriptions(&mut self) -> Vec<String> {
        self.subscribed.drain().collect()
    }
}
