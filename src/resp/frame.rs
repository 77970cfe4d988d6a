// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::{BufMut, Bytes, BytesMut};

/// A single RESP reply value.
///
/// Every command executor produces one `Frame`; the dispatcher encodes it
/// into the session's write buffer. Arrays nest, which covers pub/sub
/// message frames, stream results and `EXEC` batches.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `+<text>\r\n`
    Simple(String),
    /// `-<text>\r\n`
    Error(String),
    /// `:<n>\r\n`
    Integer(i64),
    /// `$<n>\r\n<bytes>\r\n`
    Bulk(String),
    /// `$-1\r\n`
    NullBulk,
    /// `*<n>\r\n<elements>`
    Array(Vec<Frame>),
}

impl Frame {
    /// The canonical `+OK` reply for successful mutations.
    pub fn ok() -> Frame {
        Frame::Simple("OK".to_string())
    }

    pub fn error(msg: impl Into<String>) -> Frame {
        Frame::Error(msg.into())
    }

    pub fn bulk(msg: impl Into<String>) -> Frame {
        Frame::Bulk(msg.into())
    }

    /// Serializes the frame into `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Frame::Simple(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            },
            Frame::Error(s) => {
                buf.put_u8(b'-');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            },
            Frame::Integer(n) => {
                buf.put_slice(format!(":{n}\r\n").as_bytes());
            },
            Frame::Bulk(s) => {
                buf.put_slice(format!("${}\r\n", s.len()).as_bytes());
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            },
            Frame::NullBulk => {
                buf.put_slice(b"$-1\r\n");
            },
            Frame::Array(items) => {
                buf.put_slice(format!("*{}\r\n", items.len()).as_bytes());
                for item in items {
                    item.encode_into(buf);
                }
            },
        }
    }

    /// Serializes the frame into a freshly allocated buffer.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64);
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

/// Subscribe/unsubscribe confirmations: `[op, channel, total_count]`.
pub fn pubsub_reply(op: &str, channel: &str, count: i64) -> Frame {
    Frame::Array(vec![
        Frame::bulk(op),
        Frame::bulk(channel),
        Frame::Integer(count),
    ])
}

/// The three-element fan-out frame written to every subscriber:
/// `["message", channel, payload]`.
pub fn message_frame(channel: &str, payload: &str) -> Frame {
    Frame::Array(vec![
        Frame::bulk("message"),
        Frame::bulk(channel),
        Frame::bulk(payload),
    ])
}
