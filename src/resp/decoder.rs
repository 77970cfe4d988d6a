// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::{Buf, BytesMut};
use thiserror::Error;

/// Upper bound on elements in one request array. Anything larger is a
/// framing error, not a legitimate command.
const MAX_ARGS: usize = 1024 * 1024;
/// Upper bound on a single bulk-string payload (512 MiB, the classic cap).
const MAX_BULK: usize = 512 * 1024 * 1024;

/// A fully framed client request.
///
/// The first array element is the command label, case-folded to lower for
/// dispatch; the rest are its arguments verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub label: String,
    pub args: Vec<String>,
    /// Wire length of the whole request, maintained for the session's
    /// acknowledged-bytes counter.
    pub frame_len: usize,
}

/// Framing errors are unrecoverable: the dispatcher closes the connection.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("expected array header '*'")]
    ExpectedArray,
    #[error("expected bulk string header '$'")]
    ExpectedBulk,
    #[error("invalid length prefix")]
    BadLength,
    #[error("bulk payload not terminated by CRLF")]
    BadTerminator,
    #[error("request element is not valid UTF-8")]
    InvalidUtf8,
}

/// Tries to frame one request out of `buf`.
///
/// Returns `Ok(None)` when the buffer holds only a prefix of a request;
/// nothing is consumed in that case. On success the framed bytes are
/// consumed from `buf`.
pub fn try_decode(buf: &mut BytesMut) -> Result<Option<Request>, DecodeError> {
    let mut pos = 0usize;

    let Some(header) = read_line(buf, &mut pos) else {
        return Ok(None);
    };
    if header.first() != Some(&b'*') {
        return Err(DecodeError::ExpectedArray);
    }
    let count = parse_len(&header[1..])?;
    if count == 0 || count > MAX_ARGS {
        return Err(DecodeError::BadLength);
    }

    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(len_line) = read_line(buf, &mut pos) else {
            return Ok(None);
        };
        if len_line.first() != Some(&b'$') {
            return Err(DecodeError::ExpectedBulk);
        }
        let len = parse_len(&len_line[1..])?;
        if len > MAX_BULK {
            return Err(DecodeError::BadLength);
        }

        // Payload plus its trailing CRLF must be present in full.
        if buf.len() < pos + len + 2 {
            return Ok(None);
        }
        let payload = &buf[pos..pos + len];
        if &buf[pos + len..pos + len + 2] != b"\r\n" {
            return Err(DecodeError::BadTerminator);
        }
        let text =
            std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?;
        elements.push(text.to_string());
        pos += len + 2;
    }

    buf.advance(pos);

    let mut iter = elements.into_iter();
    let label = match iter.next() {
        Some(first) => first.to_ascii_lowercase(),
        None => return Err(DecodeError::BadLength),
    };
    Ok(Some(Request {
        label,
        args: iter.collect(),
        frame_len: pos,
    }))
}

/// Reads one CRLF-terminated line starting at `*pos`, advancing `*pos`
/// past the terminator. Returns `None` when the line is incomplete.
fn read_line<'a>(buf: &'a BytesMut, pos: &mut usize) -> Option<&'a [u8]> {
    let start = *pos;
    let rest = &buf[start..];
    let nl = rest.windows(2).position(|w| w == b"\r\n")?;
    *pos = start + nl + 2;
    Some(&rest[..nl])
}

fn parse_len(digits: &[u8]) -> Result<usize, DecodeError> {
    if digits.is_empty() {
        return Err(DecodeError::BadLength);
    }
    let mut value = 0usize;
    for &d in digits {
        if !d.is_ascii_digit() {
            return Err(DecodeError::BadLength);
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((d - b'0') as usize))
            .ok_or(DecodeError::BadLength)?;
    }
    Ok(value)
}
