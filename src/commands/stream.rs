// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{
    commands::{
        ERR_INVALID_STREAM_ID, ERR_SYNTAX_BARE, ERR_WRONG_ARGS, ERR_XREAD_UNBALANCED,
        ExecContext, Execute, Outcome, error_reply, reply, store_error,
    },
    resp::frame::Frame,
    server::waiter::BlockingJob,
    store::{
        Store,
        stream::{IdSpec, StreamEntry, StreamId},
    },
};

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Entry wire shape: `[id, [field, value, …]]`.
pub(crate) fn encode_entry(entry: &StreamEntry) -> Frame {
    let mut fields = Vec::with_capacity(entry.fields.len() * 2);
    for (field, value) in &entry.fields {
        fields.push(Frame::bulk(field.clone()));
        fields.push(Frame::bulk(value.clone()));
    }
    Frame::Array(vec![
        Frame::Bulk(entry.id.to_string()),
        Frame::Array(fields),
    ])
}

/// Collects entries strictly after each cursor, keyed by stream. Streams
/// with nothing new (or not holding a stream at all) are left out.
pub(crate) fn read_streams(
    store: &Store,
    keys: &[String],
    ids: &[StreamId],
) -> Vec<(String, Vec<StreamEntry>)> {
    let mut results = Vec::new();
    for (key, id) in keys.iter().zip(ids) {
        match store.stream_entries_after(key, *id) {
            Ok(entries) if !entries.is_empty() => results.push((key.clone(), entries)),
            _ => {},
        }
    }
    results
}

/// Per-stream result arrays: `[[key, [entries…]], …]`.
pub(crate) fn encode_streams_reply(results: &[(String, Vec<StreamEntry>)]) -> Frame {
    Frame::Array(
        results
            .iter()
            .map(|(key, entries)| {
                Frame::Array(vec![
                    Frame::bulk(key.clone()),
                    Frame::Array(entries.iter().map(encode_entry).collect()),
                ])
            })
            .collect(),
    )
}

/// `XADD key id field value [field value …]`
#[derive(Debug)]
pub struct XAddCommand {
    pub args: Vec<String>,
}

impl Execute for XAddCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        let num_args = self.args.len();
        if num_args < 4 || (num_args - 2) % 2 != 0 {
            return error_reply(ERR_WRONG_ARGS);
        }

        let key = &self.args[0];
        let spec = match self.args[1].as_str() {
            "*" => IdSpec::Auto,
            explicit => match StreamId::parse_exact(explicit) {
                Some(id) => IdSpec::Explicit(id),
                None => return error_reply(ERR_INVALID_STREAM_ID),
            },
        };

        let mut fields = Vec::with_capacity((num_args - 2) / 2);
        for pair in self.args[2..].chunks_exact(2) {
            fields.push((pair[0].clone(), pair[1].clone()));
        }

        match ctx.state.store.xadd(key, spec, fields, wall_clock_ms()) {
            Ok(id) => reply(Frame::Bulk(id)),
            Err(e) => store_error(e),
        }
    }
}

/// `XRANGE key start end` — inclusive on both bounds; `-`/`+` are the
/// minimum/maximum sentinels.
#[derive(Debug)]
pub struct XRangeCommand {
    pub args: Vec<String>,
}

impl Execute for XRangeCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 3 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let key = &self.args[0];

        let Some(start) = StreamId::parse_range(&self.args[1], true) else {
            return error_reply(ERR_INVALID_STREAM_ID);
        };
        let Some(end) = StreamId::parse_range(&self.args[2], false) else {
            return error_reply(ERR_INVALID_STREAM_ID);
        };

        match ctx.state.store.xrange(key, start, end) {
            Ok(entries) => {
                reply(Frame::Array(entries.iter().map(encode_entry).collect()))
            },
            Err(e) => store_error(e),
        }
    }
}

/// `XREAD [BLOCK ms] STREAMS key… id…` — entries strictly after each
/// given id; `$` resolves to the stream's current top at call time.
#[derive(Debug)]
pub struct XReadCommand {
    pub args: Vec<String>,
}

impl Execute for XReadCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 3 {
            return error_reply(ERR_WRONG_ARGS);
        }

        let mut rest: &[String] = &self.args;
        let mut block_ms: Option<i64> = None;
        if rest[0].eq_ignore_ascii_case("block") {
            let Ok(timeout) = rest[1].parse::<i64>() else {
                return error_reply(ERR_SYNTAX_BARE);
            };
            block_ms = Some(timeout);
            rest = &rest[2..];
        }

        let Some(streams_idx) =
            rest.iter().position(|a| a.eq_ignore_ascii_case("streams"))
        else {
            return error_reply(ERR_SYNTAX_BARE);
        };

        let cursor_args = &rest[streams_idx + 1..];
        if cursor_args.len() < 2 || cursor_args.len() % 2 != 0 {
            return error_reply(ERR_XREAD_UNBALANCED);
        }

        let num_streams = cursor_args.len() / 2;
        let keys: Vec<String> = cursor_args[..num_streams].to_vec();
        let mut ids = Vec::with_capacity(num_streams);
        for (key, raw) in keys.iter().zip(&cursor_args[num_streams..]) {
            if raw == "$" {
                // The cursor pins to whatever the top id is right now, so
                // a blocking read waits for strictly newer entries.
                ids.push(
                    ctx.state
                        .store
                        .stream_last_id(key)
                        .unwrap_or(StreamId::ZERO),
                );
            } else {
                match StreamId::parse_after(raw) {
                    Some(id) => ids.push(id),
                    None => return error_reply(ERR_INVALID_STREAM_ID),
                }
            }
        }

        let results = read_streams(&ctx.state.store, &keys, &ids);
        if !results.is_empty() {
            return reply(encode_streams_reply(&results));
        }

        match block_ms {
            Some(ms) if ms >= 0 => Outcome::Block(BlockingJob::StreamRead {
                keys,
                ids,
                timeout: (ms > 0).then(|| Duration::from_millis(ms as u64)),
            }),
            _ => reply(Frame::NullBulk),
        }
    }
}
