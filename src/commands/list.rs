// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use crate::{
    commands::{
        ERR_NOT_INTEGER, ERR_WRONG_ARGS, ExecContext, Execute, Outcome, error_reply,
        reply, store_error,
    },
    resp::frame::Frame,
    server::waiter::BlockingJob,
};

const ERR_TIMEOUT_FLOAT: &str = "ERR timeout is not a float or out of range";

/// `LPUSH key element [element …]` — the last argument ends up at the
/// head. Returns the new length.
#[derive(Debug)]
pub struct LPushCommand {
    pub args: Vec<String>,
}

impl Execute for LPushCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.push_front(&self.args[0], &self.args[1..]) {
            Ok(len) => reply(Frame::Integer(len as i64)),
            Err(e) => store_error(e),
        }
    }
}

/// `RPUSH key element [element …]`
#[derive(Debug)]
pub struct RPushCommand {
    pub args: Vec<String>,
}

impl Execute for RPushCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.push_back(&self.args[0], &self.args[1..]) {
            Ok(len) => reply(Frame::Integer(len as i64)),
            Err(e) => store_error(e),
        }
    }
}

/// `LPOP key` — null on a missing key; popping the last element removes
/// the key.
#[derive(Debug)]
pub struct LPopCommand {
    pub args: Vec<String>,
}

impl Execute for LPopCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.pop_front(&self.args[0]) {
            Ok(Some(elem)) => reply(Frame::Bulk(elem)),
            Ok(None) => reply(Frame::NullBulk),
            Err(e) => store_error(e),
        }
    }
}

/// `RPOP key`
#[derive(Debug)]
pub struct RPopCommand {
    pub args: Vec<String>,
}

impl Execute for RPopCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.pop_back(&self.args[0]) {
            Ok(Some(elem)) => reply(Frame::Bulk(elem)),
            Ok(None) => reply(Frame::NullBulk),
            Err(e) => store_error(e),
        }
    }
}

/// `LLEN key` — 0 for a missing key.
#[derive(Debug)]
pub struct LLenCommand {
    pub args: Vec<String>,
}

impl Execute for LLenCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.list_len(&self.args[0]) {
            Ok(len) => reply(Frame::Integer(len as i64)),
            Err(e) => store_error(e),
        }
    }
}

/// `LRANGE key start stop` — negative indices count from the tail.
#[derive(Debug)]
pub struct LRangeCommand {
    pub args: Vec<String>,
}

impl Execute for LRangeCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 3 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let Ok(start) = self.args[1].parse::<i64>() else {
            return error_reply(ERR_NOT_INTEGER);
        };
        let Ok(stop) = self.args[2].parse::<i64>() else {
            return error_reply(ERR_NOT_INTEGER);
        };

        match ctx.state.store.list_range(&self.args[0], start, stop) {
            Ok(elems) => {
                reply(Frame::Array(elems.into_iter().map(Frame::Bulk).collect()))
            },
            Err(e) => store_error(e),
        }
    }
}

/// `BLPOP key [key …] timeout` — scans keys in argument order; the first
/// non-empty list wins. A zero timeout blocks until data arrives.
#[derive(Debug)]
pub struct BLPopCommand {
    pub args: Vec<String>,
}

impl Execute for BLPopCommand {
    fn execute(&self, _ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let Ok(timeout_secs) = self.args[self.args.len() - 1].parse::<f64>() else {
            return error_reply(ERR_TIMEOUT_FLOAT);
        };
        if !timeout_secs.is_finite() {
            return error_reply(ERR_TIMEOUT_FLOAT);
        }

        let keys = self.args[..self.args.len() - 1].to_vec();
        let timeout =
            (timeout_secs > 0.0).then(|| Duration::from_secs_f64(timeout_secs));

        Outcome::Block(BlockingJob::ListPop { keys, timeout })
    }
}
