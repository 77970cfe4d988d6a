// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{
    commands::{
        ERR_NOT_FLOAT, ERR_NOT_INTEGER, ERR_WRONG_ARGS, ExecContext, Execute, Outcome,
        error_reply, reply, store_error,
    },
    resp::frame::Frame,
};

/// Shortest decimal form: trailing zeros and the decimal point drop out
/// (`5.0` prints as `5`).
pub(crate) fn format_score(score: f64) -> String {
    score.to_string()
}

/// `ZADD key score member [score member …]` — returns the number of
/// members that did not exist before; repositioned members do not count.
#[derive(Debug)]
pub struct ZAddCommand {
    pub args: Vec<String>,
}

impl Execute for ZAddCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        let num_args = self.args.len();
        if num_args < 3 || (num_args - 1) % 2 != 0 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let key = &self.args[0];

        let mut pairs = Vec::with_capacity((num_args - 1) / 2);
        for pair in self.args[1..].chunks_exact(2) {
            let score: f64 = match pair[0].parse() {
                Ok(s) => s,
                Err(_) => return error_reply(ERR_NOT_FLOAT),
            };
            // NaN and the infinities are not valid ranking scores.
            if !score.is_finite() {
                return error_reply(ERR_NOT_FLOAT);
            }
            pairs.push((score, pair[1].clone()));
        }

        match ctx.state.store.zadd(key, &pairs) {
            Ok(added) => reply(Frame::Integer(added as i64)),
            Err(e) => store_error(e),
        }
    }
}

/// `ZRANK key member` — 0-based rank under `(score asc, member asc)`.
#[derive(Debug)]
pub struct ZRankCommand {
    pub args: Vec<String>,
}

impl Execute for ZRankCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.zrank(&self.args[0], &self.args[1]) {
            Ok(Some(rank)) => reply(Frame::Integer(rank as i64)),
            Ok(None) => reply(Frame::NullBulk),
            Err(e) => store_error(e),
        }
    }
}

/// `ZRANGE key start stop [WITHSCORES]`
#[derive(Debug)]
pub struct ZRangeCommand {
    pub args: Vec<String>,
}

impl Execute for ZRangeCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        let num_args = self.args.len();
        if num_args < 3 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let key = &self.args[0];

        let Ok(start) = self.args[1].parse::<i64>() else {
            return error_reply(ERR_NOT_INTEGER);
        };
        let Ok(stop) = self.args[2].parse::<i64>() else {
            return error_reply(ERR_NOT_INTEGER);
        };
        let with_scores =
            num_args >= 4 && self.args[3].eq_ignore_ascii_case("withscores");

        match ctx.state.store.zrange(key, start, stop) {
            Ok(members) => {
                let mut out =
                    Vec::with_capacity(members.len() * if with_scores { 2 } else { 1 });
                for (member, score) in members {
                    out.push(Frame::Bulk(member));
                    if with_scores {
                        out.push(Frame::Bulk(format_score(score)));
                    }
                }
                reply(Frame::Array(out))
            },
            Err(e) => store_error(e),
        }
    }
}

/// `ZCARD key`
#[derive(Debug)]
pub struct ZCardCommand {
    pub args: Vec<String>,
}

impl Execute for ZCardCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.zcard(&self.args[0]) {
            Ok(card) => reply(Frame::Integer(card as i64)),
            Err(e) => store_error(e),
        }
    }
}

/// `ZSCORE key member`
#[derive(Debug)]
pub struct ZScoreCommand {
    pub args: Vec<String>,
}

impl Execute for ZScoreCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.zscore(&self.args[0], &self.args[1]) {
            Ok(Some(score)) => reply(Frame::Bulk(format_score(score))),
            Ok(None) => reply(Frame::NullBulk),
            Err(e) => store_error(e),
        }
    }
}

/// `ZREM key member [member …]`
#[derive(Debug)]
pub struct ZRemCommand {
    pub args: Vec<String>,
}

impl Execute for ZRemCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.zrem(&self.args[0], &self.args[1..]) {
            Ok(removed) => reply(Frame::Integer(removed as i64)),
            Err(e) => store_error(e),
        }
    }
}
