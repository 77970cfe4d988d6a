// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use crate::{
    commands::{
        ERR_SYNTAX_BARE, ERR_WRONG_ARGS, ExecContext, Execute, Outcome, error_reply,
        reply, store_error,
    },
    resp::frame::Frame,
};

const ERR_INVALID_EXPIRE: &str = "ERR invalid expire time in 'set' command";

/// `SET key value [EX seconds | PX milliseconds]`
#[derive(Debug)]
pub struct SetCommand {
    pub args: Vec<String>,
}

impl Execute for SetCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        let num_args = self.args.len();
        if num_args != 2 && num_args != 4 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let key = &self.args[0];
        let data = self.args[1].clone();

        let mut ttl = None;
        if num_args == 4 {
            let unit = self.args[2].to_ascii_lowercase();
            if unit != "ex" && unit != "px" {
                return error_reply(ERR_SYNTAX_BARE);
            }
            let amount: u64 = match self.args[3].parse() {
                Ok(n) if n > 0 => n,
                _ => return error_reply(ERR_INVALID_EXPIRE),
            };
            ttl = Some(if unit == "ex" {
                Duration::from_secs(amount)
            } else {
                Duration::from_millis(amount)
            });
        }

        ctx.state.store.set_string(key, data, ttl);
        reply(Frame::ok())
    }
}

/// `GET key` — expiry-aware read; a null bulk stands for absence.
#[derive(Debug)]
pub struct GetCommand {
    pub args: Vec<String>,
}

impl Execute for GetCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.get_string(&self.args[0]) {
            Ok(Some(data)) => reply(Frame::Bulk(data)),
            Ok(None) => reply(Frame::NullBulk),
            Err(e) => store_error(e),
        }
    }
}

/// `INCR key` — signed 64-bit increment; a missing key counts from zero.
#[derive(Debug)]
pub struct IncrCommand {
    pub args: Vec<String>,
}

impl Execute for IncrCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match ctx.state.store.incr(&self.args[0]) {
            Ok(n) => reply(Frame::Integer(n)),
            Err(e) => store_error(e),
        }
    }
}

/// `TYPE key` — names the stored kind, `none` for absent keys.
#[derive(Debug)]
pub struct TypeCommand {
    pub args: Vec<String>,
}

impl Execute for TypeCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let kind = ctx.state.store.kind_of(&self.args[0]).unwrap_or("none");
        reply(Frame::Simple(kind.to_string()))
    }
}
