// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{
    commands::{ERR_WRONG_ARGS, ExecContext, Execute, Outcome, error_reply, reply},
    resp::frame::Frame,
};

#[derive(Debug)]
pub struct PingCommand {
    pub args: Vec<String>,
}

impl Execute for PingCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        // Subscribed sessions get the two-element array form.
        if ctx.session.is_subscribed() {
            let msg = self.args.first().map(String::as_str).unwrap_or("");
            return reply(Frame::Array(vec![Frame::bulk("pong"), Frame::bulk(msg)]));
        }

        match self.args.len() {
            0 => reply(Frame::Simple("PONG".to_string())),
            1 => reply(Frame::bulk(self.args[0].clone())),
            _ => error_reply(ERR_WRONG_ARGS),
        }
    }
}

#[derive(Debug)]
pub struct EchoCommand {
    pub args: Vec<String>,
}

impl Execute for EchoCommand {
    fn execute(&self, _ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        reply(Frame::bulk(self.args[0].clone()))
    }
}
