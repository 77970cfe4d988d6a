// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{
    commands::{
        Command, ERR_DISCARD_NO_MULTI, ERR_EXEC_NO_MULTI, ERR_MULTI_NESTED,
        ExecContext, Execute, Outcome, error_reply, reply,
    },
    resp::frame::Frame,
    server::waiter,
};

/// `MULTI` — arms the transaction; subsequent commands are queued by the
/// dispatcher instead of executing.
#[derive(Debug)]
pub struct MultiCommand {
    pub args: Vec<String>,
}

impl Execute for MultiCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if ctx.session.in_transaction() {
            return error_reply(ERR_MULTI_NESTED);
        }
        ctx.session.start_transaction();
        reply(Frame::ok())
    }
}

/// `EXEC` — drains the queue in order against the current keyspace state.
/// A failing queued command lands in the result array and does not abort
/// the rest of the batch.
#[derive(Debug)]
pub struct ExecCommand {
    pub args: Vec<String>,
}

impl Execute for ExecCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if !ctx.session.in_transaction() {
            return error_reply(ERR_EXEC_NO_MULTI);
        }

        let queued = ctx.session.take_queued();
        let mut results = Vec::with_capacity(queued.len());
        for cmd in queued {
            let frame = match Command::parse(&cmd.label, cmd.args).execute(ctx) {
                Outcome::Reply(frame) => frame,
                // A batch cannot suspend: blocking commands get exactly
                // one immediate scan.
                Outcome::Block(job) => {
                    waiter::try_once(ctx.state, &job).unwrap_or(Frame::NullBulk)
                },
            };
            results.push(frame);
        }

        reply(Frame::Array(results))
    }
}

/// `DISCARD` — clears the flag and the queue.
#[derive(Debug)]
pub struct DiscardCommand {
    pub args: Vec<String>,
}

impl Execute for DiscardCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if !ctx.session.in_transaction() {
            return error_reply(ERR_DISCARD_NO_MULTI);
        }
        ctx.session.discard_transaction();
        reply(Frame::ok())
    }
}
