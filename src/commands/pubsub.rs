// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{
    commands::{ERR_WRONG_ARGS, ExecContext, Execute, Outcome, error_reply, reply},
    resp::frame::{Frame, pubsub_reply},
};

/// `SUBSCRIBE channel` — one channel per invocation; repeated calls stack
/// subscriptions. The reply carries the session's new total.
#[derive(Debug)]
pub struct SubscribeCommand {
    pub args: Vec<String>,
}

impl Execute for SubscribeCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() != 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let channel = &self.args[0];

        let count = ctx.session.add_subscription(channel);
        ctx.state.pubsub.subscribe(
            ctx.session.id,
            ctx.session.mailbox_sender(),
            channel,
        );

        reply(pubsub_reply("subscribe", channel, count as i64))
    }
}

/// `UNSUBSCRIBE [channel]` — with no argument the session leaves every
/// channel it was in.
#[derive(Debug)]
pub struct UnsubscribeCommand {
    pub args: Vec<String>,
}

impl Execute for UnsubscribeCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        match self.args.len() {
            0 => {
                for channel in ctx.session.clear_subscriptions() {
                    ctx.state.pubsub.unsubscribe(ctx.session.id, &channel);
                }
                reply(pubsub_reply("unsubscribe", "", 0))
            },
            1 => {
                let channel = &self.args[0];
                let count = ctx.session.remove_subscription(channel);
                ctx.state.pubsub.unsubscribe(ctx.session.id, channel);
                reply(pubsub_reply("unsubscribe", channel, count as i64))
            },
            _ => error_reply(ERR_WRONG_ARGS),
        }
    }
}

/// `PUBLISH channel message` — returns how many sessions received the
/// message.
#[derive(Debug)]
pub struct PublishCommand {
    pub args: Vec<String>,
}

impl Execute for PublishCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let delivered = ctx.state.pubsub.publish(&self.args[0], &self.args[1]);
        reply(Frame::Integer(delivered as i64))
    }
}
