// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{
    commands::{
        ERR_SYNTAX_BARE, ERR_WRONG_ARGS, ExecContext, Execute, Outcome, error_reply,
        reply,
    },
    resp::frame::Frame,
};

/// `INFO [replication]` — only the replication section exists; this node
/// always reports itself as a master.
#[derive(Debug)]
pub struct InfoCommand {
    pub args: Vec<String>,
}

impl Execute for InfoCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() > 1 {
            return error_reply(ERR_WRONG_ARGS);
        }
        if let Some(section) = self.args.first()
            && !section.eq_ignore_ascii_case("replication")
        {
            return error_reply(ERR_SYNTAX_BARE);
        }

        let replication = &ctx.state.replication;
        reply(Frame::Bulk(format!(
            "role:master\r\nmaster_replid:{}\r\nmaster_repl_offset:{}",
            replication.replid, replication.offset
        )))
    }
}

/// `REPLCONF <sub> <value>` — the handshake surface a replica would use.
/// Only the acknowledgement query does real work: it reports how many
/// request bytes this session has fed the dispatcher.
#[derive(Debug)]
pub struct ReplConfCommand {
    pub args: Vec<String>,
}

impl Execute for ReplConfCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        match self.args[0].to_ascii_lowercase().as_str() {
            "listening-port" | "capa" => reply(Frame::ok()),
            "getack" => reply(Frame::Array(vec![
                Frame::bulk("REPLCONF"),
                Frame::bulk("ACK"),
                Frame::Bulk(ctx.session.bytes_read.to_string()),
            ])),
            _ => error_reply(ERR_SYNTAX_BARE),
        }
    }
}
