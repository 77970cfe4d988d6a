// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Command executors: per-command argument validation and keyspace
//! effect. Construction happens once per request via [`Command::parse`];
//! execution is synchronous and either yields a reply frame or hands a
//! blocking job to the waiter.

pub mod geo;
pub mod list;
pub mod ping;
pub mod pubsub;
pub mod replication;
pub mod stream;
pub mod strings;
pub mod txn;
pub mod zset;

use enum_dispatch::enum_dispatch;

use crate::{
    commands::{
        geo::{GeoAddCommand, GeoDistCommand, GeoPosCommand, GeoRadiusCommand},
        list::{
            BLPopCommand, LLenCommand, LPopCommand, LPushCommand, LRangeCommand,
            RPopCommand, RPushCommand,
        },
        ping::{EchoCommand, PingCommand},
        pubsub::{PublishCommand, SubscribeCommand, UnsubscribeCommand},
        replication::{InfoCommand, ReplConfCommand},
        stream::{XAddCommand, XRangeCommand, XReadCommand},
        strings::{GetCommand, IncrCommand, SetCommand, TypeCommand},
        txn::{DiscardCommand, ExecCommand, MultiCommand},
        zset::{
            ZAddCommand, ZCardCommand, ZRangeCommand, ZRankCommand, ZRemCommand,
            ZScoreCommand,
        },
    },
    resp::frame::Frame,
    server::{state::ServerState, waiter::BlockingJob},
    session::Session,
    store::StoreError,
};

pub const ERR_WRONG_ARGS: &str = "ERR wrong number of arguments";
pub const ERR_SYNTAX: &str = "ERR syntax error";
pub const ERR_SYNTAX_BARE: &str = "syntax error";
pub const ERR_SUBSCRIBED_ONLY: &str = "ERR only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context";
pub const ERR_NOT_INTEGER: &str = "ERR value is not an integer or out of range";
pub const ERR_NOT_FLOAT: &str = "ERR value is not a valid float";
pub const ERR_INVALID_STREAM_ID: &str =
    "ERR Invalid stream ID specified as stream command argument";
pub const ERR_MULTI_NESTED: &str = "ERR MULTI calls can not be nested";
pub const ERR_EXEC_NO_MULTI: &str = "ERR EXEC without MULTI";
pub const ERR_DISCARD_NO_MULTI: &str = "ERR DISCARD without MULTI";
pub const ERR_XREAD_UNBALANCED: &str = "ERR Unbalanced 'xread' list of streams";

/// Everything an executor may touch: the shared keyspace/registry pair
/// and the calling session's own state.
pub struct ExecContext<'a> {
    pub state: &'a ServerState,
    pub session: &'a mut Session,
}

/// Result of running one executor.
pub enum Outcome {
    Reply(Frame),
    /// The command wants to wait for data; the dispatcher runs the job
    /// through the blocking waiter.
    Block(BlockingJob),
}

pub(crate) fn reply(frame: Frame) -> Outcome {
    Outcome::Reply(frame)
}

pub(crate) fn error_reply(msg: impl Into<String>) -> Outcome {
    Outcome::Reply(Frame::Error(msg.into()))
}

pub(crate) fn store_error(err: StoreError) -> Outcome {
    Outcome::Reply(Frame::Error(err.to_string()))
}

#[enum_dispatch]
pub trait Execute {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome;
}

/// The closed command surface, dispatched by lower-cased label.
#[enum_dispatch(Execute)]
#[derive(Debug)]
pub enum Command {
    PingCommand(PingCommand),
    EchoCommand(EchoCommand),
    SetCommand(SetCommand),
    GetCommand(GetCommand),
    IncrCommand(IncrCommand),
    TypeCommand(TypeCommand),
    XAddCommand(XAddCommand),
    XRangeCommand(XRangeCommand),
    XReadCommand(XReadCommand),
    ZAddCommand(ZAddCommand),
    ZRankCommand(ZRankCommand),
    ZRangeCommand(ZRangeCommand),
    ZCardCommand(ZCardCommand),
    ZScoreCommand(ZScoreCommand),
    ZRemCommand(ZRemCommand),
    LPushCommand(LPushCommand),
    RPushCommand(RPushCommand),
    LPopCommand(LPopCommand),
    RPopCommand(RPopCommand),
    LLenCommand(LLenCommand),
    LRangeCommand(LRangeCommand),
    BLPopCommand(BLPopCommand),
    GeoAddCommand(GeoAddCommand),
    GeoPosCommand(GeoPosCommand),
    GeoDistCommand(GeoDistCommand),
    GeoRadiusCommand(GeoRadiusCommand),
    MultiCommand(MultiCommand),
    ExecCommand(ExecCommand),
    DiscardCommand(DiscardCommand),
    SubscribeCommand(SubscribeCommand),
    UnsubscribeCommand(UnsubscribeCommand),
    PublishCommand(PublishCommand),
    InfoCommand(InfoCommand),
    ReplConfCommand(ReplConfCommand),
    UnknownCommand(UnknownCommand),
}

impl Command {
    /// Maps a lower-cased label onto its executor. Anything outside the
    /// surface becomes [`UnknownCommand`].
    pub fn parse(label: &str, args: Vec<String>) -> Command {
        match label {
            "ping" => Command::PingCommand(PingCommand { args }),
            "echo" => Command::EchoCommand(EchoCommand { args }),
            "set" => Command::SetCommand(SetCommand { args }),
            "get" => Command::GetCommand(GetCommand { args }),
            "incr" => Command::IncrCommand(IncrCommand { args }),
            "type" => Command::TypeCommand(TypeCommand { args }),
            "xadd" => Command::XAddCommand(XAddCommand { args }),
            "xrange" => Command::XRangeCommand(XRangeCommand { args }),
            "xread" => Command::XReadCommand(XReadCommand { args }),
            "zadd" => Command::ZAddCommand(ZAddCommand { args }),
            "zrank" => Command::ZRankCommand(ZRankCommand { args }),
            "zrange" => Command::ZRangeCommand(ZRangeCommand { args }),
            "zcard" => Command::ZCardCommand(ZCardCommand { args }),
            "zscore" => Command::ZScoreCommand(ZScoreCommand { args }),
            "zrem" => Command::ZRemCommand(ZRemCommand { args }),
            "lpush" => Command::LPushCommand(LPushCommand { args }),
            "rpush" => Command::RPushCommand(RPushCommand { args }),
            "lpop" => Command::LPopCommand(LPopCommand { args }),
            "rpop" => Command::RPopCommand(RPopCommand { args }),
            "llen" => Command::LLenCommand(LLenCommand { args }),
            "lrange" => Command::LRangeCommand(LRangeCommand { args }),
            "blpop" => Command::BLPopCommand(BLPopCommand { args }),
            "geoadd" => Command::GeoAddCommand(GeoAddCommand { args }),
            "geopos" => Command::GeoPosCommand(GeoPosCommand { args }),
            "geodist" => Command::GeoDistCommand(GeoDistCommand { args }),
            "georadius" => Command::GeoRadiusCommand(GeoRadiusCommand { args }),
            "multi" => Command::MultiCommand(MultiCommand { args }),
            "exec" => Command::ExecCommand(ExecCommand { args }),
            "discard" => Command::DiscardCommand(DiscardCommand { args }),
            "subscribe" => Command::SubscribeCommand(SubscribeCommand { args }),
            "unsubscribe" => Command::UnsubscribeCommand(UnsubscribeCommand { args }),
            "publish" => Command::PublishCommand(PublishCommand { args }),
            "info" => Command::InfoCommand(InfoCommand { args }),
            "replconf" => Command::ReplConfCommand(ReplConfCommand { args }),
            other => Command::UnknownCommand(UnknownCommand {
                label: other.to_string(),
            }),
        }
    }
}

/// Labels a session may still issue while it has live subscriptions.
pub fn is_allowed_in_subscribed_mode(label: &str) -> bool {
    matches!(
        label,
        "subscribe" | "unsubscribe" | "psubscribe" | "punsubscribe" | "ping" | "quit"
            | "reset"
    )
}

#[derive(Debug)]
pub struct UnknownCommand {
    pub label: String,
}

impl Execute for UnknownCommand {
    fn execute(&self, _ctx: &mut ExecContext<'_>) -> Outcome {
        error_reply(format!("ERR unknown command '{}'", self.label))
    }
}
