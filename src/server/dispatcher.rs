// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The per-connection read/execute/write loop.

use std::sync::Arc;

use anyhow::{Result, bail};
use bytes::{Bytes, BytesMut};
use tokio::{io::AsyncReadExt, net::TcpStream, net::tcp::OwnedReadHalf, time::timeout};
use tokio_util::sync::CancellationToken;

use crate::{
    commands::{
        Command, ERR_SUBSCRIBED_ONLY, ExecContext, Execute, Outcome,
        is_allowed_in_subscribed_mode,
    },
    pubsub::SessionId,
    resp::{
        decoder::{Request, try_decode},
        frame::Frame,
    },
    server::{state::ServerState, waiter},
    session::Session,
};

enum Event {
    Request(Request),
    Mail(Bytes),
    Shutdown,
}

/// Runs one session to completion: frames requests, applies the
/// subscribed-mode gate and transaction capture, executes, and drains the
/// pub/sub mailbox in between. Returns when the peer disconnects, the
/// framing breaks, or the server shuts down.
pub async fn drive(
    state: Arc<ServerState>,
    stream: TcpStream,
    id: SessionId,
    cancel: CancellationToken,
) -> Result<()> {
    stream.set_nodelay(true)?;
    let (mut reader, writer) = stream.into_split();
    let (mut session, mut mailbox) = Session::new(id, writer);
    let mut buf = BytesMut::with_capacity(4096);

    let result = async {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => Event::Shutdown,
                mail = mailbox.recv() => match mail {
                    Some(bytes) => Event::Mail(bytes),
                    None => Event::Shutdown,
                },
                request = read_request(&mut reader, &mut buf) => match request? {
                    Some(r) => Event::Request(r),
                    None => Event::Shutdown,
                },
            };

            match event {
                Event::Shutdown => return Ok(()),
                Event::Mail(bytes) => {
                    session.write_raw(&bytes);
                    flush_session(&state, &mut session).await?;
                },
                Event::Request(request) => {
                    let frame =
                        dispatch(state.as_ref(), &mut session, request, &cancel).await;
                    session.write_frame(&frame);
                    flush_session(&state, &mut session).await?;
                },
            }
        }
    }
    .await;

    // The registry must forget this session before the socket goes away.
    let channels = session.clear_subscriptions();
    state.pubsub.drop_session(session.id, channels.iter());

    result
}

async fn flush_session(state: &ServerState, session: &mut Session) -> Result<()> {
    match timeout(state.write_timeout, session.flush()).await {
        Ok(res) => res,
        Err(_) => bail!("write timed out"),
    }
}

/// Accumulates socket bytes until one full request frames, surviving
/// cancellation between reads (partial input stays in `buf`).
async fn read_request(
    reader: &mut OwnedReadHalf,
    buf: &mut BytesMut,
) -> Result<Option<Request>> {
    loop {
        if let Some(request) = try_decode(buf)? {
            return Ok(Some(request));
        }
        let n = reader.read_buf(buf).await?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            bail!("connection closed mid-frame");
        }
    }
}

async fn dispatch(
    state: &ServerState,
    session: &mut Session,
    request: Request,
    cancel: &CancellationToken,
) -> Frame {
    session.bytes_read += request.frame_len as u64;
    let Request { label, args, .. } = request;

    // Subscribed sessions accept only the subscription whitelist.
    if session.is_subscribed() && !is_allowed_in_subscribed_mode(&label) {
        return Frame::error(ERR_SUBSCRIBED_ONLY);
    }

    // Inside a transaction everything except the control commands is
    // captured instead of executed.
    if session.in_transaction()
        && !matches!(label.as_str(), "exec" | "discard" | "multi")
    {
        session.queue_command(label, args);
        return Frame::Simple("QUEUED".to_string());
    }

    let command = Command::parse(&label, args);
    let mut ctx = ExecContext { state, session };
    match command.execute(&mut ctx) {
        Outcome::Reply(frame) => frame,
        Outcome::Block(job) => waiter::run(state, job, cancel).await,
    }
}
