// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! TCP accept loop: one lightweight task per connection, all sharing the
//! keyspace and registry through [`state::ServerState`].

pub mod dispatcher;
pub mod state;
pub mod waiter;

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{cfg::config::Config, server::state::ServerState};

pub struct Server {
    cfg: Config,
    state: Arc<ServerState>,
    cancel: CancellationToken,
    local_addr: OnceCell<SocketAddr>,
    next_session: AtomicU64,
    active: Arc<AtomicUsize>,
}

impl Server {
    pub fn new(cfg: Config) -> Arc<Self> {
        let state = Arc::new(ServerState::new(&cfg));
        Arc::new(Self {
            cfg,
            state,
            cancel: CancellationToken::new(),
            local_addr: OnceCell::new(),
            next_session: AtomicU64::new(1),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Address actually bound, available once `start` returned. With a
    /// configured port of 0 this is where the ephemeral port shows up.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Binds the listener and spawns the accept loop. Returns the bound
    /// address; the server keeps running until `shutdown`.
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr> {
        let listen = self.cfg.listen_addr();
        let listener = TcpListener::bind(&listen)
            .await
            .with_context(|| format!("failed to bind {listen}"))?;
        let addr = listener.local_addr()?;
        let _ = self.local_addr.set(addr);

        let server = Arc::clone(self);
        tokio::spawn(async move {
            server.accept_loop(listener).await;
        });

        info!("listening on {addr}");
        Ok(addr)
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        let max_connections = self.cfg.runtime.max_connections as usize;

        loop {
            let accepted = tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            let (socket, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("accept failed: {e}");
                    continue;
                },
            };

            if self.active.load(Ordering::SeqCst) >= max_connections {
                warn!("connection limit reached, dropping {peer}");
                continue;
            }

            let id = self.next_session.fetch_add(1, Ordering::SeqCst);
            let state = Arc::clone(&self.state);
            let cancel = self.cancel.child_token();
            let active = Arc::clone(&self.active);
            active.fetch_add(1, Ordering::SeqCst);

            debug!("session {id} accepted from {peer}");
            tokio::spawn(async move {
                if let Err(e) = dispatcher::drive(state, socket, id, cancel).await {
                    debug!("session {id} closed: {e}");
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });
        }
    }
}
