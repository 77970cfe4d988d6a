// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result, bail};
use resp_kv_rs::{cfg::config::Config, server::Server};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

/// Boots a server on an ephemeral port and returns it with its address.
pub async fn spawn_server() -> Result<(Arc<Server>, SocketAddr)> {
    let mut cfg = Config::default();
    cfg.server.port = 0;
    let server = Server::new(cfg);
    let addr = server.start().await.context("server start failed")?;
    Ok((server, addr))
}

/// A raw RESP client: sends framed commands and reads back one complete
/// reply value at a time, byte-for-byte.
pub struct TestClient {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            buf: Vec::new(),
        })
    }

    pub async fn send(&mut self, args: &[&str]) -> Result<()> {
        let mut out = format!("*{}\r\n", args.len()).into_bytes();
        for arg in args {
            out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
            out.extend_from_slice(arg.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        self.stream.write_all(&out).await?;
        Ok(())
    }

    /// Reads exactly one RESP value (arrays included) and returns its raw
    /// wire bytes.
    pub async fn read_value(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(total) = value_len(&self.buf) {
                let bytes = self.buf[..total].to_vec();
                self.buf.drain(..total);
                return Ok(bytes);
            }
            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                bail!("connection closed while waiting for a reply");
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    pub async fn round_trip(&mut self, args: &[&str]) -> Result<Vec<u8>> {
        self.send(args).await?;
        self.read_value().await
    }
}

/// Byte length of one complete RESP value at the head of `buf`, or `None`
/// while it is still partial.
fn value_len(buf: &[u8]) -> Option<usize> {
    let line_end = buf.windows(2).position(|w| w == b"\r\n")?;
    let body = std::str::from_utf8(&buf[1..line_end]).ok()?;
    match buf.first()? {
        b'+' | b'-' | b':' => Some(line_end + 2),
        b'$' => {
            let n: i64 = body.parse().ok()?;
            if n < 0 {
                return Some(line_end + 2);
            }
            let need = line_end + 2 + n as usize + 2;
            (buf.len() >= need).then_some(need)
        },
        b'*' => {
            let count: usize = body.parse().ok()?;
            let mut pos = line_end + 2;
            for _ in 0..count {
                pos += value_len(&buf[pos..])?;
            }
            Some(pos)
        },
        _ => None,
    }
}

/// Builds the expected wire form of a bulk string.
pub fn bulk(s: &str) -> Vec<u8> {
    format!("${}\r\n{s}\r\n", s.len()).into_bytes()
}

/// Builds the expected wire form of an array of bulk strings.
pub fn bulk_array(items: &[&str]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        out.extend_from_slice(&bulk(item));
    }
    out
}
