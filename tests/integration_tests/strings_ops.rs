// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use serial_test::serial;
use tokio::time::{Duration, sleep};

use crate::integration_tests::common::{TestClient, bulk, spawn_server};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ping_and_echo() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    assert_eq!(client.round_trip(&["PING"]).await?, b"+PONG\r\n");
    assert_eq!(client.round_trip(&["ping", "hello"]).await?, bulk("hello"));
    assert_eq!(client.round_trip(&["ECHO", "msg"]).await?, bulk("msg"));
    assert_eq!(
        client.round_trip(&["ECHO"]).await?,
        b"-ERR wrong number of arguments\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn set_get_and_expiry() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    assert_eq!(client.round_trip(&["SET", "foo", "bar"]).await?, b"+OK\r\n");
    assert_eq!(client.round_trip(&["GET", "foo"]).await?, bulk("bar"));
    assert_eq!(client.round_trip(&["GET", "nothing"]).await?, b"$-1\r\n");

    assert_eq!(
        client.round_trip(&["SET", "foo", "bar", "PX", "50"]).await?,
        b"+OK\r\n"
    );
    sleep(Duration::from_millis(100)).await;
    assert_eq!(client.round_trip(&["GET", "foo"]).await?, b"$-1\r\n");

    // EX takes whole seconds; well before the deadline the value is live.
    assert_eq!(
        client.round_trip(&["SET", "slow", "v", "EX", "100"]).await?,
        b"+OK\r\n"
    );
    assert_eq!(client.round_trip(&["GET", "slow"]).await?, bulk("v"));

    assert_eq!(
        client.round_trip(&["SET", "foo", "bar", "XXX", "50"]).await?,
        b"-syntax error\r\n"
    );
    assert_eq!(
        client.round_trip(&["SET", "foo", "bar", "PX", "-1"]).await?,
        b"-ERR invalid expire time in 'set' command\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn incr_counts_and_rejects_non_integers() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    assert_eq!(client.round_trip(&["INCR", "c"]).await?, b":1\r\n");
    assert_eq!(client.round_trip(&["INCR", "c"]).await?, b":2\r\n");

    assert_eq!(client.round_trip(&["SET", "c", "abc"]).await?, b"+OK\r\n");
    assert_eq!(
        client.round_trip(&["INCR", "c"]).await?,
        b"-ERR value is not an integer or out of range\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn type_names_every_kind() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    client.round_trip(&["SET", "s", "v"]).await?;
    client.round_trip(&["RPUSH", "l", "a"]).await?;
    client.round_trip(&["ZADD", "z", "1", "m"]).await?;
    client.round_trip(&["XADD", "st", "1-1", "f", "v"]).await?;

    assert_eq!(client.round_trip(&["TYPE", "s"]).await?, b"+string\r\n");
    assert_eq!(client.round_trip(&["TYPE", "l"]).await?, b"+list\r\n");
    assert_eq!(client.round_trip(&["TYPE", "z"]).await?, b"+zset\r\n");
    assert_eq!(client.round_trip(&["TYPE", "st"]).await?, b"+stream\r\n");
    assert_eq!(client.round_trip(&["TYPE", "nope"]).await?, b"+none\r\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wrong_kind_is_rejected_and_state_unchanged() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    client.round_trip(&["RPUSH", "k", "a"]).await?;
    assert_eq!(
        client.round_trip(&["GET", "k"]).await?,
        b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n"
    );
    assert_eq!(
        client.round_trip(&["INCR", "k"]).await?,
        b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n"
    );
    assert_eq!(client.round_trip(&["LLEN", "k"]).await?, b":1\r\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_commands_keep_the_session_alive() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    assert_eq!(
        client.round_trip(&["FLOOP", "x"]).await?,
        b"-ERR unknown command 'floop'\r\n"
    );
    assert_eq!(client.round_trip(&["PING"]).await?, b"+PONG\r\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn info_and_replconf_surface() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    let info = client.round_trip(&["INFO", "replication"]).await?;
    let text = String::from_utf8(info)?;
    assert!(text.contains("role:master"), "got {text:?}");
    assert!(text.contains("master_replid:"), "got {text:?}");
    assert!(text.contains("master_repl_offset:0"), "got {text:?}");

    assert_eq!(
        client.round_trip(&["REPLCONF", "capa", "psync2"]).await?,
        b"+OK\r\n"
    );
    assert_eq!(
        client
            .round_trip(&["REPLCONF", "listening-port", "6380"])
            .await?,
        b"+OK\r\n"
    );

    let ack = client.round_trip(&["REPLCONF", "GETACK", "*"]).await?;
    let text = String::from_utf8(ack)?;
    assert!(text.starts_with("*3\r\n$8\r\nREPLCONF\r\n$3\r\nACK\r\n$"));

    assert_eq!(
        client.round_trip(&["REPLCONF", "bogus", "x"]).await?,
        b"-syntax error\r\n"
    );
    Ok(())
}
