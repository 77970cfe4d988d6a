// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;

use crate::integration_tests::common::{TestClient, bulk, spawn_server};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn queued_commands_apply_on_exec() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    assert_eq!(client.round_trip(&["MULTI"]).await?, b"+OK\r\n");
    assert_eq!(client.round_trip(&["SET", "k", "1"]).await?, b"+QUEUED\r\n");
    assert_eq!(client.round_trip(&["INCR", "k"]).await?, b"+QUEUED\r\n");

    // Nothing ran yet.
    let mut probe = TestClient::connect(addr).await?;
    assert_eq!(probe.round_trip(&["GET", "k"]).await?, b"$-1\r\n");

    assert_eq!(
        client.round_trip(&["EXEC"]).await?,
        b"*2\r\n+OK\r\n:2\r\n"
    );
    assert_eq!(client.round_trip(&["GET", "k"]).await?, bulk("2"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn errors_inside_the_batch_do_not_abort_it() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    client.round_trip(&["SET", "bad", "abc"]).await?;

    client.round_trip(&["MULTI"]).await?;
    client.round_trip(&["SET", "k", "1"]).await?;
    client.round_trip(&["INCR", "k"]).await?;
    client.round_trip(&["INCR", "bad"]).await?;
    client.round_trip(&["INCR", "k"]).await?;

    let mut expected = b"*4\r\n+OK\r\n:2\r\n".to_vec();
    expected
        .extend_from_slice(b"-ERR value is not an integer or out of range\r\n");
    expected.extend_from_slice(b":3\r\n");
    assert_eq!(client.round_trip(&["EXEC"]).await?, expected);

    assert_eq!(client.round_trip(&["GET", "k"]).await?, bulk("3"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transaction_preconditions_hold() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    assert_eq!(
        client.round_trip(&["EXEC"]).await?,
        b"-ERR EXEC without MULTI\r\n"
    );
    assert_eq!(
        client.round_trip(&["DISCARD"]).await?,
        b"-ERR DISCARD without MULTI\r\n"
    );

    client.round_trip(&["MULTI"]).await?;
    assert_eq!(
        client.round_trip(&["MULTI"]).await?,
        b"-ERR MULTI calls can not be nested\r\n"
    );
    assert_eq!(client.round_trip(&["DISCARD"]).await?, b"+OK\r\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn discard_throws_the_queue_away() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    client.round_trip(&["MULTI"]).await?;
    assert_eq!(client.round_trip(&["SET", "k", "9"]).await?, b"+QUEUED\r\n");
    assert_eq!(client.round_trip(&["DISCARD"]).await?, b"+OK\r\n");

    assert_eq!(client.round_trip(&["GET", "k"]).await?, b"$-1\r\n");
    assert_eq!(
        client.round_trip(&["EXEC"]).await?,
        b"-ERR EXEC without MULTI\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_commands_queue_and_fail_inside_exec() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    client.round_trip(&["MULTI"]).await?;
    assert_eq!(client.round_trip(&["NOPE"]).await?, b"+QUEUED\r\n");
    assert_eq!(
        client.round_trip(&["EXEC"]).await?,
        b"*1\r\n-ERR unknown command 'nope'\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_commands_degrade_to_one_scan_inside_exec() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    client.round_trip(&["RPUSH", "full", "v"]).await?;

    client.round_trip(&["MULTI"]).await?;
    client.round_trip(&["BLPOP", "full", "0"]).await?;
    client.round_trip(&["BLPOP", "empty", "0"]).await?;

    let mut expected = b"*2\r\n".to_vec();
    expected.extend_from_slice(b"*2\r\n");
    expected.extend_from_slice(&bulk("full"));
    expected.extend_from_slice(&bulk("v"));
    expected.extend_from_slice(b"$-1\r\n");
    assert_eq!(client.round_trip(&["EXEC"]).await?, expected);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn interleaved_sessions_see_exec_effects_in_order() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut writer = TestClient::connect(addr).await?;
    let mut other = TestClient::connect(addr).await?;

    writer.round_trip(&["MULTI"]).await?;
    writer.round_trip(&["INCR", "n"]).await?;
    writer.round_trip(&["INCR", "n"]).await?;

    // Another session mutates between MULTI and EXEC; the batch applies
    // on top of the current state.
    assert_eq!(other.round_trip(&["INCR", "n"]).await?, b":1\r\n");

    assert_eq!(writer.round_trip(&["EXEC"]).await?, b"*2\r\n:2\r\n:3\r\n");
    Ok(())
}
