// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use resp_kv_rs::geo;

use crate::integration_tests::common::{TestClient, bulk, bulk_array, spawn_server};

const PALERMO: (&str, &str) = ("13.361389", "38.115556");
const CATANIA: (&str, &str) = ("15.087269", "37.502669");

/// Mirror of the server's fixed-precision float formatting.
fn fmt10(value: f64) -> String {
    let s = format!("{value:.10}");
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

/// The coordinates a member snaps to after the 52-bit round trip.
fn snapped(lon: &str, lat: &str) -> (f64, f64) {
    let lat: f64 = lat.parse().expect("lat");
    let lon: f64 = lon.parse().expect("lon");
    geo::decode(geo::encode(lat, lon))
}

async fn seed_cities(client: &mut TestClient) -> Result<()> {
    let reply = client
        .round_trip(&[
            "GEOADD", "cities", PALERMO.0, PALERMO.1, "Palermo", CATANIA.0, CATANIA.1,
            "Catania",
        ])
        .await?;
    assert_eq!(reply, b":2\r\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn geoadd_scores_land_in_a_plain_ordered_set() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    seed_cities(&mut client).await?;
    assert_eq!(client.round_trip(&["TYPE", "cities"]).await?, b"+zset\r\n");
    assert_eq!(client.round_trip(&["ZCARD", "cities"]).await?, b":2\r\n");

    // Re-adding the same member at the same spot counts zero.
    assert_eq!(
        client
            .round_trip(&["GEOADD", "cities", PALERMO.0, PALERMO.1, "Palermo"])
            .await?,
        b":0\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn geopos_returns_snapped_coordinates_and_nulls() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    seed_cities(&mut client).await?;

    let (lat, lon) = snapped(PALERMO.0, PALERMO.1);
    let mut expected = b"*2\r\n".to_vec();
    expected.extend_from_slice(&bulk_array(&[&fmt10(lon), &fmt10(lat)]));
    expected.extend_from_slice(b"$-1\r\n");

    assert_eq!(
        client
            .round_trip(&["GEOPOS", "cities", "Palermo", "Nowhere"])
            .await?,
        expected
    );

    // Missing key: one null per requested member.
    assert_eq!(
        client.round_trip(&["GEOPOS", "ghost", "a", "b"]).await?,
        b"*2\r\n$-1\r\n$-1\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn geodist_converts_units() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    seed_cities(&mut client).await?;

    let (plat, plon) = snapped(PALERMO.0, PALERMO.1);
    let (clat, clon) = snapped(CATANIA.0, CATANIA.1);
    let meters = geo::distance(plat, plon, clat, clon);

    assert_eq!(
        client
            .round_trip(&["GEODIST", "cities", "Palermo", "Catania"])
            .await?,
        bulk(&fmt10(meters))
    );
    assert_eq!(
        client
            .round_trip(&["GEODIST", "cities", "Palermo", "Catania", "km"])
            .await?,
        bulk(&fmt10(meters * 0.001))
    );

    assert_eq!(
        client
            .round_trip(&["GEODIST", "cities", "Palermo", "Ghost"])
            .await?,
        b"$-1\r\n"
    );
    assert_eq!(
        client
            .round_trip(&["GEODIST", "cities", "Palermo", "Catania", "yd"])
            .await?,
        b"-ERR unsupported unit provided. please use M, KM, FT, MI\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn georadius_filters_sorts_and_limits() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    seed_cities(&mut client).await?;

    // Catania (~56 km) and Palermo (~190 km) are both inside 200 km.
    assert_eq!(
        client
            .round_trip(&["GEORADIUS", "cities", "15", "37", "200", "km", "ASC"])
            .await?,
        bulk_array(&["Catania", "Palermo"])
    );
    assert_eq!(
        client
            .round_trip(&["GEORADIUS", "cities", "15", "37", "200", "km", "DESC"])
            .await?,
        bulk_array(&["Palermo", "Catania"])
    );
    assert_eq!(
        client
            .round_trip(&[
                "GEORADIUS", "cities", "15", "37", "200", "km", "ASC", "COUNT", "1"
            ])
            .await?,
        bulk_array(&["Catania"])
    );
    assert_eq!(
        client
            .round_trip(&["GEORADIUS", "cities", "15", "37", "100", "km"])
            .await?,
        bulk_array(&["Catania"])
    );
    assert_eq!(
        client
            .round_trip(&["GEORADIUS", "ghost", "15", "37", "100", "km"])
            .await?,
        b"*0\r\n"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn georadius_withdist_pairs_members_with_distances() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    seed_cities(&mut client).await?;

    let (clat, clon) = snapped(CATANIA.0, CATANIA.1);
    let km = geo::distance(37.0, 15.0, clat, clon) * 0.001;

    let mut expected = b"*1\r\n*2\r\n".to_vec();
    expected.extend_from_slice(&bulk("Catania"));
    expected.extend_from_slice(&bulk(&fmt10(km)));
    assert_eq!(
        client
            .round_trip(&[
                "GEORADIUS", "cities", "15", "37", "100", "km", "WITHDIST"
            ])
            .await?,
        expected
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn geoadd_validates_coordinates() -> Result<()> {
    let (_server, addr) = spawn_server().await?;
    let mut client = TestClient::connect(addr).await?;

    assert_eq!(
        client
            .round_trip(&["GEOADD", "g", "181", "10", "m"])
            .await?,
        b"-ERR invalid longitude, must be between -180.0000000000 and 180.0000000000\r\n"
    );
    assert_eq!(
        client.round_trip(&["GEOADD", "g", "10", "86", "m"]).await?,
        b"-ERR invalid latitude, must be between -85.0511287800 and 85.0511287800\r\n"
    );
    assert_eq!(
        client.round_trip(&["GEOADD", "g", "x", "10", "m"]).await?,
        b"-ERR value is not a valid float\r\n"
    );
    assert_eq!(
        client.round_trip(&["GEOADD", "g", "1", "2"]).await?,
        b"-ERR wrong number of arguments\r\n"
    );
    assert_eq!(
        client
            .round_trip(&["GEOADD", "g", "1", "2", "m", "extra"])
            .await?,
        b"-ERR syntax error\r\n"
    );
    Ok(())
}
