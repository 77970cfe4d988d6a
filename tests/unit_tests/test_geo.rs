// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use resp_kv_rs::geo::{self, Unit};

const PALERMO: (f64, f64) = (38.115556, 13.361389);
const CATANIA: (f64, f64) = (37.502669, 15.087269);

// One cell in either direction of the 26-bit grid.
const LAT_TOLERANCE: f64 = (85.05112878 * 2.0) / (1u64 << 26) as f64;
const LON_TOLERANCE: f64 = 360.0 / (1u64 << 26) as f64;

#[test]
fn encode_decode_round_trips_within_grid_resolution() {
    for (lat, lon) in [
        PALERMO,
        CATANIA,
        (0.0, 0.0),
        (-85.0, -179.9),
        (85.0, 179.9),
        (48.8566, 2.3522),
    ] {
        let hash = geo::encode(lat, lon);
        assert!(hash < (1u64 << 53));

        let (dec_lat, dec_lon) = geo::decode(hash);
        assert!(
            (dec_lat - lat).abs() <= LAT_TOLERANCE,
            "lat {lat} decoded as {dec_lat}"
        );
        assert!(
            (dec_lon - lon).abs() <= LON_TOLERANCE,
            "lon {lon} decoded as {dec_lon}"
        );
    }
}

#[test]
fn encoding_is_stable_after_a_round_trip() {
    let hash = geo::encode(PALERMO.0, PALERMO.1);
    let (lat, lon) = geo::decode(hash);
    assert_eq!(geo::encode(lat, lon), hash);
}

#[test]
fn haversine_matches_the_known_palermo_catania_distance() {
    let meters = geo::distance(PALERMO.0, PALERMO.1, CATANIA.0, CATANIA.1);
    assert!(
        (meters - 166_274.0).abs() < 50.0,
        "unexpected distance {meters}"
    );

    // Symmetric, and zero at the same point.
    let back = geo::distance(CATANIA.0, CATANIA.1, PALERMO.0, PALERMO.1);
    assert!((meters - back).abs() < 1e-6);
    assert!(geo::distance(10.0, 20.0, 10.0, 20.0).abs() < 1e-9);
}

#[test]
fn unit_parsing_is_case_insensitive_and_closed() {
    assert_eq!(Unit::parse("m"), Some(Unit::Meters));
    assert_eq!(Unit::parse("KM"), Some(Unit::Kilometers));
    assert_eq!(Unit::parse("Mi"), Some(Unit::Miles));
    assert_eq!(Unit::parse("ft"), Some(Unit::Feet));
    assert_eq!(Unit::parse("yd"), None);
    assert_eq!(Unit::parse(""), None);

    assert_eq!(Unit::Meters.factor(), 1.0);
    assert_eq!(Unit::Kilometers.factor(), 0.001);
}
