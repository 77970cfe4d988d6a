// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Geospatial scoring: latitude/longitude pairs are packed into a 52-bit
//! interleaved integer that doubles as an ordered-set score. The low 52
//! bits fit an `f64` mantissa exactly, so the cast in both directions is
//! lossless.

pub const MIN_LATITUDE: f64 = -85.05112878;
pub const MAX_LATITUDE: f64 = 85.05112878;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

const LATITUDE_RANGE: f64 = MAX_LATITUDE - MIN_LATITUDE;
const LONGITUDE_RANGE: f64 = MAX_LONGITUDE - MIN_LONGITUDE;

/// Earth radius used by the haversine distance, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_372_797.560856;

const STEP_SCALE: f64 = (1u64 << 26) as f64;

/// Spreads the low 32 bits of `v` so that bit `i` lands at position `2*i`.
fn spread_u32_to_u64(v: u32) -> u64 {
    let mut r = v as u64;
    r = (r | (r << 16)) & 0x0000_FFFF_0000_FFFF;
    r = (r | (r << 8)) & 0x00FF_00FF_00FF_00FF;
    r = (r | (r << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    r = (r | (r << 2)) & 0x3333_3333_3333_3333;
    r = (r | (r << 1)) & 0x5555_5555_5555_5555;
    r
}

fn squash_u64_to_u32(v: u64) -> u32 {
    let mut r = v & 0x5555_5555_5555_5555;
    r = (r | (r >> 1)) & 0x3333_3333_3333_3333;
    r = (r | (r >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    r = (r | (r >> 4)) & 0x00FF_00FF_00FF_00FF;
    r = (r | (r >> 8)) & 0x0000_FFFF_0000_FFFF;
    r = (r | (r >> 16)) & 0x0000_0000_FFFF_FFFF;
    r as u32
}

fn interleave(x: u32, y: u32) -> u64 {
    spread_u32_to_u64(x) | (spread_u32_to_u64(y) << 1)
}

fn deinterleave(hash: u64) -> (u32, u32) {
    (squash_u64_to_u32(hash), squash_u64_to_u32(hash >> 1))
}

/// Converts a coordinate pair into its 52-bit score.
///
/// Each coordinate is mapped linearly onto `[0, 2^26)` and truncated;
/// latitude bits occupy even positions, longitude bits odd ones.
pub fn encode(latitude: f64, longitude: f64) -> u64 {
    let lat_norm = STEP_SCALE * (latitude - MIN_LATITUDE) / LATITUDE_RANGE;
    let lon_norm = STEP_SCALE * (longitude - MIN_LONGITUDE) / LONGITUDE_RANGE;

    interleave(lat_norm as u32, lon_norm as u32)
}

/// Recovers `(latitude, longitude)` from a 52-bit score. The result is the
/// cell corner, accurate to one part in 2^26 of each coordinate range.
pub fn decode(hash: u64) -> (f64, f64) {
    let (lat_bits, lon_bits) = deinterleave(hash);

    let latitude = lat_bits as f64 * LATITUDE_RANGE / STEP_SCALE + MIN_LATITUDE;
    let longitude = lon_bits as f64 * LONGITUDE_RANGE / STEP_SCALE + MIN_LONGITUDE;

    (latitude, longitude)
}

/// Haversine great-circle distance between two points, in meters.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin() * (delta_lat / 2.0).sin()
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin() * (delta_lon / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Distance units accepted by the geo commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl Unit {
    /// Parses a unit token case-insensitively; `None` maps to the fixed
    /// unsupported-unit error at the command layer.
    pub fn parse(token: &str) -> Option<Unit> {
        match token.to_ascii_lowercase().as_str() {
            "m" => Some(Unit::Meters),
            "km" => Some(Unit::Kilometers),
            "mi" => Some(Unit::Miles),
            "ft" => Some(Unit::Feet),
            _ => None,
        }
    }

    /// Multiplier converting meters into this unit.
    pub fn factor(self) -> f64 {
        match self {
            Unit::Meters => 1.0,
            Unit::Kilometers => 0.001,
            Unit::Miles => 0.000621371,
            Unit::Feet => 3.28084,
        }
    }
}
