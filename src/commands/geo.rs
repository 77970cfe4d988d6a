// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{
    commands::{
        ERR_NOT_FLOAT, ERR_SYNTAX, ERR_WRONG_ARGS, ExecContext, Execute, Outcome,
        error_reply, reply, store_error,
    },
    geo::{self, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE, Unit},
    resp::frame::Frame,
};

const ERR_UNSUPPORTED_UNIT: &str =
    "ERR unsupported unit provided. please use M, KM, FT, MI";
const ERR_COUNT_RANGE: &str = "ERR value is out of range, must be positive";

/// Fixed-precision float used for coordinates and distances: ten decimal
/// places with trailing zeros (and a bare trailing point) trimmed.
pub(crate) fn format_float(value: f64) -> String {
    let s = format!("{value:.10}");
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

fn out_of_longitude(lon: f64) -> bool {
    !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&lon)
}

fn out_of_latitude(lat: f64) -> bool {
    !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat)
}

fn longitude_error() -> Outcome {
    error_reply(format!(
        "ERR invalid longitude, must be between {MIN_LONGITUDE:.10} and {MAX_LONGITUDE:.10}"
    ))
}

fn latitude_error() -> Outcome {
    error_reply(format!(
        "ERR invalid latitude, must be between {MIN_LATITUDE:.10} and {MAX_LATITUDE:.10}"
    ))
}

/// `GEOADD key longitude latitude member [longitude latitude member …]`
///
/// Members land in an ordered set scored by the 52-bit interleaved hash,
/// so every ordered-set command works on geo keys too.
#[derive(Debug)]
pub struct GeoAddCommand {
    pub args: Vec<String>,
}

impl Execute for GeoAddCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        let num_args = self.args.len();
        if num_args < 4 {
            return error_reply(ERR_WRONG_ARGS);
        }
        if (num_args - 1) % 3 != 0 {
            return error_reply(ERR_SYNTAX);
        }
        let key = &self.args[0];

        // Surface the type mismatch before any triple is validated.
        if ctx.state.store.kind_of(key).is_some_and(|k| k != "zset") {
            return store_error(crate::store::StoreError::WrongType);
        }

        let mut added = 0;
        for triple in self.args[1..].chunks_exact(3) {
            let Ok(longitude) = triple[0].parse::<f64>() else {
                return error_reply(ERR_NOT_FLOAT);
            };
            let Ok(latitude) = triple[1].parse::<f64>() else {
                return error_reply(ERR_NOT_FLOAT);
            };
            if out_of_longitude(longitude) {
                return longitude_error();
            }
            if out_of_latitude(latitude) {
                return latitude_error();
            }

            let score = geo::encode(latitude, longitude) as f64;
            match ctx
                .state
                .store
                .zadd(key, &[(score, triple[2].clone())])
            {
                Ok(n) => added += n,
                Err(e) => return store_error(e),
            }
        }

        reply(Frame::Integer(added as i64))
    }
}

/// `GEOPOS key member [member …]` — `[longitude, latitude]` per member,
/// null for members (or keys) that do not exist.
#[derive(Debug)]
pub struct GeoPosCommand {
    pub args: Vec<String>,
}

impl Execute for GeoPosCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 2 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let key = &self.args[0];

        let mut results = Vec::with_capacity(self.args.len() - 1);
        for member in &self.args[1..] {
            match ctx.state.store.zscore(key, member) {
                Ok(Some(score)) => {
                    let (lat, lon) = geo::decode(score as u64);
                    results.push(Frame::Array(vec![
                        Frame::Bulk(format_float(lon)),
                        Frame::Bulk(format_float(lat)),
                    ]));
                },
                Ok(None) => results.push(Frame::NullBulk),
                Err(e) => return store_error(e),
            }
        }
        reply(Frame::Array(results))
    }
}

/// `GEODIST key member1 member2 [unit]` — haversine distance in the
/// requested unit (meters by default); null when either member is absent.
#[derive(Debug)]
pub struct GeoDistCommand {
    pub args: Vec<String>,
}

impl Execute for GeoDistCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 3 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let key = &self.args[0];

        let unit = match self.args.get(3) {
            Some(token) => match Unit::parse(token) {
                Some(u) => u,
                None => return error_reply(ERR_UNSUPPORTED_UNIT),
            },
            None => Unit::Meters,
        };

        let score1 = match ctx.state.store.zscore(key, &self.args[1]) {
            Ok(Some(s)) => s,
            Ok(None) => return reply(Frame::NullBulk),
            Err(e) => return store_error(e),
        };
        let score2 = match ctx.state.store.zscore(key, &self.args[2]) {
            Ok(Some(s)) => s,
            Ok(None) => return reply(Frame::NullBulk),
            Err(e) => return store_error(e),
        };

        let (lat1, lon1) = geo::decode(score1 as u64);
        let (lat2, lon2) = geo::decode(score2 as u64);
        let meters = geo::distance(lat1, lon1, lat2, lon2);

        reply(Frame::Bulk(format_float(meters * unit.factor())))
    }
}

#[derive(Debug, Clone, Copy)]
enum RadiusOrder {
    Unordered,
    Ascending,
    Descending,
}

struct RadiusHit {
    member: String,
    distance: f64,
    lat: f64,
    lon: f64,
}

/// `GEORADIUS key longitude latitude radius m|km|ft|mi [WITHCOORD]
/// [WITHDIST] [WITHHASH] [COUNT n] [ASC|DESC]`
#[derive(Debug)]
pub struct GeoRadiusCommand {
    pub args: Vec<String>,
}

impl Execute for GeoRadiusCommand {
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Outcome {
        if self.args.len() < 5 {
            return error_reply(ERR_WRONG_ARGS);
        }
        let key = &self.args[0];

        let Ok(longitude) = self.args[1].parse::<f64>() else {
            return error_reply(ERR_NOT_FLOAT);
        };
        let Ok(latitude) = self.args[2].parse::<f64>() else {
            return error_reply(ERR_NOT_FLOAT);
        };
        let Ok(radius) = self.args[3].parse::<f64>() else {
            return error_reply(ERR_NOT_FLOAT);
        };
        let Some(unit) = Unit::parse(&self.args[4]) else {
            return error_reply(ERR_UNSUPPORTED_UNIT);
        };
        // The search itself runs in meters; distances convert on output.
        let radius_meters = radius / unit.factor();

        let mut with_coord = false;
        let mut with_dist = false;
        let mut with_hash = false;
        let mut count: Option<usize> = None;
        let mut order = RadiusOrder::Unordered;

        let mut i = 5;
        while i < self.args.len() {
            match self.args[i].to_ascii_uppercase().as_str() {
                "WITHCOORD" => with_coord = true,
                "WITHDIST" => with_dist = true,
                "WITHHASH" => with_hash = true,
                "COUNT" => {
                    i += 1;
                    let parsed = self.args.get(i).map(|a| a.parse::<i64>());
                    match parsed {
                        Some(Ok(n)) if n >= 0 => count = Some(n as usize),
                        Some(_) => return error_reply(ERR_COUNT_RANGE),
                        None => return error_reply(ERR_SYNTAX),
                    }
                },
                "ASC" => order = RadiusOrder::Ascending,
                "DESC" => order = RadiusOrder::Descending,
                _ => return error_reply(ERR_SYNTAX),
            }
            i += 1;
        }

        let members = match ctx.state.store.zset_snapshot(key) {
            Ok(Some(members)) => members,
            Ok(None) => return reply(Frame::Array(Vec::new())),
            Err(e) => return store_error(e),
        };

        let mut hits = Vec::new();
        for (member, score) in members {
            let (member_lat, member_lon) = geo::decode(score as u64);
            let meters = geo::distance(latitude, longitude, member_lat, member_lon);
            if meters <= radius_meters {
                hits.push(RadiusHit {
                    member,
                    distance: meters * unit.factor(),
                    lat: member_lat,
                    lon: member_lon,
                });
            }
        }

        match order {
            RadiusOrder::Ascending => {
                hits.sort_by(|a, b| a.distance.total_cmp(&b.distance))
            },
            RadiusOrder::Descending => {
                hits.sort_by(|a, b| b.distance.total_cmp(&a.distance))
            },
            RadiusOrder::Unordered => {},
        }

        if let Some(limit) = count
            && limit > 0
            && limit < hits.len()
        {
            hits.truncate(limit);
        }

        let plain = !with_coord && !with_dist && !with_hash;
        let results = hits
            .into_iter()
            .map(|hit| {
                if plain {
                    return Frame::Bulk(hit.member);
                }
                let mut fields = vec![Frame::Bulk(hit.member)];
                if with_dist {
                    fields.push(Frame::Bulk(format_float(hit.distance)));
                }
                if with_hash {
                    fields.push(Frame::Integer(geo::encode(hit.lat, hit.lon) as i64));
                }
                if with_coord {
                    fields.push(Frame::Array(vec![
                        Frame::Bulk(format_float(hit.lon)),
                        Frame::Bulk(format_float(hit.lat)),
                    ]));
                }
                Frame::Array(fields)
            })
            .collect();

        reply(Frame::Array(results))
    }
}
