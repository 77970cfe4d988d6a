// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The keyspace engine: a typed-value map with per-key locking, string
//! expiry, and checked accessors enforcing the one-kind-per-key rule.

pub mod skiplist;
pub mod sorted_set;
pub mod stream;

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;

use crate::store::{
    sorted_set::SortedSet,
    stream::{IdSpec, Stream, StreamEntry, StreamId},
};

/// Typed failures surfaced by the engine. The `Display` form is the exact
/// wire text of the corresponding protocol error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdTooSmall,
}

#[derive(Debug)]
pub struct StringValue {
    pub data: String,
    /// Absolute deadline; a read past it removes the entry.
    pub expires_at: Option<Instant>,
}

/// One keyspace slot. A key holds exactly one kind at a time.
#[derive(Debug)]
pub enum Value {
    Str(StringValue),
    Stream(Stream),
    Zset(SortedSet),
    List(VecDeque<String>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Stream(_) => "stream",
            Value::Zset(_) => "zset",
            Value::List(_) => "list",
        }
    }

    fn as_str(&self) -> Result<&StringValue, StoreError> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(StoreError::WrongType),
        }
    }

    fn as_str_mut(&mut self) -> Result<&mut StringValue, StoreError> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(StoreError::WrongType),
        }
    }

    fn as_list(&self) -> Result<&VecDeque<String>, StoreError> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(StoreError::WrongType),
        }
    }

    fn as_list_mut(&mut self) -> Result<&mut VecDeque<String>, StoreError> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(StoreError::WrongType),
        }
    }

    fn as_zset(&self) -> Result<&SortedSet, StoreError> {
        match self {
            Value::Zset(z) => Ok(z),
            _ => Err(StoreError::WrongType),
        }
    }

    fn as_zset_mut(&mut self) -> Result<&mut SortedSet, StoreError> {
        match self {
            Value::Zset(z) => Ok(z),
            _ => Err(StoreError::WrongType),
        }
    }

    fn as_stream(&self) -> Result<&Stream, StoreError> {
        match self {
            Value::Stream(s) => Ok(s),
            _ => Err(StoreError::WrongType),
        }
    }

    fn as_stream_mut(&mut self) -> Result<&mut Stream, StoreError> {
        match self {
            Value::Stream(s) => Ok(s),
            _ => Err(StoreError::WrongType),
        }
    }
}

/// Shared keyspace. Sharded locking via `DashMap` keeps the wrong-type
/// check and expiry-driven removal atomic per key; no guard ever escapes
/// this module, so no lock is held across an await point.
#[derive(Debug, Default)]
pub struct Store {
    data: DashMap<String, Value>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    fn is_expired(value: &Value) -> bool {
        match value {
            Value::Str(s) => s.expires_at.is_some_and(|at| at <= Instant::now()),
            _ => false,
        }
    }

    /// Drops `key` if it holds an expired string, making the expiry
    /// visible as plain absence to whatever accessor runs next.
    fn purge_expired(&self, key: &str) {
        self.data.remove_if(key, |_, v| Self::is_expired(v));
    }

    pub fn delete(&self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Kind of the live value under `key`, if any.
    pub fn kind_of(&self, key: &str) -> Option<&'static str> {
        self.purge_expired(key);
        self.data.get(key).map(|v| v.kind_name())
    }

    // ── strings ──────────────────────────────────────────────────────────

    pub fn set_string(&self, key: &str, data: String, ttl: Option<Duration>) {
        // An expiry too far out to represent simply never fires.
        let expires_at = ttl.and_then(|d| Instant::now().checked_add(d));
        self.data
            .insert(key.to_string(), Value::Str(StringValue { data, expires_at }));
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(None),
            Some(v) => Ok(Some(v.as_str()?.data.clone())),
        }
    }

    /// Parses the stored decimal, adds one and stores the result back.
    /// A missing key counts from zero; the expiry of an existing entry is
    /// preserved.
    pub fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.purge_expired(key);
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let sv = occupied.get_mut().as_str_mut()?;
                let parsed: i64 =
                    sv.data.parse().map_err(|_| StoreError::NotAnInteger)?;
                let next = parsed.checked_add(1).ok_or(StoreError::NotAnInteger)?;
                sv.data = next.to_string();
                Ok(next)
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Value::Str(StringValue {
                    data: "1".to_string(),
                    expires_at: None,
                }));
                Ok(1)
            },
        }
    }

    // ── lists ────────────────────────────────────────────────────────────

    /// Pushes each element at the head in argument order, so the last
    /// argument ends up first. Creates the list on first use.
    pub fn push_front(&self, key: &str, elems: &[String]) -> Result<usize, StoreError> {
        self.purge_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()));
        let list = entry.as_list_mut()?;
        for e in elems {
            list.push_front(e.clone());
        }
        Ok(list.len())
    }

    pub fn push_back(&self, key: &str, elems: &[String]) -> Result<usize, StoreError> {
        self.purge_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()));
        let list = entry.as_list_mut()?;
        for e in elems {
            list.push_back(e.clone());
        }
        Ok(list.len())
    }

    /// Pops the head; removing the last element deletes the key.
    pub fn pop_front(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.pop_end(key, true)
    }

    /// Pops the tail; removing the last element deletes the key.
    pub fn pop_back(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.pop_end(key, false)
    }

    fn pop_end(&self, key: &str, front: bool) -> Result<Option<String>, StoreError> {
        self.purge_expired(key);
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let (elem, emptied) = {
                    let list = occupied.get_mut().as_list_mut()?;
                    let elem = if front {
                        list.pop_front()
                    } else {
                        list.pop_back()
                    };
                    (elem, list.is_empty())
                };
                if emptied {
                    occupied.remove();
                }
                Ok(elem)
            },
            Entry::Vacant(_) => Ok(None),
        }
    }

    pub fn list_len(&self, key: &str) -> Result<usize, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(0),
            Some(v) => Ok(v.as_list()?.len()),
        }
    }

    /// Inclusive index slice with two-sided negative indexing; an
    /// inverted or out-of-bounds range yields an empty result.
    pub fn list_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>, StoreError> {
        self.purge_expired(key);
        let Some(v) = self.data.get(key) else {
            return Ok(Vec::new());
        };
        let list = v.as_list()?;
        let len = list.len() as i64;

        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop };

        if start > stop || start >= len {
            return Ok(Vec::new());
        }
        let stop = stop.min(len - 1);

        Ok(list
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .cloned()
            .collect())
    }

    // ── ordered sets ─────────────────────────────────────────────────────

    /// Adds or repositions each `(score, member)` pair; returns the count
    /// of genuinely new members. Creates the set on first use.
    pub fn zadd(&self, key: &str, pairs: &[(f64, String)]) -> Result<usize, StoreError> {
        self.purge_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Zset(SortedSet::new()));
        let zset = entry.as_zset_mut()?;
        let mut added = 0;
        for (score, member) in pairs {
            if zset.add(*score, member) {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(None),
            Some(v) => Ok(v.as_zset()?.score(member)),
        }
    }

    pub fn zrank(&self, key: &str, member: &str) -> Result<Option<usize>, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(None),
            Some(v) => Ok(v.as_zset()?.rank(member)),
        }
    }

    pub fn zcard(&self, key: &str) -> Result<usize, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(0),
            Some(v) => Ok(v.as_zset()?.card()),
        }
    }

    pub fn zrem(&self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        self.purge_expired(key);
        match self.data.get_mut(key) {
            None => Ok(0),
            Some(mut v) => {
                let zset = v.as_zset_mut()?;
                let mut removed = 0;
                for m in members {
                    if zset.remove(m) {
                        removed += 1;
                    }
                }
                Ok(removed)
            },
        }
    }

    pub fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(Vec::new()),
            Some(v) => Ok(v.as_zset()?.range(start, stop)),
        }
    }

    /// Full member/score listing in rank order, or `None` when the key is
    /// absent. Used by radius scans that need every candidate at once.
    pub fn zset_snapshot(
        &self,
        key: &str,
    ) -> Result<Option<Vec<(String, f64)>>, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(None),
            Some(v) => {
                let zset = v.as_zset()?;
                Ok(Some(zset.range(0, zset.card() as i64 - 1)))
            },
        }
    }

    // ── streams ──────────────────────────────────────────────────────────

    /// Appends to the stream under `key`, creating it on first use.
    /// Returns the id string of the new entry.
    pub fn xadd(
        &self,
        key: &str,
        spec: IdSpec,
        fields: Vec<(String, String)>,
        now_ms: u64,
    ) -> Result<String, StoreError> {
        self.purge_expired(key);
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Stream(Stream::new()));
        let stream = entry.as_stream_mut()?;
        stream.append(spec, fields, now_ms)
    }

    pub fn xrange(
        &self,
        key: &str,
        start: StreamId,
        end: StreamId,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(Vec::new()),
            Some(v) => Ok(v.as_stream()?.range(start, end)),
        }
    }

    pub fn stream_entries_after(
        &self,
        key: &str,
        id: StreamId,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        self.purge_expired(key);
        match self.data.get(key) {
            None => Ok(Vec::new()),
            Some(v) => Ok(v.as_stream()?.entries_after(id)),
        }
    }

    /// Top id of the stream under `key`, used to resolve the `$` cursor.
    /// Absent, empty or non-stream keys resolve to `None` (i.e. the zero
    /// id).
    pub fn stream_last_id(&self, key: &str) -> Option<StreamId> {
        self.purge_expired(key);
        let v = self.data.get(key)?;
        match v.as_stream() {
            Ok(s) if !s.is_empty() => Some(s.last_id()),
            _ => None,
        }
    }
}
