// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::fmt;

use crate::store::StoreError;

/// Stream entry identifier: `(ms, seq)` ordered lexicographically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    /// Strict `ms-seq` form, as required by explicit XADD ids.
    pub fn parse_exact(s: &str) -> Option<StreamId> {
        let (ms, seq) = s.split_once('-')?;
        Some(StreamId {
            ms: ms.parse().ok()?,
            seq: seq.parse().ok()?,
        })
    }

    /// Range-bound form: `-`/`+` sentinels, `ms-seq`, or a bare `ms`
    /// whose sequence defaults to 0 on the start bound and to the maximum
    /// on the end bound.
    pub fn parse_range(s: &str, is_start: bool) -> Option<StreamId> {
        match s {
            "-" => Some(StreamId::ZERO),
            "+" => Some(StreamId::MAX),
            _ if s.contains('-') => Self::parse_exact(s),
            _ => {
                let ms = s.parse().ok()?;
                let seq = if is_start { 0 } else { u64::MAX };
                Some(StreamId { ms, seq })
            },
        }
    }

    /// XREAD cursor form: a bare `ms` means "strictly after the whole
    /// millisecond", i.e. the sequence part saturates.
    pub fn parse_after(s: &str) -> Option<StreamId> {
        if s.contains('-') {
            Self::parse_exact(s)
        } else {
            Some(StreamId {
                ms: s.parse().ok()?,
                seq: u64::MAX,
            })
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// Requested id for an append: auto-generated or caller-provided.
#[derive(Debug, Clone, Copy)]
pub enum IdSpec {
    Auto,
    Explicit(StreamId),
}

#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: StreamId,
    /// Field/value pairs in submission order; duplicate fields are kept.
    pub fields: Vec<(String, String)>,
}

/// Append-only entry log with strictly increasing ids.
#[derive(Debug, Default)]
pub struct Stream {
    entries: Vec<StreamEntry>,
    last: StreamId,
    /// Cached string form of `last`, handed back verbatim by appends.
    last_id_string: String,
}

impl Stream {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            last: StreamId::ZERO,
            last_id_string: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_id(&self) -> StreamId {
        self.last
    }

    /// Appends an entry and returns its id string.
    ///
    /// Auto ids use `now_ms`, clamped to the stored top when the clock is
    /// not ahead of it (the sequence then increments instead). Explicit
    /// ids must be strictly greater than the stored top, the zero id
    /// included on a fresh stream.
    pub fn append(
        &mut self,
        spec: IdSpec,
        fields: Vec<(String, String)>,
        now_ms: u64,
    ) -> Result<String, StoreError> {
        let id = match spec {
            IdSpec::Auto => {
                if now_ms <= self.last.ms {
                    StreamId {
                        ms: self.last.ms,
                        seq: self.last.seq + 1,
                    }
                } else {
                    StreamId { ms: now_ms, seq: 0 }
                }
            },
            IdSpec::Explicit(id) => {
                if id <= self.last {
                    return Err(StoreError::StreamIdTooSmall);
                }
                id
            },
        };

        self.last = id;
        self.last_id_string = id.to_string();
        self.entries.push(StreamEntry { id, fields });
        Ok(self.last_id_string.clone())
    }

    /// Entries with `start <= id <= end`, in append order.
    pub fn range(&self, start: StreamId, end: StreamId) -> Vec<StreamEntry> {
        self.entries
            .iter()
            .filter(|e| e.id >= start && e.id <= end)
            .cloned()
            .collect()
    }

    /// Entries strictly after `id`, in append order.
    pub fn entries_after(&self, id: StreamId) -> Vec<StreamEntry> {
        self.entries
            .iter()
            .filter(|e| e.id > id)
            .cloned()
            .collect()
    }
}
