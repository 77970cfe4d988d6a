// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use rand::RngExt;

/// Generates a random replication id (20 bytes) and returns:
/// - `[u8; 20]` raw form
/// - `String` containing its hexadecimal representation (40 chars)
pub fn generate_replid() -> ([u8; 20], String) {
    let mut id = [0u8; 20];
    rand::rng().fill(&mut id);

    (id, hex::encode(id))
}
