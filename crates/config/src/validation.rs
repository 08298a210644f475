// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use std::str::FromStr;

pub fn parse_contract_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("Invalid contract address '{value}'"))
}

/// Accepts 32 bytes of hex with or without the `0x` prefix
pub fn check_private_key(name: &str, value: &str) -> Result<()> {
    let hex = value.trim().trim_start_matches("0x");
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("{name} must be 32 bytes of hex");
    }
    Ok(())
}
