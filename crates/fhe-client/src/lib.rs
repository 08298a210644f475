// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! BFV encryption of report severities and the decryption oracle that reveals them.

mod client;
mod error;
pub mod keys;
mod oracle;
pub mod params;
pub mod proof;

pub use client::*;
pub use error::*;
pub use oracle::*;
