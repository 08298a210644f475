// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Text views of the dashboard state. Every view is a pure function of an `AppState`.

mod json;
mod views;

pub use json::*;
pub use views::*;
