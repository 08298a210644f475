// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod contracts;
mod errors;
pub mod event_listener;
pub mod events;
mod pending;
pub mod retry;

pub use errors::*;
pub use pending::*;
