// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod models;
mod session;
pub mod state;
pub mod status;
mod store;
pub mod submission;
mod verification;

pub use error::*;
pub use models::*;
pub use session::*;
pub use store::*;
pub use submission::{SubmissionFlow, SubmissionPhase};
pub use verification::*;
