// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Pending,
    Success,
    Error,
}

/// Banner shown while and after a transaction runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl TransactionStatus {
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Pending,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }
}

/// How long finished banners stay visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTimeouts {
    pub success: Duration,
    pub error: Duration,
}

impl Default for StatusTimeouts {
    fn default() -> Self {
        Self {
            success: Duration::from_millis(2000),
            error: Duration::from_millis(3000),
        }
    }
}

impl StatusTimeouts {
    /// `None` for banners that stay until replaced
    pub fn ttl(&self, kind: StatusKind) -> Option<Duration> {
        match kind {
            StatusKind::Pending => None,
            StatusKind::Success => Some(self.success),
            StatusKind::Error => Some(self.error),
        }
    }
}
