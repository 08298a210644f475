// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tvr_evm_helpers::contracts::ReportRecord;

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const MAX_SEVERITY: u32 = 10;

/// Display projection of an on-chain report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub id: String,
    pub license_plate: String,
    pub location: String,
    pub timestamp: u64,
    pub reference_hash: String,
    pub creator: Address,
    pub public_value_1: u64,
    pub public_value_2: u64,
    pub is_verified: bool,
    pub revealed_severity: Option<u32>,
}

impl From<ReportRecord> for ViolationReport {
    fn from(record: ReportRecord) -> Self {
        let revealed_severity = record.is_verified.then_some(record.decrypted_severity);
        Self {
            id: record.id,
            license_plate: record.license_plate,
            location: record.location,
            timestamp: record.timestamp,
            reference_hash: record.reference_hash,
            creator: record.creator,
            public_value_1: record.public_value_1,
            public_value_2: record.public_value_2,
            is_verified: record.is_verified,
            revealed_severity,
        }
    }
}

impl ViolationReport {
    /// Case-insensitive substring match on plate or location
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.license_plate.to_lowercase().contains(&term)
            || self.location.to_lowercase().contains(&term)
    }

    pub fn severity_label(&self) -> Option<String> {
        self.revealed_severity.map(format_severity)
    }
}

pub fn format_severity(severity: u32) -> String {
    format!("{severity}/{MAX_SEVERITY} (Police Verified)")
}

/// Contents of the creation form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftReport {
    pub license_plate: String,
    pub location: String,
    pub severity: String,
    pub reference_hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub total: usize,
    pub verified: usize,
    pub last_24h: usize,
}

impl ReportStats {
    pub fn compute(reports: &[ViolationReport], now: u64) -> Self {
        let cutoff = now.saturating_sub(SECONDS_PER_DAY);
        Self {
            total: reports.len(),
            verified: reports.iter().filter(|r| r.is_verified).count(),
            last_24h: reports.iter().filter(|r| r.timestamp > cutoff).count(),
        }
    }
}

pub fn filter_reports<'a>(reports: &'a [ViolationReport], term: &str) -> Vec<&'a ViolationReport> {
    reports.iter().filter(|r| r.matches(term)).collect()
}
