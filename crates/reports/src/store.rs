// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{FlowError, ReportStats, ViolationReport};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use tvr_evm_helpers::contracts::ReportsRead;

/// Result of one full pass over the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSnapshot {
    pub reports: Vec<ViolationReport>,
    pub stats: ReportStats,
    /// Ids listed by the contract whose record could not be fetched
    pub skipped: Vec<String>,
}

/// Rebuilds the report list from the contract
pub struct ReportStore<R: ?Sized> {
    gateway: Arc<R>,
}

impl<R: ReportsRead + ?Sized> ReportStore<R> {
    pub fn new(gateway: Arc<R>) -> Self {
        Self { gateway }
    }

    pub async fn refresh(&self) -> Result<ReportSnapshot, FlowError> {
        let ids = self.gateway.list_record_ids().await?;
        debug!(count = ids.len(), "Fetched report ids");

        let mut reports = Vec::with_capacity(ids.len());
        let mut skipped = Vec::new();
        // One record at a time
        for id in ids {
            match self.gateway.get_record(&id).await {
                Ok(record) => reports.push(ViolationReport::from(record)),
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping report that could not be fetched");
                    skipped.push(id);
                }
            }
        }

        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let stats = ReportStats::compute(&reports, now);
        Ok(ReportSnapshot {
            reports,
            stats,
            skipped,
        })
    }
}
