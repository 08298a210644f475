// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use chrono::DateTime;
use std::fmt;
use tvr_reports::{
    state::{AppState, DetailState, FormState},
    status::{StatusKind, TransactionStatus},
    ReportStats, SubmissionPhase, ViolationReport,
};

/// Call to action shown when the grid has nothing to show
pub const EMPTY_GRID_ACTION: &str = "Report First Violation";
pub const VERIFY_ACTION: &str = "Request Verification";

const ENCRYPTED: &str = "Encrypted";

pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub struct Banner<'a>(pub &'a TransactionStatus);

impl fmt::Display for Banner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.0.kind {
            StatusKind::Pending => "pending",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        };
        write!(f, "[{tag}] {}", self.0.message)
    }
}

pub struct StatsView(pub ReportStats);

impl fmt::Display for StatsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total Reports: {}   Police Verified: {}   Last 24h: {}",
            self.0.total, self.0.verified, self.0.last_24h
        )
    }
}

pub struct ReportGrid<'a> {
    pub reports: Vec<&'a ViolationReport>,
    pub search: &'a str,
}

impl fmt::Display for ReportGrid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reports.is_empty() {
            if self.search.trim().is_empty() {
                writeln!(f, "No violation reports yet.")?;
            } else {
                writeln!(f, "No reports match \"{}\".", self.search.trim())?;
            }
            return writeln!(f, "[ {EMPTY_GRID_ACTION} ]");
        }

        writeln!(
            f,
            "{:<28} {:<12} {:<22} {:<16} {:<24}",
            "ID", "Plate", "Location", "Reported", "Severity"
        )?;
        writeln!(f, "{}", "-".repeat(106))?;
        for report in &self.reports {
            let severity = report
                .severity_label()
                .unwrap_or_else(|| ENCRYPTED.to_string());
            writeln!(
                f,
                "{:<28} {:<12} {:<22} {:<16} {:<24}",
                truncate(&report.id, 28),
                truncate(&report.license_plate, 12),
                truncate(&report.location, 22),
                format_timestamp(report.timestamp),
                severity
            )?;
        }
        Ok(())
    }
}

pub struct DetailView<'a> {
    pub report: &'a ViolationReport,
    pub detail: Option<&'a DetailState>,
}

impl fmt::Display for DetailView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "Report {}", r.id)?;
        writeln!(f, "  License Plate:  {}", r.license_plate)?;
        writeln!(f, "  Location:       {}", r.location)?;
        writeln!(f, "  Reported:       {}", format_timestamp(r.timestamp))?;
        writeln!(f, "  Reference Hash: {}", r.reference_hash)?;
        writeln!(f, "  Reporter:       {}", r.creator)?;
        writeln!(f, "  Public Values:  {} / {}", r.public_value_1, r.public_value_2)?;

        let revealed = r
            .revealed_severity
            .or_else(|| self.detail.and_then(|d| d.revealed));
        match revealed {
            Some(severity) => writeln!(
                f,
                "  Severity:       {}",
                tvr_reports::format_severity(severity)
            )?,
            None => writeln!(f, "  Severity:       {ENCRYPTED}")?,
        }

        if let Some(detail) = self.detail {
            if detail.verifying {
                writeln!(f, "  Verifying...")?;
            } else if revealed.is_none() {
                writeln!(f, "  [ {VERIFY_ACTION} ]")?;
            }
            if let Some(error) = &detail.error {
                writeln!(f, "  Error: {error}")?;
            }
        }
        Ok(())
    }
}

pub struct FormView<'a>(pub &'a FormState);

impl fmt::Display for FormView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = self.0;
        let phase = match form.phase {
            SubmissionPhase::Idle => "ready",
            SubmissionPhase::Validating => "validating",
            SubmissionPhase::Encrypting => "encrypting severity",
            SubmissionPhase::Submitting => "submitting",
            SubmissionPhase::AwaitingConfirmation => "awaiting confirmation",
            SubmissionPhase::Succeeded => "submitted",
            SubmissionPhase::Failed => "failed",
        };
        writeln!(f, "New Violation Report ({phase})")?;
        writeln!(f, "  License Plate:  {}", form.draft.license_plate)?;
        writeln!(f, "  Location:       {}", form.draft.location)?;
        writeln!(f, "  Severity:       {}", form.draft.severity)?;
        writeln!(f, "  Reference Hash: {}", form.draft.reference_hash)?;
        if let Some(error) = &form.error {
            writeln!(f, "  Error: {error}")?;
        }
        Ok(())
    }
}

/// The whole dashboard
pub struct DashboardView<'a>(pub &'a AppState);

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        writeln!(f, "Traffic Violation Reports")?;
        writeln!(f, "{}", StatsView(state.stats))?;
        if let Some(banner) = &state.status {
            writeln!(f, "{}", Banner(&banner.status))?;
        }
        if state.loading {
            writeln!(f, "Loading reports...")?;
        }
        if !state.search.trim().is_empty() {
            writeln!(f, "Search: {}", state.search.trim())?;
        }
        writeln!(f)?;
        write!(
            f,
            "{}",
            ReportGrid {
                reports: state.visible_reports(),
                search: &state.search,
            }
        )?;

        if let Some(form) = &state.form {
            writeln!(f)?;
            write!(f, "{}", FormView(form))?;
        }
        if let (Some(detail), Some(report)) = (&state.detail, state.detail_report()) {
            writeln!(f)?;
            write!(
                f,
                "{}",
                DetailView {
                    report,
                    detail: Some(detail),
                }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use tvr_reports::state::{reduce, AppEvent};

    fn report(id: &str, plate: &str, location: &str, severity: Option<u32>) -> ViolationReport {
        ViolationReport {
            id: id.to_string(),
            license_plate: plate.to_string(),
            location: location.to_string(),
            timestamp: 1_700_000_000,
            reference_hash: "0xdeadbeef".to_string(),
            creator: Address::ZERO,
            public_value_1: 0xdeadbeef,
            public_value_2: 0,
            is_verified: severity.is_some(),
            revealed_severity: severity,
        }
    }

    fn loaded(reports: Vec<ViolationReport>) -> AppState {
        let stats = ReportStats::compute(&reports, 1_700_000_100);
        reduce(
            &AppState::default(),
            AppEvent::ReportsLoaded { reports, stats },
        )
    }

    #[test]
    fn test_grid_shows_verified_severity() {
        let state = loaded(vec![
            report("violation-1", "ABC-123", "Main St", Some(7)),
            report("violation-2", "XYZ-999", "Harbor Road", None),
        ]);
        let out = DashboardView(&state).to_string();
        assert!(out.contains("Total Reports: 2   Police Verified: 1   Last 24h: 2"));
        assert!(out.contains("7/10 (Police Verified)"));
        assert!(out.contains(ENCRYPTED));
        assert!(!out.contains(EMPTY_GRID_ACTION));
    }

    #[test]
    fn test_empty_grid_offers_first_report() {
        let out = DashboardView(&AppState::default()).to_string();
        assert!(out.contains("No violation reports yet."));
        assert!(out.contains(EMPTY_GRID_ACTION));

        let state = reduce(
            &loaded(vec![report("violation-1", "ABC-123", "Main St", None)]),
            AppEvent::SearchChanged("nowhere".into()),
        );
        let out = DashboardView(&state).to_string();
        assert!(out.contains("No reports match \"nowhere\"."));
        assert!(out.contains(EMPTY_GRID_ACTION));
        assert!(!out.contains("ABC-123"));
    }

    #[test]
    fn test_detail_offers_verification_until_revealed() {
        let state = reduce(
            &loaded(vec![report("violation-1", "ABC-123", "Main St", None)]),
            AppEvent::DetailOpened("violation-1".into()),
        );
        let out = DashboardView(&state).to_string();
        assert!(out.contains("Severity:       Encrypted"));
        assert!(out.contains(VERIFY_ACTION));

        let epoch = state.detail.as_ref().unwrap().epoch;
        let state = reduce(&state, AppEvent::VerificationStarted { epoch });
        assert!(DashboardView(&state).to_string().contains("Verifying..."));

        let state = reduce(
            &state,
            AppEvent::VerificationSucceeded { epoch, severity: 7 },
        );
        let out = DashboardView(&state).to_string();
        assert!(out.contains("Severity:       7/10 (Police Verified)"));
        assert!(!out.contains(VERIFY_ACTION));
    }

    #[test]
    fn test_banner_and_form() {
        let state = reduce(
            &AppState::default(),
            AppEvent::StatusChanged(TransactionStatus::error("Transaction rejected by user")),
        );
        let state = reduce(&state, AppEvent::FormOpened);
        let out = DashboardView(&state).to_string();
        assert!(out.contains("[error] Transaction rejected by user"));
        assert!(out.contains("New Violation Report (ready)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long location", 8), "a very …");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
        assert_eq!(format_timestamp(u64::MAX), "-");
    }
}
