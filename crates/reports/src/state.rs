// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Dashboard state and the events that move it.
//!
//! Flows never touch [`AppState`] directly. They emit [`AppEvent`]s which the
//! session folds in with [`reduce`]. Events that belong to a form or detail view
//! carry the epoch of the view they were started from and are dropped when that
//! view has since been closed or reopened.

use crate::{
    filter_reports, status::TransactionStatus, submission::SubmissionPhase, DraftReport,
    ReportStats, ViolationReport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub seq: u64,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub epoch: u64,
    pub draft: DraftReport,
    pub phase: SubmissionPhase,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailState {
    pub epoch: u64,
    pub report_id: String,
    pub verifying: bool,
    pub revealed: Option<u32>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub reports: Vec<ViolationReport>,
    pub stats: ReportStats,
    pub loading: bool,
    pub search: String,
    pub status: Option<StatusBanner>,
    pub form: Option<FormState>,
    pub detail: Option<DetailState>,
    epoch: u64,
    status_seq: u64,
}

impl AppState {
    /// Reports passing the current search term
    pub fn visible_reports(&self) -> Vec<&ViolationReport> {
        filter_reports(&self.reports, &self.search)
    }

    pub fn report(&self, id: &str) -> Option<&ViolationReport> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn detail_report(&self) -> Option<&ViolationReport> {
        self.detail.as_ref().and_then(|d| self.report(&d.report_id))
    }

    fn form_at(&mut self, epoch: u64) -> Option<&mut FormState> {
        self.form.as_mut().filter(|f| f.epoch == epoch)
    }

    fn detail_at(&mut self, epoch: u64) -> Option<&mut DetailState> {
        self.detail.as_mut().filter(|d| d.epoch == epoch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    RefreshStarted,
    ReportsLoaded {
        reports: Vec<ViolationReport>,
        stats: ReportStats,
    },
    RefreshFailed,
    SearchChanged(String),
    FormOpened,
    FormEdited(DraftReport),
    FormClosed,
    SubmissionPhaseChanged {
        epoch: u64,
        phase: SubmissionPhase,
    },
    SubmissionSucceeded {
        epoch: u64,
    },
    SubmissionFailed {
        epoch: u64,
        message: String,
    },
    DetailOpened(String),
    DetailClosed,
    VerificationStarted {
        epoch: u64,
    },
    VerificationSucceeded {
        epoch: u64,
        severity: u32,
    },
    VerificationFailed {
        epoch: u64,
        message: String,
    },
    StatusChanged(TransactionStatus),
    StatusExpired {
        seq: u64,
    },
}

pub fn reduce(state: &AppState, event: AppEvent) -> AppState {
    let mut next = state.clone();
    match event {
        AppEvent::RefreshStarted => next.loading = true,
        AppEvent::ReportsLoaded { reports, stats } => {
            next.reports = reports;
            next.stats = stats;
            next.loading = false;
        }
        AppEvent::RefreshFailed => next.loading = false,
        AppEvent::SearchChanged(term) => next.search = term,
        AppEvent::FormOpened => {
            next.epoch += 1;
            next.form = Some(FormState {
                epoch: next.epoch,
                draft: DraftReport::default(),
                phase: SubmissionPhase::Idle,
                error: None,
            });
        }
        AppEvent::FormEdited(draft) => {
            if let Some(form) = next.form.as_mut().filter(|f| !f.phase.in_flight()) {
                form.draft = draft;
                form.error = None;
            }
        }
        AppEvent::FormClosed => next.form = None,
        AppEvent::SubmissionPhaseChanged { epoch, phase } => {
            if let Some(form) = next.form_at(epoch) {
                form.phase = phase;
            }
        }
        AppEvent::SubmissionSucceeded { epoch } => {
            if next.form_at(epoch).is_some() {
                next.form = None;
            }
        }
        AppEvent::SubmissionFailed { epoch, message } => {
            if let Some(form) = next.form_at(epoch) {
                form.phase = SubmissionPhase::Failed;
                form.error = Some(message);
            }
        }
        AppEvent::DetailOpened(report_id) => {
            next.epoch += 1;
            next.detail = Some(DetailState {
                epoch: next.epoch,
                report_id,
                verifying: false,
                revealed: None,
                error: None,
            });
        }
        AppEvent::DetailClosed => next.detail = None,
        AppEvent::VerificationStarted { epoch } => {
            if let Some(detail) = next.detail_at(epoch) {
                detail.verifying = true;
                detail.error = None;
            }
        }
        AppEvent::VerificationSucceeded { epoch, severity } => {
            if let Some(detail) = next.detail_at(epoch) {
                detail.verifying = false;
                detail.revealed = Some(severity);
            }
        }
        AppEvent::VerificationFailed { epoch, message } => {
            if let Some(detail) = next.detail_at(epoch) {
                detail.verifying = false;
                detail.error = Some(message);
            }
        }
        AppEvent::StatusChanged(status) => {
            next.status_seq += 1;
            next.status = Some(StatusBanner {
                seq: next.status_seq,
                status,
            });
        }
        AppEvent::StatusExpired { seq } => {
            if next.status.as_ref().is_some_and(|b| b.seq == seq) {
                next.status = None;
            }
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(state: AppState, events: Vec<AppEvent>) -> AppState {
        events.into_iter().fold(state, |s, e| reduce(&s, e))
    }

    fn draft() -> DraftReport {
        DraftReport {
            license_plate: "ABC-123".into(),
            location: "Main St".into(),
            severity: "7".into(),
            reference_hash: "0xdeadbeef".into(),
        }
    }

    #[test]
    fn test_reduce_does_not_touch_input() {
        let state = AppState::default();
        let next = reduce(&state, AppEvent::RefreshStarted);
        assert!(!state.loading);
        assert!(next.loading);
    }

    #[test]
    fn test_failed_submission_keeps_draft() {
        let state = apply(
            AppState::default(),
            vec![AppEvent::FormOpened, AppEvent::FormEdited(draft())],
        );
        let epoch = state.form.as_ref().unwrap().epoch;
        let state = apply(
            state,
            vec![
                AppEvent::SubmissionPhaseChanged {
                    epoch,
                    phase: SubmissionPhase::Encrypting,
                },
                AppEvent::SubmissionFailed {
                    epoch,
                    message: "Transaction rejected by user".into(),
                },
            ],
        );
        let form = state.form.unwrap();
        assert_eq!(form.draft, draft());
        assert_eq!(form.phase, SubmissionPhase::Failed);
        assert_eq!(form.error.as_deref(), Some("Transaction rejected by user"));
    }

    #[test]
    fn test_successful_submission_closes_and_resets_form() {
        let state = apply(
            AppState::default(),
            vec![AppEvent::FormOpened, AppEvent::FormEdited(draft())],
        );
        let epoch = state.form.as_ref().unwrap().epoch;
        let state = reduce(&state, AppEvent::SubmissionSucceeded { epoch });
        assert!(state.form.is_none());

        let state = reduce(&state, AppEvent::FormOpened);
        assert_eq!(state.form.unwrap().draft, DraftReport::default());
    }

    #[test]
    fn test_late_results_do_not_touch_reopened_views() {
        let state = apply(AppState::default(), vec![AppEvent::FormOpened]);
        let stale = state.form.as_ref().unwrap().epoch;
        let state = apply(
            state,
            vec![
                AppEvent::FormClosed,
                AppEvent::FormOpened,
                AppEvent::FormEdited(draft()),
                AppEvent::SubmissionFailed {
                    epoch: stale,
                    message: "late".into(),
                },
                AppEvent::SubmissionSucceeded { epoch: stale },
            ],
        );
        let form = state.form.unwrap();
        assert_eq!(form.draft, draft());
        assert_eq!(form.error, None);

        let state = apply(
            AppState::default(),
            vec![AppEvent::DetailOpened("violation-1".into())],
        );
        let stale = state.detail.as_ref().unwrap().epoch;
        let state = apply(
            state,
            vec![
                AppEvent::DetailClosed,
                AppEvent::VerificationSucceeded {
                    epoch: stale,
                    severity: 7,
                },
            ],
        );
        assert!(state.detail.is_none());
    }

    #[test]
    fn test_form_is_locked_while_in_flight() {
        let state = apply(AppState::default(), vec![AppEvent::FormOpened]);
        let epoch = state.form.as_ref().unwrap().epoch;
        let state = apply(
            state,
            vec![
                AppEvent::SubmissionPhaseChanged {
                    epoch,
                    phase: SubmissionPhase::Submitting,
                },
                AppEvent::FormEdited(draft()),
            ],
        );
        assert_eq!(state.form.unwrap().draft, DraftReport::default());
    }

    #[test]
    fn test_only_current_status_expires() {
        let state = reduce(
            &AppState::default(),
            AppEvent::StatusChanged(TransactionStatus::success("first")),
        );
        let first = state.status.as_ref().unwrap().seq;
        let state = reduce(
            &state,
            AppEvent::StatusChanged(TransactionStatus::error("second")),
        );
        let state = reduce(&state, AppEvent::StatusExpired { seq: first });
        assert_eq!(state.status.as_ref().unwrap().status.message, "second");

        let second = state.status.as_ref().unwrap().seq;
        let state = reduce(&state, AppEvent::StatusExpired { seq: second });
        assert!(state.status.is_none());
    }
}
