// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    format_severity,
    state::{reduce, AppEvent, AppState},
    status::{StatusTimeouts, TransactionStatus},
    submission::SubmissionReceipt,
    DraftReport, FlowError, ReportStore, SubmissionFlow, SubmissionPhase, VerificationFlow,
    VerificationOutcome, VerificationPhase, VerificationSource,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tvr_evm_helpers::contracts::ReportsWrite;
use tvr_fhe_client::EncryptionClient;

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Value stored in the second public field of new reports
    pub jurisdiction: u64,
    pub timeouts: StatusTimeouts,
}

/// Owns the dashboard state and runs flows against it.
///
/// Every flow error ends here: it is logged, shown as a banner and returned to the
/// caller, and the state goes back to ready.
pub struct Session<W: ?Sized, E> {
    state: Arc<watch::Sender<AppState>>,
    store: ReportStore<W>,
    submission: SubmissionFlow<W, E>,
    verification: VerificationFlow<W, E>,
    timeouts: StatusTimeouts,
}

impl<W, E> Session<W, E>
where
    W: ReportsWrite + ?Sized + 'static,
    E: EncryptionClient,
{
    pub fn new(gateway: Arc<W>, client: Arc<E>, options: SessionOptions) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            state: Arc::new(state),
            store: ReportStore::new(gateway.clone()),
            submission: SubmissionFlow::new(gateway.clone(), client.clone(), options.jurisdiction),
            verification: VerificationFlow::new(gateway, client),
            timeouts: options.timeouts,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    fn emit(&self, event: AppEvent) {
        self.state.send_modify(|s| *s = reduce(s, event));
    }

    fn set_status(&self, status: TransactionStatus) {
        let ttl = self.timeouts.ttl(status.kind);
        self.emit(AppEvent::StatusChanged(status));
        let (Some(ttl), Some(seq)) = (ttl, self.state.borrow().status.as_ref().map(|b| b.seq))
        else {
            return;
        };
        let state = self.state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            state.send_modify(|s| *s = reduce(s, AppEvent::StatusExpired { seq }));
        });
    }

    /// Reload every report. Returns false when the id list could not be fetched.
    pub async fn refresh(&self) -> bool {
        self.emit(AppEvent::RefreshStarted);
        match self.store.refresh().await {
            Ok(snapshot) => {
                self.emit(AppEvent::ReportsLoaded {
                    reports: snapshot.reports,
                    stats: snapshot.stats,
                });
                true
            }
            Err(e) => {
                error!("Failed to load reports: {e}");
                self.emit(AppEvent::RefreshFailed);
                self.set_status(TransactionStatus::error(format!(
                    "Failed to load reports: {e}"
                )));
                false
            }
        }
    }

    pub fn set_search(&self, term: impl Into<String>) {
        self.emit(AppEvent::SearchChanged(term.into()));
    }

    pub fn open_form(&self) {
        self.emit(AppEvent::FormOpened);
    }

    pub fn edit_form(&self, draft: DraftReport) {
        self.emit(AppEvent::FormEdited(draft));
    }

    pub fn close_form(&self) {
        self.emit(AppEvent::FormClosed);
    }

    /// Submit the draft in the open creation form
    pub async fn submit(&self) -> Result<SubmissionReceipt, FlowError> {
        let Some(form) = self.snapshot().form else {
            return Err(FlowError::Validation("The report form is not open".to_string()));
        };
        if form.phase.in_flight() {
            return Err(FlowError::Validation(
                "A submission is already in progress".to_string(),
            ));
        }
        let epoch = form.epoch;

        let on_phase = |phase: SubmissionPhase| {
            self.emit(AppEvent::SubmissionPhaseChanged { epoch, phase });
            let message = match phase {
                SubmissionPhase::Encrypting => "Encrypting severity...",
                SubmissionPhase::Submitting => "Submitting report to blockchain...",
                SubmissionPhase::AwaitingConfirmation => "Waiting for confirmation...",
                _ => return,
            };
            self.set_status(TransactionStatus::pending(message));
        };

        match self.submission.submit(&form.draft, on_phase).await {
            Ok(receipt) => {
                self.emit(AppEvent::SubmissionPhaseChanged {
                    epoch,
                    phase: SubmissionPhase::Succeeded,
                });
                self.emit(AppEvent::SubmissionSucceeded { epoch });
                self.set_status(TransactionStatus::success("Report submitted successfully!"));
                self.refresh().await;
                Ok(receipt)
            }
            Err(e) => {
                let message = match &e {
                    FlowError::RejectedByUser => "Transaction rejected by user".to_string(),
                    FlowError::Validation(msg) => msg.clone(),
                    other => format!("Failed to submit report: {other}"),
                };
                error!("{message}");
                self.emit(AppEvent::SubmissionFailed {
                    epoch,
                    message: message.clone(),
                });
                self.set_status(TransactionStatus::error(message));
                Err(e)
            }
        }
    }

    pub fn open_detail(&self, report_id: impl Into<String>) {
        self.emit(AppEvent::DetailOpened(report_id.into()));
    }

    pub fn close_detail(&self) {
        self.emit(AppEvent::DetailClosed);
    }

    /// Reveal the severity of `report_id`, opening its detail view if needed
    pub async fn verify(&self, report_id: &str) -> Result<u32, FlowError> {
        let showing = self
            .snapshot()
            .detail
            .is_some_and(|d| d.report_id == report_id);
        if !showing {
            self.open_detail(report_id);
        }
        let snapshot = self.snapshot();
        let Some(epoch) = snapshot.detail.as_ref().map(|d| d.epoch) else {
            return Err(FlowError::NotFound(report_id.to_string()));
        };
        self.emit(AppEvent::VerificationStarted { epoch });

        let on_phase = |phase: VerificationPhase| {
            let message = match phase {
                VerificationPhase::FetchingHandle => "Fetching encrypted severity...",
                VerificationPhase::Decrypting => "Requesting decryption proof...",
                VerificationPhase::Submitting => "Submitting verification to blockchain...",
                VerificationPhase::AwaitingConfirmation => "Waiting for confirmation...",
            };
            self.set_status(TransactionStatus::pending(message));
        };

        match self
            .verification
            .verify(report_id, snapshot.report(report_id), on_phase)
            .await
        {
            Ok(VerificationOutcome {
                severity, source, ..
            }) => {
                self.emit(AppEvent::VerificationSucceeded { epoch, severity });
                if source != VerificationSource::Cached {
                    info!(report_id, ?source, "Severity revealed");
                    self.set_status(TransactionStatus::success(format!(
                        "Severity revealed: {}",
                        format_severity(severity)
                    )));
                    self.refresh().await;
                }
                Ok(severity)
            }
            Err(e) => {
                let message = match &e {
                    FlowError::RejectedByUser => "Transaction rejected by user".to_string(),
                    FlowError::Verification(msg) => format!("Verification failed: {msg}"),
                    other => format!("Verification failed: {other}"),
                };
                error!("{message}");
                self.emit(AppEvent::VerificationFailed {
                    epoch,
                    message: message.clone(),
                });
                self.set_status(TransactionStatus::error(message));
                Err(e)
            }
        }
    }
}
