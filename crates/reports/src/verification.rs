// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{FlowError, ViolationReport};
use alloy::primitives::B256;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use tvr_evm_helpers::{contracts::ReportsWrite, GatewayError};
use tvr_fhe_client::{EncryptionClient, EncryptionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPhase {
    FetchingHandle,
    Decrypting,
    Submitting,
    AwaitingConfirmation,
}

/// Where a revealed severity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationSource {
    /// The report was already verified when last fetched
    Cached,
    /// This call published the value
    Published,
    /// Another party published the value while this call was running
    Concurrent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub report_id: String,
    pub severity: u32,
    pub source: VerificationSource,
    pub tx_hash: Option<B256>,
}

/// Reveals the severity of a report through the decryption protocol
pub struct VerificationFlow<W: ?Sized, E> {
    gateway: Arc<W>,
    client: Arc<E>,
}

impl<W, E> VerificationFlow<W, E>
where
    W: ReportsWrite + ?Sized + 'static,
    E: EncryptionClient,
{
    pub fn new(gateway: Arc<W>, client: Arc<E>) -> Self {
        Self { gateway, client }
    }

    /// `known` is the report as last fetched, if any
    #[instrument(skip(self, known, on_phase))]
    pub async fn verify<F>(
        &self,
        report_id: &str,
        known: Option<&ViolationReport>,
        on_phase: F,
    ) -> Result<VerificationOutcome, FlowError>
    where
        F: Fn(VerificationPhase) + Send + Sync,
    {
        if let Some(severity) = known.filter(|r| r.is_verified).and_then(|r| r.revealed_severity) {
            return Ok(VerificationOutcome {
                report_id: report_id.to_string(),
                severity,
                source: VerificationSource::Cached,
                tx_hash: None,
            });
        }

        on_phase(VerificationPhase::FetchingHandle);
        let handle = self.gateway.get_ciphertext_handle(report_id).await?;

        on_phase(VerificationPhase::Decrypting);
        self.client.initialize().await?;
        let target = self.gateway.contract_address();
        let gateway = self.gateway.clone();
        let id = report_id.to_string();
        let on_phase = &on_phase;
        let result = self
            .client
            .request_verification(std::slice::from_ref(&handle), target, move |clear, proof| {
                on_phase(VerificationPhase::Submitting);
                async move { gateway.submit_verification_proof(&id, clear, proof).await }
            })
            .await;

        let verification = match result {
            Ok(v) => v,
            Err(EncryptionError::Submission(GatewayError::AlreadyVerified(_))) => {
                return self.settled_elsewhere(report_id).await;
            }
            Err(e) => return Err(e.into()),
        };

        on_phase(VerificationPhase::AwaitingConfirmation);
        let receipt = match verification.submission.confirm().await {
            Ok(receipt) => receipt,
            Err(GatewayError::AlreadyVerified(_)) => {
                return self.settled_elsewhere(report_id).await;
            }
            Err(e @ GatewayError::Reverted(_)) => {
                return self.after_revert(report_id, e).await;
            }
            Err(e) => return Err(e.into()),
        };

        let clear = verification
            .clear_values
            .get(&handle)
            .copied()
            .ok_or_else(|| FlowError::Verification("No clear value for handle".to_string()))?;
        let severity = u32::try_from(clear)
            .map_err(|_| FlowError::Verification(format!("Severity {clear} out of range")))?;

        info!(report_id, severity, tx = %receipt.tx_hash, "Report verified");
        Ok(VerificationOutcome {
            report_id: report_id.to_string(),
            severity,
            source: VerificationSource::Published,
            tx_hash: Some(receipt.tx_hash),
        })
    }

    /// A mined revert carries no reason. The report being verified by now means
    /// another party won the race, anything else is a real failure.
    async fn after_revert(
        &self,
        report_id: &str,
        err: GatewayError,
    ) -> Result<VerificationOutcome, FlowError> {
        let record = self.gateway.get_record(report_id).await?;
        if !record.is_verified {
            warn!(report_id, error = %err, "Verification transaction reverted");
            return Err(err.into());
        }
        self.settled_elsewhere(report_id).await
    }

    /// Another party verified first; read back the value they published
    async fn settled_elsewhere(&self, report_id: &str) -> Result<VerificationOutcome, FlowError> {
        warn!(report_id, "Report was verified concurrently, reading published value");
        let record = self.gateway.get_record(report_id).await?;
        if !record.is_verified {
            return Err(FlowError::Chain(format!(
                "Report {report_id} reported as verified but no value is published"
            )));
        }
        Ok(VerificationOutcome {
            report_id: report_id.to_string(),
            severity: record.decrypted_severity,
            source: VerificationSource::Concurrent,
            tx_hash: None,
        })
    }
}
