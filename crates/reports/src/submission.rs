// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DraftReport, FlowError, MAX_SEVERITY};
use alloy::primitives::{keccak256, B256};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use tvr_evm_helpers::contracts::{NewRecord, ReportsWrite};
use tvr_fhe_client::EncryptionClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Encrypting,
    Submitting,
    AwaitingConfirmation,
    Succeeded,
    Failed,
}

impl SubmissionPhase {
    pub fn in_flight(&self) -> bool {
        matches!(
            self,
            SubmissionPhase::Validating
                | SubmissionPhase::Encrypting
                | SubmissionPhase::Submitting
                | SubmissionPhase::AwaitingConfirmation
        )
    }
}

/// A draft that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub license_plate: String,
    pub location: String,
    pub severity: u64,
    pub reference_hash: String,
}

pub fn validate(draft: &DraftReport) -> Result<ValidDraft, FlowError> {
    let fields = [
        &draft.license_plate,
        &draft.location,
        &draft.severity,
        &draft.reference_hash,
    ];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(FlowError::Validation("Please fill in all fields".to_string()));
    }

    let severity = draft
        .severity
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|s| (1..=u64::from(MAX_SEVERITY)).contains(s))
        .ok_or_else(|| {
            FlowError::Validation(format!(
                "Severity must be a whole number from 1 to {MAX_SEVERITY}"
            ))
        })?;

    Ok(ValidDraft {
        license_plate: draft.license_plate.trim().to_string(),
        location: draft.location.trim().to_string(),
        severity,
        reference_hash: draft.reference_hash.trim().to_string(),
    })
}

/// Public numeric fingerprint of a reference hash.
///
/// Hex input is read as a big-endian number from its first 8 bytes. Anything else is
/// fingerprinted through keccak256.
pub fn reference_fingerprint(reference_hash: &str) -> u64 {
    let digits = reference_hash
        .strip_prefix("0x")
        .or_else(|| reference_hash.strip_prefix("0X"))
        .unwrap_or(reference_hash);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        let prefix = &digits[..digits.len().min(16)];
        if let Ok(value) = u64::from_str_radix(prefix, 16) {
            return value;
        }
    }
    let digest: B256 = keccak256(reference_hash.as_bytes());
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(word)
}

pub fn new_report_id() -> String {
    format!(
        "violation-{}-{}",
        Utc::now().timestamp_millis(),
        hex::encode(rand::random::<[u8; 2]>())
    )
}

/// What a confirmed submission produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub report_id: String,
    pub tx_hash: B256,
}

/// Validates a draft, encrypts its severity and creates the report on-chain
pub struct SubmissionFlow<W: ?Sized, E> {
    gateway: Arc<W>,
    client: Arc<E>,
    jurisdiction: u64,
}

impl<W, E> SubmissionFlow<W, E>
where
    W: ReportsWrite + ?Sized,
    E: EncryptionClient,
{
    pub fn new(gateway: Arc<W>, client: Arc<E>, jurisdiction: u64) -> Self {
        Self {
            gateway,
            client,
            jurisdiction,
        }
    }

    /// Run the flow, reporting each phase to `on_phase`. Terminal phases are left to
    /// the caller.
    #[instrument(skip_all)]
    pub async fn submit<F>(
        &self,
        draft: &DraftReport,
        on_phase: F,
    ) -> Result<SubmissionReceipt, FlowError>
    where
        F: Fn(SubmissionPhase) + Send + Sync,
    {
        on_phase(SubmissionPhase::Validating);
        let valid = validate(draft)?;

        on_phase(SubmissionPhase::Encrypting);
        self.client.initialize().await?;
        let target = self.gateway.contract_address();
        let requester = self.gateway.signer_address();
        let input = self.client.encrypt(target, requester, valid.severity).await?;

        on_phase(SubmissionPhase::Submitting);
        let report_id = new_report_id();
        let record = NewRecord {
            id: report_id.clone(),
            public_value_1: reference_fingerprint(&valid.reference_hash),
            public_value_2: self.jurisdiction,
            license_plate: valid.license_plate,
            location: valid.location,
            reference_hash: valid.reference_hash,
            encrypted_severity: input.ciphertext,
            input_proof: input.proof,
        };
        let pending = self.gateway.create_record(record).await?;

        on_phase(SubmissionPhase::AwaitingConfirmation);
        let receipt = pending.confirm().await?;
        info!(report_id = %report_id, tx = %receipt.tx_hash, "Report created");

        Ok(SubmissionReceipt {
            report_id,
            tx_hash: receipt.tx_hash,
        })
    }
}
