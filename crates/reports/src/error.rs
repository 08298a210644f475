// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;
use tvr_evm_helpers::GatewayError;
use tvr_fhe_client::EncryptionError;

/// Failures a flow reports back to the session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Not connected: {0}")]
    Connectivity(String),
    #[error("Transaction rejected by user")]
    RejectedByUser,
    #[error("{0}")]
    Chain(String),
    #[error("Report already verified: {0}")]
    AlreadyVerified(String),
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("{0}")]
    Validation(String),
    #[error("Report not found: {0}")]
    NotFound(String),
}

impl From<GatewayError> for FlowError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::Connectivity(msg) => FlowError::Connectivity(msg),
            GatewayError::NotFound(id) => FlowError::NotFound(id),
            GatewayError::RecordExists(id) => FlowError::Chain(format!("Report {id} already exists")),
            GatewayError::RejectedByUser => FlowError::RejectedByUser,
            GatewayError::AlreadyVerified(id) => FlowError::AlreadyVerified(id),
            GatewayError::InvalidProof => {
                FlowError::Verification("decryption proof rejected on-chain".to_string())
            }
            GatewayError::Reverted(tx) => FlowError::Chain(format!("Transaction {tx} reverted")),
            GatewayError::Chain(msg) => FlowError::Chain(msg),
        }
    }
}

impl From<EncryptionError> for FlowError {
    fn from(value: EncryptionError) -> Self {
        match value {
            EncryptionError::RejectedByUser => FlowError::RejectedByUser,
            EncryptionError::Submission(e) => e.into(),
            EncryptionError::Verification(msg) => FlowError::Verification(msg),
            other => FlowError::Chain(other.to_string()),
        }
    }
}
