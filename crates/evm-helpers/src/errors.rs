// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::contracts::TrafficViolationReports::TrafficViolationReportsErrors;
use alloy::{
    contract::Error as ContractError,
    providers::PendingTransactionError,
    sol_types::SolInterface,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

/// EIP-1193 code returned by wallets when the user declines a request
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// Typed failures surfaced by the reports contract gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("No wallet or provider available: {0}")]
    Connectivity(String),
    #[error("Report not found: {0}")]
    NotFound(String),
    #[error("Report already exists: {0}")]
    RecordExists(String),
    #[error("Transaction rejected by user")]
    RejectedByUser,
    #[error("Report already verified: {0}")]
    AlreadyVerified(String),
    #[error("Decryption proof was rejected by the contract")]
    InvalidProof,
    /// The transaction was mined but reverted, carries the tx hash
    #[error("Transaction {0} reverted")]
    Reverted(String),
    #[error("Chain error: {0}")]
    Chain(String),
}

impl GatewayError {
    /// Transient errors are worth retrying for read calls
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Connectivity(_))
    }
}

impl From<ContractError> for GatewayError {
    fn from(value: ContractError) -> Self {
        classify_contract_error(value)
    }
}

impl From<PendingTransactionError> for GatewayError {
    fn from(value: PendingTransactionError) -> Self {
        match value {
            PendingTransactionError::TransportError(e) => classify_rpc_error(e),
            other => GatewayError::Chain(other.to_string()),
        }
    }
}

pub fn classify_contract_error(err: ContractError) -> GatewayError {
    if let Some(decoded) = err.as_decoded_interface_error::<TrafficViolationReportsErrors>() {
        return from_revert(decoded);
    }

    match err {
        ContractError::TransportError(e) => classify_rpc_error(e),
        other => GatewayError::Chain(other.to_string()),
    }
}

pub fn classify_rpc_error(err: RpcError<TransportErrorKind>) -> GatewayError {
    match err {
        RpcError::ErrorResp(payload) => {
            if let Some(classified) = classify_rpc_code(payload.code) {
                return classified;
            }
            payload
                .as_revert_data()
                .and_then(|data| classify_revert_data(&data))
                .unwrap_or_else(|| GatewayError::Chain(payload.to_string()))
        }
        RpcError::Transport(kind) => GatewayError::Connectivity(kind.to_string()),
        other => GatewayError::Chain(other.to_string()),
    }
}

pub fn classify_rpc_code(code: i64) -> Option<GatewayError> {
    match code {
        USER_REJECTED_REQUEST => Some(GatewayError::RejectedByUser),
        _ => None,
    }
}

/// Decode revert data emitted by the reports contract
pub fn classify_revert_data(data: &[u8]) -> Option<GatewayError> {
    TrafficViolationReportsErrors::abi_decode(data)
        .ok()
        .map(from_revert)
}

fn from_revert(err: TrafficViolationReportsErrors) -> GatewayError {
    use TrafficViolationReportsErrors::*;
    match err {
        ReportNotFound(e) => GatewayError::NotFound(e.reportId),
        ReportAlreadyExists(e) => GatewayError::RecordExists(e.reportId),
        AlreadyVerified(e) => GatewayError::AlreadyVerified(e.reportId),
        InvalidDecryptionProof(_) => GatewayError::InvalidProof,
    }
}
