// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;
use tvr_evm_helpers::GatewayError;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Encryption client used before initialize()")]
    NotInitialized,
    #[error("Invalid BFV parameters: {0}")]
    InvalidParameters(String),
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
    #[error("Plaintext {value} does not fit the plaintext modulus {modulus}")]
    PlaintextOutOfRange { value: u64, modulus: u64 },
    #[error("Encryption failed: {0}")]
    Encryption(String),
    #[error("Encryption rejected by user")]
    RejectedByUser,
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Proof submission failed: {0}")]
    Submission(#[source] GatewayError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
