// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{keys, proof, EncryptionError};
use alloy::{
    primitives::{Address, Bytes},
    signers::{local::PrivateKeySigner, SignerSync},
};
use async_trait::async_trait;
use fhe::bfv::{BfvParameters, Ciphertext, Encoding, Plaintext, SecretKey};
use fhe_traits::{DeserializeParametrized, FheDecoder, FheDecrypter};
use std::sync::Arc;
use tracing::{debug, warn};
use tvr_evm_helpers::contracts::CiphertextHandle;

/// Clear values released by the verifying party, with the proof the contract checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionResult {
    pub clear_values: Vec<u64>,
    pub abi_encoded: Bytes,
    pub proof: Bytes,
}

/// The party authorized to decrypt ciphertext handles
#[async_trait]
pub trait DecryptionOracle: Send + Sync {
    /// Account whose signature the contract accepts
    fn signer(&self) -> Address;

    async fn decrypt_with_proof(
        &self,
        handles: &[CiphertextHandle],
        target: Address,
    ) -> Result<DecryptionResult, EncryptionError>;
}

/// Decryption oracle holding the BFV secret key in process
pub struct LocalDecryptionOracle {
    params: Arc<BfvParameters>,
    secret_key: SecretKey,
    signer: PrivateKeySigner,
    authorized_target: Option<Address>,
}

impl LocalDecryptionOracle {
    pub fn new(params: Arc<BfvParameters>, secret_key: SecretKey, signer: PrivateKeySigner) -> Self {
        Self {
            params,
            secret_key,
            signer,
            authorized_target: None,
        }
    }

    pub fn from_bytes(
        params: Arc<BfvParameters>,
        secret_key: &[u8],
        signing_key: &str,
    ) -> Result<Self, EncryptionError> {
        let secret_key = keys::decode_secret_key(secret_key, &params)?;
        let signer: PrivateKeySigner = signing_key
            .parse()
            .map_err(|e| EncryptionError::InvalidKey(format!("Invalid verifier key: {e}")))?;
        Ok(Self::new(params, secret_key, signer))
    }

    /// Only release values for handles stored on this contract
    pub fn with_authorized_target(mut self, target: Address) -> Self {
        self.authorized_target = Some(target);
        self
    }

    fn decrypt(&self, handle: &CiphertextHandle) -> Result<u64, EncryptionError> {
        let ct = Ciphertext::from_bytes(handle.as_bytes(), &self.params).map_err(|e| {
            EncryptionError::Verification(format!("Handle is not a valid ciphertext: {e}"))
        })?;
        let pt: Plaintext = self
            .secret_key
            .try_decrypt(&ct)
            .map_err(|e| EncryptionError::Verification(format!("Decryption failed: {e}")))?;
        let decoded = Vec::<u64>::try_decode(&pt, Encoding::poly())
            .map_err(|e| EncryptionError::Verification(format!("Decoding failed: {e}")))?;
        decoded
            .first()
            .copied()
            .ok_or_else(|| EncryptionError::Verification("Empty plaintext".to_string()))
    }
}

#[async_trait]
impl DecryptionOracle for LocalDecryptionOracle {
    fn signer(&self) -> Address {
        self.signer.address()
    }

    async fn decrypt_with_proof(
        &self,
        handles: &[CiphertextHandle],
        target: Address,
    ) -> Result<DecryptionResult, EncryptionError> {
        if handles.is_empty() {
            return Err(EncryptionError::Verification(
                "No handles to decrypt".to_string(),
            ));
        }
        if let Some(authorized) = self.authorized_target {
            if authorized != target {
                warn!(%target, "Refusing decryption for unauthorized contract");
                return Err(EncryptionError::Verification(format!(
                    "Contract {target} is not authorized"
                )));
            }
        }

        let clear_values = handles
            .iter()
            .map(|h| self.decrypt(h))
            .collect::<Result<Vec<_>, _>>()?;
        let abi_encoded = proof::encode_clear_values(&clear_values);
        let digest = proof::decryption_digest(handles, target, &abi_encoded);
        let signature = self
            .signer
            .sign_hash_sync(&digest)
            .map_err(|e| EncryptionError::Verification(format!("Signing failed: {e}")))?;

        debug!(handles = handles.len(), "Released decryption proof");
        Ok(DecryptionResult {
            clear_values,
            abi_encoded,
            proof: Bytes::from(signature.as_bytes().to_vec()),
        })
    }
}
