// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{keys, params::BfvParamSet, proof, DecryptionOracle, EncryptionError};
use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use fhe::bfv::{BfvParameters, Encoding, Plaintext, PublicKey};
use fhe_traits::{FheEncoder, FheEncrypter, Serialize};
use rand::thread_rng;
use std::{collections::HashMap, future::Future, sync::Arc};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use tvr_evm_helpers::{contracts::CiphertextHandle, GatewayError};

/// Ciphertext of a plaintext integer together with its input proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub ciphertext: Bytes,
    pub proof: Bytes,
}

/// Outcome of the verification protocol
#[derive(Debug)]
pub struct Verification<T> {
    pub clear_values: HashMap<CiphertextHandle, u64>,
    /// Whatever the submit callback returned
    pub submission: T,
}

#[async_trait]
pub trait EncryptionClient: Send + Sync {
    /// Prepare the client. Calling it again is a no-op.
    async fn initialize(&self) -> Result<(), EncryptionError>;

    fn is_initialized(&self) -> bool;

    /// Encrypt `plaintext` for use by `requester` on the `target` contract
    async fn encrypt(
        &self,
        target: Address,
        requester: Address,
        plaintext: u64,
    ) -> Result<EncryptedInput, EncryptionError>;

    /// Obtain clear values for `handles` from the verifying party and hand the encoded
    /// values and proof to `submit`, which publishes them on-chain.
    async fn request_verification<S, Fut, T>(
        &self,
        handles: &[CiphertextHandle],
        target: Address,
        submit: S,
    ) -> Result<Verification<T>, EncryptionError>
    where
        S: FnOnce(Bytes, Bytes) -> Fut + Send,
        Fut: Future<Output = Result<T, GatewayError>> + Send,
        T: Send;
}

struct Initialized {
    params: Arc<BfvParameters>,
    public_key: PublicKey,
}

/// Encryption client backed by a BFV public key and, for verification, a decryption oracle
pub struct BfvEncryptionClient {
    param_set: BfvParamSet,
    public_key: Vec<u8>,
    oracle: Option<Arc<dyn DecryptionOracle>>,
    state: OnceCell<Initialized>,
}

impl BfvEncryptionClient {
    pub fn new(
        param_set: BfvParamSet,
        public_key: Vec<u8>,
        oracle: Arc<dyn DecryptionOracle>,
    ) -> Self {
        Self {
            param_set,
            public_key,
            oracle: Some(oracle),
            state: OnceCell::new(),
        }
    }

    /// A client that can encrypt but not request verification
    pub fn encrypt_only(param_set: BfvParamSet, public_key: Vec<u8>) -> Self {
        Self {
            param_set,
            public_key,
            oracle: None,
            state: OnceCell::new(),
        }
    }

    fn ready(&self) -> Result<&Initialized, EncryptionError> {
        self.state.get().ok_or(EncryptionError::NotInitialized)
    }
}

#[async_trait]
impl EncryptionClient for BfvEncryptionClient {
    async fn initialize(&self) -> Result<(), EncryptionError> {
        self.state
            .get_or_try_init(|| async {
                let params = self.param_set.build_arc()?;
                let public_key = keys::decode_public_key(&self.public_key, &params)?;
                info!(
                    degree = params.degree(),
                    plaintext_modulus = params.plaintext(),
                    "Encryption client initialized"
                );
                Ok::<_, EncryptionError>(Initialized { params, public_key })
            })
            .await?;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    async fn encrypt(
        &self,
        target: Address,
        requester: Address,
        plaintext: u64,
    ) -> Result<EncryptedInput, EncryptionError> {
        let Initialized { params, public_key } = self.ready()?;
        if plaintext >= params.plaintext() {
            return Err(EncryptionError::PlaintextOutOfRange {
                value: plaintext,
                modulus: params.plaintext(),
            });
        }

        let values: &[u64] = &[plaintext];
        let pt = Plaintext::try_encode(values, Encoding::poly(), params)
            .map_err(|e| EncryptionError::Encryption(format!("Error encoding plaintext: {e}")))?;
        let ct = public_key
            .try_encrypt(&pt, &mut thread_rng())
            .map_err(|e| EncryptionError::Encryption(format!("Error encrypting data: {e}")))?;

        let ciphertext = ct.to_bytes();
        let input_proof = proof::input_proof(&ciphertext, target, requester);
        debug!(bytes = ciphertext.len(), "Encrypted input");
        Ok(EncryptedInput {
            ciphertext: Bytes::from(ciphertext),
            proof: Bytes::from(input_proof.to_vec()),
        })
    }

    async fn request_verification<S, Fut, T>(
        &self,
        handles: &[CiphertextHandle],
        target: Address,
        submit: S,
    ) -> Result<Verification<T>, EncryptionError>
    where
        S: FnOnce(Bytes, Bytes) -> Fut + Send,
        Fut: Future<Output = Result<T, GatewayError>> + Send,
        T: Send,
    {
        self.ready()?;
        let oracle = self.oracle.as_ref().ok_or_else(|| {
            EncryptionError::Verification("No decryption oracle configured".to_string())
        })?;
        let result = oracle.decrypt_with_proof(handles, target).await?;
        if result.clear_values.len() != handles.len() {
            return Err(EncryptionError::Verification(format!(
                "Expected {} clear values, got {}",
                handles.len(),
                result.clear_values.len()
            )));
        }

        let submission = submit(result.abi_encoded, result.proof)
            .await
            .map_err(EncryptionError::Submission)?;

        let clear_values = handles
            .iter()
            .cloned()
            .zip(result.clear_values)
            .collect();
        Ok(Verification {
            clear_values,
            submission,
        })
    }
}
