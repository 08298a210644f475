// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use std::{
    future::Future,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tvr_evm_helpers::{contracts::CiphertextHandle, GatewayError};
use tvr_fhe_client::{EncryptedInput, EncryptionClient, EncryptionError, Verification};

/// Wraps an encryption client and records how it is used
pub struct CountingClient<E> {
    inner: E,
    encrypt_calls: AtomicUsize,
    verification_calls: AtomicUsize,
    reject_encryption: AtomicBool,
}

impl<E> CountingClient<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            encrypt_calls: AtomicUsize::new(0),
            verification_calls: AtomicUsize::new(0),
            reject_encryption: AtomicBool::new(false),
        }
    }

    pub fn encrypt_calls(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    pub fn verification_calls(&self) -> usize {
        self.verification_calls.load(Ordering::SeqCst)
    }

    /// Decline the next encryption request as a user would
    pub fn reject_next_encryption(&self) {
        self.reject_encryption.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl<E: EncryptionClient> EncryptionClient for CountingClient<E> {
    async fn initialize(&self) -> Result<(), EncryptionError> {
        self.inner.initialize().await
    }

    fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    async fn encrypt(
        &self,
        target: Address,
        requester: Address,
        plaintext: u64,
    ) -> Result<EncryptedInput, EncryptionError> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_encryption.swap(false, Ordering::SeqCst) {
            return Err(EncryptionError::RejectedByUser);
        }
        self.inner.encrypt(target, requester, plaintext).await
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
        self.verification_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.request_verification(handles, target, submit).await
    }
}
