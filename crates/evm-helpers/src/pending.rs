// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::GatewayError;
use alloy::primitives::B256;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;

/// Receipt of a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// A transaction that has been broadcast but not yet confirmed.
///
/// Sending and confirming are separate steps so callers can report progress in between.
pub struct PendingTx {
    tx_hash: B256,
    confirmation: BoxFuture<'static, Result<TxReceipt, GatewayError>>,
}

impl PendingTx {
    pub fn new<F>(tx_hash: B256, confirmation: F) -> Self
    where
        F: Future<Output = Result<TxReceipt, GatewayError>> + Send + 'static,
    {
        Self {
            tx_hash,
            confirmation: confirmation.boxed(),
        }
    }

    /// A transaction that was final the moment it was accepted
    pub fn confirmed(receipt: TxReceipt) -> Self {
        let tx_hash = receipt.tx_hash;
        Self::new(tx_hash, async move { Ok(receipt) })
    }

    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Wait for the transaction to be included
    pub async fn confirm(self) -> Result<TxReceipt, GatewayError> {
        self.confirmation.await
    }
}

impl fmt::Debug for PendingTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTx")
            .field("tx_hash", &self.tx_hash)
            .finish_non_exhaustive()
    }
}
