// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, Bytes, B256};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};
use tokio::sync::watch;
use tracing::debug;
use tvr_evm_helpers::{
    contracts::{CiphertextHandle, NewRecord, ReportRecord, ReportsRead, ReportsWrite},
    GatewayError, PendingTx, TxReceipt,
};
use tvr_fhe_client::proof::{decode_clear_values, decryption_digest, input_proof, recover_signer};

#[derive(Default)]
struct Ledger {
    order: Vec<String>,
    records: HashMap<String, (ReportRecord, Bytes)>,
    failing: HashSet<String>,
    offline: bool,
    reject_next_write: bool,
    revert_next_verification: bool,
    block: u64,
}

impl Ledger {
    fn next_receipt(&mut self, seed: &str) -> TxReceipt {
        self.block += 1;
        TxReceipt {
            tx_hash: keccak256(format!("{seed}:{}", self.block)),
            block_number: Some(self.block),
        }
    }
}

#[derive(Default)]
pub struct CallCounts {
    pub list_record_ids: AtomicUsize,
    pub get_record: AtomicUsize,
    pub create_record: AtomicUsize,
    pub proof_submissions: AtomicUsize,
    pub verifications_applied: AtomicUsize,
}

/// Reports contract kept in memory.
///
/// Checks input proofs and decryption proofs the way the deployed contract does.
/// Writes take effect when their `PendingTx` is confirmed, after one scheduler yield,
/// so concurrent flows interleave like they would against a chain.
pub struct InMemoryReports {
    address: Address,
    signer: Address,
    verifier: Address,
    ledger: Arc<Mutex<Ledger>>,
    counts: Arc<CallCounts>,
    /// Pending writes are mined only while this is open
    mining: Arc<watch::Sender<bool>>,
}

impl InMemoryReports {
    /// `verifier` is the account whose decryption proofs are accepted
    pub fn new(address: Address, signer: Address, verifier: Address) -> Self {
        Self {
            address,
            signer,
            verifier,
            ledger: Arc::new(Mutex::new(Ledger::default())),
            counts: Arc::new(CallCounts::default()),
            mining: Arc::new(watch::channel(true).0),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        match self.ledger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn counts(&self) -> &CallCounts {
        &self.counts
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Make `list_record_ids` fail as if the provider were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.ledger().offline = offline;
    }

    /// Make `get_record` fail for one id
    pub fn fail_record(&self, id: &str) {
        self.ledger().failing.insert(id.to_string());
    }

    /// The next write is declined by the signer
    pub fn reject_next_write(&self) {
        self.ledger().reject_next_write = true;
    }

    /// Park every pending write until `resume_mining` is called
    pub fn pause_mining(&self) {
        self.mining.send_replace(false);
    }

    pub fn resume_mining(&self) {
        self.mining.send_replace(true);
    }

    /// Insert a record directly, bypassing proof checks
    pub fn seed(&self, record: ReportRecord, ciphertext: Bytes) {
        let mut ledger = self.ledger();
        ledger.order.push(record.id.clone());
        ledger.records.insert(record.id.clone(), (record, ciphertext));
    }

    pub fn record(&self, id: &str) -> Option<ReportRecord> {
        self.ledger().records.get(id).map(|(r, _)| r.clone())
    }

    /// The next verification proof is accepted at send time but its
    /// transaction reverts when mined
    pub fn revert_next_verification(&self) {
        self.ledger().revert_next_verification = true;
    }

    fn take_rejection(&self) -> bool {
        std::mem::take(&mut self.ledger().reject_next_write)
    }
}

#[async_trait]
impl ReportsRead for InMemoryReports {
    fn contract_address(&self) -> Address {
        self.address
    }

    async fn list_record_ids(&self) -> Result<Vec<String>, GatewayError> {
        self.counts.list_record_ids.fetch_add(1, Ordering::SeqCst);
        let ledger = self.ledger();
        if ledger.offline {
            return Err(GatewayError::Connectivity("provider offline".to_string()));
        }
        Ok(ledger.order.clone())
    }

    async fn get_record(&self, id: &str) -> Result<ReportRecord, GatewayError> {
        self.counts.get_record.fetch_add(1, Ordering::SeqCst);
        let ledger = self.ledger();
        if ledger.failing.contains(id) {
            return Err(GatewayError::Chain(format!("execution reverted reading {id}")));
        }
        ledger
            .records
            .get(id)
            .map(|(r, _)| r.clone())
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    async fn get_ciphertext_handle(&self, id: &str) -> Result<CiphertextHandle, GatewayError> {
        self.ledger()
            .records
            .get(id)
            .map(|(_, ct)| CiphertextHandle(ct.clone()))
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    async fn is_available(&self) -> Result<bool, GatewayError> {
        Ok(!self.ledger().offline)
    }
}

#[async_trait]
impl ReportsWrite for InMemoryReports {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn create_record(&self, record: NewRecord) -> Result<PendingTx, GatewayError> {
        self.counts.create_record.fetch_add(1, Ordering::SeqCst);
        if self.take_rejection() {
            return Err(GatewayError::RejectedByUser);
        }
        let expected = input_proof(&record.encrypted_severity, self.address, self.signer);
        if record.input_proof.as_ref() != expected.as_slice() {
            return Err(GatewayError::Chain("invalid input proof".to_string()));
        }
        if self.ledger().records.contains_key(&record.id) {
            return Err(GatewayError::RecordExists(record.id));
        }

        let ledger = self.ledger.clone();
        let creator = self.signer;
        let tx_hash = keccak256(record.id.as_bytes());
        let mut mining = self.mining.subscribe();
        Ok(PendingTx::new(tx_hash, async move {
            tokio::task::yield_now().await;
            let _ = mining.wait_for(|open| *open).await;
            let mut ledger = match ledger.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if ledger.records.contains_key(&record.id) {
                return Err(GatewayError::Reverted(tx_hash.to_string()));
            }
            let stored = ReportRecord {
                id: record.id.clone(),
                license_plate: record.license_plate,
                location: record.location,
                reference_hash: record.reference_hash,
                public_value_1: record.public_value_1,
                public_value_2: record.public_value_2,
                timestamp: u64::try_from(Utc::now().timestamp()).unwrap_or_default(),
                creator,
                is_verified: false,
                decrypted_severity: 0,
            };
            ledger.order.push(record.id.clone());
            ledger
                .records
                .insert(record.id.clone(), (stored, record.encrypted_severity));
            let receipt = ledger.next_receipt(&record.id);
            debug!(id = %record.id, "Report stored");
            Ok(TxReceipt { tx_hash, ..receipt })
        }))
    }

    async fn submit_verification_proof(
        &self,
        id: &str,
        clear_values: Bytes,
        proof: Bytes,
    ) -> Result<PendingTx, GatewayError> {
        self.counts.proof_submissions.fetch_add(1, Ordering::SeqCst);
        if self.take_rejection() {
            return Err(GatewayError::RejectedByUser);
        }
        let handle = {
            let ledger = self.ledger();
            let (record, ct) = ledger
                .records
                .get(id)
                .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
            if record.is_verified {
                return Err(GatewayError::AlreadyVerified(id.to_string()));
            }
            CiphertextHandle(ct.clone())
        };

        let digest = decryption_digest(std::slice::from_ref(&handle), self.address, &clear_values);
        match recover_signer(digest, &proof) {
            Ok(signer) if signer == self.verifier => {}
            _ => return Err(GatewayError::InvalidProof),
        }
        let severity = decode_clear_values(&clear_values)
            .ok()
            .and_then(|v| v.first().copied())
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(GatewayError::InvalidProof)?;

        let reverts = std::mem::take(&mut self.ledger().revert_next_verification);
        let ledger = self.ledger.clone();
        let counts = self.counts.clone();
        let id = id.to_string();
        let tx_hash: B256 = keccak256(proof.as_ref());
        let mut mining = self.mining.subscribe();
        Ok(PendingTx::new(tx_hash, async move {
            tokio::task::yield_now().await;
            let _ = mining.wait_for(|open| *open).await;
            let mut ledger = match ledger.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let receipt = ledger.next_receipt(&id);
            let (record, _) = ledger
                .records
                .get_mut(&id)
                .ok_or_else(|| GatewayError::NotFound(id.clone()))?;
            // Mined reverts carry no reason, like a receipt with a failed status
            if reverts || record.is_verified {
                return Err(GatewayError::Reverted(tx_hash.to_string()));
            }
            record.is_verified = true;
            record.decrypted_severity = severity;
            counts.verifications_applied.fetch_add(1, Ordering::SeqCst);
            debug!(id = %id, severity, "Report verified");
            Ok(TxReceipt { tx_hash, ..receipt })
        }))
    }
}
