// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::classify_rpc_error;
use crate::retry::call_with_retry;
use crate::{GatewayError, PendingTx, TxReceipt};
use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

sol! {
    #[derive(Debug)]
    struct ViolationRecord {
        string licensePlate;
        string location;
        string referenceHash;
        uint256 publicValue1;
        uint256 publicValue2;
        uint256 timestamp;
        address creator;
        bool isVerified;
        uint32 decryptedSeverity;
    }

    #[derive(Debug)]
    #[sol(rpc)]
    contract TrafficViolationReports {
        error ReportNotFound(string reportId);
        error ReportAlreadyExists(string reportId);
        error AlreadyVerified(string reportId);
        error InvalidDecryptionProof();

        function getAllReportIds() external view returns (string[] memory);
        function getReport(string calldata reportId) external view returns (ViolationRecord memory);
        function createReport(string calldata reportId, string calldata licensePlate, string calldata location, string calldata referenceHash, bytes calldata encryptedSeverity, bytes calldata inputProof, uint256 publicValue1, uint256 publicValue2) external;
        function getEncryptedSeverity(string calldata reportId) external view returns (bytes memory);
        function verifyDecryption(string calldata reportId, bytes calldata abiEncodedClearValues, bytes calldata decryptionProof) external;
        function isAvailable() external view returns (bool);
    }
}

/// Opaque on-chain reference to an encrypted value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CiphertextHandle(pub Bytes);

impl CiphertextHandle {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for CiphertextHandle {
    fn from(value: Vec<u8>) -> Self {
        CiphertextHandle(Bytes::from(value))
    }
}

/// A report record as stored by the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    pub id: String,
    pub license_plate: String,
    pub location: String,
    pub reference_hash: String,
    pub public_value_1: u64,
    pub public_value_2: u64,
    pub timestamp: u64,
    pub creator: Address,
    pub is_verified: bool,
    pub decrypted_severity: u32,
}

impl ReportRecord {
    fn try_from_sol(id: &str, record: ViolationRecord) -> Result<Self, GatewayError> {
        Ok(ReportRecord {
            id: id.to_string(),
            license_plate: record.licensePlate,
            location: record.location,
            reference_hash: record.referenceHash,
            public_value_1: u64_try_from(record.publicValue1)?,
            public_value_2: u64_try_from(record.publicValue2)?,
            timestamp: u64_try_from(record.timestamp)?,
            creator: record.creator,
            is_verified: record.isVerified,
            decrypted_severity: record.decryptedSeverity,
        })
    }
}

/// Everything needed to create a report on-chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub id: String,
    pub license_plate: String,
    pub location: String,
    pub reference_hash: String,
    pub encrypted_severity: Bytes,
    pub input_proof: Bytes,
    pub public_value_1: u64,
    pub public_value_2: u64,
}

/// Trait for read-only operations on the reports contract
#[async_trait]
pub trait ReportsRead: Send + Sync {
    /// Address of the deployed reports contract
    fn contract_address(&self) -> Address;

    /// Get every report id in creation order
    async fn list_record_ids(&self) -> Result<Vec<String>, GatewayError>;

    /// Get a single report
    async fn get_record(&self, id: &str) -> Result<ReportRecord, GatewayError>;

    /// Get the handle to the encrypted severity of a report
    async fn get_ciphertext_handle(&self, id: &str) -> Result<CiphertextHandle, GatewayError>;

    /// Check that the contract answers
    async fn is_available(&self) -> Result<bool, GatewayError>;
}

/// Trait for signer-bound operations on the reports contract
#[async_trait]
pub trait ReportsWrite: ReportsRead {
    /// Account that signs transactions
    fn signer_address(&self) -> Address;

    /// Create a new report
    async fn create_record(&self, record: NewRecord) -> Result<PendingTx, GatewayError>;

    /// Publish the clear severity of a report along with its decryption proof
    async fn submit_verification_proof(
        &self,
        id: &str,
        clear_values: Bytes,
        proof: Bytes,
    ) -> Result<PendingTx, GatewayError>;
}

/// Marker for the kind of access a contract handle has
pub trait ProviderType: Clone + Send + Sync + 'static {}

/// Marker type for read-only provider
#[derive(Clone, Debug)]
pub struct ReadOnly;
impl ProviderType for ReadOnly {}

/// Marker type for read-write provider
#[derive(Clone, Debug)]
pub struct ReadWrite {
    signer: Address,
}
impl ProviderType for ReadWrite {}

/// Generic reports contract
#[derive(Clone)]
pub struct ReportsContract<T: ProviderType> {
    provider: Arc<DynProvider<Ethereum>>,
    contract_address: Address,
    access: T,
}

/// Type aliases for the two contract variants
pub type ReportsReadContract = ReportsContract<ReadOnly>;
pub type ReportsWriteContract = ReportsContract<ReadWrite>;

impl<T: ProviderType> ReportsContract<T> {
    pub fn get_provider(&self) -> Arc<DynProvider<Ethereum>> {
        self.provider.clone()
    }

    pub fn address(&self) -> &Address {
        &self.contract_address
    }

    /// Fail unless the node serves chain `expected`
    pub async fn ensure_chain_id(&self, expected: u64) -> Result<(), GatewayError> {
        let actual = self
            .provider
            .get_chain_id()
            .await
            .map_err(classify_rpc_error)?;
        check_chain_id(expected, actual)?;
        debug!(chain_id = actual, "Chain id matches");
        Ok(())
    }
}

impl ReportsContract<ReadWrite> {
    pub async fn new(
        rpc_url: &str,
        private_key: &str,
        contract_address: &str,
    ) -> Result<ReportsContract<ReadWrite>, GatewayError> {
        ReportsContractFactory::create_write(rpc_url, contract_address, private_key).await
    }
}

impl ReportsContract<ReadOnly> {
    pub async fn read_only(
        rpc_url: &str,
        contract_address: &str,
    ) -> Result<ReportsContract<ReadOnly>, GatewayError> {
        ReportsContractFactory::create_read(rpc_url, contract_address).await
    }
}

// Factory for creating contract instances
pub struct ReportsContractFactory;

impl ReportsContractFactory {
    /// Create a write-capable contract
    pub async fn create_write(
        rpc_url: &str,
        contract_address: &str,
        private_key: &str,
    ) -> Result<ReportsContract<ReadWrite>, GatewayError> {
        let contract_address = parse_address(contract_address)?;

        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| GatewayError::Connectivity(format!("Invalid private key: {e}")))?;
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(rpc_url)
            .await
            .map_err(|e| GatewayError::Connectivity(e.to_string()))?
            .erased();

        info!(address = %signer_address, "Connected signer-bound reports contract");

        Ok(ReportsContract {
            provider: Arc::new(provider),
            contract_address,
            access: ReadWrite {
                signer: signer_address,
            },
        })
    }

    /// Create a read-only contract
    pub async fn create_read(
        rpc_url: &str,
        contract_address: &str,
    ) -> Result<ReportsContract<ReadOnly>, GatewayError> {
        let contract_address = parse_address(contract_address)?;

        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| GatewayError::Connectivity(e.to_string()))?
            .erased();

        Ok(ReportsContract {
            provider: Arc::new(provider),
            contract_address,
            access: ReadOnly,
        })
    }
}

// Implement ReportsRead for any ReportsContract regardless of provider type
#[async_trait]
impl<T: ProviderType> ReportsRead for ReportsContract<T> {
    fn contract_address(&self) -> Address {
        self.contract_address
    }

    async fn list_record_ids(&self) -> Result<Vec<String>, GatewayError> {
        call_with_retry("list_record_ids", || async {
            let contract = TrafficViolationReports::new(self.contract_address, &*self.provider);
            Ok::<_, GatewayError>(contract.getAllReportIds().call().await?)
        })
        .await
    }

    async fn get_record(&self, id: &str) -> Result<ReportRecord, GatewayError> {
        let record = call_with_retry("get_record", || async {
            let contract = TrafficViolationReports::new(self.contract_address, &*self.provider);
            Ok::<_, GatewayError>(contract.getReport(id.to_string()).call().await?)
        })
        .await?;
        ReportRecord::try_from_sol(id, record)
    }

    async fn get_ciphertext_handle(&self, id: &str) -> Result<CiphertextHandle, GatewayError> {
        let bytes = call_with_retry("get_ciphertext_handle", || async {
            let contract = TrafficViolationReports::new(self.contract_address, &*self.provider);
            Ok::<_, GatewayError>(contract.getEncryptedSeverity(id.to_string()).call().await?)
        })
        .await?;
        Ok(CiphertextHandle(bytes))
    }

    async fn is_available(&self) -> Result<bool, GatewayError> {
        let contract = TrafficViolationReports::new(self.contract_address, &*self.provider);
        Ok(contract.isAvailable().call().await?)
    }
}

// Implement ReportsWrite only for contracts with ReadWrite marker
#[async_trait]
impl ReportsWrite for ReportsContract<ReadWrite> {
    fn signer_address(&self) -> Address {
        self.access.signer
    }

    async fn create_record(&self, record: NewRecord) -> Result<PendingTx, GatewayError> {
        let contract = TrafficViolationReports::new(self.contract_address, &*self.provider);
        let builder = contract.createReport(
            record.id.clone(),
            record.license_plate,
            record.location,
            record.reference_hash,
            record.encrypted_severity,
            record.input_proof,
            U256::from(record.public_value_1),
            U256::from(record.public_value_2),
        );
        let pending = builder.send().await?;
        debug!(id = %record.id, tx = %pending.tx_hash(), "createReport sent");
        Ok(into_pending_tx(pending))
    }

    async fn submit_verification_proof(
        &self,
        id: &str,
        clear_values: Bytes,
        proof: Bytes,
    ) -> Result<PendingTx, GatewayError> {
        let contract = TrafficViolationReports::new(self.contract_address, &*self.provider);
        let builder = contract.verifyDecryption(id.to_string(), clear_values, proof);
        let pending = builder.send().await?;
        debug!(id = %id, tx = %pending.tx_hash(), "verifyDecryption sent");
        Ok(into_pending_tx(pending))
    }
}

fn into_pending_tx(pending: alloy::providers::PendingTransactionBuilder<Ethereum>) -> PendingTx {
    let tx_hash = *pending.tx_hash();
    PendingTx::new(tx_hash, async move {
        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(GatewayError::Reverted(receipt.transaction_hash.to_string()));
        }
        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    })
}

fn check_chain_id(expected: u64, actual: u64) -> Result<(), GatewayError> {
    if expected != actual {
        return Err(GatewayError::Connectivity(format!(
            "Node is on chain {actual} but chain {expected} is configured"
        )));
    }
    Ok(())
}

fn parse_address(address: &str) -> Result<Address, GatewayError> {
    address
        .parse()
        .map_err(|e| GatewayError::Connectivity(format!("Invalid contract address '{address}': {e}")))
}

fn u64_try_from(input: U256) -> Result<u64, GatewayError> {
    u64::try_from(input).map_err(|_| GatewayError::Chain("larger than 64-bit".to_string()))
}
