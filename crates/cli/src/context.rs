// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;
use tvr_config::AppConfig;
use tvr_evm_helpers::contracts::{
    ProviderType, ReadOnly, ReadWrite, ReportsContract, ReportsContractFactory,
};
use tvr_fhe_client::{
    keys::read_key, params::BfvParamSet, BfvEncryptionClient, LocalDecryptionOracle,
};
use tvr_reports::{status::StatusTimeouts, Session, SessionOptions};

pub type CliSession = Session<ReportsContract<ReadWrite>, BfvEncryptionClient>;

/// What a session is opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Submitting reports only needs the public key
    Reporter,
    /// Revealing severities also needs the secret key and the verifier key
    Verifier,
}

pub async fn read_gateway(config: &AppConfig) -> Result<ReportsContract<ReadOnly>> {
    let rpc = config.rpc()?;
    let address = config.reports_contract()?;
    debug!(%address, "Connecting to reports contract");
    let gateway =
        ReportsContractFactory::create_read(&rpc.as_http_url()?, &address.to_string()).await?;
    check_chain(config, &gateway).await?;
    Ok(gateway)
}

pub async fn write_gateway(config: &AppConfig) -> Result<ReportsContract<ReadWrite>> {
    let rpc = config.rpc()?;
    let address = config.reports_contract()?;
    let gateway = ReportsContractFactory::create_write(
        &rpc.as_http_url()?,
        &address.to_string(),
        config.wallet_key()?,
    )
    .await?;
    check_chain(config, &gateway).await?;
    Ok(gateway)
}

async fn check_chain<T: ProviderType>(
    config: &AppConfig,
    gateway: &ReportsContract<T>,
) -> Result<()> {
    if let Some(chain_id) = config.chain.chain_id {
        gateway
            .ensure_chain_id(chain_id)
            .await
            .context("Configured chain.chain_id does not match the node")?;
    }
    Ok(())
}

pub fn param_set(config: &AppConfig) -> Result<BfvParamSet> {
    match &config.fhe.params {
        Some(params) => Ok(BfvParamSet {
            degree: params.degree,
            plaintext_modulus: params.plaintext_modulus,
            moduli: params.moduli.clone(),
        }),
        None => Ok(BfvParamSet::from_preset(&config.fhe.preset)?),
    }
}

/// Client for the contract at `target`. Verifiers get an in-process oracle holding the
/// secret key.
pub fn encryption_client(
    config: &AppConfig,
    target: Address,
    role: SessionRole,
) -> Result<BfvEncryptionClient> {
    let param_set = param_set(config)?;
    let public_key = read_key(&config.public_key_path())
        .context("Run `violations keygen` to create the BFV key pair")?;
    if role == SessionRole::Reporter {
        return Ok(BfvEncryptionClient::encrypt_only(param_set, public_key));
    }

    let params = param_set.build_arc()?;
    let secret_key = read_key(&config.secret_key_path())?;
    let oracle = LocalDecryptionOracle::from_bytes(params, &secret_key, config.verifier_key()?)?
        .with_authorized_target(target);
    Ok(BfvEncryptionClient::new(
        param_set,
        public_key,
        Arc::new(oracle),
    ))
}

pub async fn session(config: &AppConfig, role: SessionRole) -> Result<CliSession> {
    let gateway = Arc::new(write_gateway(config).await?);
    let client = Arc::new(encryption_client(config, *gateway.address(), role)?);
    let options = SessionOptions {
        jurisdiction: config.jurisdiction,
        timeouts: StatusTimeouts {
            success: config.success_status_ttl(),
            error: config.error_status_ttl(),
        },
    };
    Ok(Session::new(gateway, client, options))
}
