// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CountingClient, InMemoryReports};
use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use std::sync::Arc;
use tvr_fhe_client::{
    keys::{decode_secret_key, generate_keypair},
    params::BfvParamSet,
    BfvEncryptionClient, LocalDecryptionOracle,
};

pub type TestClient = CountingClient<BfvEncryptionClient>;

/// An in-memory contract wired to a real BFV client and oracle
pub struct LocalStack {
    pub contract: Arc<InMemoryReports>,
    pub client: Arc<TestClient>,
}

pub fn contract_address() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn reporter_address() -> Address {
    Address::repeat_byte(0x5e)
}

pub fn local_stack() -> LocalStack {
    let param_set = BfvParamSet::default();
    let params = param_set.build_arc().expect("default params");
    let keypair = generate_keypair(&params).expect("keypair");
    let secret_key = decode_secret_key(&keypair.secret_key, &params).expect("secret key");
    let verifier = PrivateKeySigner::random();

    let contract = Arc::new(InMemoryReports::new(
        contract_address(),
        reporter_address(),
        verifier.address(),
    ));
    let oracle = LocalDecryptionOracle::new(params, secret_key, verifier)
        .with_authorized_target(contract_address());
    let client = BfvEncryptionClient::new(param_set, keypair.public_key, Arc::new(oracle));

    LocalStack {
        contract,
        client: Arc::new(CountingClient::new(client)),
    }
}
