// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context;
use anyhow::Result;
use tvr_config::AppConfig;
use tvr_fhe_client::keys::{generate_keypair, write_keypair};

pub fn execute(config: &AppConfig) -> Result<()> {
    let params = context::param_set(config)?.build_arc()?;
    let keypair = generate_keypair(&params)?;
    let public_key = config.public_key_path();
    let secret_key = config.secret_key_path();
    write_keypair(&keypair, &public_key, &secret_key)?;

    println!("Public key: {}", public_key.display());
    println!("Secret key: {}", secret_key.display());
    Ok(())
}
