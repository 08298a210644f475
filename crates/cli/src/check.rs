// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context;
use anyhow::{bail, Result};
use tvr_config::AppConfig;
use tvr_evm_helpers::contracts::ReportsRead;

pub async fn execute(config: &AppConfig) -> Result<()> {
    let gateway = context::read_gateway(config).await?;
    if !gateway.is_available().await? {
        bail!(
            "Reports contract at {} is not accepting reports",
            gateway.contract_address()
        );
    }
    println!(
        "Reports contract at {} is available",
        gateway.contract_address()
    );
    Ok(())
}
