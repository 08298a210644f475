// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context;
use anyhow::Result;
use tvr_config::AppConfig;
use tvr_dashboard::{DetailView, VERIFY_ACTION};
use tvr_evm_helpers::contracts::ReportsRead;
use tvr_reports::ViolationReport;

pub async fn execute(config: &AppConfig, id: &str) -> Result<()> {
    let gateway = context::read_gateway(config).await?;
    let report = ViolationReport::from(gateway.get_record(id).await?);
    print!(
        "{}",
        DetailView {
            report: &report,
            detail: None,
        }
    );
    if !report.is_verified {
        println!("\n{VERIFY_ACTION}: violations verify {}", report.id);
    }
    Ok(())
}
