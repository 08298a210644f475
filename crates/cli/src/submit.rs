// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::{self, SessionRole};
use anyhow::Result;
use tvr_config::AppConfig;
use tvr_dashboard::DashboardView;
use tvr_reports::DraftReport;

pub async fn execute(config: &AppConfig, draft: DraftReport) -> Result<()> {
    let session = context::session(config, SessionRole::Reporter).await?;
    session.open_form();
    session.edit_form(draft);

    let receipt = session.submit().await?;
    print!("{}", DashboardView(&session.snapshot()));
    println!(
        "\nSubmitted {} in transaction {}",
        receipt.report_id, receipt.tx_hash
    );
    Ok(())
}
