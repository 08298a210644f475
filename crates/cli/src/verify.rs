// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::{self, SessionRole};
use anyhow::{Context, Result};
use tvr_config::AppConfig;
use tracing::warn;
use tvr_dashboard::{Banner, DetailView};

pub async fn execute(config: &AppConfig, id: &str) -> Result<()> {
    let session = context::session(config, SessionRole::Verifier).await?;
    // Verified reports are answered from loaded state without a new proof
    if !session.refresh().await {
        warn!("Could not load reports, verifying without cached state");
    }
    session.verify(id).await?;

    let state = session.snapshot();
    let report = state
        .report(id)
        .context("Report disappeared after verification")?;
    if let Some(banner) = &state.status {
        println!("{}", Banner(&banner.status));
    }
    print!(
        "{}",
        DetailView {
            report,
            detail: state.detail.as_ref(),
        }
    );
    Ok(())
}
