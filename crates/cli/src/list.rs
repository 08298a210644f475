// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context;
use anyhow::Result;
use std::sync::Arc;
use tvr_config::AppConfig;
use tvr_dashboard::{dashboard_json, DashboardView};
use tvr_evm_helpers::contracts::ReportsRead;
use tvr_reports::{
    state::{reduce, AppEvent, AppState},
    ReportStore,
};

/// Load every report into a fresh dashboard state
pub async fn load_dashboard<R: ReportsRead + ?Sized>(
    store: &ReportStore<R>,
    search: Option<&str>,
) -> Result<AppState> {
    let snapshot = store.refresh().await?;
    let mut state = reduce(
        &AppState::default(),
        AppEvent::ReportsLoaded {
            reports: snapshot.reports,
            stats: snapshot.stats,
        },
    );
    if let Some(term) = search {
        state = reduce(&state, AppEvent::SearchChanged(term.to_string()));
    }
    Ok(state)
}

pub async fn execute(config: &AppConfig, search: Option<String>, json: bool) -> Result<()> {
    let store = ReportStore::new(Arc::new(context::read_gateway(config).await?));
    let state = load_dashboard(&store, search.as_deref()).await?;
    if json {
        println!("{}", dashboard_json(&state)?);
    } else {
        print!("{}", DashboardView(&state));
    }
    Ok(())
}
