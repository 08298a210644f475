// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{context, list::load_dashboard};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tvr_config::AppConfig;
use tvr_dashboard::DashboardView;
use tvr_evm_helpers::{
    contracts::ReportsRead,
    event_listener::EventListener,
    events::{ReportCreated, ReportVerified},
};
use tvr_reports::ReportStore;

/// Redraw whenever the contract reports a change, until interrupted
pub async fn execute(config: &AppConfig, search: Option<String>) -> Result<()> {
    let ws_url = config.rpc()?.as_ws_url()?;
    let address = config.reports_contract()?;
    let store = ReportStore::new(Arc::new(context::read_gateway(config).await?));

    let listener = EventListener::create_contract_listener(&ws_url, address)
        .await
        .map_err(|e| anyhow!(e))?;
    let (changed_tx, mut changed_rx) = mpsc::channel::<()>(16);

    let tx = changed_tx.clone();
    listener
        .add_event_handler(move |event: ReportCreated| {
            let tx = tx.clone();
            async move {
                log_created(&event);
                tx.send(()).await?;
                Ok(())
            }
        })
        .await;
    let tx = changed_tx;
    listener
        .add_event_handler(move |event: ReportVerified| {
            let tx = tx.clone();
            async move {
                log_verified(&event);
                tx.send(()).await?;
                Ok(())
            }
        })
        .await;
    info!(
        handlers = listener.handled_signatures().await,
        "Watching reports contract"
    );

    let listening = tokio::spawn(async move { listener.listen().await });

    draw(&store, search.as_deref()).await;
    loop {
        tokio::select! {
            Some(()) = changed_rx.recv() => draw(&store, search.as_deref()).await,
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    listening.abort();
    Ok(())
}

// Indexed strings arrive as their keccak hash, not the report id
fn log_created(event: &ReportCreated) {
    info!(
        report_id_hash = %event.reportId,
        creator = %event.creator,
        "Report created"
    );
}

fn log_verified(event: &ReportVerified) {
    info!(
        report_id_hash = %event.reportId,
        severity = event.severity,
        "Report verified"
    );
}

async fn draw<R: ReportsRead + ?Sized>(store: &ReportStore<R>, search: Option<&str>) {
    match load_dashboard(store, search).await {
        Ok(state) => println!("{}", DashboardView(&state)),
        Err(e) => error!("Failed to load reports: {e}"),
    }
}
