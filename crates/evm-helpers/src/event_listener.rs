// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    network::Ethereum,
    primitives::{Address, B256},
    providers::{Provider, ProviderBuilder},
    rpc::types::{BlockNumberOrTag, Filter, Log},
    sol_types::SolEvent,
};
use eyre::Result;
use futures::{future::FutureExt, stream::StreamExt};
use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info};

type EventHandler =
    Box<dyn Fn(&Log) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

/// Dispatches contract logs to handlers keyed by event signature
#[derive(Clone)]
pub struct EventListener {
    provider: Arc<dyn Provider<Ethereum>>,
    filter: Filter,
    handlers: Arc<RwLock<HashMap<B256, Vec<EventHandler>>>>,
}

impl EventListener {
    pub fn new(provider: Arc<dyn Provider<Ethereum>>, filter: Filter) -> Self {
        Self {
            provider,
            filter,
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add_event_handler<E, F, Fut>(&self, handler: F)
    where
        E: SolEvent + Send + Clone + 'static,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let wrapped_handler = Box::new(move |log: &Log| {
            let handler = Arc::clone(&handler);
            let log = log.clone();
            async move {
                let decoded = log.log_decode::<E>()?;
                handler(decoded.inner.data).await
            }
            .boxed()
        });

        self.handlers
            .write()
            .await
            .entry(E::SIGNATURE_HASH)
            .or_default()
            .push(wrapped_handler);
    }

    /// Number of event signatures with at least one handler
    pub async fn handled_signatures(&self) -> usize {
        self.handlers.read().await.len()
    }

    pub async fn listen(&self) -> Result<()> {
        let mut stream = self
            .provider
            .subscribe_logs(&self.filter)
            .await?
            .into_stream();
        info!("Listening for report events");
        while let Some(log) = stream.next().await {
            self.dispatch(&log).await;
        }
        Ok(())
    }

    async fn dispatch(&self, log: &Log) {
        let Some(topic0) = log.topic0().copied() else {
            return;
        };
        if let Some(handlers) = self.handlers.read().await.get(&topic0) {
            for handler in handlers {
                let fut = handler(log);
                tokio::spawn(async move {
                    if let Err(e) = fut.await {
                        error!("Error processing event 0x{:x}: {:?}", topic0, e);
                    }
                });
            }
        }
    }

    pub fn provider(&self) -> Arc<dyn Provider<Ethereum>> {
        self.provider.clone()
    }

    /// Create a listener for events emitted by the given contract, from the latest block on.
    pub async fn create_contract_listener(ws_url: &str, contract: Address) -> Result<Self> {
        let provider = Arc::new(ProviderBuilder::new().connect(ws_url).await?);
        let filter = Filter::new()
            .address(contract)
            .from_block(BlockNumberOrTag::Latest);
        Ok(EventListener::new(provider, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ReportCreated, ReportVerified};
    use alloy::primitives::U256;
    use tokio::sync::mpsc;

    fn listener() -> EventListener {
        let provider = ProviderBuilder::new().connect_http("http://localhost:8545".parse().unwrap());
        EventListener::new(Arc::new(provider), Filter::new())
    }

    fn log_of<E: SolEvent>(event: &E) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0xc0),
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_dispatches_by_signature() {
        let listener = listener();
        let (tx, mut rx) = mpsc::channel::<u32>(4);
        listener
            .add_event_handler(move |event: ReportVerified| {
                let tx = tx.clone();
                async move {
                    tx.send(event.severity).await?;
                    Ok(())
                }
            })
            .await;
        assert_eq!(listener.handled_signatures().await, 1);

        let created = ReportCreated {
            reportId: B256::repeat_byte(1),
            creator: Address::repeat_byte(2),
            timestamp: U256::from(1_700_000_000u64),
        };
        listener.dispatch(&log_of(&created)).await;

        let verified = ReportVerified {
            reportId: B256::repeat_byte(1),
            severity: 7,
        };
        listener.dispatch(&log_of(&verified)).await;

        assert_eq!(rx.recv().await, Some(7));
        assert!(rx.try_recv().is_err());
    }
}
