//! Market data: contract qualification and historical bars.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ib_history_core::{
    ContractSpec, HistoricalBarSource, HistoryRequest, OhlcvBar, QualifiedContract,
};
use tracing::{debug, info};

use crate::client::IBClient;
use crate::error::IbError;
use crate::types::{from_ib_bar, historical_args, to_ib_contract};

impl IBClient {
    /// Resolve a contract description to the first matching IB contract.
    pub async fn qualify_contract(
        &self,
        spec: &ContractSpec,
    ) -> Result<(QualifiedContract, ibapi::prelude::Contract)> {
        let contract = to_ib_contract(spec);
        debug!(contract = %spec.display_name(), "Qualifying contract");

        let details = self
            .inner()
            .contract_details(&contract)
            .await
            .map_err(|e| IbError::Api(e.to_string()))
            .with_context(|| format!("Contract details request failed for {}", spec.display_name()))?;

        let first = details
            .into_iter()
            .next()
            .ok_or_else(|| IbError::ContractNotQualified {
                contract: spec.display_name(),
            })?;

        let resolved = first.contract;
        let qualified = QualifiedContract {
            contract_id: resolved.contract_id,
            symbol: resolved.symbol.to_string(),
            local_symbol: resolved.local_symbol.to_string(),
            exchange: resolved.exchange.to_string(),
        };

        info!(
            local_symbol = %qualified.local_symbol,
            exchange = %qualified.exchange,
            con_id = qualified.contract_id,
            "Contract qualified"
        );
        Ok((qualified, resolved))
    }

    /// Fetch historical bars for an already-resolved contract.
    pub async fn fetch_bars(
        &self,
        contract: &ibapi::prelude::Contract,
        request: &HistoryRequest,
    ) -> Result<Vec<OhlcvBar>> {
        let args = historical_args(request)?;

        debug!(
            end = %request.window.end_text(),
            duration = %request.window.duration,
            bar_size = %request.timeframe,
            what_to_show = %request.what_to_show,
            use_rth = request.use_rth,
            "Requesting historical data"
        );

        let data = self
            .inner()
            .historical_data(
                contract,
                args.end,
                args.duration,
                args.bar_size,
                args.what_to_show,
                args.trading_hours,
            )
            .await
            .map_err(|e| IbError::Api(e.to_string()))
            .context("Historical data request failed")?;

        let bars = data
            .bars
            .iter()
            .map(from_ib_bar)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = bars.len(), "Historical bars received");
        Ok(bars)
    }
}

/// Bar source backed by a live Gateway/TWS connection.
///
/// Keeps the resolved ibapi contract from [`HistoricalBarSource::qualify`]
/// so the history request uses the terminal's own contract definition.
pub struct IbBarSource {
    client: IBClient,
    resolved: tokio::sync::Mutex<Option<(i32, ibapi::prelude::Contract)>>,
}

impl IbBarSource {
    pub fn new(client: IBClient) -> Self {
        Self {
            client,
            resolved: tokio::sync::Mutex::new(None),
        }
    }

    /// Release the underlying connection.
    pub fn disconnect(self) {
        self.client.disconnect();
    }
}

#[async_trait]
impl HistoricalBarSource for IbBarSource {
    async fn qualify(&self, spec: &ContractSpec) -> Result<QualifiedContract> {
        let (qualified, contract) = self.client.qualify_contract(spec).await?;
        *self.resolved.lock().await = Some((qualified.contract_id, contract));
        Ok(qualified)
    }

    async fn historical_bars(
        &self,
        contract: &QualifiedContract,
        request: &HistoryRequest,
    ) -> Result<Vec<OhlcvBar>> {
        let ib_contract = match self.resolved.lock().await.as_ref() {
            Some((id, c)) if *id == contract.contract_id => c.clone(),
            _ => ibapi::prelude::Contract {
                contract_id: contract.contract_id,
                exchange: contract.exchange.as_str().into(),
                ..Default::default()
            },
        };
        self.client.fetch_bars(&ib_contract, request).await
    }
}
