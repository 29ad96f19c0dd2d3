use crate::contract::ContractSpec;
use crate::models::{HistoryRequest, OhlcvBar, QualifiedContract};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait HistoricalBarSource: Send + Sync {
    /// Resolves `spec` to a single tradable contract.
    async fn qualify(&self, spec: &ContractSpec) -> Result<QualifiedContract>;

    /// Downloads bars for `contract`. An empty vector means the terminal had no data.
    async fn historical_bars(
        &self,
        contract: &QualifiedContract,
        request: &HistoryRequest,
    ) -> Result<Vec<OhlcvBar>>;
}
