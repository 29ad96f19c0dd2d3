use serde::{Deserialize, Serialize};

use crate::contract::{SecurityKind, DEFAULT_CURRENCY};
use crate::duration::HistoryDuration;
use crate::models::WhatToShow;
use crate::timeframe::Timeframe;
use crate::timezone::OutputTimezone;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub ib: IbConnectionConfig,
    pub contract: ContractConfig,
    pub history: HistoryConfig,
}

/// Gateway/TWS connection. Ports: TWS paper 7497, TWS live 7496,
/// Gateway paper 4002, Gateway live 4001.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbConnectionConfig {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    pub symbol: String,
    pub security_type: SecurityKind,
    /// Routing exchange for stocks (SMART when unset); listing exchange for futures.
    pub exchange: Option<String>,
    pub currency: String,
    /// Futures only: YYYYMM or YYYYMMDD.
    pub contract_month: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub timeframe: Timeframe,
    pub duration: HistoryDuration,
    pub what_to_show: WhatToShow,
    pub timezone: OutputTimezone,
}

impl Default for IbConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4001,
            client_id: 77,
            connect_timeout_secs: 15,
        }
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            security_type: SecurityKind::Stock,
            exchange: None,
            currency: DEFAULT_CURRENCY.to_string(),
            contract_month: None,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::Day1,
            duration: HistoryDuration::years(1),
            what_to_show: WhatToShow::Trades,
            timezone: OutputTimezone::Market,
        }
    }
}
