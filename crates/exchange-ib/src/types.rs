//! Conversions between request types and ibapi types.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use ib_history_core::{
    ContractSpec, DurationUnit, HistoryDuration, HistoryRequest, OhlcvBar, SecurityKind, Timeframe,
    WhatToShow,
};
use ibapi::market_data::historical::{Duration as IbDuration, ToDuration};
use ibapi::prelude::{Contract, HistoricalBarSize, HistoricalWhatToShow, SecurityType, TradingHours};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::error::IbError;

/// Timezone in which request end times are expressed.
pub const MARKET_TZ: Tz = chrono_tz::US::Eastern;

/// Build an ibapi contract from a contract description.
pub fn to_ib_contract(spec: &ContractSpec) -> Contract {
    let security_type = match spec.kind {
        SecurityKind::Stock => SecurityType::Stock,
        SecurityKind::Forex => SecurityType::ForexPair,
        SecurityKind::Future => SecurityType::Future,
    };

    Contract {
        security_type,
        symbol: spec.symbol.as_str().into(),
        exchange: spec.exchange.as_str().into(),
        currency: spec.currency.as_str().into(),
        last_trade_date_or_contract_month: spec
            .contract_month
            .clone()
            .unwrap_or_default()
            .into(),
        ..Default::default()
    }
}

pub fn to_ib_bar_size(timeframe: Timeframe) -> HistoricalBarSize {
    match timeframe {
        Timeframe::Sec1 => HistoricalBarSize::Sec,
        Timeframe::Sec5 => HistoricalBarSize::Sec5,
        Timeframe::Sec10 => HistoricalBarSize::Sec10,
        Timeframe::Sec15 => HistoricalBarSize::Sec15,
        Timeframe::Sec30 => HistoricalBarSize::Sec30,
        Timeframe::Min1 => HistoricalBarSize::Min,
        Timeframe::Min2 => HistoricalBarSize::Min2,
        Timeframe::Min3 => HistoricalBarSize::Min3,
        Timeframe::Min5 => HistoricalBarSize::Min5,
        Timeframe::Min10 => HistoricalBarSize::Min10,
        Timeframe::Min15 => HistoricalBarSize::Min15,
        Timeframe::Min20 => HistoricalBarSize::Min20,
        Timeframe::Min30 => HistoricalBarSize::Min30,
        Timeframe::Hour1 => HistoricalBarSize::Hour,
        Timeframe::Hour2 => HistoricalBarSize::Hour2,
        Timeframe::Hour3 => HistoricalBarSize::Hour3,
        Timeframe::Hour4 => HistoricalBarSize::Hour4,
        Timeframe::Hour8 => HistoricalBarSize::Hour8,
        Timeframe::Day1 => HistoricalBarSize::Day,
        Timeframe::Week1 => HistoricalBarSize::Week,
        Timeframe::Month1 => HistoricalBarSize::Month,
    }
}

pub fn to_ib_what_to_show(what: WhatToShow) -> HistoricalWhatToShow {
    match what {
        WhatToShow::Trades => HistoricalWhatToShow::Trades,
        WhatToShow::Midpoint => HistoricalWhatToShow::MidPoint,
        WhatToShow::Bid => HistoricalWhatToShow::Bid,
        WhatToShow::Ask => HistoricalWhatToShow::Ask,
        WhatToShow::AdjustedLast => HistoricalWhatToShow::AdjustedLast,
    }
}

pub fn to_ib_trading_hours(use_rth: bool) -> TradingHours {
    if use_rth {
        TradingHours::Regular
    } else {
        TradingHours::Extended
    }
}

pub fn to_ib_duration(duration: HistoryDuration) -> IbDuration {
    let amount = i32::try_from(duration.amount).unwrap_or(i32::MAX);
    match duration.unit {
        DurationUnit::Seconds => amount.seconds(),
        DurationUnit::Days => amount.days(),
        DurationUnit::Weeks => amount.weeks(),
        DurationUnit::Months => amount.months(),
        DurationUnit::Years => amount.years(),
    }
}

/// Interpret a naive market-time end as an instant.
///
/// On the autumn DST overlap the earlier instant is used. A time inside the
/// spring-forward gap is moved forward by the skipped hour (02:30 becomes
/// 03:30 EDT).
pub fn market_end_to_utc(end: NaiveDateTime) -> Result<DateTime<Utc>, IbError> {
    MARKET_TZ
        .from_local_datetime(&end)
        .earliest()
        .or_else(|| {
            MARKET_TZ
                .from_local_datetime(&(end + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| IbError::InvalidEndTime(format!("{end} does not exist in {MARKET_TZ}")))
}

pub fn to_offset_datetime(dt: DateTime<Utc>) -> Result<OffsetDateTime, IbError> {
    OffsetDateTime::from_unix_timestamp(dt.timestamp())
        .map_err(|e| IbError::InvalidEndTime(e.to_string()))
}

/// Arguments for `Client::historical_data`, in call order.
pub struct HistoricalArgs {
    pub end: Option<OffsetDateTime>,
    pub duration: IbDuration,
    pub bar_size: HistoricalBarSize,
    pub what_to_show: Option<HistoricalWhatToShow>,
    pub trading_hours: TradingHours,
}

/// Translate a request into `historical_data` arguments.
pub fn historical_args(request: &HistoryRequest) -> Result<HistoricalArgs, IbError> {
    Ok(HistoricalArgs {
        end: Some(to_offset_datetime(market_end_to_utc(request.window.end)?)?),
        duration: to_ib_duration(request.window.duration),
        bar_size: to_ib_bar_size(request.timeframe),
        what_to_show: Some(to_ib_what_to_show(request.what_to_show)),
        trading_hours: to_ib_trading_hours(request.use_rth),
    })
}

fn price(value: f64, field: &str) -> Result<Decimal, IbError> {
    Decimal::from_f64(value).ok_or_else(|| IbError::InvalidBar(format!("{field} = {value}")))
}

/// Convert an ibapi bar to an [`OhlcvBar`].
pub fn from_ib_bar(bar: &ibapi::market_data::historical::Bar) -> Result<OhlcvBar, IbError> {
    let timestamp = DateTime::<Utc>::from_timestamp(bar.date.unix_timestamp(), bar.date.nanosecond())
        .ok_or_else(|| IbError::InvalidBar(format!("date = {}", bar.date)))?;

    Ok(OhlcvBar {
        timestamp,
        open: price(bar.open, "open")?,
        high: price(bar.high, "high")?,
        low: price(bar.low, "low")?,
        close: price(bar.close, "close")?,
        // Volume is -1 for series without volume (MIDPOINT, BID, ASK).
        volume: price(bar.volume.max(0.0), "volume")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stock_contract() {
        let contract = to_ib_contract(&ContractSpec::stock("spy", "SMART", "USD"));
        assert_eq!(contract.security_type, SecurityType::Stock);
        assert_eq!(contract.symbol.to_string(), "SPY");
        assert_eq!(contract.exchange.to_string(), "SMART");
        assert_eq!(contract.currency.to_string(), "USD");
    }

    #[test]
    fn test_forex_contract() {
        let contract = to_ib_contract(&ContractSpec::forex("EURUSD").unwrap());
        assert_eq!(contract.security_type, SecurityType::ForexPair);
        assert_eq!(contract.symbol.to_string(), "EUR");
        assert_eq!(contract.exchange.to_string(), "IDEALPRO");
    }

    #[test]
    fn test_future_contract_carries_month() {
        let spec = ContractSpec::future("ES", Some("202412"), Some("CME"), "USD").unwrap();
        let contract = to_ib_contract(&spec);
        assert_eq!(contract.security_type, SecurityType::Future);
        assert_eq!(
            contract.last_trade_date_or_contract_month.to_string(),
            "202412"
        );
    }

    #[test]
    fn test_every_timeframe_maps() {
        for tf in Timeframe::ALL {
            let _ = to_ib_bar_size(tf);
        }
    }

    #[test]
    fn test_market_end_converts_from_eastern() {
        let winter = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap();
        assert_eq!(
            market_end_to_utc(winter).unwrap().to_rfc3339(),
            "2024-01-15T21:00:00+00:00"
        );

        let summer = NaiveDate::from_ymd_opt(2024, 7, 15)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap();
        assert_eq!(
            market_end_to_utc(summer).unwrap().to_rfc3339(),
            "2024-07-15T20:00:00+00:00"
        );
    }

    #[test]
    fn test_spring_forward_gap_moves_past_skipped_hour() {
        // Extended-hours end for Saturday 2024-03-09 lands on 02:00 the next day.
        let gap = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();
        assert_eq!(
            market_end_to_utc(gap).unwrap().to_rfc3339(),
            "2024-03-10T07:00:00+00:00"
        );

        let inside = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(
            market_end_to_utc(inside).unwrap().to_rfc3339(),
            "2024-03-10T07:30:00+00:00"
        );
    }

    #[test]
    fn test_extended_hours_window_on_dst_weekend_resolves() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let window = ib_history_core::plan_window(
            Some("2024-03-09"),
            None,
            HistoryDuration::years(1),
            true,
            today,
        )
        .unwrap();
        assert_eq!(window.end_text(), "20240310 02:00:00");
        assert_eq!(
            market_end_to_utc(window.end).unwrap().to_rfc3339(),
            "2024-03-10T07:00:00+00:00"
        );
    }

    #[test]
    fn test_historical_args_from_request() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let request = HistoryRequest {
            window: ib_history_core::plan_window(
                Some("2024-01-15"),
                None,
                HistoryDuration::years(1),
                false,
                today,
            )
            .unwrap(),
            timeframe: Timeframe::Min1,
            what_to_show: WhatToShow::Midpoint,
            use_rth: true,
        };

        let args = historical_args(&request).unwrap();
        assert_eq!(
            args.end.map(|end| end.unix_timestamp()),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 21, 0, 0).unwrap().timestamp())
        );
        assert!(matches!(
            args.what_to_show,
            Some(HistoricalWhatToShow::MidPoint)
        ));
        assert!(matches!(args.bar_size, HistoricalBarSize::Min));
        assert!(matches!(args.trading_hours, TradingHours::Regular));
    }

    #[test]
    fn test_autumn_overlap_uses_earlier_instant() {
        let overlap = NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        assert_eq!(
            market_end_to_utc(overlap).unwrap().to_rfc3339(),
            "2024-11-03T05:30:00+00:00"
        );
    }

    #[test]
    fn test_offset_datetime_matches_instant() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 15, 21, 0, 0).unwrap();
        let odt = to_offset_datetime(utc).unwrap();
        assert_eq!(odt.unix_timestamp(), utc.timestamp());
    }

    #[test]
    fn test_bar_conversion() {
        let bar = ibapi::market_data::historical::Bar {
            date: OffsetDateTime::from_unix_timestamp(1_705_329_000).unwrap(),
            open: 470.1,
            high: 471.0,
            low: 469.55,
            close: 470.8,
            volume: 12500.0,
            wap: 470.4,
            count: 42,
        };
        let converted = from_ib_bar(&bar).unwrap();
        assert_eq!(converted.timestamp.timestamp(), 1_705_329_000);
        assert_eq!(converted.open, dec!(470.1));
        assert_eq!(converted.low, dec!(469.55));
        assert_eq!(converted.volume, dec!(12500));
    }

    #[test]
    fn test_bar_conversion_rejects_nan() {
        let bar = ibapi::market_data::historical::Bar {
            date: OffsetDateTime::from_unix_timestamp(1_705_329_000).unwrap(),
            open: f64::NAN,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
            wap: 1.0,
            count: 1,
        };
        assert!(matches!(from_ib_bar(&bar), Err(IbError::InvalidBar(_))));
    }
}
