//! Historical OHLCV download command.
//!
//! Connects to IB Gateway/TWS, qualifies the requested contract, downloads
//! bars for the planned window and writes them to CSV.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use ib_history_core::config_loader::DEFAULT_CONFIG_PATH;
use ib_history_core::{
    plan_window, request_warnings, AppConfig, ConfigLoader, ContractSpec, HistoricalBarSource,
    HistoryDuration, HistoryRequest, IbConnectionConfig, OutputTimezone, SecurityKind, Timeframe,
    WhatToShow, WindowMode,
};
use ib_history_data::{
    generate_filename, resolve_conflict, ConflictChoice, ConflictInfo, CsvStorage, OutputTarget,
};
use ib_history_ib::{IBClient, IBConfig, IbBarSource};
use std::path::PathBuf;

use crate::prompt::prompt_conflict_stdio;

/// Arguments for the historical download.
#[derive(Args, Debug, Clone, Default)]
pub struct FetchHistoryArgs {
    /// Symbol to download (default from config: SPY). Forex pairs as EURUSD.
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Bar size, e.g. "1 min", "5 mins", "1 hour", "1 day" (default: 1 day)
    #[arg(short, long)]
    pub timeframe: Option<Timeframe>,

    /// History duration, e.g. "30 D", "6 M", "1 Y" (default: 1 Y)
    #[arg(short, long)]
    pub duration: Option<HistoryDuration>,

    /// Output filename (auto-generated if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite existing files without prompting
    #[arg(long)]
    pub overwrite: bool,

    /// Output timezone: UTC, market (US/Eastern) or local (default: market)
    #[arg(long)]
    pub timezone: Option<OutputTimezone>,

    /// Start date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long = "start-date", visible_alias = "from")]
    pub start_date: Option<String>,

    /// End date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long = "end-date", visible_alias = "to")]
    pub end_date: Option<String>,

    /// Include extended trading hours (pre-market and after-hours)
    #[arg(long)]
    pub eth: bool,

    /// Security type: STK, CASH or FUT (default: STK)
    #[arg(long = "sec-type")]
    pub sec_type: Option<SecurityKind>,

    /// Exchange (stocks default to SMART; required for futures)
    #[arg(long)]
    pub exchange: Option<String>,

    /// Contract currency (default: USD)
    #[arg(long)]
    pub currency: Option<String>,

    /// Futures contract month, YYYYMM or YYYYMMDD
    #[arg(long = "contract-month")]
    pub contract_month: Option<String>,

    /// Data type: TRADES, MIDPOINT, BID, ASK or ADJUSTED_LAST (default: TRADES)
    #[arg(long = "what-to-show")]
    pub what_to_show: Option<WhatToShow>,

    /// Gateway/TWS host
    #[arg(long)]
    pub host: Option<String>,

    /// Gateway/TWS port (TWS 7497 paper / 7496 live, Gateway 4002 paper / 4001 live)
    #[arg(long)]
    pub port: Option<u16>,

    /// API client ID
    #[arg(long = "client-id")]
    pub client_id: Option<i32>,

    /// Config file path
    #[arg(short, long, env = "IBH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Settings after merging command-line arguments over configuration.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Symbol as typed, upper-cased (EURUSD rather than EUR).
    pub symbol: String,
    pub spec: ContractSpec,
    pub timeframe: Timeframe,
    pub default_duration: HistoryDuration,
    pub what_to_show: WhatToShow,
    pub timezone: OutputTimezone,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub extended_hours: bool,
    pub output: Option<PathBuf>,
    pub overwrite: bool,
    pub ib: IbConnectionConfig,
}

impl FetchSettings {
    /// Merges `args` over `config`.
    ///
    /// # Errors
    /// Returns an error if the contract parameters are invalid.
    pub fn resolve(args: &FetchHistoryArgs, config: &AppConfig) -> Result<Self> {
        let symbol = args
            .symbol
            .clone()
            .unwrap_or_else(|| config.contract.symbol.clone())
            .trim()
            .to_uppercase();
        let kind = args.sec_type.unwrap_or(config.contract.security_type);

        let spec = ContractSpec::build(
            kind,
            &symbol,
            args.exchange.as_deref().or(config.contract.exchange.as_deref()),
            Some(args.currency.as_deref().unwrap_or(&config.contract.currency)),
            args.contract_month
                .as_deref()
                .or(config.contract.contract_month.as_deref()),
        )?;

        let mut ib = config.ib.clone();
        if let Some(host) = &args.host {
            ib.host.clone_from(host);
        }
        if let Some(port) = args.port {
            ib.port = port;
        }
        if let Some(client_id) = args.client_id {
            ib.client_id = client_id;
        }

        Ok(Self {
            symbol,
            spec,
            timeframe: args.timeframe.unwrap_or(config.history.timeframe),
            default_duration: args.duration.unwrap_or(config.history.duration),
            what_to_show: args.what_to_show.unwrap_or(config.history.what_to_show),
            timezone: args.timezone.unwrap_or(config.history.timezone),
            start_date: args.start_date.clone(),
            end_date: args.end_date.clone(),
            extended_hours: args.eth,
            output: args.output.clone(),
            overwrite: args.overwrite,
            ib,
        })
    }
}

/// A planned download.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub request: HistoryRequest,
    pub output: PathBuf,
    pub warnings: Vec<String>,
}

/// Plans the request window, output path and warnings.
///
/// # Errors
/// Returns an error if the dates are invalid.
pub fn plan_fetch(settings: &FetchSettings, today: NaiveDate) -> Result<FetchPlan> {
    let window = plan_window(
        settings.start_date.as_deref(),
        settings.end_date.as_deref(),
        settings.default_duration,
        settings.extended_hours,
        today,
    )?;

    let output = settings.output.clone().unwrap_or_else(|| {
        PathBuf::from(generate_filename(
            &settings.symbol,
            settings.spec.kind,
            settings.spec.contract_month.as_deref(),
            window.duration,
            settings.timeframe,
            settings.extended_hours,
        ))
    });

    let warnings = request_warnings(settings.timeframe, window.duration);

    Ok(FetchPlan {
        request: HistoryRequest {
            window,
            timeframe: settings.timeframe,
            what_to_show: settings.what_to_show,
            use_rth: !settings.extended_hours,
        },
        output,
        warnings,
    })
}

/// How a download finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Saved { path: PathBuf, rows: usize },
    /// The terminal returned no bars.
    NoData,
    /// Bars were downloaded but the user declined to write them.
    Cancelled { bars: usize },
}

/// Qualifies the contract, downloads bars and writes the CSV.
///
/// `choose` is consulted only when the output file exists and overwrite
/// is off. It runs on a blocking thread.
///
/// # Errors
/// Returns an error if qualification, download or writing fails.
pub async fn download_and_save<S, F>(
    source: &S,
    settings: &FetchSettings,
    plan: &FetchPlan,
    choose: F,
) -> Result<FetchOutcome>
where
    S: HistoricalBarSource + ?Sized,
    F: FnOnce(&ConflictInfo) -> Result<ConflictChoice> + Send + 'static,
{
    tracing::info!(contract = %settings.spec.display_name(), "Qualifying contract");
    let contract = source.qualify(&settings.spec).await?;
    println!(
        "Contract qualified: {} on {} (conId: {})",
        contract.local_symbol, contract.exchange, contract.contract_id
    );

    print_request(settings, plan, &contract.symbol);

    let bars = source.historical_bars(&contract, &plan.request).await?;
    if bars.is_empty() {
        return Ok(FetchOutcome::NoData);
    }
    println!("\nSuccessfully received {} bars of data.", bars.len());

    let output = plan.output.clone();
    let overwrite = settings.overwrite;
    let target = tokio::task::spawn_blocking(move || resolve_conflict(&output, overwrite, choose))
        .await
        .context("File conflict prompt failed")??;

    let path = match target {
        OutputTarget::Write { path, .. } => path,
        OutputTarget::Cancelled => return Ok(FetchOutcome::Cancelled { bars: bars.len() }),
    };

    let zone = settings.timezone.resolve(&settings.symbol);
    let rows = CsvStorage::write_bars(&path, &bars, &zone, settings.timeframe)?;
    tracing::info!(path = %path.display(), rows, "Historical data saved");

    Ok(FetchOutcome::Saved { path, rows })
}

fn print_request(settings: &FetchSettings, plan: &FetchPlan, symbol: &str) {
    let request = &plan.request;
    println!("\nRequesting historical data for {symbol}:");
    println!("  Duration: {}", request.window.duration);
    println!("  Bar size: {}", request.timeframe);
    println!("  Data type: {}", request.what_to_show);
    println!("  Regular Trading Hours: {}", request.use_rth);
    if settings.extended_hours {
        println!("  Extended Hours: Included (pre-market and after-hours data)");
    }
    println!("  End DateTime: {}", request.window.end_text());
    if request.timeframe.is_intraday() {
        let zone = settings.timezone.resolve(&settings.symbol);
        println!("  Output timezone: {} ({})", settings.timezone, zone.label());
    }
}

/// Likely reasons for an empty response.
#[must_use]
pub fn no_data_reasons(timeframe: Timeframe) -> Vec<String> {
    let mut reasons = vec![
        "No data available for the requested contract or period.".to_string(),
        "Market data subscriptions might be required for this specific data.".to_string(),
        "Incorrect contract details or parameters.".to_string(),
        format!(
            "{timeframe} data may not be available if the duration is too short or data restrictions apply."
        ),
    ];
    if timeframe.is_small() {
        reasons.push(
            "Remember: Bars 30 seconds or smaller older than 6 months are not available from IBKR."
                .to_string(),
        );
    }
    reasons
}

fn print_banner(settings: &FetchSettings) {
    println!("IBKR Historical Data Downloader");
    println!("================================");
    println!("Symbol: {}", settings.symbol);
    println!("Timeframe: {}", settings.timeframe);
    println!("Duration: {}", settings.default_duration);
    println!("Timezone: {}", settings.timezone);
    if let Some(start) = &settings.start_date {
        println!("Start date: {start}");
    }
    if let Some(end) = &settings.end_date {
        println!("End date: {end}");
    }
    if settings.extended_hours {
        println!("Extended hours: Enabled");
    }
    if let Some(output) = &settings.output {
        println!("Output file: {}", output.display());
    }
    println!();
}

fn print_window(mode: &WindowMode, duration: HistoryDuration) {
    match mode {
        WindowMode::DateRange { start, end } => {
            println!("Date range mode: {start} to {end}");
            println!("Calculated duration: {duration}");
        }
        WindowMode::SingleDay { date } => println!("Single day mode: {date}"),
        WindowMode::DurationWithEnd { end } => {
            println!("Duration with end date: {duration} ending at {end}");
        }
        WindowMode::DurationOnly => {}
    }
}

/// Runs the download end to end against a live Gateway/TWS.
///
/// # Errors
/// Returns an error if configuration, arguments, connection, download or
/// writing fails.
pub async fn run_fetch_history(args: FetchHistoryArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let settings = FetchSettings::resolve(&args, &config)?;

    print_banner(&settings);

    let plan = plan_fetch(&settings, Local::now().date_naive())?;
    print_window(&plan.request.window.mode, plan.request.window.duration);
    for warning in &plan.warnings {
        println!("{warning}");
    }

    let ib_config = IBConfig::from(&settings.ib);
    println!(
        "Attempting to connect to IBKR at {} with Client ID {}...",
        ib_config.connection_url(),
        ib_config.client_id
    );
    let client = IBClient::connect(ib_config).await?;
    println!("Successfully connected to IBKR.");

    let source = IbBarSource::new(client);
    let outcome = download_and_save(&source, &settings, &plan, prompt_conflict_stdio).await;

    println!("\nDisconnecting from IBKR...");
    source.disconnect();

    match outcome? {
        FetchOutcome::Saved { path, rows } => {
            println!(
                "SUCCESS: {rows} bars of historical OHLCV data saved to: {}",
                path.display()
            );
        }
        FetchOutcome::NoData => {
            println!("\nNo historical data received. This could be due to several reasons:");
            for reason in no_data_reasons(settings.timeframe) {
                println!("  - {reason}");
            }
        }
        FetchOutcome::Cancelled { bars } => {
            println!("Operation cancelled by user.");
            println!(
                "Downloaded {bars} bars, but the file was not saved due to user cancellation."
            );
        }
    }

    Ok(())
}
