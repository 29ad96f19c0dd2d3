use clap::Parser;

use ib_history_cli::commands::{run_fetch_history, FetchHistoryArgs};

const AFTER_HELP: &str = r#"Examples:
  ib-history -s SPY -t "1 min" -d "30 D"           # 30 days of 1-minute SPY data
  ib-history -s AAPL -t "5 mins" -d "1 Y"          # 1 year of 5-minute AAPL data
  ib-history -s EURUSD --sec-type CASH -t "1 hour" -d "6 M"
  ib-history -s ES --sec-type FUT --exchange CME --contract-month 202412 -t "1 day" -d "2 Y"

  # Date range examples:
  ib-history --from 2024-01-15 -t "1 min"          # Single day of 1-minute data
  ib-history --from 2024-01-01 --to 2024-01-31 -t "5 mins"
  ib-history --to 2024-12-31 -d "30 D" -t "1 hour"

  # Extended hours:
  ib-history -s SPY -t "1 min" -d "1 D" --eth

Valid timeframes: 1 secs, 5 secs, 10 secs, 15 secs, 30 secs, 1 min, 2 mins,
3 mins, 5 mins, 10 mins, 15 mins, 20 mins, 30 mins, 1 hour, 2 hours, 3 hours,
4 hours, 8 hours, 1 day, 1 week, 1 month

Note: Bars 30 seconds or smaller older than 6 months are not available from IBKR."#;

#[derive(Parser)]
#[command(name = "ib-history")]
#[command(about = "Download historical OHLCV data from Interactive Brokers", long_about = None)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    #[command(flatten)]
    args: FetchHistoryArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tokio::select! {
        result = run_fetch_history(cli.args) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nOperation cancelled by user.");
            std::process::exit(1);
        }
    }
}
