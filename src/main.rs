use clap::Parser;
use risk_alloc::cli::{Cli, Commands};
use risk_alloc::config::Config;
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    risk_alloc::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Size(args) => {
            args.execute(&config).await?;
        }
        Commands::Allocate(args) => {
            tracing::info!("Starting allocation cycle");
            args.execute(&config).await?;
        }
        Commands::Status(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            let limits = config.risk.effective_limits();
            println!("Current configuration:");
            println!(
                "  Risk: profile={:?}, equity={}",
                config.risk.profile, config.risk.initial_equity
            );
            println!(
                "  Limits: MaxDD={}%, DailyLoss={}, MaxPos={} ({:?}), MaxCorr={} ({:?}), MinCash={}, MaxLev={}x",
                limits.max_portfolio_drawdown_pct * dec!(100),
                limits.max_daily_loss,
                limits.max_concurrent_positions,
                limits.position_cap_scope,
                limits.max_correlation,
                limits.correlation_policy,
                limits.min_cash_reserve,
                limits.max_leverage
            );
            println!("  Sizing: {}", config.sizing.describe());
            println!(
                "  Allocation: {}, lookback={}d, threshold={}%, speed={}",
                config.allocation.method,
                config.allocation.lookback_days,
                config.allocation.rebalance_threshold * dec!(100),
                config.allocation.adaptation_speed
            );
            println!(
                "  Telemetry: level={}, format={:?}",
                config.telemetry.log_level, config.telemetry.log_format
            );
        }
    }

    Ok(())
}
