//! Size command implementation

use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::OutputFormat;
use crate::config::Config;
use crate::risk::{compare_methods, SizingMethod, SizingRequest};

#[derive(Args, Debug)]
pub struct SizeArgs {
    /// Entry price per unit
    #[arg(long)]
    pub entry: Decimal,

    /// Stop-loss price per unit
    #[arg(long)]
    pub stop: Option<Decimal>,

    /// Volatility reference (e.g. ATR) for volatility-adjusted sizing
    #[arg(long)]
    pub volatility: Option<Decimal>,

    /// Account value (defaults to risk.initial_equity)
    #[arg(long)]
    pub account: Option<Decimal>,

    /// Sizing method name; defaults to the configured method
    #[arg(long)]
    pub method: Option<String>,

    /// Size with every standard method plus the configured one
    #[arg(long)]
    pub compare: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl SizeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let account = self.account.unwrap_or(config.risk.initial_equity);
        let mut request = SizingRequest::new(account, self.entry);
        if let Some(stop) = self.stop {
            request = request.with_stop(stop);
        }
        if let Some(volatility) = self.volatility {
            request = request.with_volatility(volatility);
        }

        if self.compare {
            let mut methods = standard_methods();
            if !methods.contains(&config.sizing) {
                methods.push(config.sizing.clone());
            }
            let results = compare_methods(&request, &methods);
            match self.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                OutputFormat::Table => {
                    println!("{:<45} {:>10} {:>14}", "Method", "Quantity", "Value");
                    for (method, quantity) in &results {
                        println!(
                            "{:<45} {:>10} {:>14.2}",
                            method,
                            quantity,
                            Decimal::from(*quantity) * self.entry
                        );
                    }
                }
            }
            return Ok(());
        }

        let method = self.resolve_method(config)?;
        let quantity = method.size(&request)?;
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "method": method.mode_name(),
                    "quantity": quantity,
                    "position_value": Decimal::from(quantity) * self.entry,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Method:          {}", method.describe());
                println!("Account:         {:.2}", account);
                println!("Entry:           {}", self.entry);
                if let Some(stop) = self.stop {
                    println!("Stop:            {}", stop);
                }
                println!("Quantity:        {}", quantity);
                println!("Position Value:  {:.2}", Decimal::from(quantity) * self.entry);
            }
        }
        Ok(())
    }

    /// Configured method, or the named one with standard parameters
    fn resolve_method(&self, config: &Config) -> anyhow::Result<SizingMethod> {
        let Some(name) = &self.method else {
            return Ok(config.sizing.clone());
        };
        if config.sizing.mode_name() == name.as_str() {
            return Ok(config.sizing.clone());
        }
        standard_methods()
            .into_iter()
            .find(|method| method.mode_name() == name.as_str())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Sizing method '{}' is not configured and has no standard parameters",
                    name
                )
            })
    }
}

/// Methods that need no strategy statistics
fn standard_methods() -> Vec<SizingMethod> {
    vec![
        SizingMethod::FixedDollarRisk {
            risk_amount: dec!(1000),
        },
        SizingMethod::PercentRisk {
            risk_fraction: dec!(0.01),
            max_position_fraction: dec!(0.20),
        },
        SizingMethod::FixedFractional {
            fraction: dec!(0.05),
        },
        SizingMethod::VolatilityAdjusted {
            risk_fraction: dec!(0.01),
            atr_multiplier: dec!(2.0),
            max_position_fraction: dec!(0.20),
        },
    ]
}
