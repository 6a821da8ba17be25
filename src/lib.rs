//! risk-alloc: Risk-adjusted capital allocation across trading strategies
//!
//! This library provides the core components for:
//! - Position sizing (fixed dollar, percent risk, Kelly, fixed fractional, volatility adjusted)
//! - Portfolio risk limits shared safely across concurrent strategies
//! - Dynamic capital allocation with gradual rebalancing
//! - Configuration, logging and metrics

pub mod allocation;
pub mod cli;
pub mod config;
pub mod risk;
pub mod telemetry;
