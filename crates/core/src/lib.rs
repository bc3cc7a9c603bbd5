//! Core types and calculations for the trade journal.
//!
//! - Application configuration and its figment loader
//! - Time-weighted return performance metrics
//! - Margin-interest estimation
//! - Average-cost stock position tracking

pub mod config;
pub mod config_loader;
pub mod margin;
pub mod performance;
pub mod position;
pub mod report;

pub use config::{
    AppConfig, AuthConfig, DatabaseConfig, MarginConfig, MarginTierConfig, PerformanceConfig,
    ServerConfig,
};
pub use config_loader::ConfigLoader;
pub use margin::{
    FedFundsSchedule, InterestEstimate, MarginError, MarginInterestEstimator, MarginTier,
    MarginTiers,
};
pub use performance::{
    benchmark_returns, time_weighted_return, CashFlow, EquityPoint, PerformanceError,
    PerformanceParams, PerformanceReport,
};
pub use position::{Fill, Position, PositionTracker, Side};
pub use report::ReportFormatter;
