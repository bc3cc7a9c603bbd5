//! Data storage for the trade journal.
//!
//! This crate provides:
//! - `SQLite` connection pool with embedded migrations
//! - Row models and request payloads with validation
//! - Repositories for typed, tenant-scoped database access
//! - CSV import of option trades

pub mod database;
pub mod import;
pub mod models;
pub mod repositories;

pub use database::{now_ts, Database, KNOWN_TABLES};
pub use import::{OptionCsvImporter, ParsedOptions};

// Re-export models
pub use models::{
    CommentRecord, DateRange, DepositKind, DepositRecord, FedFundsRate, ImportSummary,
    ItemPriority, ItemRecord, ItemStatus, ItemUpdate, MarketPriceRecord, NetEquityRecord,
    NewComment, NewDeposit, NewItem, NewMarketPrice, NewNetEquity, NewOptionTrade, NewProject,
    NewStockTrade, NewUser, OptionFilter, OptionStatus, OptionSummary, OptionTradeRecord,
    OptionType, ProjectRecord, ProjectStatus, ProjectUpdate, Role, StockTradeFilter,
    StockTradeRecord, TradeSide, UserRecord, UserUpdate, ValidationError,
};

// Re-export repositories
pub use repositories::{
    DepositRepository, FedFundsRepository, MarketPriceRepository, NetEquityRepository,
    OptionTradeRepository, ProjectRepository, Repositories, StockTradeRepository, UserRepository,
};
