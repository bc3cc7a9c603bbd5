//! Database repositories for the trade journal.
//!
//! Each repository provides typed access to one table (or, for projects,
//! one table family). Tenant scoping is enforced by callers through the
//! `owner_id` arguments and the `owner_id` on returned rows.

pub mod deposit_repo;
pub mod fed_funds_repo;
pub mod market_price_repo;
pub mod net_equity_repo;
pub mod option_repo;
pub mod project_repo;
pub mod stock_trade_repo;
pub mod user_repo;

#[cfg(test)]
pub(crate) mod test_support;

pub use deposit_repo::DepositRepository;
pub use fed_funds_repo::FedFundsRepository;
pub use market_price_repo::MarketPriceRepository;
pub use net_equity_repo::NetEquityRepository;
pub use option_repo::OptionTradeRepository;
pub use project_repo::ProjectRepository;
pub use stock_trade_repo::StockTradeRepository;
pub use user_repo::UserRepository;

use sqlx::SqlitePool;

/// Creates all repositories from a single database pool.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub users: UserRepository,
    pub stock_trades: StockTradeRepository,
    pub options: OptionTradeRepository,
    pub deposits: DepositRepository,
    pub net_equity: NetEquityRepository,
    pub market_prices: MarketPriceRepository,
    pub fed_funds: FedFundsRepository,
    pub projects: ProjectRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            stock_trades: StockTradeRepository::new(pool.clone()),
            options: OptionTradeRepository::new(pool.clone()),
            deposits: DepositRepository::new(pool.clone()),
            net_equity: NetEquityRepository::new(pool.clone()),
            market_prices: MarketPriceRepository::new(pool.clone()),
            fed_funds: FedFundsRepository::new(pool.clone()),
            projects: ProjectRepository::new(pool),
        }
    }
}
