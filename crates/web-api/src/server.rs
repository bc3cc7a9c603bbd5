use crate::{
    handlers::{
        auth, deposits, margin, market_data, net_equity, options, projects, stock_trades, users,
    },
    health,
    state::AppState,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/health", get(health::health))
            // Session
            .route("/api/auth/login", post(auth::login))
            .route("/api/auth/logout", post(auth::logout))
            .route("/api/auth/me", get(auth::me))
            // Users
            .route("/api/users", get(users::list_users).post(users::create_user))
            .route(
                "/api/users/:id",
                put(users::update_user).delete(users::delete_user),
            )
            .route("/api/users/:id/password", put(users::change_password))
            // Stock trades
            .route(
                "/api/stock-trades",
                get(stock_trades::list_trades).post(stock_trades::create_trade),
            )
            .route("/api/stock-trades/positions", get(stock_trades::positions))
            .route(
                "/api/stock-trades/:id",
                put(stock_trades::update_trade).delete(stock_trades::delete_trade),
            )
            // Options
            .route(
                "/api/options",
                get(options::list_options).post(options::create_option),
            )
            .route("/api/options/summary", get(options::summary))
            .route("/api/options/import", post(options::import_options))
            .route(
                "/api/options/:id",
                put(options::update_option).delete(options::delete_option),
            )
            // Deposits
            .route(
                "/api/deposits",
                get(deposits::list_deposits).post(deposits::create_deposit),
            )
            .route(
                "/api/deposits/:id",
                put(deposits::update_deposit).delete(deposits::delete_deposit),
            )
            // Net equity and performance
            .route(
                "/api/net-equity",
                get(net_equity::list_net_equity).post(net_equity::upsert_net_equity),
            )
            .route("/api/net-equity/performance", get(net_equity::performance))
            .route("/api/net-equity/:id", delete(net_equity::delete_net_equity))
            .route("/api/margin-interest", get(margin::margin_interest))
            // Market data
            .route(
                "/api/market-data",
                get(market_data::list_symbols).post(market_data::upsert_prices),
            )
            .route(
                "/api/market-data/fed-funds",
                get(market_data::list_fed_funds).post(market_data::upsert_fed_funds),
            )
            .route("/api/market-data/:symbol", get(market_data::get_prices))
            // Projects
            .route(
                "/api/projects",
                get(projects::list_projects).post(projects::create_project),
            )
            .route(
                "/api/projects/:id",
                get(projects::get_project)
                    .put(projects::update_project)
                    .delete(projects::delete_project),
            )
            .route(
                "/api/projects/:id/items",
                get(projects::list_items).post(projects::create_item),
            )
            .route(
                "/api/items/:id",
                put(projects::update_item).delete(projects::delete_item),
            )
            .route(
                "/api/items/:id/comments",
                get(projects::list_comments).post(projects::create_comment),
            )
            .route("/api/comments/:id", delete(projects::delete_comment))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
