pub mod auth;
pub mod error;
pub mod handlers;
pub mod health;
pub mod server;
pub mod state;

pub use auth::{hash_password, verify_password, AuthUser, Claims, TokenSigner};
pub use error::ApiError;
pub use health::{HealthResponse, SymbolHealth, TableCount};
pub use server::ApiServer;
pub use state::AppState;
