//! Route handlers, one module per resource.

pub mod auth;
pub mod deposits;
pub mod margin;
pub mod market_data;
pub mod net_equity;
pub mod options;
pub mod projects;
pub mod stock_trades;
pub mod users;

use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;

use crate::error::ApiError;

/// JSON body whose rejections render as `{"error": ...}` with status 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections render as `{"error": ...}` with status 400.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `?user_id=` lets an admin act on another tenant's rows.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub user_id: Option<i64>,
}
