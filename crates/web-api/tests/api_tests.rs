//! End-to-end HTTP tests against an in-memory database.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use trade_journal_core::AppConfig;
use trade_journal_data::{Database, NewUser, Role};
use trade_journal_web_api::{hash_password, ApiServer, AppState};

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::in_memory().await.unwrap();
        let mut config = AppConfig::default();
        config.auth.token_secret = "test-secret".to_string();
        config.auth.bcrypt_cost = 4;
        let state = AppState::new(db, config);
        let router = ApiServer::new(state.clone()).router();
        Self { router, state }
    }

    async fn add_user(&self, email: &str, password: &str, role: Role) -> i64 {
        let hash = hash_password(password.to_string(), 4).await.unwrap();
        self.state
            .repos
            .users
            .create(&NewUser {
                email: email.to_string(),
                name: email.split('@').next().unwrap().to_string(),
                password_hash: hash,
                role,
            })
            .await
            .unwrap()
            .id
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

fn option_row(underlying: &str, strike: f64, open_date: &str) -> Value {
    json!({
        "underlying": underlying,
        "option_type": "put",
        "side": "sell",
        "strike": strike,
        "expiration": "2024-08-16",
        "quantity": 1,
        "premium": 2.5,
        "open_date": open_date
    })
}

#[tokio::test]
async fn test_login_sets_cookie_and_me_returns_user() {
    let app = TestApp::new().await;
    app.add_user("trader@example.com", "password123", Role::User).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "Trader@Example.com", "password": "password123" }).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    // The cookie alone authenticates.
    let token_pair = cookie.split(';').next().unwrap().to_string();
    let me = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, token_pair)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(me).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "trader@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.add_user("trader@example.com", "password123", Role::User).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "trader@example.com", "password": "nope-nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/api/stock-trades", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app
        .request(Method::GET, "/api/stock-trades", Some("garbage.token.value"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tenants_are_isolated_and_admins_are_not() {
    let app = TestApp::new().await;
    let alice_id = app.add_user("alice@example.com", "password123", Role::User).await;
    app.add_user("bob@example.com", "password123", Role::User).await;
    app.add_user("root@example.com", "password123", Role::Admin).await;
    let alice = app.login("alice@example.com", "password123").await;
    let bob = app.login("bob@example.com", "password123").await;
    let admin = app.login("root@example.com", "password123").await;

    let (status, trade) = app
        .request(
            Method::POST,
            "/api/stock-trades",
            Some(&alice),
            Some(json!({
                "symbol": "aapl",
                "side": "buy",
                "quantity": 10,
                "price": 150.0,
                "trade_date": "2024-03-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(trade["symbol"], "AAPL");
    let trade_id = trade["id"].as_i64().unwrap();

    // Bob sees nothing of Alice's and cannot touch her trade.
    let (_, listed) = app.request(Method::GET, "/api/stock-trades", Some(&bob), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/stock-trades/{trade_id}"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .request(
            Method::GET,
            &format!("/api/stock-trades?user_id={alice_id}"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin can read and delete it.
    let (status, listed) = app
        .request(
            Method::GET,
            &format!("/api/stock-trades?user_id={alice_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/stock-trades/{trade_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Missing rows are 404.
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/stock-trades/{trade_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = TestApp::new().await;
    app.add_user("alice@example.com", "password123", Role::User).await;
    let admin_id = app.add_user("root@example.com", "password123", Role::Admin).await;
    let alice = app.login("alice@example.com", "password123").await;
    let admin = app.login("root@example.com", "password123").await;

    let (status, _) = app.request(Method::GET, "/api/users", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let new_user = json!({ "email": "carol@example.com", "name": "Carol", "password": "password123" });
    let (status, created) = app
        .request(Method::POST, "/api/users", Some(&admin), Some(new_user.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "user");

    let (status, _) = app
        .request(Method::POST, "/api/users", Some(&admin), Some(new_user))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/users/{admin_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("own account"));
}

#[tokio::test]
async fn test_own_password_change_requires_current_password() {
    let app = TestApp::new().await;
    let alice_id = app.add_user("alice@example.com", "password123", Role::User).await;
    let alice = app.login("alice@example.com", "password123").await;
    let uri = format!("/api/users/{alice_id}/password");

    let (status, _) = app
        .request(
            Method::PUT,
            &uri,
            Some(&alice),
            Some(json!({ "current_password": "wrong-one", "new_password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::PUT,
            &uri,
            Some(&alice),
            Some(json!({ "current_password": "password123", "new_password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    app.login("alice@example.com", "brand-new-pass").await;
}

#[tokio::test]
async fn test_option_import_skips_duplicates() {
    let app = TestApp::new().await;
    app.add_user("alice@example.com", "password123", Role::User).await;
    let alice = app.login("alice@example.com", "password123").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/options",
            Some(&alice),
            Some(option_row("SPY", 500.0, "2024-07-01")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/options",
            Some(&alice),
            Some(option_row("spy", 500.0, "2024-07-01")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let rows = json!([
        option_row("SPY", 500.0, "2024-07-01"),
        option_row("QQQ", 440.0, "2024-07-02"),
        { "underlying": "IWM", "option_type": "straddle" },
    ]);
    let (status, summary) = app
        .request(Method::POST, "/api/options/import", Some(&alice), Some(rows))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["skipped"], 1);
    assert_eq!(summary["failed"], 1);

    // Row numbers in failures follow the submitted array, not the rows that parsed.
    let mut zero_quantity = option_row("DIA", 390.0, "2024-07-05");
    zero_quantity["quantity"] = json!(0);
    let rows = json!([
        { "underlying": "IWM", "option_type": "straddle" },
        zero_quantity,
    ]);
    let (status, summary) = app
        .request(Method::POST, "/api/options/import", Some(&alice), Some(rows))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["failed"], 2);
    let errors: Vec<&str> = summary["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(errors.iter().any(|e| e.starts_with("row 1:")), "{errors:?}");
    assert!(errors.iter().any(|e| e.starts_with("row 2:")), "{errors:?}");

    let csv = "underlying,option_type,side,strike,expiration,quantity,premium,fees,open_date,status,close_date,close_price,notes\n\
               QQQ,put,sell,440,2024-08-16,1,2.5,0,2024-07-02,,,,\n\
               AAPL,call,buy,200,2024-08-16,2,1.1,1.3,2024-07-03,,,,\n";
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/options/import")
        .header(header::AUTHORIZATION, format!("Bearer {alice}"))
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv))
        .unwrap();
    let (status, summary) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["skipped"], 1);

    let (_, listed) = app.request(Method::GET, "/api/options", Some(&alice), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);

    let (status, summary) = app
        .request(Method::GET, "/api/options/summary", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["open_positions"], 3);
}

#[tokio::test]
async fn test_invalid_payloads_are_bad_requests() {
    let app = TestApp::new().await;
    app.add_user("alice@example.com", "password123", Role::User).await;
    let alice = app.login("alice@example.com", "password123").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/stock-trades",
            Some(&alice),
            Some(json!({
                "symbol": " ",
                "side": "buy",
                "quantity": 1,
                "price": 1.0,
                "trade_date": "2024-03-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("symbol"));

    let (status, body) = app
        .request(
            Method::POST,
            "/api/stock-trades",
            Some(&alice),
            Some(json!({
                "symbol": "AAPL",
                "side": "short",
                "quantity": 1,
                "price": 1.0,
                "trade_date": "2024-03-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app
        .request(
            Method::GET,
            "/api/deposits?from=2024-02-01&to=2024-01-01",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_performance_needs_two_snapshots_and_neutralizes_deposits() {
    let app = TestApp::new().await;
    app.add_user("alice@example.com", "password123", Role::User).await;
    let alice = app.login("alice@example.com", "password123").await;

    app.request(
        Method::POST,
        "/api/net-equity",
        Some(&alice),
        Some(json!({ "record_date": "2024-01-02", "net_equity": 10000.0 })),
    )
    .await;
    let (status, body) = app
        .request(Method::GET, "/api/net-equity/performance", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("insufficient data"));

    // A 5k deposit with no market movement.
    app.request(
        Method::POST,
        "/api/deposits",
        Some(&alice),
        Some(json!({ "deposit_date": "2024-01-03", "amount": 5000.0, "kind": "deposit" })),
    )
    .await;
    let (status, _) = app
        .request(
            Method::POST,
            "/api/net-equity",
            Some(&alice),
            Some(json!([
                { "record_date": "2024-01-03", "net_equity": 15000.0 },
                { "record_date": "2024-01-04", "net_equity": 15000.0 }
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::GET,
            "/api/net-equity/performance?benchmark=SPY",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["portfolio"]["cumulative_return"].as_f64().unwrap().abs() < 1e-12);
    assert!((body["portfolio"]["net_flows"].as_f64().unwrap() - 5000.0).abs() < 1e-9);
    assert!(body["benchmark"].is_null());
}

#[tokio::test]
async fn test_margin_interest_uses_prior_month_rate() {
    let app = TestApp::new().await;
    app.add_user("alice@example.com", "password123", Role::User).await;
    app.add_user("root@example.com", "password123", Role::Admin).await;
    let alice = app.login("alice@example.com", "password123").await;
    let admin = app.login("root@example.com", "password123").await;

    let rates = json!([{ "month": "2024-01", "rate": 5.0 }]);
    let (status, _) = app
        .request(Method::POST, "/api/market-data/fed-funds", Some(&alice), Some(rates.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .request(Method::POST, "/api/market-data/fed-funds", Some(&admin), Some(rates))
        .await;
    assert_eq!(status, StatusCode::OK);

    // February has no rate of its own; January's applies.
    let (status, body) = app
        .request(
            Method::GET,
            "/api/margin-interest?loan=36000&start=2024-02-01&end=2024-02-11",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["days"], 10);
    // 36k sits in the first tier: 5.0 + 1.5 = 6.5% on a 360-day year.
    let expected = 36_000.0 * 6.5 / 100.0 / 360.0 * 10.0;
    assert!((body["total"].as_f64().unwrap() - expected).abs() < 1e-6);

    let (status, _) = app
        .request(
            Method::GET,
            "/api/margin-interest?loan=1000&start=2023-06-01&end=2023-06-05",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_project_delete_cascades_and_comment_rules() {
    let app = TestApp::new().await;
    app.add_user("alice@example.com", "password123", Role::User).await;
    app.add_user("bob@example.com", "password123", Role::User).await;
    let alice = app.login("alice@example.com", "password123").await;
    let bob = app.login("bob@example.com", "password123").await;

    let (status, project) = app
        .request(
            Method::POST,
            "/api/projects",
            Some(&alice),
            Some(json!({ "name": "Q1 review" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_i64().unwrap();

    let (status, item) = app
        .request(
            Method::POST,
            &format!("/api/projects/{project_id}/items"),
            Some(&alice),
            Some(json!({ "title": "Check fills", "priority": "high" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_i64().unwrap();

    let (status, comment) = app
        .request(
            Method::POST,
            &format!("/api/items/{item_id}/comments"),
            Some(&alice),
            Some(json!({ "body": "all matched" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["author_name"], "alice");

    // Bob can neither read the project nor comment on its items.
    let (status, _) = app
        .request(Method::GET, &format!("/api/projects/{project_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/items/{item_id}/comments"),
            Some(&bob),
            Some(json!({ "body": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, detail) = app
        .request(Method::GET, &format!("/api/projects/{project_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["items"].as_array().unwrap().len(), 1);
    assert_eq!(detail["name"], "Q1 review");

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/projects/{project_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .request(Method::GET, &format!("/api/items/{item_id}/comments"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.db.count_rows("item_comments").await.unwrap(), 0);
    assert_eq!(app.state.db.count_rows("project_items").await.unwrap(), 0);
}

#[tokio::test]
async fn test_health_reports_tables_and_stale_symbols() {
    let app = TestApp::new().await;
    app.add_user("root@example.com", "password123", Role::Admin).await;
    let admin = app.login("root@example.com", "password123").await;

    app.request(
        Method::POST,
        "/api/market-data",
        Some(&admin),
        Some(json!([{ "symbol": "spy", "price_date": "2020-01-02", "close": 324.87 }])),
    )
    .await;

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["market_data"][0]["symbol"], "SPY");
    assert_eq!(body["market_data"][0]["status"], "unhealthy");
    let users = body["tables"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["table"] == "users")
        .unwrap();
    assert_eq!(users["rows"], 1);
}
