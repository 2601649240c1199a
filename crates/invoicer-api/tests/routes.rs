//! HTTP surface: status codes, cookies and JSON shapes.

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use invoicer_api::router::router;
use invoicer_oracle::BalanceOracle;
use invoicer_types::api::InvoiceView;

use common::{ScriptedOracle, ledger};

fn app() -> (Router, Arc<ScriptedOracle>) {
    let (ledger, oracle) = ledger();
    (router(Arc::new(ledger)), oracle)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn with_cookie(uri: &str, method: Method, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

async fn signup(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/signup",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn signup_sets_session_cookie() {
    let (app, _) = app();
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/signup",
            None,
            json!({ "username": "alice", "password": "secret1" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = set_cookie(&response).expect("session cookie");

    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    let token = body["token"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("token={token}")));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn duplicate_signup_is_conflict() {
    let (app, _) = app();
    signup(&app, "alice", "secret1").await;

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/signup",
            None,
            json!({ "username": "alice", "password": "other" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(set_cookie(&response).is_none());
    assert_eq!(body_json(response).await["message"], "Username already taken");
}

#[tokio::test]
async fn signup_rejects_unexpected_fields() {
    let (app, _) = app();
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/signup",
            None,
            json!({ "username": "alice", "password": "pw", "admin": true }),
        ),
    )
    .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn bad_credentials_share_one_message() {
    let (app, _) = app();
    signup(&app, "alice", "secret1").await;

    for (username, password) in [("alice", "wrong"), ("nobody", "secret1")] {
        let response = send(
            &app,
            json_request(
                Method::POST,
                "/signin",
                None,
                json!({ "username": username, "password": password }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Invalid credentials" })
        );
    }
}

#[tokio::test]
async fn signin_issues_a_new_token() {
    let (app, _) = app();
    let first = signup(&app, "alice", "secret1").await;

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/signin",
            None,
            json!({ "username": "alice", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(set_cookie(&response).is_some());
    let second = body_json(response).await["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);
}

#[tokio::test]
async fn api_without_session_is_unauthorized() {
    let (app, _) = app();

    for uri in ["/api/invoices", "/api/wallets"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = send(&app, json_request(Method::POST, "/create", None, json!({}))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stale_cookie_is_cleared() {
    let (app, _) = app();
    let response = send(&app, with_cookie("/api/invoices", Method::GET, "stale")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cookie = set_cookie(&response).expect("removal cookie");
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn signout_without_session_redirects_to_sign_in() {
    let (app, _) = app();
    let response = send(&app, get("/signout", None)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/signin");
}

#[tokio::test]
async fn signout_revokes_only_the_presented_token() {
    let (app, _) = app();
    let t1 = signup(&app, "alice", "secret1").await;
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/signin",
            None,
            json!({ "username": "alice", "password": "secret1" }),
        ),
    )
    .await;
    let t2 = body_json(response).await["token"].as_str().unwrap().to_string();

    let response = send(&app, with_cookie("/signout", Method::GET, &t1)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));

    let response = send(&app, get("/api/invoices", Some(&t1))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = send(&app, get("/api/invoices", Some(&t2))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn invoice_flow_over_bearer_token() {
    let (app, oracle) = app();
    let token = signup(&app, "alice", "secret1").await;

    let response = send(&app, json_request(Method::POST, "/create", Some(&token), json!({}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: InvoiceView = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(created.username, "alice");
    assert_eq!(created.total, Decimal::ZERO);
    assert_eq!(created.paid, Some(Decimal::ZERO));

    let response = send(&app, get("/api/wallets", Some(&token))).await;
    let wallets = body_json(response).await;
    assert_eq!(wallets[0]["invoice_id"], json!(created.id));
    assert_eq!(wallets[0]["address"], json!(created.address));
    assert!(wallets[0].get("secret").is_none());

    oracle.set_balance(&created.address, Decimal::new(20, 0));
    let uri = format!("/api/invoices/{}", created.id);
    let response = send(
        &app,
        json_request(
            Method::PUT,
            &uri,
            Some(&token),
            json!({
                "id": created.id,
                "username": "alice",
                "total": "50",
                "to": "Bob",
                "from": "Alice",
                "description": "rent",
                "paid": "999",
                "address": "0xforged",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: InvoiceView = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(updated.total, Decimal::new(50, 0));
    assert_eq!(updated.paid, Some(Decimal::new(20, 0)));
    assert_eq!(updated.address, created.address);
    assert_eq!(updated.description, "rent");

    let response = send(&app, get(&uri, Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: InvoiceView = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(fetched, updated);

    let response = send(&app, get("/api/invoices", Some(&token))).await;
    let listed: Vec<InvoiceView> = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(listed, vec![updated]);
}

#[tokio::test]
async fn mismatched_body_id_is_bad_request() {
    let (app, _) = app();
    let token = signup(&app, "alice", "pw").await;

    let response = send(&app, json_request(Method::POST, "/create", Some(&token), json!({}))).await;
    let a: InvoiceView = serde_json::from_value(body_json(response).await).unwrap();
    let response = send(&app, json_request(Method::POST, "/create", Some(&token), json!({}))).await;
    let b: InvoiceView = serde_json::from_value(body_json(response).await).unwrap();

    let response = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/invoices/{}", a.id),
            Some(&token),
            json!({ "id": b.id, "username": "alice", "total": "1" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn foreign_invoice_is_forbidden() {
    let (app, _) = app();
    let alice = signup(&app, "alice", "pw").await;
    let bob = signup(&app, "bob", "pw").await;

    let response = send(&app, json_request(Method::POST, "/create", Some(&bob), json!({}))).await;
    let bobs: InvoiceView = serde_json::from_value(body_json(response).await).unwrap();
    let uri = format!("/api/invoices/{}", bobs.id);

    let response = send(&app, get(&uri, Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(
            Method::PUT,
            &uri,
            Some(&alice),
            json!({ "id": bobs.id, "username": "alice", "total": "1" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_invoice_is_not_found() {
    let (app, _) = app();
    let token = signup(&app, "alice", "pw").await;
    let id = invoicer_types::ids::InvoiceId::generate();

    let response = send(&app, get(&format!("/api/invoices/{id}"), Some(&token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_reconciliation_is_reported_per_invoice() {
    let (app, oracle) = app();
    let token = signup(&app, "alice", "pw").await;

    let response = send(&app, json_request(Method::POST, "/create", Some(&token), json!({}))).await;
    let broken: InvoiceView = serde_json::from_value(body_json(response).await).unwrap();
    let response = send(&app, json_request(Method::POST, "/create", Some(&token), json!({}))).await;
    let healthy: InvoiceView = serde_json::from_value(body_json(response).await).unwrap();

    oracle.fail_for(&broken.address);
    oracle.set_balance(&healthy.address, Decimal::new(5, 0));

    let response = send(&app, get("/api/invoices", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;

    assert_eq!(listed[0]["id"], json!(broken.id));
    assert!(listed[0]["paid"].is_null());
    assert_eq!(listed[0]["reconcile_error"], "balance lookup failed");

    assert_eq!(listed[1]["id"], json!(healthy.id));
    assert_eq!(listed[1]["paid"], json!(Decimal::new(5, 0)));
    assert!(listed[1].get("reconcile_error").is_none());
}

#[tokio::test]
async fn scripted_oracle_defaults_to_zero() {
    let oracle = ScriptedOracle::default();
    assert_eq!(oracle.get_balance("0xunseen").await.unwrap(), Decimal::ZERO);
}
