use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::invoices;
use crate::middleware::{require_session, require_session_or_redirect};
use crate::wallets;

/// Every ledger route. Pages and static assets are left to the caller.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin));

    let page_routes = Router::new()
        .route("/signout", get(auth::signout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session_or_redirect,
        ));

    let api_routes = Router::new()
        .route("/create", post(invoices::create_invoice))
        .route(
            "/api/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/api/invoices/{id}",
            get(invoices::get_invoice).put(invoices::replace_invoice),
        )
        .route("/api/wallets", get(wallets::list_wallets))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(api_routes)
        .with_state(state)
}
