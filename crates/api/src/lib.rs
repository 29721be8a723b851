//! HTTP API server with observability for the farm marketplace.
//!
//! A thin adapter: handlers identify the caller from forwarded actor
//! headers, call one service operation and render the result as JSON.
//! Structured logging comes from tracing and metrics from a Prometheus
//! recorder.

pub mod actor;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use checkout::{CartService, CheckoutService};
use domain::{
    AccountService, DisputeService, OrderNotifier, OrderService, ProductService, ReviewService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::ReportingService;
use store::MarketStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: MarketStore> {
    pub accounts: AccountService<S>,
    pub products: ProductService<S>,
    pub orders: OrderService<S>,
    pub disputes: DisputeService<S>,
    pub reviews: ReviewService<S>,
    pub cart: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub reports: ReportingService<S>,
}

/// Builds every service over `store`, sharing one notifier.
pub fn create_state<S: MarketStore + Clone>(
    store: S,
    notifier: Arc<dyn OrderNotifier>,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        accounts: AccountService::new(store.clone()),
        products: ProductService::new(store.clone()),
        orders: OrderService::new(store.clone()).with_notifier(notifier.clone()),
        disputes: DisputeService::new(store.clone()).with_notifier(notifier.clone()),
        reviews: ReviewService::new(store.clone()),
        cart: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone()).with_notifier(notifier),
        reports: ReportingService::new(store),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: MarketStore + Clone>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{accounts, cart, orders, products, reports};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/accounts", post(accounts::register::<S>))
        .route("/accounts/me", get(accounts::me::<S>))
        .route(
            "/products",
            get(products::list::<S>).post(products::create::<S>),
        )
        .route("/products/search", get(products::search::<S>))
        .route("/products/my/listings", get(products::mine::<S>))
        .route("/products/bulk/status", patch(products::bulk_status::<S>))
        .route(
            "/products/{id}",
            get(products::get::<S>)
                .put(products::update::<S>)
                .delete(products::delete::<S>),
        )
        .route("/products/{id}/price", patch(products::update_price::<S>))
        .route("/products/{id}/status", patch(products::update_status::<S>))
        .route("/products/{id}/duplicate", post(products::duplicate::<S>))
        .route("/products/{id}/price-history", get(products::price_history::<S>))
        .route("/orders", post(orders::create::<S>))
        .route("/orders/my/orders", get(orders::mine::<S>))
        .route("/orders/my/notifications", get(reports::buyer_notifications::<S>))
        .route("/orders/farmer/orders", get(orders::for_farmer::<S>))
        .route("/orders/farmer/payout-summary", get(reports::payout_summary::<S>))
        .route("/orders/farmer/analytics", get(reports::analytics::<S>))
        .route("/orders/farmer/notifications", get(reports::farmer_notifications::<S>))
        .route(
            "/orders/{id}",
            get(orders::get::<S>).delete(orders::cancel::<S>),
        )
        .route("/orders/{id}/status", put(orders::update_status::<S>))
        .route("/orders/{id}/history", get(orders::history::<S>))
        .route("/orders/{id}/invoice", get(reports::invoice::<S>))
        .route("/orders/{id}/review", post(orders::review::<S>))
        .route("/orders/{id}/dispute", post(orders::open_dispute::<S>))
        .route("/orders/{id}/dispute/resolve", post(orders::resolve_dispute::<S>))
        .route("/orders/{id}/dispute/reject", post(orders::reject_dispute::<S>))
        .route("/cart", get(cart::get::<S>).post(cart::add::<S>))
        .route("/cart/checkout", post(cart::checkout::<S>))
        .route("/cart/{id}", put(cart::update::<S>).delete(cart::remove::<S>))
        .route("/reports/summary", get(reports::period_summary::<S>))
        .route("/reports/export", get(reports::export::<S>))
        .route("/reviews/received", get(reports::reviews_received::<S>))
        .route("/reviews/written", get(reports::reviews_written::<S>))
        .route("/disputes", get(reports::disputes::<S>))
        .with_state(state);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1", api)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
