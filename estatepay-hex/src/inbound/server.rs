//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use estatepay_types::{PaymentGateway, PaymentLedger};

use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::PaymentService;
use crate::openapi::ApiDoc;

/// HTTP Server for the estate payments API.
pub struct HttpServer<L: PaymentLedger, G: PaymentGateway> {
    state: Arc<AppState<L, G>>,
    rate_limiter: Arc<RateLimiterState>,
}

impl<L: PaymentLedger, G: PaymentGateway> HttpServer<L, G> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: PaymentService<L, G>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
            rate_limiter: Arc::new(RateLimiterState::default()), // 100 req/min default
        }
    }

    /// Creates a new HTTP server with custom rate limiting.
    pub fn with_rate_limit(service: PaymentService<L, G>, requests_per_minute: u32) -> Self {
        use std::time::Duration;
        Self {
            state: Arc::new(AppState { service }),
            rate_limiter: Arc::new(RateLimiterState::new(
                requests_per_minute,
                Duration::from_secs(60),
            )),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/api/payments/initialize",
                post(handlers::initialize_payment::<L, G>),
            )
            .route(
                "/api/payments/verify/{reference}",
                get(handlers::verify_payment::<L, G>),
            )
            .route("/api/payments/webhook", post(handlers::webhook::<L, G>))
            .route(
                "/api/payments/history",
                get(handlers::payment_history::<L, G>),
            )
            .route(
                "/api/payments/currencies",
                get(handlers::currencies::<L, G>),
            )
            .route("/api/payments/rates", get(handlers::rates::<L, G>))
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        Router::new()
            .merge(api)
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
