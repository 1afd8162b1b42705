//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with every timer and group route
//! - Wire up middleware (tracing, request ID, timeouts, body limits, CORS, compression)
//! - Record per-route metrics
//! - Bind to a listener and serve until shutdown

use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::Api;
use crate::config::HttpConfig;
use crate::http::handlers::{docs, groups, timers};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer, track_metrics};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub api: Api,
}

/// REST front-end for the time-tracking Api.
pub struct HttpServer {
    router: Router,
    config: HttpConfig,
}

impl HttpServer {
    pub fn new(config: HttpConfig, api: Api) -> Self {
        let router = Self::build_router(&config, AppState { api });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &HttpConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(docs::docs))
            .route("/health", get(docs::health))
            .route("/timers", get(timers::list_all).delete(timers::remove_all))
            .route("/timers/running", get(timers::running_all))
            .route("/timers/consolidate", get(timers::consolidate_all))
            .route("/timers/{group}", get(timers::list_group).delete(timers::remove_group))
            .route("/timers/{group}/running", get(timers::running_group))
            .route("/timers/{group}/consolidate", get(timers::consolidate_group))
            .route("/timers/{group}/start", post(timers::start))
            .route(
                "/timers/{group}/{id}",
                get(timers::get).put(timers::update).delete(timers::remove),
            )
            .route("/timers/{group}/{id}/stop", post(timers::stop))
            .route("/groups", get(groups::list))
            .route("/groups/names", get(groups::names))
            .route(
                "/groups/{name}",
                get(groups::get)
                    .post(groups::create)
                    .put(groups::update)
                    .delete(groups::remove),
            )
            .route("/groups/{name}/timers", get(groups::timers))
            .route("/groups/{name}/timers/running", get(groups::running_timers))
            .route("/groups/{name}/consolidate", get(groups::consolidate))
            .with_state(state)
            .layer(middleware::from_fn(track_metrics));

        if config.compression_enabled {
            router = router.layer(CompressionLayer::new());
        }
        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router
            .layer(RequestBodyLimitLayer::new(config.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.request_timeout_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}
