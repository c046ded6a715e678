use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tenant_polls_storage::Database;

use crate::middleware::bind_current_domain;
use crate::resolver::DomainResolver;
use crate::{admin, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    resolver: DomainResolver,
    use_forwarded_host: bool,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database, use_forwarded_host: bool) -> Self {
        let resolver = DomainResolver::new(storage.domains());
        Self {
            metrics,
            storage,
            resolver,
            use_forwarded_host,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn resolver(&self) -> &DomainResolver {
        &self.resolver
    }

    pub fn use_forwarded_host(&self) -> bool {
        self.use_forwarded_host
    }
}

pub fn app_router(state: AppState) -> Router {
    let tenant_routes = Router::new()
        .route(
            "/admin/domains",
            get(admin::list_domains).post(admin::create_domain),
        )
        .route(
            "/admin/domains/:id",
            get(admin::get_domain)
                .put(admin::update_domain)
                .delete(admin::delete_domain),
        )
        .route(
            "/admin/polls",
            get(admin::list_polls).post(admin::create_poll),
        )
        .route(
            "/admin/polls/:id",
            get(admin::get_poll)
                .put(admin::update_poll)
                .delete(admin::delete_poll),
        )
        .route_layer(from_fn_with_state(state.clone(), bind_current_domain));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .merge(tenant_routes)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

/// Builds state over a fresh in-memory database with migrations applied.
#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let metrics = telemetry::init_metrics().expect("metrics init");
    let database = Database::connect("sqlite::memory:")
        .await
        .expect("connect");
    database.run_migrations().await.expect("migrations");
    AppState::new(metrics, database, false)
}
