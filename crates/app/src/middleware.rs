use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use tenant_polls_core::Domain;

use crate::host::request_host;
use crate::problem::ProblemResponse;
use crate::resolver::ResolveError;
use crate::router::AppState;

/// Tenant bound to the current request by [`bind_current_domain`].
#[derive(Debug, Clone)]
pub struct CurrentDomain(pub Arc<Domain>);

/// Resolves the request host to its domain before the handler runs.
pub async fn bind_current_domain(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ProblemResponse> {
    let Some(host) = request_host(
        request.headers(),
        request.uri(),
        state.use_forwarded_host(),
    ) else {
        return Err(ProblemResponse::new(
            StatusCode::BAD_REQUEST,
            "invalid_host",
            "request host is missing or malformed",
        ));
    };

    let domain = state
        .resolver()
        .resolve(Some(&host), None)
        .await
        .map_err(|err| {
            if matches!(err, ResolveError::NotFound { .. }) {
                warn!(stage = "middleware", %host, "no domain configured for host");
            }
            ProblemResponse::from(err)
        })?;

    debug!(
        stage = "middleware",
        %host,
        domain_id = domain.id,
        cached = state.resolver().len(),
        "bound current domain"
    );
    request.extensions_mut().insert(CurrentDomain(domain));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentDomain
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentDomain>()
            .cloned()
            .ok_or_else(|| {
                ProblemResponse::internal("current domain was not bound for this route")
            })
    }
}
