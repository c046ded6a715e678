//! JSON administration endpoints.
//!
//! Domains are managed globally; polls are always read and written through
//! the domain bound to the request, so one tenant never sees another's data.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use tenant_polls_core::types::{DomainInput, OptionChange};
use tenant_polls_core::{Domain, PollOption};
use tenant_polls_storage::PollWithOptions;

use crate::middleware::CurrentDomain;
use crate::problem::ProblemResponse;
use crate::router::AppState;

pub async fn list_domains(
    State(state): State<AppState>,
) -> Result<Json<Vec<Domain>>, ProblemResponse> {
    let domains = state.storage().domains().list().await?;
    Ok(Json(domains))
}

pub async fn create_domain(
    State(state): State<AppState>,
    Json(input): Json<DomainInput>,
) -> Result<(StatusCode, Json<Domain>), ProblemResponse> {
    let domain = state.storage().domains().create(&input).await?;
    state.resolver().clear();
    info!(stage = "admin", domain_id = domain.id, domain = %domain, "domain created");
    Ok((StatusCode::CREATED, Json(domain)))
}

pub async fn get_domain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Domain>, ProblemResponse> {
    let domain = state.storage().domains().fetch_by_id(id).await?;
    Ok(Json(domain))
}

pub async fn update_domain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<DomainInput>,
) -> Result<Json<Domain>, ProblemResponse> {
    let domain = state.storage().domains().update(id, &input).await?;
    // The new name may shadow port-stripped or case-variant aliases of other domains.
    state.resolver().clear();
    info!(stage = "admin", domain_id = id, domain = %domain, "domain updated");
    Ok(Json(domain))
}

pub async fn delete_domain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ProblemResponse> {
    state.storage().domains().delete(id).await?;
    state.resolver().invalidate(id);
    info!(stage = "admin", domain_id = id, "domain deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Poll as shown in the admin; the owning domain is read-only.
#[derive(Debug, Serialize)]
pub struct PollView {
    id: i64,
    content: String,
    domain: String,
    options: Vec<PollOption>,
}

impl PollView {
    fn new(record: PollWithOptions, domain: &Domain) -> Self {
        Self {
            id: record.poll.id,
            content: record.poll.content,
            domain: domain.to_string(),
            options: record.options,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    content: String,
    #[serde(default)]
    options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePollRequest {
    content: String,
    #[serde(default)]
    options: Vec<OptionEdit>,
}

/// One inline row of the options editor.
///
/// Rows without an id add an option, rows with an id rename it, and `delete`
/// removes it. Untouched rows and blank extra rows are ignored.
#[derive(Debug, Deserialize)]
pub struct OptionEdit {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    delete: bool,
}

impl OptionEdit {
    fn into_change(self) -> Option<OptionChange> {
        match (self.id, self.value, self.delete) {
            (Some(id), _, true) => Some(OptionChange::Delete { id }),
            (None, _, true) => None,
            (Some(id), Some(value), false) => Some(OptionChange::Rename { id, value }),
            (Some(_), None, false) => None,
            (None, Some(value), false) if !value.is_empty() => Some(OptionChange::Add { value }),
            (None, _, false) => None,
        }
    }
}

pub async fn list_polls(
    State(state): State<AppState>,
    CurrentDomain(domain): CurrentDomain,
) -> Result<Json<Vec<PollView>>, ProblemResponse> {
    let polls = state.storage().polls().list_with_options(domain.id).await?;
    Ok(Json(
        polls
            .into_iter()
            .map(|record| PollView::new(record, &domain))
            .collect(),
    ))
}

pub async fn create_poll(
    State(state): State<AppState>,
    CurrentDomain(domain): CurrentDomain,
    Json(request): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<PollView>), ProblemResponse> {
    let record = state
        .storage()
        .polls()
        .create(domain.id, &request.content, &request.options)
        .await?;
    info!(stage = "admin", domain_id = domain.id, poll_id = record.poll.id, "poll created");
    Ok((StatusCode::CREATED, Json(PollView::new(record, &domain))))
}

pub async fn get_poll(
    State(state): State<AppState>,
    CurrentDomain(domain): CurrentDomain,
    Path(id): Path<i64>,
) -> Result<Json<PollView>, ProblemResponse> {
    let record = state.storage().polls().fetch_for_domain(domain.id, id).await?;
    Ok(Json(PollView::new(record, &domain)))
}

pub async fn update_poll(
    State(state): State<AppState>,
    CurrentDomain(domain): CurrentDomain,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePollRequest>,
) -> Result<Json<PollView>, ProblemResponse> {
    let changes: Vec<OptionChange> = request
        .options
        .into_iter()
        .filter_map(OptionEdit::into_change)
        .collect();
    let record = state
        .storage()
        .polls()
        .update(domain.id, id, &request.content, &changes)
        .await?;
    info!(stage = "admin", domain_id = domain.id, poll_id = id, changes = changes.len(), "poll updated");
    Ok(Json(PollView::new(record, &domain)))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    CurrentDomain(domain): CurrentDomain,
    Path(id): Path<i64>,
) -> Result<StatusCode, ProblemResponse> {
    state.storage().polls().delete(domain.id, id).await?;
    info!(stage = "admin", domain_id = domain.id, poll_id = id, "poll deleted");
    Ok(StatusCode::NO_CONTENT)
}
