use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::auth::BearerToken;
use crate::error::AppError;
use crate::filters::filter_participants;
use crate::models::{ParticipantRow, User};
use crate::report::{Export, consent, dated_name, pdf, xlsx};
use crate::services::{self, page_visits, video_watches};
use crate::state::AppState;
use crate::views::participants::{FALLBACK_MESSAGE as PARTICIPANTS_FALLBACK, ParticipantsQuery};
use crate::views::redirect_notice;

const PARTICIPANTS_FILE: &str = "LISTE_DES_PARTICIPANTS";
pub const EMPTY_SELECTION: &str = "Veuillez sélectionner au moins un participant";

pub async fn page_visits_pdf(State(state): State<Arc<AppState>>, token: BearerToken) -> Result<Export, AppError> {
    let visits = page_visits::fetch_all(&state.backend, token.as_str())
        .await
        .map_err(|err| AppError::from_backend(err, page_visits::FALLBACK_MESSAGE))?;
    let now = Utc::now();
    let rendered = pdf::page_visits_report(&visits, now)?;
    info!(rows = rendered.layout.row_count(), pages = rendered.layout.page_count(), "page visits pdf");
    Ok(Export::pdf(
        dated_name("rapport-visites-pages", now.date_naive(), "pdf"),
        rendered.bytes,
    ))
}

pub async fn page_visits_xlsx(State(state): State<Arc<AppState>>, token: BearerToken) -> Result<Export, AppError> {
    let visits = page_visits::fetch_all(&state.backend, token.as_str())
        .await
        .map_err(|err| AppError::from_backend(err, page_visits::FALLBACK_MESSAGE))?;
    Ok(Export::xlsx(
        dated_name("visites-pages", Utc::now().date_naive(), "xlsx"),
        xlsx::page_visits(&visits)?,
    ))
}

pub async fn video_watches_pdf(State(state): State<Arc<AppState>>, token: BearerToken) -> Result<Export, AppError> {
    let watches = video_watches::fetch_all(&state.backend, token.as_str())
        .await
        .map_err(|err| AppError::from_backend(err, video_watches::FALLBACK_MESSAGE))?;
    let now = Utc::now();
    let rendered = pdf::video_watches_report(&watches, now)?;
    info!(rows = rendered.layout.row_count(), pages = rendered.layout.page_count(), "video watches pdf");
    Ok(Export::pdf(
        dated_name("rapport-videos-regardees", now.date_naive(), "pdf"),
        rendered.bytes,
    ))
}

pub async fn video_watches_xlsx(State(state): State<Arc<AppState>>, token: BearerToken) -> Result<Export, AppError> {
    let watches = video_watches::fetch_all(&state.backend, token.as_str())
        .await
        .map_err(|err| AppError::from_backend(err, video_watches::FALLBACK_MESSAGE))?;
    Ok(Export::xlsx(
        dated_name("videos-regardees", Utc::now().date_naive(), "xlsx"),
        xlsx::video_watches(&watches)?,
    ))
}

/// Participants kept by the same date filter as the list page
async fn filtered_participants(
    state: &AppState,
    token: &BearerToken,
    query: &ParticipantsQuery,
) -> Result<(Vec<ParticipantRow>, Option<String>), AppError> {
    let participants = services::users::participants(&state.backend, token.as_str())
        .await
        .map_err(|err| AppError::from_backend(err, PARTICIPANTS_FALLBACK))?;

    let today = Utc::now().date_naive();
    let range = query.date_range(today);
    let rows = filter_participants(&participants, &range)
        .into_iter()
        .map(User::participant_row)
        .collect();
    Ok((rows, range.period_text(today)))
}

pub async fn participants_pdf(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Query(query): Query<ParticipantsQuery>,
) -> Result<Export, AppError> {
    let (rows, period) = filtered_participants(&state, &token, &query).await?;
    let rendered = pdf::participants_report(&rows, period.as_deref(), Utc::now())?;
    info!(rows = rendered.layout.row_count(), "participants pdf");
    Ok(Export::pdf(format!("{PARTICIPANTS_FILE}.pdf"), rendered.bytes))
}

pub async fn participants_xlsx(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Query(query): Query<ParticipantsQuery>,
) -> Result<Export, AppError> {
    let (rows, _) = filtered_participants(&state, &token, &query).await?;
    Ok(Export::xlsx(format!("{PARTICIPANTS_FILE}.xlsx"), xlsx::participants(&rows)?))
}

/// `GET /api/reports/consent/:id`
pub async fn consent_form(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Path(id): Path<String>,
) -> Result<Export, AppError> {
    let participant = services::users::get(&state.backend, token.as_str(), &id)
        .await
        .map_err(|err| AppError::from_backend(err, PARTICIPANTS_FALLBACK))?;
    Ok(Export::pdf(
        consent::file_name(&participant),
        consent::consent_pdf(&participant, Utc::now())?,
    ))
}

/// Checkboxes of the participants table
#[derive(Debug, Default, Deserialize)]
pub struct ConsentSelection {
    #[serde(default)]
    pub ids: Vec<String>,
}

/// `POST /api/reports/consent`: one PDF, or a ZIP for several participants
pub async fn consent_bundle(
    State(state): State<Arc<AppState>>,
    token: BearerToken,
    Form(selection): Form<ConsentSelection>,
) -> Result<Response, AppError> {
    let mut participants = Vec::with_capacity(selection.ids.len());
    for id in selection.ids.iter().filter(|id| !id.trim().is_empty()) {
        let participant = services::users::get(&state.backend, token.as_str(), id)
            .await
            .map_err(|err| AppError::from_backend(err, PARTICIPANTS_FALLBACK))?;
        participants.push(participant);
    }

    match consent::bundle(&participants, Utc::now())? {
        Some(export) => {
            info!(count = participants.len(), file = %export.file_name, "consent forms exported");
            Ok(export.into_response())
        }
        None => Ok(redirect_notice("/dashboard/participants", "error", EMPTY_SELECTION).into_response()),
    }
}
