use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use rostra_core::debate::{DebateConfig, Role};
use rostra_core::ids::{DebateId, MediaId};
use rostra_core::summary::VoteSide;
use rostra_engine::EngineError;
use rostra_store::debates::DebateRepo;
use rostra_store::media::MediaRepo;
use rostra_store::participants::ParticipantRepo;
use rostra_store::summaries::SummaryRepo;
use rostra_store::turns::TurnRepo;
use rostra_store::verdicts::{AlertRepo, VerdictRepo};
use rostra_store::votes::VoteRepo;
use rostra_store::StoreError;

use crate::server::AppState;

/// API error envelope. Maps store/engine errors onto HTTP statuses.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match &e {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: e.to_string() }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match &e {
            EngineError::DebateNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidPhase(_) | EngineError::AlreadyRunning(_) => StatusCode::CONFLICT,
            EngineError::MissingParticipant(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Store(inner) => return ApiError::from_store_ref(inner),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: e.to_string() }
    }
}

impl ApiError {
    fn from_store_ref(e: &StoreError) -> Self {
        let status = match e {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: e.to_string() }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
pub struct ParticipantSpec {
    pub role: Role,
    pub display_name: String,
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub voice_id: String,
}

#[derive(Deserialize)]
pub struct CreateDebateRequest {
    pub topic: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: Option<DebateConfig>,
    pub participants: Vec<ParticipantSpec>,
}

#[derive(Serialize)]
pub struct CreateDebateResponse {
    pub debate_id: DebateId,
}

/// Create the debate and its participants, start orchestration, and
/// return immediately — the run continues in the background.
pub async fn create_debate(
    State(state): State<AppState>,
    Json(request): Json<CreateDebateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.topic.trim().is_empty() {
        return Err(ApiError::bad_request("topic must not be empty"));
    }

    let config = request.config.unwrap_or_default();
    if config.max_turns < 2 {
        return Err(ApiError::bad_request("max_turns must be at least 2"));
    }

    let debates = DebateRepo::new(state.db.clone(), state.feed.clone());
    let debate = debates.create(&request.topic, &request.description, &config)?;

    let participants = ParticipantRepo::new(state.db.clone());
    for spec in &request.participants {
        participants.create(
            &debate.id,
            spec.role,
            &spec.display_name,
            &spec.persona,
            &spec.voice_id,
        )?;
    }

    state.orchestrator.start(&debate.id)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateDebateResponse { debate_id: debate.id }),
    ))
}

pub async fn list_debates(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let debates = DebateRepo::new(state.db.clone(), state.feed.clone()).list(100)?;
    Ok(Json(debates))
}

pub async fn get_debate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let debate = DebateRepo::new(state.db.clone(), state.feed.clone()).get(&DebateId::from_raw(id))?;
    Ok(Json(debate))
}

pub async fn list_turns(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let turns = TurnRepo::new(state.db.clone(), state.feed.clone()).list(&DebateId::from_raw(id))?;
    Ok(Json(turns))
}

pub async fn list_verdicts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let verdicts = VerdictRepo::new(state.db.clone(), state.feed.clone()).list(&DebateId::from_raw(id))?;
    Ok(Json(verdicts))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let alerts = AlertRepo::new(state.db.clone(), state.feed.clone()).list(&DebateId::from_raw(id))?;
    Ok(Json(alerts))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = SummaryRepo::new(state.db.clone(), state.feed.clone()).get(&DebateId::from_raw(id))?;
    Ok(Json(summary))
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub side: VoteSide,
}

/// Record a vote. Attribution to the debate is by ID; the orchestrator
/// snapshots the tally once, at summary time.
pub async fn submit_vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let debate_id = DebateId::from_raw(id);
    // Reject votes for debates that don't exist.
    DebateRepo::new(state.db.clone(), state.feed.clone()).get(&debate_id)?;

    let vote_id = VoteRepo::new(state.db.clone(), state.feed.clone()).record(&debate_id, request.side)?;
    Ok((StatusCode::CREATED, Json(json!({ "vote_id": vote_id }))))
}

/// Per-debate change feed as server-sent events.
pub async fn debate_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let debate_id = DebateId::from_raw(id);
    let rx = state.feed.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |received| {
        let change = received.ok()?;
        if change.debate_id != debate_id {
            return None;
        }
        let data = serde_json::to_string(&change).ok()?;
        Some(Ok(Event::default().event("change").data(data)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (content_type, data) = MediaRepo::new(state.db.clone()).get(&MediaId::from_raw(id))?;
    Ok(([(header::CONTENT_TYPE, content_type)], data))
}
