//! HTTP route handlers for the game server.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use game::core::difficulty::Difficulty;
use game::error::GameError;
use game::io::provider::ModelSpec;
use game::modes::council::{CouncilRequest, run_council};
use game::modes::fight::{FightRequest, run_fight};
use game::modes::finish;
use game::modes::interactive::{InteractiveGame, InteractiveRequest};
use game::modes::inverse::{InverseGame, InverseRequest};
use game::modes::solo::{SoloRequest, run_solo};
use game::roles::council::CouncilModels;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::{AppState, Session, lock_game};
use crate::stream::{ndjson_response, start_session};

/// Response header carrying the id of a newly started per-turn session.
pub const SESSION_HEADER: &str = "x-session-id";

/// Build the full router (game routes plus `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api", Router::new().route("/health", get(health)))
        .route("/start_game", post(start_game))
        .route("/start_fight", post(start_fight))
        .route("/start_council", post(start_council))
        .route("/start_inverse", post(start_inverse))
        .route("/start_interactive", post(start_interactive))
        .route("/inverse_answer", post(inverse_answer))
        .route("/solve_mystery", post(solve_mystery))
        .route("/ask_narrator", post(ask_narrator))
        .route("/get_hint", post(get_hint))
}

async fn health() -> &'static str {
    "ok"
}

/// Error reply: `{status: "error", message}`.
#[derive(Debug)]
pub enum ApiError {
    UnknownSession(String),
    Game(GameError),
    Internal(String),
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        ApiError::Game(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownSession(_) => StatusCode::NOT_FOUND,
            ApiError::Game(err) if err.is_caller_error() => StatusCode::BAD_REQUEST,
            ApiError::Game(GameError::Protocol(_)) => StatusCode::BAD_REQUEST,
            ApiError::Game(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::UnknownSession(id) => format!("no active game for session {id}"),
            ApiError::Game(err) => err.to_string(),
            ApiError::Internal(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.message(), "request failed");
        }
        let body = Json(json!({ "status": "error", "message": self.message() }));
        (status, body).into_response()
    }
}

/// Fields shared by every game request; each route reads the ones it needs.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GameBody {
    session_id: Option<String>,
    difficulty: Option<String>,
    narrator_model: Option<String>,
    detective_model: Option<String>,
    detective_model_1: Option<String>,
    detective_model_2: Option<String>,
    visionary_model: Option<String>,
    skeptic_model: Option<String>,
    leader_model: Option<String>,
    question: Option<String>,
    answer: Option<String>,
    solution: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

impl GameBody {
    fn difficulty(&self) -> Result<Difficulty, GameError> {
        match non_blank(&self.difficulty) {
            Some(text) => Difficulty::parse_player(text).map_err(GameError::InvalidInput),
            None => Ok(Difficulty::Medium),
        }
    }

    fn required(&self, value: &Option<String>, field: &str) -> Result<String, GameError> {
        non_blank(value)
            .map(str::to_string)
            .ok_or_else(|| GameError::InvalidInput(format!("{field} is required")))
    }

    fn session_id(&self) -> Result<String, GameError> {
        self.required(&self.session_id, "session_id")
    }
}

/// Model default comes from the server config.
fn model_or(value: &Option<String>, default: &str) -> Result<ModelSpec, GameError> {
    non_blank(value).unwrap_or(default).parse()
}

fn with_session_header(mut response: Response, id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// POST /start_game - one AI detective against the AI narrator.
async fn start_game(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Response, ApiError> {
    let models = &state.ctx.config.models;
    let request = SoloRequest {
        difficulty: body.difficulty()?,
        narrator: model_or(&body.narrator_model, &models.narrator)?,
        detective: model_or(&body.detective_model, &models.detective)?,
    };
    info!(difficulty = %request.difficulty, "starting classic game");
    let ctx = state.ctx.clone();
    Ok(ndjson_response(move |sink| {
        run_solo(&ctx, &request, sink).map(drop)
    }))
}

/// POST /start_fight - two AI detectives race on one mystery.
async fn start_fight(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Response, ApiError> {
    let models = &state.ctx.config.models;
    let request = FightRequest {
        narrator: model_or(&body.narrator_model, &models.narrator)?,
        detectives: [
            model_or(&body.detective_model_1, &models.detective)?,
            model_or(&body.detective_model_2, &models.detective)?,
        ],
    };
    info!("starting fight");
    let ctx = state.ctx.clone();
    Ok(ndjson_response(move |sink| {
        run_fight(&ctx, &request, sink).map(drop)
    }))
}

/// POST /start_council - Visionary, Skeptic and Leader share one game.
async fn start_council(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Response, ApiError> {
    let models = &state.ctx.config.models;
    let request = CouncilRequest {
        difficulty: body.difficulty()?,
        narrator: model_or(&body.narrator_model, &models.narrator)?,
        members: CouncilModels {
            visionary: model_or(&body.visionary_model, &models.detective)?,
            skeptic: model_or(&body.skeptic_model, &models.detective)?,
            leader: model_or(&body.leader_model, &models.detective)?,
        },
    };
    info!(difficulty = %request.difficulty, "starting council");
    let ctx = state.ctx.clone();
    Ok(ndjson_response(move |sink| {
        run_council(&ctx, &request, sink).map(drop)
    }))
}

/// POST /start_inverse - the caller narrates for an AI detective.
async fn start_inverse(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Response, ApiError> {
    let request = InverseRequest {
        difficulty: body.difficulty()?,
        detective: model_or(&body.detective_model, &state.ctx.config.models.detective)?,
    };
    let id = non_blank(&body.session_id)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(session = %id, difficulty = %request.difficulty, "starting inverse game");
    let AppState { ctx, sessions } = state;
    let session_id = id.clone();
    let response = ndjson_response(move |sink| {
        start_session(
            sink,
            |events| InverseGame::start(&ctx, &request, events),
            |game| sessions.insert(session_id, Session::Inverse(Arc::new(Mutex::new(game)))),
        )
    });
    Ok(with_session_header(response, &id))
}

/// POST /start_interactive - the caller questions the AI narrator.
async fn start_interactive(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Response, ApiError> {
    let request = InteractiveRequest {
        difficulty: body.difficulty()?,
        narrator: model_or(&body.narrator_model, &state.ctx.config.models.narrator)?,
    };
    let id = non_blank(&body.session_id)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(session = %id, difficulty = %request.difficulty, "starting interactive game");
    let AppState { ctx, sessions } = state;
    let session_id = id.clone();
    let response = ndjson_response(move |sink| {
        start_session(
            sink,
            |events| InteractiveGame::start(&ctx, &request, events),
            |game| {
                sessions.insert(session_id, Session::Interactive(Arc::new(Mutex::new(game))));
            },
        )
    });
    Ok(with_session_header(response, &id))
}

fn inverse_session(state: &AppState, id: &str) -> Result<Arc<Mutex<InverseGame>>, ApiError> {
    match state.sessions.get(id) {
        Some(Session::Inverse(game)) => Ok(game),
        Some(other) => Err(GameError::InvalidInput(format!(
            "session {id} is an {} game",
            other.kind()
        ))
        .into()),
        None => Err(ApiError::UnknownSession(id.to_string())),
    }
}

fn interactive_session(
    state: &AppState,
    id: &str,
) -> Result<Arc<Mutex<InteractiveGame>>, ApiError> {
    match state.sessions.get(id) {
        Some(Session::Interactive(game)) => Ok(game),
        Some(other) => Err(GameError::InvalidInput(format!(
            "session {id} is an {} game",
            other.kind()
        ))
        .into()),
        None => Err(ApiError::UnknownSession(id.to_string())),
    }
}

/// POST /inverse_answer - the caller's reply to the AI detective.
async fn inverse_answer(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Response, ApiError> {
    let id = body.session_id()?;
    let answer = body.required(&body.answer, "answer")?;
    let game = inverse_session(&state, &id)?;
    Ok(ndjson_response(move |sink| {
        let mut game = lock_game(&game);
        finish(game.answer(&answer, sink), sink)
    }))
}

/// POST /solve_mystery - the caller's one final solution.
async fn solve_mystery(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Response, ApiError> {
    let id = body.session_id()?;
    let solution = body.required(&body.solution, "solution")?;
    let game = interactive_session(&state, &id)?;
    Ok(ndjson_response(move |sink| {
        let mut game = lock_game(&game);
        finish(game.solve(&solution, sink), sink).map(drop)
    }))
}

/// POST /ask_narrator - `{answer}` for one interactive question.
async fn ask_narrator(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = body.session_id()?;
    let question = body.required(&body.question, "question")?;
    let game = interactive_session(&state, &id)?;
    let answer = tokio::task::spawn_blocking(move || {
        let mut game = lock_game(&game);
        game.ask(&question)
    })
        .await
        .map_err(|err| ApiError::Internal(format!("narrator worker failed: {err}")))??;
    Ok(Json(json!({ "answer": answer.as_str() })))
}

/// POST /get_hint - `{hint}`; a failed hint leaves the game untouched.
async fn get_hint(
    State(state): State<AppState>,
    Json(body): Json<GameBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = body.session_id()?;
    let game = interactive_session(&state, &id)?;
    let hint = tokio::task::spawn_blocking(move || {
        let game = lock_game(&game);
        game.hint()
    })
        .await
        .map_err(|err| ApiError::Internal(format!("hint worker failed: {err}")))??;
    Ok(Json(json!({ "hint": hint })))
}
