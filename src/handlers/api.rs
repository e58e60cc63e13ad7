use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::error_pages::ErrorMessage;
use crate::handlers::dashboard::StateParams;
use crate::models::SankeyData;
use crate::services::cashflow::{self, Action, Summary, Update};
use crate::services::state_codec;
use crate::state::AppState;

/// JSON error body for API routes.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status: StatusCode = self.0.status();
        let message = self.0.public_message();
        let mut response = (
            status,
            Json(ErrorBody {
                error: message.clone(),
            }),
        )
            .into_response();
        response.extensions_mut().insert(ErrorMessage(message));
        response
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub s: String,
    pub action: Action,
}

/// Flow graph for the state in `s`, with collected VAT drawn as an expense.
pub async fn flow(
    State(state): State<AppState>,
    Query(params): Query<StateParams>,
) -> ApiResult<SankeyData> {
    let cashflow_state = state.load_state(params.s.as_deref());
    Ok(Json(cashflow::flow(&cashflow_state)))
}

pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<StateParams>,
) -> ApiResult<Summary> {
    let cashflow_state = state.load_state(params.s.as_deref());
    Ok(Json(Summary::of(&cashflow_state)))
}

/// Decoded state plus its canonical fragment. Upgrades legacy links.
pub async fn decoded_state(Query(params): Query<StateParams>) -> ApiResult<Update> {
    let decoded = params
        .s
        .as_deref()
        .and_then(state_codec::decode)
        .ok_or_else(|| AppError::NotFound("State fragment could not be decoded".into()))?;
    Ok(Json(Update::new(decoded)))
}

pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> ApiResult<Update> {
    let current = state.load_state(Some(&request.s));
    let update = cashflow::apply(&current, request.action, state.config.vat_rate)?;
    Ok(Json(update))
}
