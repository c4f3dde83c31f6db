use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use uuid::Uuid;

use super::domain::{QuestId, SubmissionRequest, UserId};
use super::ledger::CompletionLedger;
use super::moderation::ModerationService;
use super::service::{QuestEvaluationService, QuestServiceError};

/// Router builder exposing submission and completion-status endpoints.
pub fn quest_router<L, M>(service: Arc<QuestEvaluationService<L, M>>) -> Router
where
    L: CompletionLedger + 'static,
    M: ModerationService + 'static,
{
    Router::new()
        .route("/quest/submit", post(submit_handler::<L, M>))
        .route(
            "/quest/:quest_id/users/:user_id",
            get(completion_handler::<L, M>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<L, M>(
    State(service): State<Arc<QuestEvaluationService<L, M>>>,
    axum::Json(request): axum::Json<SubmissionRequest>,
) -> Response
where
    L: CompletionLedger + 'static,
    M: ModerationService + 'static,
{
    if let Err(error) = request.validate() {
        let payload = json!({
            "error": error.to_string(),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    match service.evaluate(&request).await {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn completion_handler<L, M>(
    State(service): State<Arc<QuestEvaluationService<L, M>>>,
    Path((quest_id, user_id)): Path<(Uuid, Uuid)>,
) -> Response
where
    L: CompletionLedger + 'static,
    M: ModerationService + 'static,
{
    match service
        .completion(QuestId(quest_id), UserId(user_id))
        .await
    {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

fn service_error_response(error: QuestServiceError) -> Response {
    let status = match error {
        QuestServiceError::Moderation(_) => StatusCode::BAD_GATEWAY,
        QuestServiceError::Ledger(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
