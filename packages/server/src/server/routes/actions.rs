//! Action endpoints: create, live SSE stream, consolidated history.
//!
//! GET /api/actions/:id/stream[?prompt=...]
//!
//! Without `prompt`, attaches a reader to the action's durable stream and
//! tails it live ("only new" — records appended before subscription are
//! replayed via the history endpoint instead, not the log). With `prompt`,
//! drives a direct assistant completion through the same SSE bridge,
//! bypassing the log.

use std::convert::Infallible;

use async_stream::stream;
use axum::extract::{Extension, Path, Query};
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::common::api::{success, ApiError, ApiResult};
use crate::common::ActionId;
use crate::domains::actions::{run_action, Action, ActionData, ActionTrigger};
use crate::domains::chat::consolidate;
use crate::kernel::{sse, stream_reader};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Deserialize)]
pub struct CreateActionRequest {
    pub prompt: String,
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct StreamQuery {
    /// Optional prompt for a direct completion (bypasses the durable log).
    pub prompt: Option<String>,
}

/// Create an action and kick off its run in the background.
///
/// The run is detached: clients follow it via the stream endpoint and
/// replay it via the history endpoint.
pub async fn create_action_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(request): Json<CreateActionRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let title = request
        .title
        .unwrap_or_else(|| truncate_title(&request.prompt));
    let action = state
        .deps
        .actions
        .create(user.user_id, ActionTrigger::User, title)
        .await;

    let deps = state.deps.clone();
    let (user_id, action_id) = (action.user_id, action.id);
    let prompt = request.prompt;
    tokio::spawn(async move {
        if let Err(e) = run_action(&deps, user_id, action_id, prompt).await {
            error!(action_id = %action_id, error = %e, "Action run failed");
        }
    });

    Ok(success("Action created", ActionData::from(action)))
}

/// SSE stream for one action.
pub async fn stream_action_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(action_id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Sse<BoxStream<'static, Result<Event, Infallible>>>> {
    let deps = &state.deps;
    let action = find_owned_action(&state, &user, &action_id).await?;

    if let Some(prompt) = query.prompt {
        // Direct completion: the caller's own generator, same bridge.
        let events = deps.assistant.stream_completion(&prompt).await?;
        return Ok(sse::bridge(events, deps.sse_keep_alive));
    }

    // Live tail of the durable stream. The abort token is cancelled when
    // the client goes away (response body dropped), which releases the
    // reader's dedicated log connection immediately.
    let abort = CancellationToken::new();
    let events = stream_reader::subscribe(
        &deps.stream_log,
        user.user_id,
        action.id,
        abort.clone(),
        deps.stream_poll_timeout,
    )
    .await;

    let guard = abort.drop_guard();
    let events = stream! {
        let _guard = guard;
        let mut inner = Box::pin(events);
        while let Some(event) = inner.next().await {
            yield event;
        }
    };

    Ok(sse::bridge(events, deps.sse_keep_alive))
}

/// Consolidated conversation history for one action.
pub async fn action_messages_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(action_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let action = find_owned_action(&state, &user, &action_id).await?;

    let history = state.deps.messages.history(action.id).await;
    let turns = consolidate(&history);

    Ok(success("Conversation history", turns))
}

/// Resolve a path id to an action owned by the caller.
///
/// An unparseable id, a missing action, and someone else's action all map
/// to the same 400 so the response doesn't leak which one it was.
async fn find_owned_action(
    state: &AppState,
    user: &AuthUser,
    raw_action_id: &str,
) -> Result<Action, ApiError> {
    let not_found = || ApiError::NotFound("Action not found".to_string());

    let action_id = ActionId::parse(raw_action_id).map_err(|_| not_found())?;
    state
        .deps
        .actions
        .find_for_user(user.user_id, action_id)
        .await
        .ok_or_else(not_found)
}

fn truncate_title(prompt: &str) -> String {
    const MAX_TITLE_CHARS: usize = 60;
    if prompt.chars().count() <= MAX_TITLE_CHARS {
        prompt.to_string()
    } else {
        let cut: String = prompt.chars().take(MAX_TITLE_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}
