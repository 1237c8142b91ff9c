use crate::api::AppState;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::AuthUser;
use crate::api::schemas::envelope::{Ack, Envelope};
use crate::api::schemas::messaging::{
    ConversationRead, ConversationReadResponse, ConversationView, MessageView, SendMessage, SetTyping,
    TypingStatusResponse, UnreadCountResponse,
};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Stores a message from the caller to `receiverId`.
///
/// # Errors
/// Returns `AppError::Forbidden` if `senderId` names someone other than the caller.
/// Returns `AppError::Validation` for a missing receiver, an empty or oversized body,
/// or an unknown receiver/report.
pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SendMessage>,
) -> Result<impl IntoResponse> {
    let sender_id = payload.sender_id.unwrap_or(auth_user.user_id);
    auth_user.ensure_acting_as(sender_id)?;
    let receiver_id =
        payload.receiver_id.ok_or_else(|| AppError::invalid_field("receiverId", "The receiver is required"))?;

    let message = state
        .message_service
        .send_message(sender_id, receiver_id, payload.message.as_deref().unwrap_or_default(), payload.report_id)
        .await?;

    Ok((StatusCode::CREATED, Json(Envelope::ok(MessageView::from(message)))))
}

/// Both directions of the thread, oldest first. Reading does not mark anything read.
///
/// Extractor failures are taken as values so every error carries the empty `data` array.
pub async fn messages_between(
    auth_user: Result<AuthUser>,
    State(state): State<AppState>,
    path: Result<ApiPath<(i64, i64)>>,
) -> Response {
    let result = async {
        let auth_user = auth_user?;
        let ApiPath((user_id, other_user_id)) = path?;
        auth_user.ensure_acting_as(user_id)?;
        state.message_service.messages_between(user_id, other_user_id).await
    }
    .await;

    match result {
        Ok(messages) => {
            let data: Vec<MessageView> = messages.into_iter().map(Into::into).collect();
            Json(Envelope::ok(data)).into_response()
        }
        Err(e) => e.into_list_response(),
    }
}

pub async fn list_conversations(
    auth_user: Result<AuthUser>,
    State(state): State<AppState>,
    path: Result<ApiPath<i64>>,
) -> Response {
    let result = async {
        let auth_user = auth_user?;
        let ApiPath(user_id) = path?;
        auth_user.ensure_acting_as(user_id)?;
        state.conversation_service.list_conversations(user_id).await
    }
    .await;

    match result {
        Ok(summaries) => {
            let data: Vec<ConversationView> = summaries.into_iter().map(Into::into).collect();
            Json(Envelope::ok(data)).into_response()
        }
        Err(e) => e.into_list_response(),
    }
}

/// # Errors
/// Returns `AppError::Database` if the update fails. Unknown or foreign ids succeed.
pub async fn mark_message_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(message_id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    state.message_service.mark_message_read(auth_user.user_id, message_id).await?;
    Ok(Json(Ack::ok()))
}

/// # Errors
/// Returns `AppError::Validation` if either identity is missing.
/// Returns `AppError::Forbidden` if `userId` is not the caller.
pub async fn mark_conversation_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ConversationRead>,
) -> Result<impl IntoResponse> {
    let user_id = payload.user_id.unwrap_or(auth_user.user_id);
    auth_user.ensure_acting_as(user_id)?;
    let other_user_id =
        payload.other_user_id.ok_or_else(|| AppError::invalid_field("otherUserId", "The other user is required"))?;

    let updated = state.message_service.mark_conversation_read(user_id, other_user_id).await?;
    Ok(Json(ConversationReadResponse { success: true, updated }))
}

/// # Errors
/// Returns `AppError::Forbidden` if the path names someone other than the caller.
pub async fn unread_count(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    auth_user.ensure_acting_as(user_id)?;
    let count = state.message_service.unread_count(user_id).await?;
    Ok(Json(UnreadCountResponse { success: true, count }))
}

/// # Errors
/// Returns `AppError::Validation` if the receiver or flag is missing.
/// Returns `AppError::Database` if the signal cannot be written.
pub async fn set_typing(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SetTyping>,
) -> Result<impl IntoResponse> {
    let sender_id = payload.sender_id.unwrap_or(auth_user.user_id);
    auth_user.ensure_acting_as(sender_id)?;
    let receiver_id =
        payload.receiver_id.ok_or_else(|| AppError::invalid_field("receiverId", "The receiver is required"))?;
    let is_typing =
        payload.is_typing.ok_or_else(|| AppError::invalid_field("isTyping", "The typing flag is required"))?;

    state.typing_service.set_typing(sender_id, receiver_id, is_typing).await?;
    Ok(Json(Ack::ok()))
}

/// Whether `sender_id` is currently typing to the caller.
///
/// # Errors
/// Returns `AppError::Forbidden` if the caller is not the receiver.
pub async fn typing_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath((sender_id, receiver_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse> {
    auth_user.ensure_acting_as(receiver_id)?;
    let is_typing = state.typing_service.check_typing(sender_id, receiver_id).await;
    Ok(Json(TypingStatusResponse { success: true, is_typing }))
}
