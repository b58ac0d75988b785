//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a lesson preview
//! WebSocket connection. It manages the editor's state machine and relays
//! checkpoint triggers and timeline changes back to the client.

use crate::web::{
    protocol::{ClientMessage, NoticeLevel, ServerMessage},
    state::{AppState, PreviewMode, PreviewState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use wordsprout_core::editor::{EditorError, EditorMode};

/// Query parameters accepted on the preview upgrade request.
#[derive(Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub mode: PreviewMode,
}

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn preview_ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<PreviewQuery>,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, query.mode))
}

async fn handle_socket(mut socket: WebSocket, app_state: Arc<AppState>, mode: PreviewMode) {
    info!("New preview connection established (mode: {:?})", mode);

    // --- 1. Initialization Phase ---
    let mut preview = if let Some(Ok(Message::Text(init_json))) = socket.recv().await {
        match serde_json::from_str::<ClientMessage>(&init_json) {
            Ok(ClientMessage::Init { lesson_id }) => {
                info!("Initializing preview for lesson: {}", lesson_id);
                match app_state.content.get_lesson(lesson_id).await {
                    Ok(lesson) => {
                        let state =
                            PreviewState::new(lesson.clone(), mode, app_state.editor_options());
                        let init_msg = ServerMessage::PreviewInitialized { lesson };
                        if send(&mut socket, &init_msg).await.is_err() {
                            error!("Failed to send preview initialized message.");
                            return;
                        }
                        state
                    }
                    Err(e) => {
                        error!("Failed to load lesson {}: {:?}", lesson_id, e);
                        let err_msg = ServerMessage::Error {
                            message: "Failed to load lesson data.".to_string(),
                        };
                        let _ = send(&mut socket, &err_msg).await;
                        return;
                    }
                }
            }
            _ => {
                error!("First message was not a valid Init message.");
                return;
            }
        }
    } else {
        error!("Client disconnected before sending Init message.");
        return;
    };

    // --- 2. Main Message Loop ---
    loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => {
                let replies = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(client_msg, &app_state, &mut preview).await
                    }
                    Err(e) => {
                        warn!("Failed to deserialize client message: {}", e);
                        Vec::new()
                    }
                };
                for reply in replies {
                    if send(&mut socket, &reply).await.is_err() {
                        info!("Client went away while sending; closing connection.");
                        return;
                    }
                }
            }
            Some(Ok(Message::Close(_))) => {
                info!("Client sent close message.");
                break;
            }
            Some(Ok(_)) => {}
            _ => {
                info!("Client disconnected.");
                break;
            }
        }
    }

    info!("Preview connection closed.");
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message)
        .map_err(|e| axum::Error::new(std::io::Error::other(e)))?;
    socket.send(Message::Text(json.into())).await
}

fn editing_unavailable() -> ServerMessage {
    ServerMessage::Notice {
        message: "Chỉnh sửa không khả dụng trong chế độ xem".to_string(),
        level: NoticeLevel::Warning,
    }
}

fn editor_notice(error: &EditorError) -> ServerMessage {
    let message = match error {
        EditorError::UnknownCheckpoint => "Không tìm thấy điểm dừng",
        EditorError::BeyondDuration { .. } => "Thời gian điểm dừng vượt quá độ dài bài học",
        EditorError::NoModalOpen | EditorError::NoDeletePending => "Thao tác không hợp lệ",
    };
    ServerMessage::Notice {
        message: message.to_string(),
        level: NoticeLevel::Error,
    }
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_client_message(
    message: ClientMessage,
    app_state: &Arc<AppState>,
    preview: &mut PreviewState,
) -> Vec<ServerMessage> {
    match message {
        ClientMessage::Init { .. } => {
            warn!("Received subsequent Init message, which is ignored.");
            Vec::new()
        }
        ClientMessage::Progress { time } => match preview.editor.handle_progress(time) {
            Some(checkpoint) => {
                info!(
                    "Checkpoint {} reached at t={}s; pausing playback.",
                    checkpoint.id, checkpoint.time_sec
                );
                vec![ServerMessage::CheckpointReached { checkpoint }]
            }
            None => Vec::new(),
        },
        ClientMessage::Seek { time } => {
            preview.editor.handle_seek(time);
            Vec::new()
        }
        ClientMessage::Play => {
            preview.editor.play();
            Vec::new()
        }
        ClientMessage::Pause => {
            preview.editor.pause();
            Vec::new()
        }
        ClientMessage::AddCheckpoint { time, kind } => {
            if !preview.mode.allows_editing() {
                return vec![editing_unavailable()];
            }
            preview.editor.add_checkpoint(time, kind);
            match preview.editor.mode() {
                EditorMode::Editing(draft) => vec![ServerMessage::ModalOpened {
                    draft: draft.clone(),
                }],
                _ => Vec::new(),
            }
        }
        ClientMessage::EditCheckpoint { id } => {
            if !preview.mode.allows_editing() {
                return vec![editing_unavailable()];
            }
            match preview.editor.edit_checkpoint(id) {
                Ok(()) => match preview.editor.mode() {
                    EditorMode::Editing(draft) => vec![ServerMessage::ModalOpened {
                        draft: draft.clone(),
                    }],
                    _ => Vec::new(),
                },
                Err(e) => vec![editor_notice(&e)],
            }
        }
        ClientMessage::SaveCheckpoint { checkpoint } => {
            if !preview.mode.allows_editing() {
                return vec![editing_unavailable()];
            }
            match preview.editor.save_from_modal(checkpoint) {
                Ok(()) => vec![ServerMessage::TimelineUpdated {
                    checkpoints: preview.editor.timeline().as_slice().to_vec(),
                }],
                Err(e) => vec![editor_notice(&e)],
            }
        }
        ClientMessage::CancelModal => {
            preview.editor.cancel_modal();
            Vec::new()
        }
        ClientMessage::DeleteCheckpoint { id } => {
            if !preview.mode.allows_editing() {
                return vec![editing_unavailable()];
            }
            match preview.editor.request_delete(id) {
                Ok(()) => vec![ServerMessage::DeletePending { id }],
                Err(e) => vec![editor_notice(&e)],
            }
        }
        ClientMessage::ConfirmDelete => {
            if !preview.mode.allows_editing() {
                return vec![editing_unavailable()];
            }
            match preview.editor.confirm_delete() {
                Ok(removed) => {
                    info!("Checkpoint {} deleted.", removed.id);
                    vec![ServerMessage::TimelineUpdated {
                        checkpoints: preview.editor.timeline().as_slice().to_vec(),
                    }]
                }
                Err(e) => vec![editor_notice(&e)],
            }
        }
        ClientMessage::SaveLesson {
            title,
            description,
            video_url,
            difficulty,
            vocabulary_ids,
        } => {
            if !preview.mode.allows_editing() {
                return vec![editing_unavailable()];
            }
            if let Some(title) = title {
                preview.editor.set_title(title);
            }
            if let Some(description) = description {
                preview.editor.set_description(description);
            }
            if let Some(video_url) = video_url {
                preview.editor.set_video_url(video_url);
            }
            if let Some(difficulty) = difficulty {
                preview.editor.set_difficulty_label(&difficulty);
            }
            if let Some(ids) = vocabulary_ids {
                preview.editor.set_vocabulary_ids(ids);
            }

            let report = preview.editor.save(app_state.content.as_ref()).await;
            if !report.is_complete_success() {
                warn!(
                    "Lesson {} save finished with failed steps: {:?}",
                    preview.lesson_id,
                    report.failed_steps()
                );
            }
            vec![ServerMessage::SaveResult {
                success: report.is_complete_success(),
                message: report.user_message().to_string(),
            }]
        }
    }
}
