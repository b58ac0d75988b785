//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for the lesson preview and checkpoint editor surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wordsprout_core::domain::{Checkpoint, CheckpointKind, Lesson};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================
// NOTE: Video playback itself happens in the browser; the client reports its
// cursor with `progress` and `seek` ticks and the server decides when a
// checkpoint fires.
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Initializes the surface. This must be the first message sent on the connection.
    Init { lesson_id: Uuid },

    /// A playback tick while the video is playing.
    Progress { time: f64 },

    /// The user relocated the playback cursor.
    Seek { time: f64 },

    /// A user-initiated command to resume playback.
    Play,

    /// A user-initiated command to pause playback.
    Pause,

    /// Opens the edit modal over a blank checkpoint at the given time, or at
    /// the current playback position.
    AddCheckpoint {
        time: Option<u32>,
        kind: Option<CheckpointKind>,
    },

    /// Opens the edit modal over an existing checkpoint.
    EditCheckpoint { id: Uuid },

    /// Commits the modal's checkpoint into the timeline.
    SaveCheckpoint { checkpoint: Checkpoint },

    /// Closes the modal or an unconfirmed delete without mutating anything.
    CancelModal,

    /// First phase of the delete flow: mark a checkpoint for deletion.
    DeleteCheckpoint { id: Uuid },

    /// Second phase: commit the pending delete.
    ConfirmDelete,

    /// Applies the lesson form fields and runs the persistence sequence.
    SaveLesson {
        title: Option<String>,
        description: Option<String>,
        video_url: Option<String>,
        difficulty: Option<String>,
        vocabulary_ids: Option<Vec<Uuid>>,
    },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Severity for one-shot notices, mirroring the toast levels in the client.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms successful initialization and carries the full lesson,
    /// including the sorted checkpoint list.
    PreviewInitialized { lesson: Lesson },

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },

    /// A checkpoint fired: playback pauses and the client surfaces the prompt.
    CheckpointReached { checkpoint: Checkpoint },

    /// The edit modal should open, pre-seeded with this draft.
    ModalOpened { draft: Checkpoint },

    /// A delete is pending and awaits confirmation.
    DeletePending { id: Uuid },

    /// The in-memory timeline changed; carries the full sorted list.
    TimelineUpdated { checkpoints: Vec<Checkpoint> },

    /// The outcome of a lesson save: one aggregate message, success or not.
    SaveResult { success: bool, message: String },

    /// A one-shot, non-fatal notification.
    Notice {
        message: String,
        level: NoticeLevel,
    },
}
