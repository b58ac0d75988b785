pub mod auth;
pub mod domain;
pub mod editor;
pub mod media;
pub mod ports;
pub mod session;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthResolver, AuthSnapshot, LoginFailure, LoginSuccess, LOGIN_ROUTE};
pub use domain::{
    Category, Checkpoint, CheckpointContent, CheckpointKind, Difficulty, GameScore, Lesson,
    LessonVersion, LessonVersionMeta, MiniGame, Principal, Role, StaffProfile, StudentProfile,
    Video, VocabItem,
};
pub use editor::{EditorMode, EditorOptions, LessonEditor, SaveReport, SaveStep};
pub use media::clean_video_url;
pub use ports::{AuthProvider, ContentStore, PortError, PortResult, SessionStore};
pub use session::SessionRepository;
pub use timeline::{CheckpointTimeline, PlaybackTracker, DEFAULT_TRIGGER_TOLERANCE_SEC};
