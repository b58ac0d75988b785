//! crates/wordsprout_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format; they
//! derive `serde` traits only because principals are persisted as JSON blobs
//! in the session store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Roles and Principals
//=========================================================================================

/// The closed set of roles a session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teacher,
    Parent,
    Student,
    Guest,
}

impl Role {
    /// Maps a role to its landing route. Total over the enum, so there is no
    /// "unknown role" fallback branch to reach.
    pub fn dashboard_route(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Teacher => "/teacher",
            Self::Parent => "/parent",
            Self::Student | Self::Guest => "/student",
        }
    }
}

/// Profile shape shared by the email-authenticated staff roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffProfile {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
}

/// A registered student. Has a backing row and a stable id usable for
/// foreign-key relations (scores, lesson progress).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: Uuid,
    pub display_name: String,
    pub class_name: Option<String>,
    pub pin_code: String,
    pub score: i32,
    pub stars: i32,
}

/// An ephemeral student identity synthesized when quick-login finds no match.
/// Carries no id: it must never be promoted into a foreign-key relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestProfile {
    pub display_name: String,
    pub class_name: Option<String>,
    pub score: i32,
    pub stars: i32,
}

impl GuestProfile {
    /// A fresh guest with zero score/star defaults.
    pub fn new(display_name: String, class_name: Option<String>) -> Self {
        Self {
            display_name,
            class_name,
            score: 0,
            stars: 0,
        }
    }
}

/// The resolved identity for the current session. Each variant carries its
/// own profile shape, so downstream code cannot confuse a guest (no id) with
/// a registered student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Principal {
    Admin(StaffProfile),
    Teacher(StaffProfile),
    Parent(StaffProfile),
    Student(StudentProfile),
    Guest(GuestProfile),
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Self::Admin(_) => Role::Admin,
            Self::Teacher(_) => Role::Teacher,
            Self::Parent(_) => Role::Parent,
            Self::Student(_) => Role::Student,
            Self::Guest(_) => Role::Guest,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Admin(p) | Self::Teacher(p) | Self::Parent(p) => &p.display_name,
            Self::Student(p) => &p.display_name,
            Self::Guest(p) => &p.display_name,
        }
    }

    pub fn dashboard_route(&self) -> &'static str {
        self.role().dashboard_route()
    }

    /// Returns `true` for an ephemeral identity with no backing row.
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }
}

// Only used internally for staff login - contains sensitive data
#[derive(Debug, Clone)]
pub struct StaffCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
}

// Represents a browser login session (auth cookie) for staff roles
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Lessons and Checkpoints
//=========================================================================================

/// Difficulty labels shown in the lesson form, persisted as ordinals 1-4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Professional,
}

impl Difficulty {
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
            Self::Professional => 4,
        }
    }

    /// Total mapping from raw form input to a difficulty. Accepts the label
    /// set and pre-existing numeric strings; anything unrecognized lands on
    /// the safe middle default rather than failing.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "beginner" | "1" => Self::Beginner,
            "intermediate" | "2" => Self::Intermediate,
            "advanced" | "3" => Self::Advanced,
            "professional" | "4" => Self::Professional,
            _ => Self::default(),
        }
    }
}

/// The kind of interactive prompt a checkpoint opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    #[default]
    Vocab,
    Question,
    Note,
}

/// The editable payload behind a checkpoint. New checkpoints start with every
/// field blank; which fields matter depends on the kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointContent {
    pub question: String,
    pub options: [String; 4],
    pub answer: String,
    pub note: String,
}

/// A time-indexed interactive prompt overlaid on a lesson video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub time_sec: u32,
    pub kind: CheckpointKind,
    pub vocab_id: Option<Uuid>,
    pub content: CheckpointContent,
}

impl Checkpoint {
    /// A blank checkpoint at the given playback time, as seeded by the
    /// editor's "add" action.
    pub fn blank_at(time_sec: u32, kind: CheckpointKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            time_sec,
            kind,
            vocab_id: None,
            content: CheckpointContent::default(),
        }
    }
}

/// The currently-edited revision of a lesson. The id identifies the row that
/// version metadata is persisted against; a lesson that has never been saved
/// has none yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonVersion {
    pub id: Option<Uuid>,
    pub checkpoints: Vec<Checkpoint>,
}

/// The derived metadata written against a version row on save: the
/// canonicalized video URL, the numeric difficulty, and the target
/// vocabulary id list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonVersionMeta {
    pub video_url: String,
    pub difficulty: Difficulty,
    pub vocabulary_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration_sec: u32,
    pub difficulty: Difficulty,
    pub version: LessonVersion,
    pub target_vocabulary: Vec<VocabItem>,
}

//=========================================================================================
// Flat Content Entities
//=========================================================================================
// Created/edited/deleted through direct 1:1 form-to-table mappings; no
// versioning or soft-delete.
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabItem {
    pub id: Uuid,
    pub word: String,
    pub meaning: String,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniGame {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// A score row submitted after a mini-game round. `student_id` is `None` for
/// guest play, which is never written back to a student row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub id: Uuid,
    pub student_id: Option<Uuid>,
    pub game_id: Uuid,
    pub score: i32,
    pub stars: i32,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_route_is_total() {
        assert_eq!(Role::Admin.dashboard_route(), "/admin");
        assert_eq!(Role::Teacher.dashboard_route(), "/teacher");
        assert_eq!(Role::Parent.dashboard_route(), "/parent");
        assert_eq!(Role::Student.dashboard_route(), "/student");
        assert_eq!(Role::Guest.dashboard_route(), "/student");
    }

    #[test]
    fn test_difficulty_from_label_known_labels() {
        assert_eq!(Difficulty::from_label("Beginner"), Difficulty::Beginner);
        assert_eq!(
            Difficulty::from_label("intermediate"),
            Difficulty::Intermediate
        );
        assert_eq!(Difficulty::from_label("ADVANCED"), Difficulty::Advanced);
        assert_eq!(
            Difficulty::from_label("Professional"),
            Difficulty::Professional
        );
    }

    #[test]
    fn test_difficulty_from_label_numeric_passthrough() {
        assert_eq!(Difficulty::from_label("1").ordinal(), 1);
        assert_eq!(Difficulty::from_label("4").ordinal(), 4);
    }

    #[test]
    fn test_difficulty_from_label_defaults_to_intermediate() {
        assert_eq!(Difficulty::from_label(""), Difficulty::Intermediate);
        assert_eq!(Difficulty::from_label("expert"), Difficulty::Intermediate);
        assert_eq!(Difficulty::from_label("7"), Difficulty::Intermediate);
    }

    #[test]
    fn test_principal_round_trips_through_json() {
        let principal = Principal::Student(StudentProfile {
            id: Uuid::new_v4(),
            display_name: "Linh".to_string(),
            class_name: Some("3A".to_string()),
            pin_code: "1234".to_string(),
            score: 120,
            stars: 3,
        });
        let json = serde_json::to_string(&principal).unwrap();
        let restored: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, principal);
        assert_eq!(restored.role(), Role::Student);
    }

    #[test]
    fn test_guest_principal_has_zero_defaults() {
        let guest = Principal::Guest(GuestProfile::new("Bao".to_string(), None));
        assert!(guest.is_guest());
        match guest {
            Principal::Guest(p) => {
                assert_eq!(p.score, 0);
                assert_eq!(p.stars, 0);
            }
            _ => unreachable!(),
        }
    }
}
