//! crates/wordsprout_core/src/testing.rs
//!
//! In-memory fakes for the port traits, shared by the unit tests in this
//! crate. Compiled only for tests.

use crate::domain::{
    Category, Checkpoint, GameScore, Lesson, LessonVersionMeta, MiniGame, Principal,
    StudentProfile, Video, VocabItem,
};
use crate::ports::{
    AuthProvider, ContentStore, PortError, PortResult, SessionStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

//=========================================================================================
// MemorySessionStore
//=========================================================================================

/// A `SessionStore` backed by a plain map, mirroring browser local storage.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

impl MemorySessionStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

//=========================================================================================
// FakeAuthProvider
//=========================================================================================

/// An `AuthProvider` over a fixed credential table. Tokens are handed out
/// sequentially and remain valid until `logout`.
#[derive(Default)]
pub struct FakeAuthProvider {
    accounts: Mutex<Vec<(String, String, Principal)>>,
    sessions: Mutex<HashMap<String, Principal>>,
    counter: Mutex<u32>,
}

impl FakeAuthProvider {
    pub fn with_account(self, email: &str, password: &str, principal: Principal) -> Self {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner()).push((
            email.to_string(),
            password.to_string(),
            principal,
        ));
        self
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn login(&self, email: &str, password: &str) -> PortResult<(Principal, String)> {
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        let found = accounts
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .map(|(_, _, principal)| principal.clone());
        drop(accounts);

        let principal = found.ok_or(PortError::Unauthorized)?;
        let mut counter = self.counter.lock().unwrap_or_else(|e| e.into_inner());
        *counter += 1;
        let token = format!("token-{counter}");
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.clone(), principal.clone());
        Ok((principal, token))
    }

    async fn current_user(&self, token: &str) -> PortResult<Option<Principal>> {
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .cloned())
    }

    async fn logout(&self, token: &str) -> PortResult<()> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token);
        Ok(())
    }
}

//=========================================================================================
// FakeContentStore
//=========================================================================================

/// Which save-saga steps the fake should reject, for partial-failure tests.
#[derive(Default)]
pub struct FailureFlags {
    pub checkpoints: bool,
    pub version_meta: bool,
    pub lesson_info: bool,
}

#[derive(Default)]
struct ContentInner {
    students: Vec<StudentProfile>,
    videos: Vec<Video>,
    vocabulary: Vec<VocabItem>,
    categories: Vec<Category>,
    games: Vec<MiniGame>,
    scores: Vec<GameScore>,
    lessons: Vec<Lesson>,
    saved_checkpoints: Option<Vec<Checkpoint>>,
    saved_meta: Option<LessonVersionMeta>,
    saved_info: Option<(String, String)>,
}

/// A `ContentStore` over in-memory vectors, with hooks to record what the
/// save saga wrote and to inject per-step failures.
#[derive(Default)]
pub struct FakeContentStore {
    inner: Mutex<ContentInner>,
    pub fail: FailureFlags,
}

impl FakeContentStore {
    pub fn with_students(students: Vec<StudentProfile>) -> Self {
        let store = Self::default();
        store.lock().students = students;
        store
    }

    pub fn failing(mut self, fail: FailureFlags) -> Self {
        self.fail = fail;
        self
    }

    pub fn saved_checkpoints(&self) -> Option<Vec<Checkpoint>> {
        self.lock().saved_checkpoints.clone()
    }

    pub fn saved_meta(&self) -> Option<LessonVersionMeta> {
        self.lock().saved_meta.clone()
    }

    pub fn saved_info(&self) -> Option<(String, String)> {
        self.lock().saved_info.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ContentInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ContentStore for FakeContentStore {
    async fn list_students(&self) -> PortResult<Vec<StudentProfile>> {
        Ok(self.lock().students.clone())
    }

    async fn get_student_by_id(&self, student_id: Uuid) -> PortResult<StudentProfile> {
        self.lock()
            .students
            .iter()
            .find(|s| s.id == student_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Student {student_id} not found")))
    }

    async fn find_student_by_pin(&self, pin: &str) -> PortResult<StudentProfile> {
        self.lock()
            .students
            .iter()
            .find(|s| s.pin_code == pin)
            .cloned()
            .ok_or_else(|| PortError::NotFound("No student with that PIN".to_string()))
    }

    async fn search_students_by_name(&self, name: &str) -> PortResult<Vec<StudentProfile>> {
        let needle = name.to_lowercase();
        Ok(self
            .lock()
            .students
            .iter()
            .filter(|s| s.display_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn create_student(&self, student: StudentProfile) -> PortResult<StudentProfile> {
        self.lock().students.push(student.clone());
        Ok(student)
    }

    async fn update_student(&self, student: StudentProfile) -> PortResult<()> {
        let mut inner = self.lock();
        match inner.students.iter_mut().find(|s| s.id == student.id) {
            Some(slot) => {
                *slot = student;
                Ok(())
            }
            None => Err(PortError::NotFound(format!(
                "Student {} not found",
                student.id
            ))),
        }
    }

    async fn delete_student(&self, student_id: Uuid) -> PortResult<()> {
        self.lock().students.retain(|s| s.id != student_id);
        Ok(())
    }

    async fn list_videos(&self) -> PortResult<Vec<Video>> {
        Ok(self.lock().videos.clone())
    }

    async fn create_video(&self, video: Video) -> PortResult<Video> {
        self.lock().videos.push(video.clone());
        Ok(video)
    }

    async fn update_video(&self, video: Video) -> PortResult<()> {
        let mut inner = self.lock();
        match inner.videos.iter_mut().find(|v| v.id == video.id) {
            Some(slot) => {
                *slot = video;
                Ok(())
            }
            None => Err(PortError::NotFound(format!("Video {} not found", video.id))),
        }
    }

    async fn delete_video(&self, video_id: Uuid) -> PortResult<()> {
        self.lock().videos.retain(|v| v.id != video_id);
        Ok(())
    }

    async fn list_vocabulary(&self, category_id: Option<Uuid>) -> PortResult<Vec<VocabItem>> {
        Ok(self
            .lock()
            .vocabulary
            .iter()
            .filter(|v| category_id.is_none() || v.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn create_vocab(&self, item: VocabItem) -> PortResult<VocabItem> {
        self.lock().vocabulary.push(item.clone());
        Ok(item)
    }

    async fn update_vocab(&self, item: VocabItem) -> PortResult<()> {
        let mut inner = self.lock();
        match inner.vocabulary.iter_mut().find(|v| v.id == item.id) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(PortError::NotFound(format!("Vocab {} not found", item.id))),
        }
    }

    async fn delete_vocab(&self, vocab_id: Uuid) -> PortResult<()> {
        self.lock().vocabulary.retain(|v| v.id != vocab_id);
        Ok(())
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        Ok(self.lock().categories.clone())
    }

    async fn create_category(&self, category: Category) -> PortResult<Category> {
        self.lock().categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, category: Category) -> PortResult<()> {
        let mut inner = self.lock();
        match inner.categories.iter_mut().find(|c| c.id == category.id) {
            Some(slot) => {
                *slot = category;
                Ok(())
            }
            None => Err(PortError::NotFound(format!(
                "Category {} not found",
                category.id
            ))),
        }
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        self.lock().categories.retain(|c| c.id != category_id);
        Ok(())
    }

    async fn list_games(&self) -> PortResult<Vec<MiniGame>> {
        Ok(self.lock().games.clone())
    }

    async fn create_game(&self, game: MiniGame) -> PortResult<MiniGame> {
        self.lock().games.push(game.clone());
        Ok(game)
    }

    async fn update_game(&self, game: MiniGame) -> PortResult<()> {
        let mut inner = self.lock();
        match inner.games.iter_mut().find(|g| g.id == game.id) {
            Some(slot) => {
                *slot = game;
                Ok(())
            }
            None => Err(PortError::NotFound(format!("Game {} not found", game.id))),
        }
    }

    async fn delete_game(&self, game_id: Uuid) -> PortResult<()> {
        self.lock().games.retain(|g| g.id != game_id);
        Ok(())
    }

    async fn record_score(&self, score: GameScore) -> PortResult<()> {
        self.lock().scores.push(score);
        Ok(())
    }

    async fn list_scores_for_student(&self, student_id: Uuid) -> PortResult<Vec<GameScore>> {
        Ok(self
            .lock()
            .scores
            .iter()
            .filter(|s| s.student_id == Some(student_id))
            .cloned()
            .collect())
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        self.lock()
            .lessons
            .iter()
            .find(|l| l.id == lesson_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Lesson {lesson_id} not found")))
    }

    async fn save_checkpoints(
        &self,
        _lesson_id: Uuid,
        checkpoints: &[Checkpoint],
    ) -> PortResult<()> {
        if self.fail.checkpoints {
            return Err(PortError::Unexpected("checkpoint write rejected".to_string()));
        }
        self.lock().saved_checkpoints = Some(checkpoints.to_vec());
        Ok(())
    }

    async fn save_version_meta(
        &self,
        _version_id: Uuid,
        meta: &LessonVersionMeta,
    ) -> PortResult<()> {
        if self.fail.version_meta {
            return Err(PortError::Unexpected("version write rejected".to_string()));
        }
        self.lock().saved_meta = Some(meta.clone());
        Ok(())
    }

    async fn save_lesson_info(
        &self,
        _lesson_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<()> {
        if self.fail.lesson_info {
            return Err(PortError::Unexpected("lesson write rejected".to_string()));
        }
        self.lock().saved_info = Some((title.to_string(), description.to_string()));
        Ok(())
    }
}
