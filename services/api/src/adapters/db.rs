//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ContentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use wordsprout_core::domain::{
    Category, Checkpoint, CheckpointContent, CheckpointKind, Difficulty, GameScore, Lesson,
    LessonVersion, LessonVersionMeta, MiniGame, StudentProfile, Video, VocabItem,
};
use wordsprout_core::ports::{ContentStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ContentStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// The current (latest) version row for a lesson, if one exists.
    async fn current_version_id(&self, lesson_id: Uuid) -> PortResult<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM lesson_versions WHERE lesson_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(|(id,)| id))
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StudentRecord {
    id: Uuid,
    display_name: String,
    class_name: Option<String>,
    pin_code: String,
    score: i32,
    stars: i32,
}
impl StudentRecord {
    fn to_domain(self) -> StudentProfile {
        StudentProfile {
            id: self.id,
            display_name: self.display_name,
            class_name: self.class_name,
            pin_code: self.pin_code,
            score: self.score,
            stars: self.stars,
        }
    }
}

#[derive(FromRow)]
struct VideoRecord {
    id: Uuid,
    title: String,
    url: String,
    category_id: Option<Uuid>,
}
impl VideoRecord {
    fn to_domain(self) -> Video {
        Video {
            id: self.id,
            title: self.title,
            url: self.url,
            category_id: self.category_id,
        }
    }
}

#[derive(FromRow)]
struct VocabRecord {
    id: Uuid,
    word: String,
    meaning: String,
    category_id: Option<Uuid>,
}
impl VocabRecord {
    fn to_domain(self) -> VocabItem {
        VocabItem {
            id: self.id,
            word: self.word,
            meaning: self.meaning,
            category_id: self.category_id,
        }
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
    color: String,
    icon: String,
}
impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            color: self.color,
            icon: self.icon,
        }
    }
}

#[derive(FromRow)]
struct GameRecord {
    id: Uuid,
    name: String,
    color: String,
    icon: String,
}
impl GameRecord {
    fn to_domain(self) -> MiniGame {
        MiniGame {
            id: self.id,
            name: self.name,
            color: self.color,
            icon: self.icon,
        }
    }
}

#[derive(FromRow)]
struct ScoreRecord {
    id: Uuid,
    student_id: Option<Uuid>,
    game_id: Uuid,
    score: i32,
    stars: i32,
    recorded_at: chrono::DateTime<chrono::Utc>,
}
impl ScoreRecord {
    fn to_domain(self) -> GameScore {
        GameScore {
            id: self.id,
            student_id: self.student_id,
            game_id: self.game_id,
            score: self.score,
            stars: self.stars,
            recorded_at: self.recorded_at,
        }
    }
}

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    title: String,
    description: String,
}

#[derive(FromRow)]
struct VersionRecord {
    id: Uuid,
    video_url: String,
    duration_sec: i32,
    difficulty: i16,
    vocabulary_ids: Vec<Uuid>,
}

#[derive(FromRow)]
struct CheckpointRecord {
    id: Uuid,
    time_sec: i32,
    kind: String,
    vocab_id: Option<Uuid>,
    question: String,
    options: Vec<String>,
    answer: String,
    note: String,
}
impl CheckpointRecord {
    fn to_domain(self) -> Checkpoint {
        let mut options = <[String; 4]>::default();
        for (slot, value) in options.iter_mut().zip(self.options) {
            *slot = value;
        }
        Checkpoint {
            id: self.id,
            time_sec: self.time_sec.max(0) as u32,
            kind: kind_from_str(&self.kind),
            vocab_id: self.vocab_id,
            content: CheckpointContent {
                question: self.question,
                options,
                answer: self.answer,
                note: self.note,
            },
        }
    }
}

fn kind_from_str(kind: &str) -> CheckpointKind {
    match kind {
        "question" => CheckpointKind::Question,
        "note" => CheckpointKind::Note,
        _ => CheckpointKind::Vocab,
    }
}

fn kind_to_str(kind: CheckpointKind) -> &'static str {
    match kind {
        CheckpointKind::Vocab => "vocab",
        CheckpointKind::Question => "question",
        CheckpointKind::Note => "note",
    }
}

fn difficulty_from_ordinal(ordinal: i16) -> Difficulty {
    match ordinal {
        1 => Difficulty::Beginner,
        3 => Difficulty::Advanced,
        4 => Difficulty::Professional,
        _ => Difficulty::Intermediate,
    }
}

//=========================================================================================
// `ContentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentStore for DbAdapter {
    async fn list_students(&self) -> PortResult<Vec<StudentProfile>> {
        let records = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, display_name, class_name, pin_code, score, stars FROM students ORDER BY display_name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_student_by_id(&self, student_id: Uuid) -> PortResult<StudentProfile> {
        let record = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, display_name, class_name, pin_code, score, stars FROM students WHERE id = $1",
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Student {} not found", student_id)))?;
        Ok(record.to_domain())
    }

    async fn find_student_by_pin(&self, pin: &str) -> PortResult<StudentProfile> {
        let record = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, display_name, class_name, pin_code, score, stars FROM students WHERE pin_code = $1",
        )
        .bind(pin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "No student with that PIN".to_string()))?;
        Ok(record.to_domain())
    }

    async fn search_students_by_name(&self, name: &str) -> PortResult<Vec<StudentProfile>> {
        let records = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, display_name, class_name, pin_code, score, stars FROM students \
             WHERE display_name ILIKE '%' || $1 || '%' ORDER BY display_name ASC",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_student(&self, student: StudentProfile) -> PortResult<StudentProfile> {
        sqlx::query(
            "INSERT INTO students (id, display_name, class_name, pin_code, score, stars) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(student.id)
        .bind(&student.display_name)
        .bind(&student.class_name)
        .bind(&student.pin_code)
        .bind(student.score)
        .bind(student.stars)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(student)
    }

    async fn update_student(&self, student: StudentProfile) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE students SET display_name = $2, class_name = $3, pin_code = $4, score = $5, stars = $6 \
             WHERE id = $1",
        )
        .bind(student.id)
        .bind(&student.display_name)
        .bind(&student.class_name)
        .bind(&student.pin_code)
        .bind(student.score)
        .bind(student.stars)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Student {} not found",
                student.id
            )));
        }
        Ok(())
    }

    async fn delete_student(&self, student_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(student_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_videos(&self) -> PortResult<Vec<Video>> {
        let records = sqlx::query_as::<_, VideoRecord>(
            "SELECT id, title, url, category_id FROM videos ORDER BY title ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_video(&self, video: Video) -> PortResult<Video> {
        sqlx::query("INSERT INTO videos (id, title, url, category_id) VALUES ($1, $2, $3, $4)")
            .bind(video.id)
            .bind(&video.title)
            .bind(&video.url)
            .bind(video.category_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(video)
    }

    async fn update_video(&self, video: Video) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE videos SET title = $2, url = $3, category_id = $4 WHERE id = $1")
                .bind(video.id)
                .bind(&video.title)
                .bind(&video.url)
                .bind(video.category_id)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Video {} not found", video.id)));
        }
        Ok(())
    }

    async fn delete_video(&self, video_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(video_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_vocabulary(&self, category_id: Option<Uuid>) -> PortResult<Vec<VocabItem>> {
        let records = sqlx::query_as::<_, VocabRecord>(
            "SELECT id, word, meaning, category_id FROM vocabulary \
             WHERE $1::uuid IS NULL OR category_id = $1 ORDER BY word ASC",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_vocab(&self, item: VocabItem) -> PortResult<VocabItem> {
        sqlx::query("INSERT INTO vocabulary (id, word, meaning, category_id) VALUES ($1, $2, $3, $4)")
            .bind(item.id)
            .bind(&item.word)
            .bind(&item.meaning)
            .bind(item.category_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(item)
    }

    async fn update_vocab(&self, item: VocabItem) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE vocabulary SET word = $2, meaning = $3, category_id = $4 WHERE id = $1",
        )
        .bind(item.id)
        .bind(&item.word)
        .bind(&item.meaning)
        .bind(item.category_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Vocab {} not found", item.id)));
        }
        Ok(())
    }

    async fn delete_vocab(&self, vocab_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM vocabulary WHERE id = $1")
            .bind(vocab_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, color, icon FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_category(&self, category: Category) -> PortResult<Category> {
        sqlx::query("INSERT INTO categories (id, name, color, icon) VALUES ($1, $2, $3, $4)")
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.color)
            .bind(&category.icon)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(category)
    }

    async fn update_category(&self, category: Category) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE categories SET name = $2, color = $3, icon = $4 WHERE id = $1")
                .bind(category.id)
                .bind(&category.name)
                .bind(&category.color)
                .bind(&category.icon)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Category {} not found",
                category.id
            )));
        }
        Ok(())
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_games(&self) -> PortResult<Vec<MiniGame>> {
        let records = sqlx::query_as::<_, GameRecord>(
            "SELECT id, name, color, icon FROM games ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_game(&self, game: MiniGame) -> PortResult<MiniGame> {
        sqlx::query("INSERT INTO games (id, name, color, icon) VALUES ($1, $2, $3, $4)")
            .bind(game.id)
            .bind(&game.name)
            .bind(&game.color)
            .bind(&game.icon)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(game)
    }

    async fn update_game(&self, game: MiniGame) -> PortResult<()> {
        let result = sqlx::query("UPDATE games SET name = $2, color = $3, icon = $4 WHERE id = $1")
            .bind(game.id)
            .bind(&game.name)
            .bind(&game.color)
            .bind(&game.icon)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Game {} not found", game.id)));
        }
        Ok(())
    }

    async fn delete_game(&self, game_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(game_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn record_score(&self, score: GameScore) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO scores (id, student_id, game_id, score, stars, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(score.id)
        .bind(score.student_id)
        .bind(score.game_id)
        .bind(score.score)
        .bind(score.stars)
        .bind(score.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_scores_for_student(&self, student_id: Uuid) -> PortResult<Vec<GameScore>> {
        let records = sqlx::query_as::<_, ScoreRecord>(
            "SELECT id, student_id, game_id, score, stars, recorded_at FROM scores \
             WHERE student_id = $1 ORDER BY recorded_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let lesson = sqlx::query_as::<_, LessonRecord>(
            "SELECT id, title, description FROM lessons WHERE id = $1",
        )
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Lesson {} not found", lesson_id)))?;

        let version = sqlx::query_as::<_, VersionRecord>(
            "SELECT id, video_url, duration_sec, difficulty, vocabulary_ids FROM lesson_versions \
             WHERE lesson_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        let Some(version) = version else {
            // A lesson that has never been saved with a version yet.
            return Ok(Lesson {
                id: lesson.id,
                title: lesson.title,
                description: lesson.description,
                video_url: String::new(),
                duration_sec: 0,
                difficulty: Difficulty::default(),
                version: LessonVersion {
                    id: None,
                    checkpoints: Vec::new(),
                },
                target_vocabulary: Vec::new(),
            });
        };

        let checkpoints = sqlx::query_as::<_, CheckpointRecord>(
            "SELECT id, time_sec, kind, vocab_id, question, options, answer, note \
             FROM checkpoints WHERE version_id = $1 ORDER BY time_sec ASC",
        )
        .bind(version.id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let vocabulary = sqlx::query_as::<_, VocabRecord>(
            "SELECT id, word, meaning, category_id FROM vocabulary WHERE id = ANY($1)",
        )
        .bind(&version.vocabulary_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(Lesson {
            id: lesson.id,
            title: lesson.title,
            description: lesson.description,
            video_url: version.video_url,
            duration_sec: version.duration_sec.max(0) as u32,
            difficulty: difficulty_from_ordinal(version.difficulty),
            version: LessonVersion {
                id: Some(version.id),
                checkpoints: checkpoints.into_iter().map(|r| r.to_domain()).collect(),
            },
            target_vocabulary: vocabulary.into_iter().map(|r| r.to_domain()).collect(),
        })
    }

    async fn save_checkpoints(
        &self,
        lesson_id: Uuid,
        checkpoints: &[Checkpoint],
    ) -> PortResult<()> {
        // A lesson edited before its first save has no version row yet; one
        // is created so the checkpoint list always has a home.
        let version_id = match self.current_version_id(lesson_id).await? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    "INSERT INTO lesson_versions (id, lesson_id, video_url, duration_sec, difficulty, vocabulary_ids) \
                     VALUES ($1, $2, '', 0, 2, '{}')",
                )
                .bind(id)
                .bind(lesson_id)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
                id
            }
        };

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM checkpoints WHERE version_id = $1")
            .bind(version_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        for checkpoint in checkpoints {
            sqlx::query(
                "INSERT INTO checkpoints (id, version_id, time_sec, kind, vocab_id, question, options, answer, note) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(checkpoint.id)
            .bind(version_id)
            .bind(checkpoint.time_sec as i32)
            .bind(kind_to_str(checkpoint.kind))
            .bind(checkpoint.vocab_id)
            .bind(&checkpoint.content.question)
            .bind(checkpoint.content.options.to_vec())
            .bind(&checkpoint.content.answer)
            .bind(&checkpoint.content.note)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn save_version_meta(
        &self,
        version_id: Uuid,
        meta: &LessonVersionMeta,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE lesson_versions SET video_url = $2, difficulty = $3, vocabulary_ids = $4 \
             WHERE id = $1",
        )
        .bind(version_id)
        .bind(&meta.video_url)
        .bind(i16::from(meta.difficulty.ordinal()))
        .bind(&meta.vocabulary_ids)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Lesson version {} not found",
                version_id
            )));
        }
        Ok(())
    }

    async fn save_lesson_info(
        &self,
        lesson_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<()> {
        let result = sqlx::query("UPDATE lessons SET title = $2, description = $3 WHERE id = $1")
            .bind(lesson_id)
            .bind(title)
            .bind(description)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Lesson {} not found",
                lesson_id
            )));
        }
        Ok(())
    }
}
