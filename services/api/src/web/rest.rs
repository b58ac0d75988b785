//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification. Content management is a set of
//! direct 1:1 form-to-table mappings; there is no versioning or soft-delete.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;
use wordsprout_core::domain::{Category, GameScore, MiniGame, StudentProfile, Video, VocabItem};
use wordsprout_core::ports::PortError;

use crate::web::auth::{
    AuthResponse, DemoLoginRequest, LoginRequest, LogoutResponse, MeResponse, PinLoginRequest,
    PrincipalDto, QuickLoginRequest,
};
use crate::web::state::AppState;

const MSG_MISSING_FIELDS: &str = "Vui lòng nhập đầy đủ thông tin";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::login_handler,
        crate::web::auth::pin_login_handler,
        crate::web::auth::quick_login_handler,
        crate::web::auth::demo_login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::me_handler,
        list_videos_handler,
        create_video_handler,
        update_video_handler,
        delete_video_handler,
        list_vocabulary_handler,
        create_vocab_handler,
        update_vocab_handler,
        delete_vocab_handler,
        list_categories_handler,
        create_category_handler,
        update_category_handler,
        delete_category_handler,
        list_games_handler,
        create_game_handler,
        update_game_handler,
        delete_game_handler,
        list_students_handler,
        create_student_handler,
        update_student_handler,
        delete_student_handler,
        submit_score_handler,
        list_student_scores_handler,
        get_lesson_handler,
    ),
    components(
        schemas(
            LoginRequest,
            PinLoginRequest,
            QuickLoginRequest,
            DemoLoginRequest,
            AuthResponse,
            MeResponse,
            LogoutResponse,
            PrincipalDto,
            VideoPayload,
            VocabPayload,
            CategoryPayload,
            GamePayload,
            StudentPayload,
            ScorePayload,
        )
    ),
    tags(
        (name = "WordSprout API", description = "API endpoints for the English-learning app: auth, content management, and lessons.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct VideoPayload {
    pub title: String,
    pub url: String,
    pub category_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
pub struct VocabPayload {
    pub word: String,
    pub meaning: String,
    pub category_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
pub struct CategoryPayload {
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GamePayload {
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StudentPayload {
    pub display_name: String,
    pub class_name: Option<String>,
    pub pin_code: String,
    pub score: Option<i32>,
    pub stars: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct ScorePayload {
    /// Absent for guest play; a guest score is never tied to a student row.
    pub student_id: Option<Uuid>,
    pub game_id: Uuid,
    pub score: i32,
    pub stars: i32,
}

#[derive(Deserialize)]
pub struct VocabQuery {
    pub category_id: Option<Uuid>,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, what),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(detail) => {
            error!("Content store failure: {}", detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Có lỗi xảy ra, vui lòng thử lại".to_string(),
            )
        }
    }
}

fn require_fields(fields: &[&str]) -> Result<(), (StatusCode, String)> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err((StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS.to_string()));
    }
    Ok(())
}

//=========================================================================================
// Video Handlers
//=========================================================================================

/// GET /videos - List all videos
#[utoipa::path(
    get,
    path = "/videos",
    responses((status = 200, description = "All videos"))
)]
pub async fn list_videos_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let videos = state
        .content
        .list_videos()
        .await
        .map_err(port_error_response)?;
    Ok(Json(videos))
}

/// POST /videos - Create a video
#[utoipa::path(
    post,
    path = "/videos",
    request_body = VideoPayload,
    responses(
        (status = 201, description = "Video created"),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_video_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VideoPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.title.as_str(), payload.url.as_str()])?;
    let video = Video {
        id: Uuid::new_v4(),
        title: payload.title,
        url: payload.url,
        category_id: payload.category_id,
    };
    let created = state
        .content
        .create_video(video)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /videos/{id} - Update a video
#[utoipa::path(
    put,
    path = "/videos/{id}",
    request_body = VideoPayload,
    params(("id" = Uuid, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video updated"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn update_video_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VideoPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.title.as_str(), payload.url.as_str()])?;
    let video = Video {
        id,
        title: payload.title,
        url: payload.url,
        category_id: payload.category_id,
    };
    state
        .content
        .update_video(video.clone())
        .await
        .map_err(port_error_response)?;
    Ok(Json(video))
}

/// DELETE /videos/{id} - Delete a video
#[utoipa::path(
    delete,
    path = "/videos/{id}",
    params(("id" = Uuid, Path, description = "Video id")),
    responses((status = 204, description = "Video deleted"))
)]
pub async fn delete_video_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .content
        .delete_video(id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Vocabulary Handlers
//=========================================================================================

/// GET /vocabulary - List vocabulary, optionally filtered by category
#[utoipa::path(
    get,
    path = "/vocabulary",
    params(("category_id" = Option<Uuid>, Query, description = "Filter by category")),
    responses((status = 200, description = "Vocabulary items"))
)]
pub async fn list_vocabulary_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VocabQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let items = state
        .content
        .list_vocabulary(query.category_id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(items))
}

/// POST /vocabulary - Create a vocabulary item
#[utoipa::path(
    post,
    path = "/vocabulary",
    request_body = VocabPayload,
    responses(
        (status = 201, description = "Vocabulary item created"),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_vocab_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VocabPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.word.as_str(), payload.meaning.as_str()])?;
    let item = VocabItem {
        id: Uuid::new_v4(),
        word: payload.word,
        meaning: payload.meaning,
        category_id: payload.category_id,
    };
    let created = state
        .content
        .create_vocab(item)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /vocabulary/{id} - Update a vocabulary item
#[utoipa::path(
    put,
    path = "/vocabulary/{id}",
    request_body = VocabPayload,
    params(("id" = Uuid, Path, description = "Vocabulary id")),
    responses(
        (status = 200, description = "Vocabulary item updated"),
        (status = 404, description = "Vocabulary item not found")
    )
)]
pub async fn update_vocab_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VocabPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.word.as_str(), payload.meaning.as_str()])?;
    let item = VocabItem {
        id,
        word: payload.word,
        meaning: payload.meaning,
        category_id: payload.category_id,
    };
    state
        .content
        .update_vocab(item.clone())
        .await
        .map_err(port_error_response)?;
    Ok(Json(item))
}

/// DELETE /vocabulary/{id} - Delete a vocabulary item
#[utoipa::path(
    delete,
    path = "/vocabulary/{id}",
    params(("id" = Uuid, Path, description = "Vocabulary id")),
    responses((status = 204, description = "Vocabulary item deleted"))
)]
pub async fn delete_vocab_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .content
        .delete_vocab(id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Category Handlers
//=========================================================================================

/// GET /categories - List all categories
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories"))
)]
pub async fn list_categories_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let categories = state
        .content
        .list_categories()
        .await
        .map_err(port_error_response)?;
    Ok(Json(categories))
}

/// POST /categories - Create a category
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Category created"),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_category_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.name.as_str()])?;
    let category = Category {
        id: Uuid::new_v4(),
        name: payload.name,
        color: payload.color,
        icon: payload.icon,
    };
    let created = state
        .content
        .create_category(category)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /categories/{id} - Update a category
#[utoipa::path(
    put,
    path = "/categories/{id}",
    request_body = CategoryPayload,
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category updated"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_category_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.name.as_str()])?;
    let category = Category {
        id,
        name: payload.name,
        color: payload.color,
        icon: payload.icon,
    };
    state
        .content
        .update_category(category.clone())
        .await
        .map_err(port_error_response)?;
    Ok(Json(category))
}

/// DELETE /categories/{id} - Delete a category
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses((status = 204, description = "Category deleted"))
)]
pub async fn delete_category_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .content
        .delete_category(id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Mini-game Handlers
//=========================================================================================

/// GET /games - List all mini-games
#[utoipa::path(
    get,
    path = "/games",
    responses((status = 200, description = "All mini-games"))
)]
pub async fn list_games_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let games = state
        .content
        .list_games()
        .await
        .map_err(port_error_response)?;
    Ok(Json(games))
}

/// POST /games - Create a mini-game
#[utoipa::path(
    post,
    path = "/games",
    request_body = GamePayload,
    responses(
        (status = 201, description = "Mini-game created"),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_game_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GamePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.name.as_str()])?;
    let game = MiniGame {
        id: Uuid::new_v4(),
        name: payload.name,
        color: payload.color,
        icon: payload.icon,
    };
    let created = state
        .content
        .create_game(game)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /games/{id} - Update a mini-game
#[utoipa::path(
    put,
    path = "/games/{id}",
    request_body = GamePayload,
    params(("id" = Uuid, Path, description = "Mini-game id")),
    responses(
        (status = 200, description = "Mini-game updated"),
        (status = 404, description = "Mini-game not found")
    )
)]
pub async fn update_game_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GamePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.name.as_str()])?;
    let game = MiniGame {
        id,
        name: payload.name,
        color: payload.color,
        icon: payload.icon,
    };
    state
        .content
        .update_game(game.clone())
        .await
        .map_err(port_error_response)?;
    Ok(Json(game))
}

/// DELETE /games/{id} - Delete a mini-game
#[utoipa::path(
    delete,
    path = "/games/{id}",
    params(("id" = Uuid, Path, description = "Mini-game id")),
    responses((status = 204, description = "Mini-game deleted"))
)]
pub async fn delete_game_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .content
        .delete_game(id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Student Handlers
//=========================================================================================

/// GET /students - List all students
#[utoipa::path(
    get,
    path = "/students",
    responses((status = 200, description = "All students"))
)]
pub async fn list_students_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let students = state
        .content
        .list_students()
        .await
        .map_err(port_error_response)?;
    Ok(Json(students))
}

/// POST /students - Register a student
#[utoipa::path(
    post,
    path = "/students",
    request_body = StudentPayload,
    responses(
        (status = 201, description = "Student created"),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_student_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StudentPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.display_name.as_str(), payload.pin_code.as_str()])?;
    let student = StudentProfile {
        id: Uuid::new_v4(),
        display_name: payload.display_name,
        class_name: payload.class_name,
        pin_code: payload.pin_code,
        score: payload.score.unwrap_or(0),
        stars: payload.stars.unwrap_or(0),
    };
    let created = state
        .content
        .create_student(student)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /students/{id} - Update a student
#[utoipa::path(
    put,
    path = "/students/{id}",
    request_body = StudentPayload,
    params(("id" = Uuid, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student updated"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn update_student_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StudentPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_fields(&[payload.display_name.as_str(), payload.pin_code.as_str()])?;
    let student = StudentProfile {
        id,
        display_name: payload.display_name,
        class_name: payload.class_name,
        pin_code: payload.pin_code,
        score: payload.score.unwrap_or(0),
        stars: payload.stars.unwrap_or(0),
    };
    state
        .content
        .update_student(student.clone())
        .await
        .map_err(port_error_response)?;
    Ok(Json(student))
}

/// DELETE /students/{id} - Delete a student
#[utoipa::path(
    delete,
    path = "/students/{id}",
    params(("id" = Uuid, Path, description = "Student id")),
    responses((status = 204, description = "Student deleted"))
)]
pub async fn delete_student_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .content
        .delete_student(id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Score Handlers
//=========================================================================================

/// POST /scores - Submit a mini-game score
#[utoipa::path(
    post,
    path = "/scores",
    request_body = ScorePayload,
    responses((status = 201, description = "Score recorded"))
)]
pub async fn submit_score_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ScorePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let score = GameScore {
        id: Uuid::new_v4(),
        student_id: payload.student_id,
        game_id: payload.game_id,
        score: payload.score,
        stars: payload.stars,
        recorded_at: Utc::now(),
    };
    state
        .content
        .record_score(score)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::CREATED)
}

/// GET /students/{id}/scores - List a student's scores, newest first
#[utoipa::path(
    get,
    path = "/students/{id}/scores",
    params(("id" = Uuid, Path, description = "Student id")),
    responses((status = 200, description = "The student's scores"))
)]
pub async fn list_student_scores_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let scores = state
        .content
        .list_scores_for_student(id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(scores))
}

//=========================================================================================
// Lesson Handlers
//=========================================================================================

/// GET /lessons/{id} - Load a lesson with its current version and checkpoints
#[utoipa::path(
    get,
    path = "/lessons/{id}",
    params(("id" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "The lesson, with its sorted checkpoint list"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn get_lesson_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let lesson = state
        .content
        .get_lesson(id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(lesson))
}
