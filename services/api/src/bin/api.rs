//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, DbAuthAdapter, MemorySessionStore},
    config::Config,
    error::ApiError,
    web::{
        auth::{
            demo_login_handler, login_handler, logout_handler, me_handler, pin_login_handler,
            quick_login_handler,
        },
        preview_ws_handler, require_staff,
        rest::{
            create_category_handler, create_game_handler, create_student_handler,
            create_video_handler, create_vocab_handler, delete_category_handler,
            delete_game_handler, delete_student_handler, delete_video_handler,
            delete_vocab_handler, get_lesson_handler, list_categories_handler,
            list_games_handler, list_student_scores_handler, list_students_handler,
            list_videos_handler, list_vocabulary_handler, submit_score_handler,
            update_category_handler, update_game_handler, update_student_handler,
            update_video_handler, update_vocab_handler, ApiDoc,
        },
        state::AppState,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let auth_adapter = Arc::new(DbAuthAdapter::new(db_pool));
    let session_store = Arc::new(MemorySessionStore::new());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        db_adapter,
        auth_adapter,
        session_store,
        config.clone(),
    ));

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required): login surfaces, lesson loading, the
    // preview WebSocket, and student score submission.
    let public_routes = Router::new()
        .route("/auth/login", post(login_handler))
        .route("/auth/pin-login", post(pin_login_handler))
        .route("/auth/quick-login", post(quick_login_handler))
        .route("/auth/demo-login", post(demo_login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route("/lessons/{id}", get(get_lesson_handler))
        .route("/lessons/preview", get(preview_ws_handler))
        .route("/scores", post(submit_score_handler))
        .route("/students/{id}/scores", get(list_student_scores_handler));

    // Protected routes (staff session required): the admin console CRUD.
    let protected_routes = Router::new()
        .route("/videos", get(list_videos_handler).post(create_video_handler))
        .route(
            "/videos/{id}",
            put(update_video_handler).delete(delete_video_handler),
        )
        .route(
            "/vocabulary",
            get(list_vocabulary_handler).post(create_vocab_handler),
        )
        .route(
            "/vocabulary/{id}",
            put(update_vocab_handler).delete(delete_vocab_handler),
        )
        .route(
            "/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/categories/{id}",
            put(update_category_handler).delete(delete_category_handler),
        )
        .route("/games", get(list_games_handler).post(create_game_handler))
        .route(
            "/games/{id}",
            put(update_game_handler).delete(delete_game_handler),
        )
        .route(
            "/students",
            get(list_students_handler).post(create_student_handler),
        )
        .route(
            "/students/{id}",
            put(update_student_handler).delete(delete_student_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_staff,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
