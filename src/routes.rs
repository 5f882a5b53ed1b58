// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{category, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the category and quiz sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let category_routes = Router::new()
        .route(
            "/",
            post(category::create_category).get(category::list_categories),
        )
        .route("/tree", get(category::get_category_tree))
        .route(
            "/{categoryId}",
            put(category::update_category).delete(category::delete_category),
        );

    let quiz_routes = Router::new()
        .route("/", post(quiz::create_quiz))
        .route("/category/{categoryId}", get(quiz::get_quizzes_by_category))
        .route("/user/{userId}/results", get(quiz::get_user_results))
        .route("/results/{resultId}", get(quiz::get_result))
        .route("/{quizId}", get(quiz::get_quiz))
        .route("/{quizId}/questions", post(quiz::add_question))
        .route("/{quizId}/results", post(quiz::submit_attempt))
        .route("/{quizId}/leaderboard", get(quiz::get_quiz_leaderboard));

    Router::new()
        .nest("/api/categories", category_routes)
        .nest("/api/quizzes", quiz_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
