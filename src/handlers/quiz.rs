// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqlitePool, types::Json as SqlJson};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        quiz::{AddQuestionRequest, CreateQuizRequest, Question, Quiz, QuizSummary},
        quiz_result::{LeaderboardEntry, QuizResult, SubmitAttemptRequest},
    },
};

/// How many rows the per-quiz leaderboard returns.
const LEADERBOARD_LIMIT: i64 = 50;

/// Percentage of correct answers, rounded to the nearest integer.
/// Zero when the quiz reports no questions.
fn percentage(correct_answers: i64, total_questions: i64) -> i64 {
    if total_questions > 0 {
        ((correct_answers as f64 / total_questions as f64) * 100.0).round() as i64
    } else {
        0
    }
}

/// Points awarded for an attempt. May go negative on bad runs.
fn points(correct_answers: i64, incorrect_answers: i64) -> i64 {
    correct_answers * 100 - incorrect_answers * 20
}

/// "position/total" among a quiz's takers. Ties share the numeric prefix;
/// the string encodes position among N takers, not a strict ordinal.
fn format_rank(better_count: i64, total_takers: i64) -> String {
    format!("{}/{}", better_count + 1, total_takers)
}

/// Order for the next question: max existing + 1, or 0 on an empty quiz.
/// Gap-tolerant; orders are never reindexed.
fn next_question_order(questions: &[Question]) -> i64 {
    questions.iter().map(|q| q.order).max().map_or(0, |m| m + 1)
}

/// Validates a question payload and builds the embedded record.
/// The correct option must be one of the supplied option ids.
fn prepare_question(payload: AddQuestionRequest, order: i64) -> Result<Question, AppError> {
    let text = payload.text.filter(|t| !t.is_empty()).ok_or_else(|| {
        AppError::BadRequest("Text, options, and correctOptionId are required.".to_string())
    })?;
    let options = payload.options.filter(|o| !o.is_empty()).ok_or_else(|| {
        AppError::BadRequest("Text, options, and correctOptionId are required.".to_string())
    })?;
    let correct_option_id = payload
        .correct_option_id
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("Text, options, and correctOptionId are required.".to_string())
        })?;

    if !options.iter().any(|option| option.id == correct_option_id) {
        return Err(AppError::BadRequest(
            "correctOptionId must match one of the option ids".to_string(),
        ));
    }

    Ok(Question {
        id: Uuid::new_v4().to_string(),
        text,
        native_text: payload.native_text,
        options,
        correct_option_id: Some(correct_option_id),
        explanation: payload.explanation,
        difficulty: payload.difficulty.unwrap_or_default(),
        order,
    })
}

/// Creates a new quiz under an existing category.
///
/// `isLocked` is derived from `price > 0` here and only here; later price
/// changes do not re-derive it.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let required = || {
        AppError::BadRequest(
            "Name, duration, totalQuestions, and categoryId are required.".to_string(),
        )
    };
    let name = payload.name.ok_or_else(required)?;
    let duration = payload.duration.ok_or_else(required)?;
    let total_questions = payload.total_questions.ok_or_else(required)?;
    let category_id = payload.category_id.ok_or_else(required)?;

    let category = sqlx::query("SELECT id FROM categories WHERE id = ?")
        .bind(category_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if category.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let mut questions = Vec::new();
    if let Some(items) = payload.questions {
        for (i, item) in items.into_iter().enumerate() {
            questions.push(prepare_question(item, i as i64)?);
        }
    }

    let price = payload.price.unwrap_or(0);

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        INSERT INTO quizzes
        (name, description, duration, total_questions, category_id, questions,
         price, is_locked, is_active, tags, rating, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, 4.5, ?)
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&payload.description)
    .bind(duration)
    .bind(total_questions)
    .bind(category_id)
    .bind(SqlJson(&questions))
    .bind(price)
    .bind(price > 0)
    .bind(SqlJson(payload.tags.unwrap_or_default()))
    .bind(payload.created_by)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Lists active quizzes in a category as summaries (no question bodies).
pub async fn get_quizzes_by_category(
    State(pool): State<SqlitePool>,
    Path(category_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category = sqlx::query("SELECT id FROM categories WHERE id = ?")
        .bind(category_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if category.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let quizzes = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT id, name, description, duration, total_questions,
               price, is_locked, tags, rating
        FROM quizzes
        WHERE category_id = ? AND is_active = 1
        "#,
    )
    .bind(category_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetQuizQuery {
    #[serde(default)]
    pub include_answers: bool,
}

/// Fetches one quiz. Unless `includeAnswers=true`, every question's
/// `correctOptionId` and `explanation` are stripped from the response.
/// Read-time redaction only; the stored row is untouched.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Query(query): Query<GetQuizQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if !query.include_answers {
        quiz.questions.0 = quiz.questions.0.into_iter().map(Question::redacted).collect();
    }

    Ok(Json(quiz))
}

/// Appends a question to a quiz.
///
/// On success the question gets the next monotonic order, and the quiz's
/// `totalQuestions` is recomputed from the question list before the whole
/// quiz is persisted. A validation failure leaves the quiz unmodified.
pub async fn add_question(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<AddQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Payload integrity first, so a bad payload maps to 400 even when the
    // quiz id is also unknown.
    let candidate = prepare_question(payload, 0)?;

    let mut quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let mut question = candidate;
    question.order = next_question_order(&quiz.questions);
    quiz.questions.0.push(question.clone());

    let total_questions = quiz.questions.0.len() as i64;

    sqlx::query("UPDATE quizzes SET questions = ?, total_questions = ? WHERE id = ?")
        .bind(SqlJson(&quiz.questions.0))
        .bind(total_questions)
        .bind(quiz_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Persists a finished attempt and computes its derived metrics.
///
/// The result row is created first with percentage and points; a second
/// write fills in the rank from count queries over sibling results. The two
/// steps are not atomic, so concurrent submissions can make the stored rank
/// slightly stale. That is accepted: rank is advisory.
pub async fn submit_attempt(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::BadRequest("UserId and quizId are required.".to_string()))?;

    let score = payload.score.unwrap_or(0);
    let total_questions = payload.total_questions.unwrap_or(0);
    let correct_answers = payload.correct_answers.unwrap_or(0);
    let incorrect_answers = payload.incorrect_answers.unwrap_or(0);

    let percentage = percentage(correct_answers, total_questions);
    let points = points(correct_answers, incorrect_answers);

    let mut result = sqlx::query_as::<_, QuizResult>(
        r#"
        INSERT INTO quiz_results
        (user_id, quiz_id, score, total_questions, correct_answers,
         incorrect_answers, not_attempted, time_taken, answers,
         completed, completed_at, percentage, points)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(score)
    .bind(total_questions)
    .bind(correct_answers)
    .bind(incorrect_answers)
    .bind(payload.not_attempted.unwrap_or(0))
    .bind(payload.time_taken.unwrap_or(0))
    .bind(SqlJson(payload.answers.unwrap_or_default()))
    .bind(Utc::now())
    .bind(percentage)
    .bind(points)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let (better_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM quiz_results WHERE quiz_id = ? AND score > ?")
            .bind(quiz_id)
            .bind(score)
            .fetch_one(&pool)
            .await?;

    let (total_takers,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM quiz_results WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_one(&pool)
            .await?;

    let rank = format_rank(better_count, total_takers);

    sqlx::query("UPDATE quiz_results SET rank = ? WHERE id = ?")
        .bind(&rank)
        .bind(result.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store rank: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    result.rank = Some(rank);

    Ok((StatusCode::CREATED, Json(result)))
}

/// A user's results, newest first.
pub async fn get_user_results(
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, QuizResult>(
        "SELECT * FROM quiz_results WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch user quiz results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}

/// Fetches a single result by id.
pub async fn get_result(
    State(pool): State<SqlitePool>,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query_as::<_, QuizResult>("SELECT * FROM quiz_results WHERE id = ?")
        .bind(result_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFound("Quiz result not found".to_string()))?;

    Ok(Json(result))
}

/// Top scores for one quiz, best first; faster attempts break ties.
pub async fn get_quiz_leaderboard(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let leaderboard = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT user_id, score, percentage, time_taken, completed_at
        FROM quiz_results
        WHERE quiz_id = ?
        ORDER BY score DESC, time_taken ASC
        LIMIT ?
        "#,
    )
    .bind(quiz_id)
    .bind(LEADERBOARD_LIMIT)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(leaderboard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{Difficulty, QuestionOption};

    fn options(ids: &[&str]) -> Vec<QuestionOption> {
        ids.iter()
            .map(|id| QuestionOption {
                id: id.to_string(),
                text: format!("Option {}", id),
            })
            .collect()
    }

    #[test]
    fn test_percentage_basic() {
        assert_eq!(percentage(8, 10), 80);
        assert_eq!(percentage(10, 10), 100);
        assert_eq!(percentage(0, 10), 0);
    }

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
    }

    #[test]
    fn test_percentage_empty_quiz() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn test_points_example() {
        // 8 correct, 1 incorrect: 800 - 20
        assert_eq!(points(8, 1), 780);
    }

    #[test]
    fn test_points_can_go_negative() {
        assert_eq!(points(0, 5), -100);
    }

    #[test]
    fn test_format_rank() {
        assert_eq!(format_rank(1, 4), "2/4");
        assert_eq!(format_rank(0, 1), "1/1");
    }

    #[test]
    fn test_next_question_order_empty() {
        assert_eq!(next_question_order(&[]), 0);
    }

    #[test]
    fn test_next_question_order_gap_tolerant() {
        let make = |order| Question {
            id: format!("q-{}", order),
            text: "t".to_string(),
            native_text: None,
            options: options(&["A", "B"]),
            correct_option_id: Some("A".to_string()),
            explanation: None,
            difficulty: Difficulty::Medium,
            order,
        };
        let questions = vec![make(0), make(1), make(5)];
        assert_eq!(next_question_order(&questions), 6);
    }

    #[test]
    fn test_prepare_question_rejects_unknown_correct_option() {
        let payload = AddQuestionRequest {
            text: Some("Capital of France?".to_string()),
            native_text: None,
            options: Some(options(&["A", "B", "C", "D"])),
            correct_option_id: Some("E".to_string()),
            explanation: None,
            difficulty: None,
        };
        let err = prepare_question(payload, 0).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_prepare_question_requires_text() {
        let payload = AddQuestionRequest {
            text: None,
            native_text: None,
            options: Some(options(&["A", "B"])),
            correct_option_id: Some("A".to_string()),
            explanation: None,
            difficulty: None,
        };
        assert!(prepare_question(payload, 0).is_err());
    }

    #[test]
    fn test_prepare_question_defaults_difficulty() {
        let payload = AddQuestionRequest {
            text: Some("2 + 2?".to_string()),
            native_text: None,
            options: Some(options(&["A", "B"])),
            correct_option_id: Some("B".to_string()),
            explanation: Some("Basic arithmetic".to_string()),
            difficulty: None,
        };
        let question = prepare_question(payload, 3).unwrap();
        assert_eq!(question.difficulty, Difficulty::Medium);
        assert_eq!(question.order, 3);
        assert_eq!(question.correct_option_id.as_deref(), Some("B"));
    }

    #[test]
    fn test_redacted_strips_grading_fields() {
        let payload = AddQuestionRequest {
            text: Some("2 + 2?".to_string()),
            native_text: None,
            options: Some(options(&["A", "B"])),
            correct_option_id: Some("B".to_string()),
            explanation: Some("Basic arithmetic".to_string()),
            difficulty: None,
        };
        let question = prepare_question(payload, 0).unwrap().redacted();
        assert!(question.correct_option_id.is_none());
        assert!(question.explanation.is_none());
        // The rest survives untouched.
        assert_eq!(question.options.len(), 2);
    }
}
