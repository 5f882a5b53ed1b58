// src/models/quiz_result.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// One answered (or skipped) question within an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnswer {
    pub question_id: String,
    pub selected_option_id: Option<String>,
    pub is_correct: Option<bool>,
    /// Seconds spent on this question.
    pub time_spent: Option<i64>,
}

/// Represents the 'quiz_results' table: one row per finished attempt.
///
/// Created in one write, then a second write fills in `rank`. The two
/// writes are not atomic with respect to concurrent submissions, so rank
/// is an approximate statistic, not a strict ordinal.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub incorrect_answers: i64,
    pub not_attempted: i64,
    /// Seconds for the whole attempt.
    pub time_taken: i64,
    pub answers: Json<Vec<AttemptAnswer>>,
    pub completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub percentage: i64,
    /// correct * 100 - incorrect * 20; may be negative.
    pub points: i64,
    /// "position/total" among this quiz's takers at submission time.
    pub rank: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for submitting a finished attempt. The client reports raw counts;
/// the server derives percentage, points and rank.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    pub user_id: Option<i64>,
    pub answers: Option<Vec<AttemptAnswer>>,
    pub time_taken: Option<i64>,
    pub score: Option<i64>,
    pub total_questions: Option<i64>,
    pub correct_answers: Option<i64>,
    pub incorrect_answers: Option<i64>,
    pub not_attempted: Option<i64>,
}

/// Leaderboard row for one quiz.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub score: i64,
    pub percentage: i64,
    pub time_taken: i64,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}
