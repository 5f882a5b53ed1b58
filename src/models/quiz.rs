// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// One answer option of a multiple-choice question.
/// Option ids are short strings ("A".."D").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

/// One multiple-choice question, embedded in its owning quiz's JSON column.
///
/// `correct_option_id` and `explanation` are always present in storage
/// (insertion validates them); they are set to None only by read-time
/// redaction and then dropped from the serialized response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_text: Option<String>,
    pub options: Vec<QuestionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Assignment order within the quiz. Monotonically increasing,
    /// gap-tolerant, never reindexed.
    pub order: i64,
}

impl Question {
    /// Strips the grading fields for client-facing reads.
    /// Storage is unaffected; this only shapes the response.
    pub fn redacted(mut self) -> Self {
        self.correct_option_id = None;
        self.explanation = None;
        self
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Duration in minutes.
    pub duration: i64,
    /// Kept equal to questions.len() after every question addition.
    pub total_questions: i64,
    pub category_id: i64,
    pub questions: Json<Vec<Question>>,
    /// 0 means free.
    pub price: i64,
    /// Derived from `price > 0` once, at creation. Later price changes do
    /// not re-derive it.
    pub is_locked: bool,
    pub is_active: bool,
    pub tags: Json<Vec<String>>,
    pub rating: f64,
    pub created_by: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Listing row for quizzes in a category: no question bodies.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub duration: i64,
    pub total_questions: i64,
    pub price: i64,
    pub is_locked: bool,
    pub tags: Json<Vec<String>>,
    pub rating: f64,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(required, length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(required, range(min = 1))]
    pub duration: Option<i64>,
    #[validate(required, range(min = 0))]
    pub total_questions: Option<i64>,
    #[validate(required)]
    pub category_id: Option<i64>,
    /// Optional initial question set; each entry passes the same integrity
    /// checks as a later addQuestion call.
    pub questions: Option<Vec<AddQuestionRequest>>,
    pub price: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub created_by: Option<i64>,
}

/// DTO for adding a question to a quiz. Required fields are checked in the
/// handler so a missing field maps to a 400, not a body rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionRequest {
    pub text: Option<String>,
    pub native_text: Option<String>,
    pub options: Option<Vec<QuestionOption>>,
    pub correct_option_id: Option<String>,
    pub explanation: Option<String>,
    pub difficulty: Option<Difficulty>,
}
