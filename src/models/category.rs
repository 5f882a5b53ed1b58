// src/models/category.rs

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Category kind: 'exam' (exam preparation) or 'course' (study material).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CategoryType {
    Exam,
    Course,
}

/// Represents the 'categories' table in the database.
///
/// Categories form a parent-pointer tree. `level` is a cached depth,
/// recomputed only when this node's `parent_category` is written; it is
/// never propagated to descendants when an ancestor moves.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,

    pub name: String,

    /// Mapped from the database column 'type' since `type` is a reserved
    /// keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub category_type: CategoryType,

    /// Parent category id, or None for a root. May dangle after a cascade
    /// delete was interrupted part-way; readers must tolerate that.
    pub parent_category: Option<i64>,

    pub description: Option<String>,

    pub image: Option<String>,

    /// Depth in the hierarchy: 0 for roots, parent.level + 1 otherwise.
    pub level: i64,

    /// Sibling display order.
    pub order: i64,

    pub is_active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One node of the materialized category tree returned by the tree endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTreeNode {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<CategoryTreeNode>,
}

/// DTO for creating a new category.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(required, length(min = 1, max = 120))]
    pub name: Option<String>,
    /// Required; checked in the handler because enums and `validator`
    /// don't mix.
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
    pub parent_category: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub order: Option<i64>,
}

/// DTO for patching a category. All fields optional.
///
/// `parent_category` distinguishes "absent" (leave alone) from an explicit
/// JSON null (detach to root), hence the double Option.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_category: Option<Option<i64>>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
