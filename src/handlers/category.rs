// src/handlers/category.rs

use std::{future::Future, pin::Pin};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::category::{
        Category, CategoryTreeNode, CategoryType, CreateCategoryRequest, UpdateCategoryRequest,
    },
};

/// Resolves the cached depth for a node about to be written.
///
/// A present, resolvable parent yields parent.level + 1; a missing parent
/// reference or an unresolvable one yields 0. The recomputation touches only
/// the written node, never its descendants.
async fn resolve_level(pool: &SqlitePool, parent_category: Option<i64>) -> Result<i64, AppError> {
    match parent_category {
        Some(parent_id) => {
            let parent =
                sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
                    .bind(parent_id)
                    .fetch_optional(pool)
                    .await?;
            Ok(parent.map_or(0, |p| p.level + 1))
        }
        None => Ok(0),
    }
}

/// Creates a new category, deriving its level from the parent (if any).
pub async fn create_category(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = payload
        .name
        .ok_or_else(|| AppError::BadRequest("Name and type are required.".to_string()))?;
    let category_type = payload
        .category_type
        .ok_or_else(|| AppError::BadRequest("Name and type are required.".to_string()))?;

    let level = resolve_level(&pool, payload.parent_category).await?;

    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name, type, parent_category, description, image, level, "order", is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1)
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(category_type)
    .bind(payload.parent_category)
    .bind(&payload.description)
    .bind(&payload.image)
    .bind(level)
    .bind(payload.order.unwrap_or(0))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create category: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// Optional filter, e.g. ?type=exam or ?type=course.
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
}

/// Lists active categories, ordered for sibling display.
pub async fn list_categories(
    State(pool): State<SqlitePool>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let categories = match query.category_type {
        Some(category_type) => {
            sqlx::query_as::<_, Category>(
                r#"
                SELECT * FROM categories
                WHERE type = ? AND is_active = 1
                ORDER BY "order" ASC, name ASC
                "#,
            )
            .bind(category_type)
            .fetch_all(&pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Category>(
                r#"
                SELECT * FROM categories
                WHERE is_active = 1
                ORDER BY "order" ASC, name ASC
                "#,
            )
            .fetch_all(&pool)
            .await
        }
    }
    .map_err(|e| {
        tracing::error!("Failed to list categories: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(categories))
}

/// Materializes the full category tree from the flat parent-pointer rows.
///
/// One store round-trip per node, depth-first. A store failure anywhere
/// fails the whole build; no partial tree is returned. Assumes the parent
/// graph is a forest: a cycle would recurse until the stack runs out.
pub async fn get_category_tree(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let roots = sqlx::query_as::<_, Category>(
        r#"
        SELECT * FROM categories
        WHERE parent_category IS NULL AND is_active = 1
        ORDER BY "order" ASC, name ASC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch root categories: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut tree = Vec::with_capacity(roots.len());
    for root in roots {
        let subcategories = build_subtree(&pool, root.id).await?;
        tree.push(CategoryTreeNode {
            category: root,
            subcategories,
        });
    }

    Ok(Json(tree))
}

/// Recursively attaches each active child's own subtree. Boxed because
/// async recursion needs an indirected future type.
fn build_subtree<'a>(
    pool: &'a SqlitePool,
    parent_id: i64,
) -> Pin<Box<dyn Future<Output = Result<Vec<CategoryTreeNode>, AppError>> + Send + 'a>> {
    Box::pin(async move {
        let children = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            WHERE parent_category = ? AND is_active = 1
            ORDER BY "order" ASC, name ASC
            "#,
        )
        .bind(parent_id)
        .fetch_all(pool)
        .await?;

        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            let subcategories = build_subtree(pool, child.id).await?;
            nodes.push(CategoryTreeNode {
                category: child,
                subcategories,
            });
        }

        Ok(nodes)
    })
}

/// Patches a category. When the patch carries `parentCategory` (even an
/// explicit null), the level is recomputed exactly as on create.
pub async fn update_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    let level = match payload.parent_category {
        Some(parent_category) => Some(resolve_level(&pool, parent_category).await?),
        None => None,
    };

    if payload.name.is_none()
        && payload.category_type.is_none()
        && payload.parent_category.is_none()
        && payload.description.is_none()
        && payload.image.is_none()
        && payload.order.is_none()
        && payload.is_active.is_none()
    {
        return Ok(Json(existing));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE categories SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(category_type) = payload.category_type {
        separated.push("type = ");
        separated.push_bind_unseparated(category_type);
    }

    if let Some(parent_category) = payload.parent_category {
        separated.push("parent_category = ");
        separated.push_bind_unseparated(parent_category);
    }

    if let Some(level) = level {
        separated.push("level = ");
        separated.push_bind_unseparated(level);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(image) = payload.image {
        separated.push("image = ");
        separated.push_bind_unseparated(image);
    }

    if let Some(order) = payload.order {
        separated.push("\"order\" = ");
        separated.push_bind_unseparated(order);
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update category: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let updated = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(updated))
}

/// Deletes a category together with its full descendant subtree.
///
/// Depth-first: each child's subtree goes first, the child after it, the
/// root last. Not transactional; a crash mid-way leaves a partially deleted
/// subtree with orphans pointing at a dangling parent id. Every step is
/// delete-if-exists, so retrying a partial delete is safe. Not-found is
/// reported only for the root id itself.
pub async fn delete_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    delete_children(&pool, id).await?;

    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete category: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(Json(serde_json::json!({
        "message": "Category and all subcategories deleted successfully"
    })))
}

fn delete_children<'a>(
    pool: &'a SqlitePool,
    parent_id: i64,
) -> Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>> {
    Box::pin(async move {
        let children: Vec<(i64,)> =
            sqlx::query_as("SELECT id FROM categories WHERE parent_category = ?")
                .bind(parent_id)
                .fetch_all(pool)
                .await?;

        for (child_id,) in children {
            delete_children(pool, child_id).await?;
            sqlx::query("DELETE FROM categories WHERE id = ?")
                .bind(child_id)
                .execute(pool)
                .await?;
        }

        Ok(())
    })
}
