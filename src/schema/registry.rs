/// Category registry backed by SQLite
///
/// All reads and writes are scoped by the owning user; a category belonging to
/// somebody else is indistinguishable from one that does not exist.
use super::{
    defaults::DEFAULT_CATEGORIES, validate_category_name, validate_fields, Category, CategoryField,
    CategoryPatch, CreateCategoryRequest, FieldSpec, NewField,
};
use crate::{
    db::models::{CategoryFieldRow, CategoryRow},
    error::{TrackerError, TrackerResult},
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;

const CATEGORY_COLUMNS: &str = "id, user_id, name, description, is_system_default, created_at";
const FIELD_COLUMNS: &str = "id, category_id, position, label, data_type, unit";

/// Category registry service
#[derive(Clone)]
pub struct CategoryRegistry {
    db: SqlitePool,
}

impl CategoryRegistry {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List the user's categories in creation order
    pub async fn list_categories(&self, user_id: i64) -> TrackerResult<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM categories WHERE user_id = ?1 ORDER BY id",
            CATEGORY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let field_rows: Vec<CategoryFieldRow> = sqlx::query_as(
            "SELECT f.id, f.category_id, f.position, f.label, f.data_type, f.unit
             FROM category_fields f
             JOIN categories c ON c.id = f.category_id
             WHERE c.user_id = ?1
             ORDER BY f.category_id, f.position, f.id",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let mut by_category: HashMap<i64, Vec<CategoryFieldRow>> = HashMap::new();
        for field in field_rows {
            by_category.entry(field.category_id).or_default().push(field);
        }

        rows.into_iter()
            .map(|row| {
                let fields = by_category.remove(&row.id).unwrap_or_default();
                assemble(row, fields)
            })
            .collect()
    }

    /// Get one of the user's categories
    pub async fn get_category(&self, user_id: i64, category_id: i64) -> TrackerResult<Category> {
        let mut conn = self.db.acquire().await?;
        fetch_category(&mut conn, user_id, category_id)
            .await?
            .ok_or_else(category_not_found)
    }

    /// Create a custom category with its initial fields
    pub async fn create_category(
        &self,
        user_id: i64,
        request: CreateCategoryRequest,
    ) -> TrackerResult<Category> {
        let name = validate_category_name(&request.name)?;
        let fields = validate_fields(&request.fields, [])?;

        let mut tx = self.db.begin().await?;
        let category = insert_category(
            &mut tx,
            user_id,
            &name,
            request.description.as_deref(),
            false,
            &fields,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            user_id,
            category_id = category.id,
            fields = category.fields.len(),
            "Created category"
        );

        Ok(category)
    }

    /// Rename or re-describe a custom category
    pub async fn update_category(
        &self,
        user_id: i64,
        category_id: i64,
        patch: CategoryPatch,
    ) -> TrackerResult<Category> {
        let name = patch.name.as_deref().map(validate_category_name).transpose()?;

        let mut tx = self.db.begin().await?;
        let category = fetch_mutable(&mut tx, user_id, category_id).await?;

        sqlx::query(
            "UPDATE categories
             SET name = COALESCE(?1, name), description = COALESCE(?2, description)
             WHERE id = ?3 AND user_id = ?4",
        )
        .bind(&name)
        .bind(&patch.description)
        .bind(category.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let updated = fetch_category(&mut tx, user_id, category_id)
            .await?
            .ok_or_else(category_not_found)?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a custom category; its fields and entries go with it
    pub async fn delete_category(&self, user_id: i64, category_id: i64) -> TrackerResult<()> {
        let mut tx = self.db.begin().await?;
        fetch_mutable(&mut tx, user_id, category_id).await?;

        sqlx::query("DELETE FROM categories WHERE id = ?1 AND user_id = ?2")
            .bind(category_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id, category_id, "Deleted category");
        Ok(())
    }

    /// Append new fields to a custom category
    pub async fn append_fields(
        &self,
        user_id: i64,
        category_id: i64,
        specs: &[FieldSpec],
    ) -> TrackerResult<Category> {
        if specs.is_empty() {
            return Err(TrackerError::Validation(
                "At least one field is required".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;
        let category = fetch_mutable(&mut tx, user_id, category_id).await?;

        let fields = validate_fields(specs, category.fields.iter().map(|f| f.label.as_str()))?;
        let next_position = category.fields.len() as i64;
        insert_fields(&mut tx, category.id, next_position, &fields).await?;

        let updated = fetch_category(&mut tx, user_id, category_id)
            .await?
            .ok_or_else(category_not_found)?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Create the default categories unless the user already has them
    pub async fn seed_defaults(&self, user_id: i64) -> TrackerResult<Vec<Category>> {
        let mut tx = self.db.begin().await?;
        let seeded = seed_defaults_in(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(seeded)
    }

    /// Remove every entry and category of the user, then seed fresh defaults
    pub async fn reset_defaults(&self, user_id: i64) -> TrackerResult<Vec<Category>> {
        let mut tx = self.db.begin().await?;

        let entries = sqlx::query("DELETE FROM entries WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let categories = sqlx::query("DELETE FROM categories WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let seeded = seed_defaults_in(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(
            user_id,
            removed_entries = entries,
            removed_categories = categories,
            "Reset categories to defaults"
        );

        Ok(seeded)
    }
}

/// Seed the default categories on an existing connection or transaction.
///
/// No-op when any system default already exists for the user.
pub async fn seed_defaults_in(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> TrackerResult<Vec<Category>> {
    let existing: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM categories WHERE user_id = ?1 AND is_system_default = 1",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    if existing > 0 {
        tracing::debug!(user_id, existing, "Default categories already present");
        return Ok(Vec::new());
    }

    let mut seeded = Vec::with_capacity(DEFAULT_CATEGORIES.len());
    for template in DEFAULT_CATEGORIES {
        let category = insert_category(
            conn,
            user_id,
            template.name,
            Some(template.description),
            true,
            &template.new_fields(),
        )
        .await?;
        seeded.push(category);
    }

    tracing::debug!(user_id, count = seeded.len(), "Seeded default categories");
    Ok(seeded)
}

/// Load a category with its fields, scoped to the owner
pub(crate) async fn fetch_category(
    conn: &mut SqliteConnection,
    user_id: i64,
    category_id: i64,
) -> TrackerResult<Option<Category>> {
    let row: Option<CategoryRow> = sqlx::query_as(&format!(
        "SELECT {} FROM categories WHERE id = ?1 AND user_id = ?2",
        CATEGORY_COLUMNS
    ))
    .bind(category_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let fields: Vec<CategoryFieldRow> = sqlx::query_as(&format!(
        "SELECT {} FROM category_fields WHERE category_id = ?1 ORDER BY position, id",
        FIELD_COLUMNS
    ))
    .bind(category_id)
    .fetch_all(&mut *conn)
    .await?;

    assemble(row, fields).map(Some)
}

/// Load a category that the caller intends to change
async fn fetch_mutable(
    conn: &mut SqliteConnection,
    user_id: i64,
    category_id: i64,
) -> TrackerResult<Category> {
    let category = fetch_category(conn, user_id, category_id)
        .await?
        .ok_or_else(category_not_found)?;

    if category.is_system_default {
        return Err(TrackerError::Immutable(format!(
            "'{}' is a system default category and cannot be changed",
            category.name
        )));
    }

    Ok(category)
}

async fn insert_category(
    conn: &mut SqliteConnection,
    user_id: i64,
    name: &str,
    description: Option<&str>,
    is_system_default: bool,
    fields: &[NewField],
) -> TrackerResult<Category> {
    let now = Utc::now();
    let id = sqlx::query(
        "INSERT INTO categories (user_id, name, description, is_system_default, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(is_system_default)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    let fields = insert_fields(conn, id, 0, fields).await?;

    Ok(Category {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
        is_system_default,
        created_at: now,
        fields,
    })
}

async fn insert_fields(
    conn: &mut SqliteConnection,
    category_id: i64,
    first_position: i64,
    fields: &[NewField],
) -> TrackerResult<Vec<CategoryField>> {
    let mut inserted = Vec::with_capacity(fields.len());

    for (offset, field) in fields.iter().enumerate() {
        let id = sqlx::query(
            "INSERT INTO category_fields (category_id, position, label, data_type, unit)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(category_id)
        .bind(first_position + offset as i64)
        .bind(&field.label)
        .bind(field.data_type.as_str())
        .bind(&field.unit)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        inserted.push(CategoryField {
            id,
            label: field.label.clone(),
            data_type: field.data_type,
            unit: field.unit.clone(),
        });
    }

    Ok(inserted)
}

fn assemble(row: CategoryRow, fields: Vec<CategoryFieldRow>) -> TrackerResult<Category> {
    let fields = fields
        .into_iter()
        .map(|f| {
            let data_type = f.data_type.parse().map_err(|_| {
                TrackerError::Internal(format!(
                    "Stored field {} has unknown data type '{}'",
                    f.id, f.data_type
                ))
            })?;
            Ok(CategoryField {
                id: f.id,
                label: f.label,
                data_type,
                unit: f.unit,
            })
        })
        .collect::<TrackerResult<Vec<_>>>()?;

    Ok(Category {
        id: row.id,
        name: row.name,
        description: row.description,
        is_system_default: row.is_system_default,
        created_at: row.created_at,
        fields,
    })
}

fn category_not_found() -> TrackerError {
    TrackerError::NotFound("Category not found".to_string())
}
