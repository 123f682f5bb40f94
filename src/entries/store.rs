/// Entry storage
use super::{
    legacy::{from_millis, resolve_category_ref, LegacyEntryRequest},
    validate_and_coerce, Entry, EntryFilter, NewEntry,
};
use crate::{
    db::models::EntryRow,
    error::{TrackerError, TrackerResult},
    schema::registry::fetch_category,
};
use chrono::Utc;
use sqlx::{types::Json, QueryBuilder, Sqlite, SqlitePool};

const ENTRY_COLUMNS: &str = "id, user_id, category_id, occurred_at, created_at, note, data";

/// Entry store service
#[derive(Clone)]
pub struct EntryStore {
    db: SqlitePool,
}

impl EntryStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List the user's entries, newest first
    pub async fn list_entries(&self, user_id: i64, filter: &EntryFilter) -> TrackerResult<Vec<Entry>> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM entries WHERE user_id = ", ENTRY_COLUMNS));
        query.push_bind(user_id);

        if let Some(category_id) = filter.category_id {
            query.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(start) = filter.start {
            query
                .push(" AND julianday(occurred_at) >= julianday(")
                .push_bind(start)
                .push(")");
        }
        if let Some(end) = filter.end {
            query
                .push(" AND julianday(occurred_at) <= julianday(")
                .push_bind(end)
                .push(")");
        }
        query.push(" ORDER BY julianday(occurred_at) DESC, id DESC");

        let rows = query.build_query_as::<EntryRow>().fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Entry::from).collect())
    }

    pub async fn get_entry(&self, user_id: i64, entry_id: i64) -> TrackerResult<Entry> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM entries WHERE id = ?1 AND user_id = ?2",
            ENTRY_COLUMNS
        ))
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Entry::from).ok_or_else(entry_not_found)
    }

    /// Create an entry in one of the user's categories
    pub async fn create_entry(&self, user_id: i64, new: NewEntry) -> TrackerResult<Entry> {
        let mut tx = self.db.begin().await?;

        let category = fetch_category(&mut tx, user_id, new.category_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound("Category not found".to_string()))?;
        let data = validate_and_coerce(&category, &new.values)?;

        let now = Utc::now();
        let occurred_at = new.occurred_at.unwrap_or(now);
        let id = sqlx::query(
            "INSERT INTO entries (user_id, category_id, occurred_at, created_at, note, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(user_id)
        .bind(category.id)
        .bind(occurred_at)
        .bind(now)
        .bind(&new.note)
        .bind(Json(&data))
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        tracing::debug!(user_id, entry_id = id, category_id = category.id, "Created entry");

        Ok(Entry {
            id,
            category_id: category.id,
            occurred_at,
            created_at: now,
            note: new.note,
            data,
        })
    }

    /// Replace an entry's category, time, note and values
    pub async fn update_entry(&self, user_id: i64, entry_id: i64, update: NewEntry) -> TrackerResult<Entry> {
        let mut tx = self.db.begin().await?;

        let existing: EntryRow = sqlx::query_as(&format!(
            "SELECT {} FROM entries WHERE id = ?1 AND user_id = ?2",
            ENTRY_COLUMNS
        ))
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(entry_not_found)?;

        let category = fetch_category(&mut tx, user_id, update.category_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound("Category not found".to_string()))?;
        let data = validate_and_coerce(&category, &update.values)?;
        let occurred_at = update.occurred_at.unwrap_or(existing.occurred_at);

        sqlx::query(
            "UPDATE entries SET category_id = ?1, occurred_at = ?2, note = ?3, data = ?4
             WHERE id = ?5 AND user_id = ?6",
        )
        .bind(category.id)
        .bind(occurred_at)
        .bind(&update.note)
        .bind(Json(&data))
        .bind(entry_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Entry {
            id: entry_id,
            category_id: category.id,
            occurred_at,
            created_at: existing.created_at,
            note: update.note,
            data,
        })
    }

    pub async fn delete_entry(&self, user_id: i64, entry_id: i64) -> TrackerResult<()> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?1 AND user_id = ?2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(entry_not_found());
        }
        Ok(())
    }

    /// Create an entry from the legacy `cat_<id>` payload
    pub async fn create_legacy_entry(
        &self,
        user_id: i64,
        request: LegacyEntryRequest,
    ) -> TrackerResult<Entry> {
        let category_id = resolve_category_ref(&request.category_ref)?;
        let occurred_at = from_millis(request.timestamp)?;

        self.create_entry(
            user_id,
            NewEntry {
                category_id,
                occurred_at: Some(occurred_at),
                note: None,
                values: request.details,
            },
        )
        .await
    }
}

fn entry_not_found() -> TrackerError {
    TrackerError::NotFound("Entry not found".to_string())
}
