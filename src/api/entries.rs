/// Entry endpoints
use crate::{
    auth::AuthUser,
    context::AppContext,
    entries::{Entry, EntryFilter, EntryOut, NewEntry},
    error::TrackerResult,
    schema::Category,
};
use super::extract::{Json, Path, Query};
use axum::{extract::State, routing::get, Router};
use serde_json::{json, Value};
use std::collections::HashMap;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/", get(list_entries).post(create_entry))
        .route(
            "/entries/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}

/// The user's categories keyed by id, for rendering units
pub(crate) async fn category_index(ctx: &AppContext, user_id: i64) -> TrackerResult<HashMap<i64, Category>> {
    let categories = ctx.category_registry.list_categories(user_id).await?;
    Ok(categories.into_iter().map(|c| (c.id, c)).collect())
}

async fn list_entries(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(filter): Query<EntryFilter>,
) -> TrackerResult<Json<Vec<EntryOut>>> {
    let entries = ctx.entry_store.list_entries(auth.id(), &filter).await?;
    let categories = category_index(&ctx, auth.id()).await?;

    let out = entries
        .into_iter()
        .map(|entry| {
            let category = categories.get(&entry.category_id);
            EntryOut::new(entry, category)
        })
        .collect();

    Ok(Json(out))
}

async fn render_one(ctx: &AppContext, user_id: i64, entry: Entry) -> TrackerResult<EntryOut> {
    let category = ctx
        .category_registry
        .get_category(user_id, entry.category_id)
        .await?;
    Ok(EntryOut::new(entry, Some(&category)))
}

async fn create_entry(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Json(req): Json<NewEntry>,
) -> TrackerResult<Json<EntryOut>> {
    let entry = ctx.entry_store.create_entry(auth.id(), req).await?;
    Ok(Json(render_one(&ctx, auth.id(), entry).await?))
}

async fn get_entry(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> TrackerResult<Json<EntryOut>> {
    let entry = ctx.entry_store.get_entry(auth.id(), id).await?;
    Ok(Json(render_one(&ctx, auth.id(), entry).await?))
}

async fn update_entry(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<NewEntry>,
) -> TrackerResult<Json<EntryOut>> {
    let entry = ctx.entry_store.update_entry(auth.id(), id, req).await?;
    Ok(Json(render_one(&ctx, auth.id(), entry).await?))
}

async fn delete_entry(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> TrackerResult<Json<Value>> {
    ctx.entry_store.delete_entry(auth.id(), id).await?;
    Ok(Json(json!({ "status": "deleted", "id": id })))
}
