/// Deprecated `/api` surface kept for the older single-page client
use super::entries::category_index;
use crate::{
    account::{LegacyLoginRequest, LegacyLoginSuccess, LegacyRegisterRequest},
    auth::AuthUser,
    context::AppContext,
    entries::{
        legacy::{LegacyCategoryRequest, LegacyEntry, LegacyEntryRequest},
        EntryFilter,
    },
    error::TrackerResult,
    schema::Category,
};
use super::extract::{Json, Path};
use axum::{
    extract::State,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/entries", get(list_entries).post(create_entry))
        .route("/api/entries/:id", delete(delete_entry))
        .route("/api/reset", post(reset))
}

/// Registration of the older client; it logs in separately afterwards
async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<LegacyRegisterRequest>,
) -> TrackerResult<Json<Value>> {
    ctx.account_manager.register(req.into()).await?;
    Ok(Json(json!({ "success": true })))
}

async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LegacyLoginRequest>,
) -> TrackerResult<Json<LegacyLoginSuccess>> {
    let (user, session) = ctx.account_manager.login(&req.username, &req.password).await?;

    Ok(Json(LegacyLoginSuccess {
        success: true,
        token: session.token,
        username: user.name,
    }))
}

async fn list_categories(State(ctx): State<AppContext>, auth: AuthUser) -> TrackerResult<Json<Vec<Category>>> {
    Ok(Json(ctx.category_registry.list_categories(auth.id()).await?))
}

async fn create_category(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Json(req): Json<LegacyCategoryRequest>,
) -> TrackerResult<Json<Category>> {
    let category = ctx
        .category_registry
        .create_category(auth.id(), req.into())
        .await?;
    Ok(Json(category))
}

async fn list_entries(State(ctx): State<AppContext>, auth: AuthUser) -> TrackerResult<Json<Vec<LegacyEntry>>> {
    let entries = ctx
        .entry_store
        .list_entries(auth.id(), &EntryFilter::default())
        .await?;
    let categories = category_index(&ctx, auth.id()).await?;

    Ok(Json(
        entries
            .iter()
            .map(|entry| LegacyEntry::from_entry(entry, categories.get(&entry.category_id)))
            .collect(),
    ))
}

async fn create_entry(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Json(req): Json<LegacyEntryRequest>,
) -> TrackerResult<Json<LegacyEntry>> {
    let entry = ctx.entry_store.create_legacy_entry(auth.id(), req).await?;
    let category = ctx
        .category_registry
        .get_category(auth.id(), entry.category_id)
        .await?;
    Ok(Json(LegacyEntry::from_entry(&entry, Some(&category))))
}

async fn delete_entry(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> TrackerResult<Json<Value>> {
    ctx.entry_store.delete_entry(auth.id(), id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn reset(State(ctx): State<AppContext>, auth: AuthUser) -> TrackerResult<Json<Value>> {
    ctx.category_registry.reset_defaults(auth.id()).await?;
    Ok(Json(json!({ "success": true })))
}
