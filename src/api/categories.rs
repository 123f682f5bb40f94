/// Category endpoints
use crate::{
    auth::AuthUser,
    context::AppContext,
    error::TrackerResult,
    schema::{AppendFieldsRequest, Category, CategoryPatch, CreateCategoryRequest},
};
use super::extract::{Json, Path};
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/categories/:id/fields", post(append_fields))
}

async fn list_categories(State(ctx): State<AppContext>, auth: AuthUser) -> TrackerResult<Json<Vec<Category>>> {
    let categories = ctx.category_registry.list_categories(auth.id()).await?;
    Ok(Json(categories))
}

async fn create_category(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Json(req): Json<CreateCategoryRequest>,
) -> TrackerResult<Json<Category>> {
    let category = ctx.category_registry.create_category(auth.id(), req).await?;
    Ok(Json(category))
}

async fn get_category(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> TrackerResult<Json<Category>> {
    let category = ctx.category_registry.get_category(auth.id(), id).await?;
    Ok(Json(category))
}

async fn update_category(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(patch): Json<CategoryPatch>,
) -> TrackerResult<Json<Category>> {
    let category = ctx.category_registry.update_category(auth.id(), id, patch).await?;
    Ok(Json(category))
}

async fn delete_category(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> TrackerResult<Json<Value>> {
    ctx.category_registry.delete_category(auth.id(), id).await?;
    Ok(Json(json!({ "status": "deleted", "id": id })))
}

async fn append_fields(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<AppendFieldsRequest>,
) -> TrackerResult<Json<Category>> {
    let category = ctx
        .category_registry
        .append_fields(auth.id(), id, &req.fields)
        .await?;
    Ok(Json(category))
}
