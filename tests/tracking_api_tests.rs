//! Categories, entries and the legacy `/api` surface

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use common::{spawn_app, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn new_users_get_four_defaults() {
    let app = spawn_app().await;
    let token = app.register("alice").await;

    let response = app.get("/categories/", &token).await;
    assert_eq!(response.status, StatusCode::OK);
    let categories = response.body.as_array().unwrap();
    assert_eq!(categories.len(), 4);
    assert!(categories.iter().all(|c| c["is_system_default"] == true));

    let fitness = &categories[0];
    assert_eq!(fitness["name"], "Fitness");
    assert_eq!(fitness["fields"][1]["label"], "Dauer");
    assert_eq!(fitness["fields"][1]["data_type"], "number");
    assert_eq!(fitness["fields"][1]["unit"], "Minuten");
}

#[tokio::test]
async fn system_defaults_cannot_be_changed() {
    let app = spawn_app().await;
    let token = app.register("alice").await;
    let fitness = app.category_id(&token, "Fitness").await;
    let uri = format!("/categories/{}", fitness);

    let renamed = app
        .request(Method::PUT, &uri, Some(&token), Some(json!({"name": "Sport"})))
        .await;
    assert_eq!(renamed.status, StatusCode::BAD_REQUEST);
    assert_eq!(renamed.body["error"], "ImmutableResource");

    let deleted = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::BAD_REQUEST);

    let appended = app
        .post(
            &format!("{}/fields", uri),
            Some(&token),
            json!({"fields": [{"label": "Puls", "data_type": "number"}]}),
        )
        .await;
    assert_eq!(appended.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.get(&uri, &token).await.body["name"], "Fitness");
}

#[tokio::test]
async fn custom_category_lifecycle() {
    let app = spawn_app().await;
    let token = app.register("alice").await;

    let created = app
        .post(
            "/categories/",
            Some(&token),
            json!({
                "name": "Lesen",
                "description": "Bücher",
                "fields": [
                    {"label": "Buch", "data_type": "text"},
                    {"label": "Seiten", "data_type": "number", "unit": "S."}
                ]
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["is_system_default"], false);
    let id = created.body["id"].as_i64().unwrap();
    let uri = format!("/categories/{}", id);

    let bad_type = app
        .post(
            &format!("{}/fields", uri),
            Some(&token),
            json!({"fields": [{"label": "Datum", "data_type": "date"}]}),
        )
        .await;
    assert_eq!(bad_type.status, StatusCode::BAD_REQUEST);

    let appended = app
        .post(
            &format!("{}/fields", uri),
            Some(&token),
            json!({"fields": [{"label": "Genre", "data_type": "text"}]}),
        )
        .await;
    assert_eq!(appended.status, StatusCode::OK);
    assert_eq!(appended.body["fields"].as_array().unwrap().len(), 3);

    let renamed = app
        .request(Method::PUT, &uri, Some(&token), Some(json!({"name": "Lektüre"})))
        .await;
    assert_eq!(renamed.body["name"], "Lektüre");
    assert_eq!(renamed.body["description"], "Bücher");

    let deleted = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(app.get(&uri, &token).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn entries_are_coerced_and_rendered() {
    let app = spawn_app().await;
    let token = app.register("alice").await;
    let fitness = app.category_id(&token, "Fitness").await;

    let created = app
        .post(
            "/entries/",
            Some(&token),
            json!({
                "category_id": fitness,
                "occurred_at": "2024-05-01T07:30:00Z",
                "note": "Morgenlauf",
                "values": {"Übung": "Laufen", "Dauer": "30", "Energie": "oops"}
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    assert_eq!(created.body["data"]["Dauer"], 30);
    assert_eq!(created.body["data"]["Energie"], "oops");
    assert_eq!(created.body["display"]["Dauer"], "30 Minuten");
    assert_eq!(created.body["display"]["Energie"], "oops kcal");
    assert_eq!(created.body["display"]["Übung"], "Laufen");
    let shown: Vec<&str> = created.body["display"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(shown, ["Übung", "Dauer", "Energie"]);

    let id = created.body["id"].as_i64().unwrap();
    let fetched = app.get(&format!("/entries/{}", id), &token).await;
    assert_eq!(fetched.body["note"], "Morgenlauf");
    assert_eq!(fetched.body["data"]["Energie"], "oops");

    let updated = app
        .request(
            Method::PUT,
            &format!("/entries/{}", id),
            Some(&token),
            Some(json!({"category_id": fitness, "values": {"Dauer": 45.5}})),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["display"]["Dauer"], "45.5 Minuten");
    assert_eq!(updated.body["occurred_at"], created.body["occurred_at"]);
}

#[tokio::test]
async fn zone_less_timestamps_are_read_as_utc() {
    let app = spawn_app().await;
    let token = app.register("alice").await;
    let fitness = app.category_id(&token, "Fitness").await;

    let created = app
        .post(
            "/entries/",
            Some(&token),
            json!({"category_id": fitness, "occurred_at": "2025-01-01T10:00", "values": {"Dauer": "30"}}),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let stored = DateTime::parse_from_rfc3339(created.body["occurred_at"].as_str().unwrap()).unwrap();
    assert_eq!(stored, Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap());

    let window = app
        .get("/entries/?start=2025-01-01T09:00&end=2025-01-01T11:00:00", &token)
        .await;
    assert_eq!(window.status, StatusCode::OK, "{}", window.body);
    assert_eq!(window.body.as_array().unwrap().len(), 1);

    let bad = app
        .post(
            "/entries/",
            Some(&token),
            json!({"category_id": fitness, "occurred_at": "tomorrow", "values": {}}),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["error"], "InvalidRequest");
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = spawn_app().await;
    let token = app.register("alice").await;

    let wrong_type = app
        .post("/entries/", Some(&token), json!({"category_id": "eins", "values": {}}))
        .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_type.body["error"], "InvalidRequest");
    assert!(wrong_type.body["detail"].is_string());

    let bad_id = app.get("/entries/abc", &token).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["error"], "InvalidRequest");

    let bad_query = app.get("/entries/?category_id=abc", &token).await;
    assert_eq!(bad_query.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_query.body["error"], "InvalidRequest");
}

#[tokio::test]
async fn entry_listing_filters_and_orders() {
    let app = spawn_app().await;
    let token = app.register("alice").await;
    let fitness = app.category_id(&token, "Fitness").await;
    let sleep = app.category_id(&token, "Schlaf").await;

    for (category, at) in [
        (fitness, "2024-05-01T07:00:00Z"),
        (sleep, "2024-05-02T06:00:00Z"),
        (fitness, "2024-05-03T18:00:00Z"),
    ] {
        let response = app
            .post(
                "/entries/",
                Some(&token),
                json!({"category_id": category, "occurred_at": at, "values": {"Dauer": 1}}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let all = app.get("/entries/", &token).await;
    let times: Vec<_> = all
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["occurred_at"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(times.len(), 3);
    assert!(times[0].starts_with("2024-05-03"));
    assert!(times[2].starts_with("2024-05-01"));

    let only_fitness = app
        .get(&format!("/entries/?category_id={}", fitness), &token)
        .await;
    assert_eq!(only_fitness.body.as_array().unwrap().len(), 2);

    let window = app
        .get(
            "/entries/?start=2024-05-02T00:00:00Z&end=2024-05-02T23:59:59Z",
            &token,
        )
        .await;
    let window = window.body.as_array().unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0]["category_id"], sleep);
}

#[tokio::test]
async fn other_users_data_is_not_found() {
    let app = spawn_app().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let fitness = app.category_id(&alice, "Fitness").await;
    let entry = app
        .post(
            "/entries/",
            Some(&alice),
            json!({"category_id": fitness, "values": {"Dauer": 20}}),
        )
        .await;
    let entry_uri = format!("/entries/{}", entry.body["id"]);

    assert_eq!(app.get(&entry_uri, &bob).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.request(Method::DELETE, &entry_uri, Some(&bob), None).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get(&format!("/categories/{}", fitness), &bob).await.status,
        StatusCode::NOT_FOUND
    );

    let into_foreign = app
        .post(
            "/entries/",
            Some(&bob),
            json!({"category_id": fitness, "values": {"Dauer": 20}}),
        )
        .await;
    assert_eq!(into_foreign.status, StatusCode::NOT_FOUND);

    assert!(app.get("/entries/", &bob).await.body.as_array().unwrap().is_empty());
    assert_eq!(app.get(&entry_uri, &alice).await.status, StatusCode::OK);
}

#[tokio::test]
async fn legacy_surface_round_trip() {
    let app = spawn_app().await;

    let registered = app
        .post(
            "/api/register",
            None,
            json!({"username": "alice", "email": "alice@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(registered.status, StatusCode::OK, "{}", registered.body);
    assert_eq!(registered.body, json!({"success": true}));

    let refused = app
        .post("/api/login", None, json!({"username": "alice", "password": "Falsch123"}))
        .await;
    assert_eq!(refused.status, StatusCode::UNAUTHORIZED);

    let login = app
        .post("/api/login", None, json!({"username": "alice", "password": PASSWORD}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["success"], true);
    assert_eq!(login.body["username"], "alice");
    let token = login.body["token"].as_str().unwrap().to_string();

    assert_eq!(app.get("/api/categories", &token).await.body.as_array().unwrap().len(), 4);

    let created = app
        .post(
            "/api/categories",
            Some(&token),
            json!({"name": "Wasser", "desc": "Trinken", "fields": [{"label": "Menge", "data_type": "number", "unit": "ml"}]}),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["description"], "Trinken");
    let reference = format!("cat_{}", created.body["id"]);

    let entry = app
        .post(
            "/api/entries",
            Some(&token),
            json!({"type": reference, "timestamp": 1_714_550_400_000i64, "details": {"Menge": "250"}}),
        )
        .await;
    assert_eq!(entry.status, StatusCode::OK, "{}", entry.body);
    assert_eq!(entry.body["type"], reference);
    assert_eq!(entry.body["text"], "Wasser");
    assert_eq!(entry.body["details"]["Menge"], "250 ml");
    assert_eq!(entry.body["timestamp"], 1_714_550_400_000i64);

    let bad = app
        .post(
            "/api/entries",
            Some(&token),
            json!({"type": "wasser", "timestamp": 0, "details": {}}),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["error"], "InvalidType");

    let listed = app.get("/api/entries", &token).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/entries/{}", entry.body["id"]),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(deleted.body["success"], true);
    assert!(app.get("/api/entries", &token).await.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn legacy_reset_restores_defaults() {
    let app = spawn_app().await;
    let token = app.register("alice").await;
    let fitness = app.category_id(&token, "Fitness").await;

    app.post("/categories/", Some(&token), json!({"name": "Lesen", "fields": []}))
        .await;
    app.post(
        "/entries/",
        Some(&token),
        json!({"category_id": fitness, "values": {"Dauer": 10}}),
    )
    .await;

    let reset = app.post("/api/reset", Some(&token), json!({})).await;
    assert_eq!(reset.status, StatusCode::OK);
    assert_eq!(reset.body["success"], true);

    let categories = app.get("/api/categories", &token).await;
    let categories = categories.body.as_array().unwrap();
    assert_eq!(categories.len(), 4);
    assert!(categories.iter().all(|c| c["is_system_default"] == true));
    assert!(app.get("/entries/", &token).await.body.as_array().unwrap().is_empty());
}
