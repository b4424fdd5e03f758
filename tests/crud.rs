//! End-to-end CRUD tests against a live PostgreSQL.
//!
//! These drive the real route table through `tower::ServiceExt::oneshot`,
//! covering the behavior the unit tests cannot: statement planning against
//! real column types, the assigned-id round trip, and the HTTP bodies for
//! missing rows. They run only when `DATABASE_URL` is set and skip
//! otherwise, so the suite stays green without a database.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use switchboard::{
    apply_migrations, resource_routes, AppState, FieldCipher, RecordCodec, ResourceDescriptor,
    ResourceSet, BUILTIN_MIGRATIONS,
};
use tower::ServiceExt;

async fn test_app() -> Option<(Router, PgPool)> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to test database");
    apply_migrations(&pool, BUILTIN_MIGRATIONS)
        .await
        .expect("apply migrations");

    let resources = ResourceSet::new(vec![
        ResourceDescriptor::new("switchables", "relay_switches"),
        ResourceDescriptor::new("credentials", "credentials").encrypt_field("payload"),
    ])
    .expect("register resources");
    let cipher = Arc::new(FieldCipher::from_passphrase("integration test key"));
    let state = AppState {
        pool: pool.clone(),
        resources: Arc::new(resources),
        codec: RecordCodec::new(cipher),
    };
    Some((resource_routes(state), pool))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn create_then_get_returns_equal_record() {
    let Some((app, _pool)) = test_app().await else { return };

    let submitted = json!({"name": "A", "target_type": "t", "target_id": "1", "enabled": false});
    let (status, created) = send(&app, "POST", "/switchables", Some(submitted.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().expect("assigned integer id");
    for key in ["name", "target_type", "target_id", "enabled"] {
        assert_eq!(created[key], submitted[key], "{}", key);
    }

    let (status, fetched) = send(&app, "GET", &format!("/switchables/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn encrypted_field_is_opaque_at_rest_and_plain_in_transit() {
    let Some((app, pool)) = test_app().await else { return };

    let (status, created) = send(
        &app,
        "POST",
        "/credentials",
        Some(json!({"name": "api key", "payload": {"secret": 42}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["payload"], json!({"secret": 42}));
    let id = created["id"].as_i64().unwrap();

    // Under the API the value is plaintext; in the table it is ciphertext.
    let stored: String = sqlx::query_scalar("SELECT payload FROM credentials WHERE id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(stored.starts_with("v1."), "stored value is ciphertext");

    let (status, fetched) = send(&app, "GET", &format!("/credentials/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["payload"], json!({"secret": 42}));
}

#[tokio::test]
async fn update_persists_and_echoes_submitted_record() {
    let Some((app, _pool)) = test_app().await else { return };

    let (_, created) = send(
        &app,
        "POST",
        "/switchables",
        Some(json!({"name": "before", "target_type": "t", "target_id": "2", "enabled": true})),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let patch = json!({"name": "after", "enabled": false});
    let (status, echoed) = send(
        &app,
        "PUT",
        &format!("/switchables/{}", id),
        Some(patch.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, patch);

    let (_, fetched) = send(&app, "GET", &format!("/switchables/{}", id), None).await;
    assert_eq!(fetched["name"], json!("after"));
    assert_eq!(fetched["enabled"], json!(false));
}

#[tokio::test]
async fn list_returns_json_array() {
    let Some((app, _pool)) = test_app().await else { return };

    let (status, body) = send(&app, "GET", "/switchables", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_array());
}

#[tokio::test]
async fn missing_row_answers_404_naming_the_resource() {
    let Some((app, _pool)) = test_app().await else { return };

    let (status, body) = send(&app, "GET", "/switchables/999999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "switchables not found"}));
}

#[tokio::test]
async fn malformed_id_answers_400() {
    let Some((app, _pool)) = test_app().await else { return };

    let (status, _) = send(&app, "GET", "/switchables/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_of_missing_row_still_confirms() {
    let Some((app, _pool)) = test_app().await else { return };

    let (status, body) = send(&app, "DELETE", "/switchables/999999999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "switchables deleted successfully"}));
}

#[tokio::test]
async fn delete_removes_the_row() {
    let Some((app, _pool)) = test_app().await else { return };

    let (_, created) = send(
        &app,
        "POST",
        "/switchables",
        Some(json!({"name": "doomed", "target_type": "t", "target_id": "3", "enabled": false})),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/switchables/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/switchables/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
