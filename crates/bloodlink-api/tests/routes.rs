use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use bloodlink_api::{AppStateInner, build_router};
use bloodlink_db::Database;

fn test_app() -> (TempDir, Router) {
    test_app_with_ttl(7)
}

fn test_app_with_ttl(token_ttl_days: i64) -> (TempDir, Router) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = Database::open(&tmp.path().join("api-test.db")).expect("open db");
    let state = Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".to_string(),
        token_ttl_days,
    });
    (tmp, build_router(state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("valid JSON response")
    };
    (status, json)
}

async fn register(app: &Router, email: &str, role: &str, location: Option<[f64; 2]>) -> String {
    let mut body = json!({
        "email": email,
        "password": "correct horse",
        "role": role,
        "name": format!("{} user", role),
    });
    if let Some(loc) = location {
        body["location"] = json!(loc);
    }
    let (status, json) = send(app, "POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["token"].as_str().unwrap().to_string()
}

async fn create_request(app: &Router, token: &str, persons: i64) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/hospital/requests",
        Some(token),
        Some(json!({ "bloodType": "O-", "persons": persons, "notes": "ER" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["request"]["status"], "Open");
    json["request"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn root_and_health() {
    let (_tmp, app) = test_app();

    let (status, json) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    let (status, json) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["db"], "up");
}

#[tokio::test]
async fn register_and_login() {
    let (_tmp, app) = test_app();
    register(&app, "donor@example.com", "donor", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "donor@example.com", "password": "correct horse", "role": "donor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["role"], "donor");
    assert_eq!(json["user"]["email"], "donor@example.com");
    assert_eq!(json["user"]["donationCount"], 0);
    assert!(json["token"].as_str().is_some());

    // Wrong password and wrong role look the same.
    for body in [
        json!({ "email": "donor@example.com", "password": "wrong password", "role": "donor" }),
        json!({ "email": "donor@example.com", "password": "correct horse", "role": "hospital" }),
    ] {
        let (status, json) = send(&app, "POST", "/api/auth/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "invalid_credentials");
    }
}

#[tokio::test]
async fn register_rejects_bad_input_and_duplicates() {
    let (_tmp, app) = test_app();
    register(&app, "taken@example.com", "hospital", Some([1.0, 2.0])).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "taken@example.com",
            "password": "long enough",
            "role": "donor",
            "name": "X",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "email_taken");

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "short@example.com",
            "password": "short",
            "role": "donor",
            "name": "X",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "not-an-email",
            "password": "long enough",
            "role": "donor",
            "name": "X",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");
}

#[tokio::test]
async fn routes_require_token_and_role() {
    let (_tmp, app) = test_app();
    let donor = register(&app, "d@example.com", "donor", Some([0.0, 0.0])).await;
    let hospital = register(&app, "h@example.com", "hospital", Some([0.0, 0.0])).await;

    let (status, json) = send(&app, "GET", "/api/donor/requests/nearby", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "unauthorized");

    let (status, _) = send(&app, "GET", "/api/donor/requests/nearby", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) =
        send(&app, "GET", "/api/donor/requests/nearby", Some(&hospital), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "forbidden");

    let (status, _) = send(&app, "GET", "/api/hospital/requests", Some(&donor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_request_validation() {
    let (_tmp, app) = test_app();
    let hospital = register(&app, "h@example.com", "hospital", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/hospital/requests",
        Some(&hospital),
        Some(json!({ "bloodType": "A+" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");

    let (status, json) = send(
        &app,
        "POST",
        "/api/hospital/requests",
        Some(&hospital),
        Some(json!({ "bloodType": "A+", "persons": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");

    let (status, json) = send(&app, "GET", "/api/hospital/requests", Some(&hospital), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["requests"], json!([]));
}

#[tokio::test]
async fn nearby_requires_location() {
    let (_tmp, app) = test_app();
    let donor = register(&app, "d@example.com", "donor", None).await;

    let (status, json) = send(&app, "GET", "/api/donor/requests/nearby", Some(&donor), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "location_not_set");

    let (status, json) = send(
        &app,
        "PATCH",
        "/api/donor/profile",
        Some(&donor),
        Some(json!({ "location": [12.5, -7.25] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["profile"]["latitude"], 12.5);
    assert_eq!(json["profile"]["longitude"], -7.25);

    let (status, json) = send(&app, "GET", "/api/donor/requests/nearby", Some(&donor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["requests"], json!([]));

    let (status, json) =
        send(&app, "PATCH", "/api/donor/profile", Some(&donor), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");
}

#[tokio::test]
async fn donor_flow_end_to_end() {
    let (_tmp, app) = test_app();
    let near = register(&app, "near@example.com", "hospital", Some([0.0, 0.0])).await;
    let far = register(&app, "far@example.com", "hospital", Some([1.0, 0.0])).await;
    let alice = register(&app, "alice@example.com", "donor", Some([0.0, 0.0])).await;
    let bob = register(&app, "bob@example.com", "donor", Some([0.0, 0.0])).await;
    let carol = register(&app, "carol@example.com", "donor", Some([0.0, 0.0])).await;

    let far_id = create_request(&app, &far, 1).await;
    let near_id = create_request(&app, &near, 2).await;

    let (status, json) = send(&app, "GET", "/api/donor/requests/nearby", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let requests = json["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["id"], near_id.as_str());
    assert_eq!(requests[0]["urgency"], "High");
    assert_eq!(requests[0]["hospitalName"], "hospital user");
    assert_eq!(requests[1]["id"], far_id.as_str());
    assert_eq!(requests[1]["urgency"], "Medium");

    // alice then bob fill the two-person request
    let uri = format!("/api/donor/requests/{}/respond", near_id);
    let (status, json) = send(&app, "POST", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["response"]["status"], "Pending");
    let alice_response = json["response"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(&app, "POST", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "already_responded");

    let (_, json) = send(&app, "GET", "/api/hospital/requests", Some(&near), None).await;
    assert_eq!(json["requests"][0]["status"], "Partially Filled");

    let (status, _) = send(&app, "POST", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, json) = send(&app, "GET", "/api/hospital/requests", Some(&near), None).await;
    assert_eq!(json["requests"][0]["status"], "Closed");

    let (status, json) = send(&app, "POST", &uri, Some(&carol), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "request_not_found_or_closed");

    // donation is credited once
    let donated_uri = format!("/api/donor/responses/{}/donated", alice_response);
    let (status, json) = send(&app, "POST", &donated_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"]["status"], "Donated");

    let (status, json) = send(&app, "POST", &donated_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "already_donated");

    // bob can't touch alice's response
    let (status, json) = send(&app, "POST", &donated_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "response_not_found");

    let delete_uri = format!("/api/donor/responses/{}", alice_response);
    let (status, json) = send(&app, "DELETE", &delete_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "cannot_withdraw_donated");

    let (status, json) = send(&app, "GET", "/api/donor/responses", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["donor"]["donationCount"], 1);
    assert_eq!(json["responses"][0]["responseStatus"], "Donated");
    assert_eq!(json["responses"][0]["requestStatus"], "Closed");

    let (_, json) = send(&app, "GET", "/api/donor/profile", Some(&alice), None).await;
    assert_eq!(json["profile"]["donationCount"], 1);

    // nearby no longer shows the closed request or the one alice answered
    let (_, json) = send(&app, "GET", "/api/donor/requests/nearby", Some(&carol), None).await;
    let ids: Vec<_> = json["requests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![far_id]);
}

#[tokio::test]
async fn withdraw_pending_response() {
    let (_tmp, app) = test_app();
    let hospital = register(&app, "h@example.com", "hospital", Some([0.0, 0.0])).await;
    let donor = register(&app, "d@example.com", "donor", Some([0.0, 0.0])).await;
    let request_id = create_request(&app, &hospital, 3).await;

    let (_, json) = send(
        &app,
        "POST",
        &format!("/api/donor/requests/{}/respond", request_id),
        Some(&donor),
        None,
    )
    .await;
    let response_id = json["response"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/donor/responses/{}", response_id);
    let (status, json) = send(&app, "DELETE", &uri, Some(&donor), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(json, Value::Null);

    let (status, _) = send(&app, "DELETE", &uri, Some(&donor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // status is not rolled back by a withdrawal
    let (_, json) = send(&app, "GET", "/api/hospital/requests", Some(&hospital), None).await;
    assert_eq!(json["requests"][0]["status"], "Partially Filled");
}

#[tokio::test]
async fn malformed_bodies_get_error_codes() {
    let (_tmp, app) = test_app();
    let donor = register(&app, "d@example.com", "donor", None).await;
    let hospital = register(&app, "h@example.com", "hospital", None).await;

    let (status, json) = send(
        &app,
        "PATCH",
        "/api/donor/profile",
        Some(&donor),
        Some(json!({ "location": ["a", "b"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");
    assert!(json["error"].as_str().is_some());

    let (status, json) = send(
        &app,
        "POST",
        "/api/hospital/requests",
        Some(&hospital),
        Some(json!({ "bloodType": "A+", "persons": "two" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "validation_error");

    // Not JSON at all.
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["code"], "bad_request");
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let (_tmp, app) = test_app();
    let donor = register(&app, "d@example.com", "donor", Some([0.0, 0.0])).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/donor/requests/not-a-uuid/respond",
        Some(&donor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "request_not_found_or_closed");

    let (status, json) = send(
        &app,
        "POST",
        "/api/donor/responses/42/donated",
        Some(&donor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "response_not_found");

    let (status, json) = send(&app, "DELETE", "/api/donor/responses/42", Some(&donor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "response_not_found");
}

#[tokio::test]
async fn out_of_range_token_ttl_is_an_internal_error() {
    let (_tmp, app) = test_app_with_ttl(i64::MAX);

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "d@example.com",
            "password": "correct horse",
            "role": "donor",
            "name": "D",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "internal_error");
    assert_eq!(json["error"], "internal server error");
}
