#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use serde_json::{json, Value};

use common::open_config;

#[actix_web::test]
async fn create_then_list_returns_the_record() {
    let app = test_app!(open_config());

    let req = test::TestRequest::post()
        .uri("/tasks")
        .set_json(json!({ "Name": "Buy milk", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let id = created["_id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 24);
    assert_eq!(created["Name"], "Buy milk");
    assert_eq!(created["Deadline"], "2025-01-01T10:00:00Z");

    let req = test::TestRequest::get().uri("/tasks").to_request();
    let tasks: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["_id"], id.as_str());
    assert_eq!(tasks[0]["Name"], "Buy milk");
}

#[actix_web::test]
async fn create_with_missing_fields_is_rejected() {
    let app = test_app!(open_config());

    for body in [
        json!({ "Deadline": "2025-01-01T10:00" }),
        json!({ "Name": "No deadline" }),
        json!({ "Name": "", "Deadline": "2025-01-01T10:00" }),
        json!({}),
    ] {
        let req = test::TestRequest::post().uri("/tasks").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let err: Value = test::read_body_json(resp).await;
        assert!(err["fields"].as_array().is_some_and(|f| !f.is_empty()));
    }

    let req = test::TestRequest::get().uri("/tasks").to_request();
    let tasks: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(tasks.is_empty());
}

#[actix_web::test]
async fn malformed_json_is_a_client_error() {
    let app = test_app!(open_config());
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = test::read_body_json(resp).await;
    assert!(err["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[actix_web::test]
async fn list_is_sorted_by_deadline() {
    let app = test_app!(open_config());
    for (name, deadline) in [
        ("third", "2025-03-01T09:00"),
        ("first", "2025-01-01T09:00"),
        ("second", "2025-02-01T09:00"),
    ] {
        let req = test::TestRequest::post()
            .uri("/tasks")
            .set_json(json!({ "Name": name, "Deadline": deadline }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get().uri("/tasks").to_request();
    let tasks: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = tasks.iter().map(|t| t["Name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[actix_web::test]
async fn delete_unknown_id_is_not_found_and_changes_nothing() {
    let app = test_app!(open_config());
    let req = test::TestRequest::post()
        .uri("/tasks")
        .set_json(json!({ "Name": "keep", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    for uri in [
        "/tasks/65a1b2c3d4e5f60718293a4b",
        "/tasks/not-an-id",
        "/tasks/completed/65a1b2c3d4e5f60718293a4b",
    ] {
        let req = test::TestRequest::delete().uri(uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let req = test::TestRequest::get().uri("/tasks").to_request();
    let tasks: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tasks.len(), 1);
    let req = test::TestRequest::get().uri("/tasks/completed").to_request();
    let completed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(completed.is_empty());
}

#[actix_web::test]
async fn delete_returns_no_content() {
    let app = test_app!(open_config());
    let req = test::TestRequest::post()
        .uri("/tasks")
        .set_json(json!({ "Name": "gone", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/tasks/{}", created["_id"].as_str().unwrap()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_web::test]
async fn update_replaces_fields_by_id() {
    let app = test_app!(open_config());
    let req = test::TestRequest::post()
        .uri("/tasks")
        .set_json(json!({ "Name": "draft", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["_id"].as_str().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/tasks/{}", id))
        .set_json(json!({ "Name": "final", "Deadline": "2025-06-01T08:30" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["_id"], id);
    assert_eq!(updated["Name"], "final");
    assert_eq!(updated["Deadline"], "2025-06-01T08:30:00Z");

    let req = test::TestRequest::put()
        .uri("/tasks/65a1b2c3d4e5f60718293a4b")
        .set_json(json!({ "Name": "x", "Deadline": "2025-06-01T08:30" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::put()
        .uri(&format!("/tasks/{}", id))
        .set_json(json!({ "Name": "x" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn completing_twice_never_duplicates() {
    let app = test_app!(open_config());
    let req = test::TestRequest::post()
        .uri("/tasks")
        .set_json(json!({ "Name": "once", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/tasks/{}/complete", created["_id"].as_str().unwrap());

    let resp = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let completed: Value = test::read_body_json(resp).await;
    assert_eq!(completed["Name"], "once");
    assert_ne!(completed["_id"], created["_id"]);

    let resp = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/tasks/completed").to_request();
    let completed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(completed.len(), 1);
}

#[actix_web::test]
async fn posting_completed_with_id_moves_the_stored_task() {
    let app = test_app!(open_config());
    let req = test::TestRequest::post()
        .uri("/tasks")
        .set_json(json!({ "Name": "stored name", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/tasks/completed")
        .set_json(json!({ "_id": created["_id"], "Name": "stale name", "Deadline": "2030-01-01T00:00" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let completed: Value = test::read_body_json(resp).await;
    assert_eq!(completed["Name"], "stored name");

    let req = test::TestRequest::get().uri("/tasks").to_request();
    let pending: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(pending.is_empty());

    let req = test::TestRequest::post()
        .uri("/tasks/completed")
        .set_json(json!({ "_id": created["_id"], "Name": "stored name", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn posting_completed_without_id_creates_directly() {
    let app = test_app!(open_config());
    let req = test::TestRequest::post()
        .uri("/tasks/completed")
        .set_json(json!({ "Name": "already done", "Deadline": "2024-12-31T23:59" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/tasks/completed")
        .set_json(json!({ "Name": "no deadline" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/tasks/completed").to_request();
    let completed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(completed.len(), 1);
}

#[actix_web::test]
async fn buy_milk_lifecycle() {
    let app = test_app!(open_config());

    let req = test::TestRequest::post()
        .uri("/tasks")
        .set_json(json!({ "Name": "Buy milk", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let x = created["_id"].as_str().unwrap().to_string();

    let tasks: Vec<Value> =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/tasks").to_request()).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["_id"], x.as_str());

    let req = test::TestRequest::post().uri(&format!("/tasks/{}/complete", x)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let tasks: Vec<Value> =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/tasks").to_request()).await;
    assert!(tasks.is_empty());
    let completed: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/tasks/completed").to_request(),
    )
    .await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["Name"], "Buy milk");

    let req = test::TestRequest::delete()
        .uri(&format!("/tasks/completed/{}", completed[0]["_id"].as_str().unwrap()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let completed: Vec<Value> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/tasks/completed").to_request(),
    )
    .await;
    assert!(completed.is_empty());
}

#[actix_web::test]
async fn fragments_render_html_lists() {
    let app = test_app!(open_config());
    let req = test::TestRequest::get().uri("/tasks/fragment").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert!(std::str::from_utf8(&body).unwrap().starts_with("Start with your first"));

    let req = test::TestRequest::post()
        .uri("/tasks")
        .set_json(json!({ "Name": "Fish & chips", "Deadline": "2025-01-01T10:00" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/tasks/fragment").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap().starts_with("text/html"));
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("Fish &amp; chips"));
    assert!(html.contains("01/01/2025, 10:00:00"));

    let req = test::TestRequest::get().uri("/tasks/completed/fragment").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert!(std::str::from_utf8(&body).unwrap().starts_with("Complete a"));
}

#[actix_web::test]
async fn front_end_is_served() {
    let app = test_app!(open_config());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/html/index.html");

    for uri in ["/html/index.html", "/html/login.html", "/html/register.html", "/js/script.js", "/css/style.css"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }
}
