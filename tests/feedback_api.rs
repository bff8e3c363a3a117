mod common;

use axum::http::{Method, StatusCode};
use common::{create_item, feedback_body, get, post, send, test_app};
use serde_json::json;

#[tokio::test]
async fn health_reports_service() {
    let app = test_app().await;
    let (status, body) = get(&app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "appfeedback");
}

#[tokio::test]
async fn create_returns_snapshot_with_baseline_rank() {
    let app = test_app().await;
    let (status, body) = post(
        &app,
        "/api/feedback",
        feedback_body("wishlist", "alice", "Dark mode please"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "new");
    assert_eq!(body["item_type"], "wishlist");
    assert_eq!(body["vote_count"], 0);
    assert_eq!(body["rank_score"], 0.5);
    assert_eq!(body["credits_awarded"], 10);
    assert_eq!(body["comment_count"], 0);
    assert!(body["user_voted"].is_null());
    assert!(body["issue_url"].is_null());
}

#[tokio::test]
async fn create_rejects_invalid_input() {
    let app = test_app().await;

    let (status, body) = post(&app, "/api/feedback", feedback_body("wishlist", "alice", "Hi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let mut short_description = feedback_body("bug", "alice", "Crash on save");
    short_description["description"] = json!("too short");
    let (status, _) = post(&app, "/api/feedback", short_description).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vote_toggles_and_flips() {
    let app = test_app().await;
    let id = create_item(&app, "wishlist", "alice", "Keyboard shortcuts").await;
    let vote_uri = format!("/api/feedback/{id}/vote");

    let (status, body) = post(&app, &vote_uri, json!({"user_id": "bob", "vote_type": "up"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"vote_count": 1, "user_voted": "up"}));

    let (_, body) = post(&app, &vote_uri, json!({"user_id": "bob", "vote_type": "down"})).await;
    assert_eq!(body, json!({"vote_count": -1, "user_voted": "down"}));

    let (_, body) = post(&app, &vote_uri, json!({"user_id": "bob", "vote_type": "down"})).await;
    assert_eq!(body, json!({"vote_count": 0, "user_voted": null}));

    // vote_type defaults to up
    let (_, body) = post(&app, &vote_uri, json!({"user_id": "carol"})).await;
    assert_eq!(body, json!({"vote_count": 1, "user_voted": "up"}));

    let (_, item) = get(&app, &format!("/api/feedback/{id}?user_id=carol")).await;
    assert_eq!(item["vote_count"], 1);
    assert_eq!(item["user_voted"], "up");
    assert_eq!(item["rank_score"], 1.5);
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let app = test_app().await;
    let missing = "00000000-0000-0000-0000-000000000000";

    let (status, body) = get(&app, &format!("/api/feedback/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Item not found");

    let (status, _) = post(
        &app,
        &format!("/api/feedback/{missing}/vote"),
        json!({"user_id": "bob"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_round_trip_and_reject_blank_content() {
    let app = test_app().await;
    let id = create_item(&app, "bug", "alice", "Export button broken").await;
    let comments_uri = format!("/api/feedback/{id}/comments");

    let (status, body) = post(
        &app,
        &comments_uri,
        json!({"user_id": "po", "content": "Reproduced", "is_product_owner": true}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_product_owner"], true);

    let (status, _) = post(&app, &comments_uri, json!({"user_id": "bob", "content": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, &comments_uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["content"], "Reproduced");

    let (_, item) = get(&app, &format!("/api/feedback/{id}")).await;
    assert_eq!(item["comment_count"], 1);
}

#[tokio::test]
async fn delete_is_owner_only_and_cascades() {
    let app = test_app().await;
    let id = create_item(&app, "wishlist", "alice", "Bulk archive").await;
    post(&app, &format!("/api/feedback/{id}/vote"), json!({"user_id": "bob"})).await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/feedback/{id}?user_id=bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/feedback/{id}?user_id=alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, &format!("/api/feedback/{id}/vote"), json!({"user_id": "bob"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &app,
        &format!("/api/feedback/{id}/comments"),
        json!({"user_id": "bob", "content": "gone?"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_updates_status_and_notes() {
    let app = test_app().await;
    let id = create_item(&app, "wishlist", "alice", "Slack integration").await;
    let update = json!({"status": "planned", "po_notes": "Q3"});

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/feedback/{id}?user_id=mallory"),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/feedback/{id}?user_id=alice"),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "planned");
    assert_eq!(body["po_notes"], "Q3");
    assert_eq!(body["title"], "Slack integration");
}

#[tokio::test]
async fn list_filters_sorts_and_pages() {
    let app = test_app().await;
    let quiet = create_item(&app, "wishlist", "alice", "Quiet request").await;
    let popular = create_item(&app, "wishlist", "bob", "Popular request").await;
    create_item(&app, "bug", "carol", "Login loop on Safari").await;

    for voter in ["v1", "v2"] {
        post(
            &app,
            &format!("/api/feedback/{popular}/vote"),
            json!({"user_id": voter}),
        )
        .await;
    }

    let (status, body) = get(&app, "/api/feedback?item_type=wishlist&sort_by=votes&user_id=v1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["id"], popular.as_str());
    assert_eq!(items[0]["user_voted"], "up");
    assert_eq!(items[1]["id"], quiet.as_str());

    let (_, page) = get(&app, "/api/feedback?limit=1&offset=1").await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["pagination"]["total"], 3);

    let (_, bugs) = get(&app, "/api/feedback?item_type=bug&status=new").await;
    assert_eq!(bugs["items"][0]["title"], "Login loop on Safari");
}

#[tokio::test]
async fn malformed_input_renders_json_errors() {
    let app = test_app().await;
    let id = create_item(&app, "wishlist", "alice", "Keyboard shortcuts").await;

    let (status, body) = post(
        &app,
        &format!("/api/feedback/{id}/vote"),
        json!({"user_id": "bob", "vote_type": "sideways"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("sideways"));

    let (status, body) = post(&app, "/api/feedback", feedback_body("feature", "alice", "Dark mode")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].is_string());

    let (status, body) = get(&app, "/api/feedback?item_type=feature").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, body) = get(&app, "/api/feedback/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn reopening_a_completed_item_pays_once() {
    let app = test_app().await;
    let id = create_item(&app, "wishlist", "alice", "Keyboard shortcuts").await;
    let uri = format!("/api/feedback/{id}?user_id=alice");

    for _ in 0..3 {
        for status in ["completed", "new"] {
            let (code, _) = send(&app, Method::PUT, &uri, Some(json!({"status": status}))).await;
            assert_eq!(code, StatusCode::OK);
        }
    }
    let (_, item) = send(&app, Method::PUT, &uri, Some(json!({"status": "completed"}))).await;
    assert_eq!(item["credits_awarded"], 510);

    let (_, balance) = get(&app, "/api/credits/balance?user_id=alice").await;
    assert_eq!(balance["credits_balance"], 510);
    assert_eq!(balance["items_developed"], 1);
}
