use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use trailer_taste::api::{create_router, AppState};
use trailer_taste::config::EngineConfig;
use trailer_taste::models::CatalogueItem;
use trailer_taste::services::Catalogue;

fn sample_catalogue() -> Vec<CatalogueItem> {
    let genres = [
        "Action", "Drama", "Comedy", "Thriller", "Sci-Fi", "Animation", "Documentary", "Horror",
    ];
    (0..24)
        .map(|i| {
            CatalogueItem::new(format!("tt{:07}", i), format!("Title {}", i))
                .with_year(1985 + i as i32 * 2)
                .with_genres(&[genres[i % genres.len()]])
                .with_director(format!("Director {}", i % 10))
        })
        .collect()
}

fn create_test_server() -> TestServer {
    let state = AppState::new(
        Catalogue::new(sample_catalogue()),
        EngineConfig::default(),
        Some(42),
    );
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn create_session(server: &TestServer) -> String {
    let response = server.post("/api/v1/sessions").json(&json!({})).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

async fn vote_on_next_pair(server: &TestServer, session: &str) -> Value {
    let pair: Value = server
        .get(&format!("/api/v1/sessions/{}/pair", session))
        .await
        .json();
    let response = server
        .post(&format!("/api/v1/sessions/{}/votes", session))
        .json(&json!({
            "winner_id": pair["left"]["id"],
            "loser_id": pair["right"]["id"]
        }))
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_replace_and_get_catalogue() {
    let server = create_test_server();

    let response = server
        .put("/api/v1/catalogue")
        .json(&json!([
            { "id": "tt0133093", "title": "The Matrix", "year": 1999, "genres": ["Action", "Sci-Fi"] },
            { "id": "tt0111161", "title": "The Shawshank Redemption", "year": 1994, "genres": ["Drama"] },
            { "id": "tt0133093", "title": "Duplicate" }
        ]))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["items"], 2);

    let response = server.get("/api/v1/catalogue").await;
    response.assert_status_ok();
    let items: Vec<Value> = response.json();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "The Matrix");
}

#[tokio::test]
async fn test_replace_catalogue_rejects_tiny_catalogue() {
    let server = create_test_server();
    let response = server
        .put("/api/v1/catalogue")
        .json(&json!([{ "id": "tt1", "title": "Alone" }]))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_and_get_session() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server.get(&format!("/api/v1/sessions/{}", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["state"]["choices"], 0);
    assert_eq!(body["state"]["target_rounds"], 12);
    assert_eq!(body["state"]["onboarding_complete"], false);
    assert_eq!(body["state"]["phase"]["status"], "collecting");
    assert_eq!(body["state"]["weights"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_create_session_without_body() {
    let server = create_test_server();

    let response = server.post("/api/v1/sessions").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["state"]["choices"], 0);

    let response = server
        .post("/api/v1/sessions")
        .json(&json!({ "seed": 9 }))
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let server = create_test_server();
    let response = server
        .get("/api/v1/sessions/6f1c1f8e-8a52-4c1b-9a0e-1d2f3a4b5c6d/pair")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pair_and_vote() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server.get(&format!("/api/v1/sessions/{}/pair", id)).await;
    response.assert_status_ok();
    let pair: Value = response.json();
    assert_ne!(pair["left"]["id"], pair["right"]["id"]);
    assert_eq!(pair["round"], 0);

    let response = server
        .post(&format!("/api/v1/sessions/{}/votes", id))
        .json(&json!({
            "winner_id": pair["left"]["id"],
            "loser_id": pair["right"]["id"]
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["phase"]["round"], 1);
    assert_eq!(body["state"]["choices"], 1);

    let norm: f64 = body["state"]["weights"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w.as_f64().unwrap().powi(2))
        .sum::<f64>()
        .sqrt();
    assert!((norm - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_malformed_vote_is_rejected() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/votes", id))
        .json(&json!({ "winner_id": "tt0000001", "loser_id": "tt9999999" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("tt9999999"));

    let state: Value = server.get(&format!("/api/v1/sessions/{}", id)).await.json();
    assert_eq!(state["state"]["choices"], 0);
}

#[tokio::test]
async fn test_full_onboarding_flow() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let mut last = Value::Null;
    for _ in 0..12 {
        last = vote_on_next_pair(&server, &id).await;
    }
    assert_eq!(last["phase"]["status"], "complete");
    assert_eq!(last["state"]["onboarding_complete"], true);

    // No more pairs once onboarding is done
    let response = server.get(&format!("/api/v1/sessions/{}/pair", id)).await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .get(&format!("/api/v1/sessions/{}/recommendations", id))
        .add_query_param("k", 5)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    let mut ids: Vec<&str> = items.iter().map(|r| r["item"]["id"].as_str().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);
    assert!(!body["explanation"]["top_genres"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recommendations_reject_bad_k() {
    let server = create_test_server();
    let id = create_session(&server).await;
    let response = server
        .get(&format!("/api/v1/sessions/{}/recommendations", id))
        .add_query_param("k", 0)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_skip_and_reset() {
    let server = create_test_server();
    let id = create_session(&server).await;

    vote_on_next_pair(&server, &id).await;
    vote_on_next_pair(&server, &id).await;

    let response = server.post(&format!("/api/v1/sessions/{}/skip", id)).await;
    response.assert_status_ok();
    let pair: Value = response.json();
    assert_eq!(pair["round"], 1);

    let response = server.post(&format!("/api/v1/sessions/{}/reset", id)).await;
    response.assert_status_ok();
    let state: Value = response.json();
    assert_eq!(state["choices"], 0);
    assert_eq!(state["explored"], 0);
    assert!(state["weights"]
        .as_array()
        .unwrap()
        .iter()
        .all(|w| w.as_f64().unwrap() == 0.0));
}

#[tokio::test]
async fn test_exploration_is_clamped() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/exploration", id))
        .json(&json!({ "delta": 5.0 }))
        .await;
    response.assert_status_ok();
    let state: Value = response.json();
    assert_eq!(state["exploration_rate"], 0.45);
}

#[tokio::test]
async fn test_hidden_items_exhaust_pairs() {
    let server = create_test_server();
    server
        .put("/api/v1/catalogue")
        .json(&json!([
            { "id": "tt1", "title": "One", "genres": ["Action"] },
            { "id": "tt2", "title": "Two", "genres": ["Drama"] }
        ]))
        .await
        .assert_status_ok();
    let id = create_session(&server).await;

    server
        .post(&format!("/api/v1/sessions/{}/hide", id))
        .json(&json!({ "item_id": "tt1" }))
        .await
        .assert_status_ok();

    let response = server.get(&format!("/api/v1/sessions/{}/pair", id)).await;
    response.assert_status(StatusCode::CONFLICT);

    server
        .post(&format!("/api/v1/sessions/{}/unhide", id))
        .json(&json!({ "item_id": "tt1" }))
        .await
        .assert_status_ok();

    let response = server.get(&format!("/api/v1/sessions/{}/pair", id)).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_like_unknown_item() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/like", id))
        .json(&json!({ "item_id": "tt404" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = server
        .post(&format!("/api/v1/sessions/{}/like", id))
        .json(&json!({ "item_id": "tt0000003" }))
        .await;
    response.assert_status_ok();
    let state: Value = response.json();
    assert_eq!(state["likes"], json!(["tt0000003"]));
}

#[tokio::test]
async fn test_delete_session() {
    let server = create_test_server();
    let id = create_session(&server).await;

    let response = server.delete(&format!("/api/v1/sessions/{}", id)).await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server.get(&format!("/api/v1/sessions/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
}
