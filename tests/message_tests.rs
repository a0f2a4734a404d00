// tests/message_tests.rs

use campuslink::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "message_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        upload_dir: std::env::temp_dir()
            .join("campuslink_test_uploads")
            .to_string_lossy()
            .to_string(),
        frontend_url: "http://localhost:3000".to_string(),
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn signed_in_student(address: &str, firstname: &str) -> (reqwest::Client, i64) {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();

    let email = format!("m_{}@test.local", &uuid::Uuid::new_v4().to_string()[..8]);

    client
        .post(&format!("{}/auth/signup", address))
        .json(&serde_json::json!({
            "firstname": firstname,
            "lastname": "Messenger",
            "email": email,
            "password": "password123",
            "role": "student"
        }))
        .send()
        .await
        .unwrap();

    client
        .post(&format!("{}/auth/signin", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();

    let me: serde_json::Value = client
        .get(&format!("{}/profile/me", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    (client, me["id"].as_i64().unwrap())
}

#[tokio::test]
async fn send_validation_rules() {
    let address = spawn_app().await;
    let (a, a_id) = signed_in_student(&address, "Alice").await;
    let (_b, b_id) = signed_in_student(&address, "Bob").await;

    // Empty body
    let resp = a
        .post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": b_id, "body": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Self-send
    let resp = a
        .post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": a_id, "body": "note to self" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Unknown recipient
    let resp = a
        .post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": 999_999_999, "body": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // Valid send
    let resp = a
        .post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": b_id, "body": "hello bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn history_is_ordered_and_annotated() {
    let address = spawn_app().await;
    let (a, a_id) = signed_in_student(&address, "Alice").await;
    let (b, b_id) = signed_in_student(&address, "Bob").await;

    a.post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": b_id, "body": "first" }))
        .send()
        .await
        .unwrap();
    b.post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": a_id, "body": "second" }))
        .send()
        .await
        .unwrap();

    let history: Vec<serde_json::Value> = a
        .get(&format!("{}/messages/{}", address, b_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["body"], "first");
    assert_eq!(history[0]["is_me"], true);
    assert_eq!(history[1]["body"], "second");
    assert_eq!(history[1]["is_me"], false);
}

#[tokio::test]
async fn conversations_show_latest_preview() {
    let address = spawn_app().await;
    let (a, a_id) = signed_in_student(&address, "Alice").await;
    let (b, b_id) = signed_in_student(&address, "Bob").await;
    let (c, c_id) = signed_in_student(&address, "Carol").await;

    a.post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": b_id, "body": "hi bob" }))
        .send()
        .await
        .unwrap();
    b.post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": a_id, "body": "hi alice" }))
        .send()
        .await
        .unwrap();
    c.post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": a_id, "body": "ping" }))
        .send()
        .await
        .unwrap();

    let conversations: Vec<serde_json::Value> = a
        .get(&format!("{}/messages/conversations", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(conversations.len(), 2);

    let with_b = conversations
        .iter()
        .find(|c| c["user_id"].as_i64() == Some(b_id))
        .expect("conversation with Bob");
    // The preview is the latest message between the pair, either direction
    assert_eq!(with_b["last_msg"], "hi alice");
    assert_eq!(with_b["name"], "Bob Messenger");

    assert!(
        conversations
            .iter()
            .any(|c| c["user_id"].as_i64() == Some(c_id))
    );
}

#[tokio::test]
async fn only_the_recipient_may_like_a_message() {
    let address = spawn_app().await;
    let (a, _a_id) = signed_in_student(&address, "Alice").await;
    let (b, b_id) = signed_in_student(&address, "Bob").await;
    let (c, _c_id) = signed_in_student(&address, "Carol").await;

    let sent: serde_json::Value = a
        .post(&format!("{}/messages/send", address))
        .json(&serde_json::json!({ "recipient_id": b_id, "body": "like this?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let message_id = sent["id"].as_i64().unwrap();

    // The sender may not like their own message
    let resp = a
        .post(&format!("{}/messages/{}/like", address, message_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Neither may a third party
    let resp = c
        .post(&format!("{}/messages/{}/like", address, message_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // The recipient toggles it on and off
    let liked: serde_json::Value = b
        .post(&format!("{}/messages/{}/like", address, message_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(liked["is_liked"], true);

    let unliked: serde_json::Value = b
        .post(&format!("{}/messages/{}/like", address, message_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unliked["is_liked"], false);
}
