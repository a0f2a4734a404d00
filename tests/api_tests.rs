// tests/api_tests.rs

use campuslink::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        upload_dir: std::env::temp_dir()
            .join("campuslink_test_uploads")
            .to_string_lossy()
            .to_string(),
        frontend_url: "http://localhost:3000".to_string(),
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registers a user with the given role and signs them in.
/// Returns a cookie-jar client whose requests carry the credential cookie.
async fn signed_in_user(address: &str, role: &str) -> (reqwest::Client, String) {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();

    let email = format!("u_{}@test.local", &uuid::Uuid::new_v4().to_string()[..8]);

    let resp = client
        .post(&format!("{}/auth/signup", address))
        .json(&serde_json::json!({
            "firstname": "Test",
            "lastname": "User",
            "email": email,
            "password": "password123",
            "role": role
        }))
        .send()
        .await
        .expect("Signup failed");
    assert_eq!(resp.status().as_u16(), 201);

    let resp = client
        .post(&format!("{}/auth/signin", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Signin failed");
    assert_eq!(resp.status().as_u16(), 200);

    (client, email)
}

#[tokio::test]
async fn protected_route_requires_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/jobs", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn invalid_token_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/jobs", address))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn signup_duplicate_email_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = format!("dup_{}@test.local", &uuid::Uuid::new_v4().to_string()[..8]);

    let payload = serde_json::json!({
        "firstname": "Dup",
        "lastname": "User",
        "email": email,
        "password": "password123",
        "role": "student"
    });

    let first = client
        .post(&format!("{}/auth/signup", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(&format!("{}/auth/signup", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn signup_rejects_unknown_role() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/signup", address))
        .json(&serde_json::json!({
            "firstname": "Bad",
            "lastname": "Role",
            "email": format!("r_{}@test.local", &uuid::Uuid::new_v4().to_string()[..8]),
            "password": "password123",
            "role": "admin"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn signin_wrong_password_unauthorized() {
    let address = spawn_app().await;
    let (_client, email) = signed_in_user(&address, "student").await;

    let other = reqwest::Client::new();
    let response = other
        .post(&format!("{}/auth/signin", address))
        .json(&serde_json::json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn student_cannot_create_job() {
    let address = spawn_app().await;
    let (student, _) = signed_in_user(&address, "student").await;

    let response = student
        .post(&format!("{}/jobs/create", address))
        .json(&serde_json::json!({
            "title": "Backend Intern",
            "description": "Rust backend work"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn job_application_flow() {
    let address = spawn_app().await;
    let (recruiter, _) = signed_in_user(&address, "recruiter").await;
    let (student, _) = signed_in_user(&address, "student").await;

    // Recruiter posts a job
    let title = format!("Intern {}", &uuid::Uuid::new_v4().to_string()[..8]);
    let created: serde_json::Value = recruiter
        .post(&format!("{}/jobs/create", address))
        .json(&serde_json::json!({
            "title": title,
            "description": "Rust backend work",
            "salary": "1200",
            "location": "Lyon",
            "is_remote": true
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = created["id"].as_i64().unwrap();

    // Recruiter may not apply
    let resp = recruiter
        .post(&format!("{}/jobs/{}/apply", address, job_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Student applies
    let resp = student
        .post(&format!("{}/jobs/{}/apply", address, job_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // A second apply is a conflict, not a duplicate
    let resp = student
        .post(&format!("{}/jobs/{}/apply", address, job_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Recruiter sees exactly one pending application and is notified
    let apps: Vec<serde_json::Value> = recruiter
        .get(&format!("{}/applications", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let app = apps
        .iter()
        .find(|a| a["job_id"].as_i64() == Some(job_id))
        .expect("application should be listed");
    assert_eq!(app["status"], "pending");

    let notifs: Vec<serde_json::Value> = recruiter
        .get(&format!("{}/notifications", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let applied = notifs
        .iter()
        .find(|n| n["kind"] == "job_application" && n["ref_id"].as_i64() == Some(job_id))
        .expect("recruiter should be notified of the application");
    assert_eq!(applied["message"], format!("applied for {}", title));

    // Recruiter accepts; student sees the status and is notified
    let app_id = app["id"].as_i64().unwrap();
    let resp = recruiter
        .put(&format!("{}/applications/{}/status", address, app_id))
        .json(&serde_json::json!({ "status": "accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let apps: Vec<serde_json::Value> = student
        .get(&format!("{}/applications", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mine = apps
        .iter()
        .find(|a| a["job_id"].as_i64() == Some(job_id))
        .unwrap();
    assert_eq!(mine["status"], "accepted");

    let notifs: Vec<serde_json::Value> = student
        .get(&format!("{}/notifications", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        notifs
            .iter()
            .any(|n| n["kind"] == "application_accepted" && n["ref_id"].as_i64() == Some(job_id)),
        "student should be notified of the acceptance"
    );
}

#[tokio::test]
async fn status_change_requires_owning_the_job() {
    let address = spawn_app().await;
    let (owner, _) = signed_in_user(&address, "recruiter").await;
    let (other_recruiter, _) = signed_in_user(&address, "recruiter").await;
    let (student, _) = signed_in_user(&address, "student").await;

    let created: serde_json::Value = owner
        .post(&format!("{}/jobs/create", address))
        .json(&serde_json::json!({ "title": "Ops role", "description": "on call" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = created["id"].as_i64().unwrap();

    student
        .post(&format!("{}/jobs/{}/apply", address, job_id))
        .send()
        .await
        .unwrap();

    let apps: Vec<serde_json::Value> = owner
        .get(&format!("{}/applications", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let app_id = apps
        .iter()
        .find(|a| a["job_id"].as_i64() == Some(job_id))
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let resp = other_recruiter
        .put(&format!("{}/applications/{}/status", address, app_id))
        .json(&serde_json::json!({ "status": "refused" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = owner
        .put(&format!("{}/applications/{}/status", address, app_id))
        .json(&serde_json::json!({ "status": "archived" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn rating_is_an_upsert() {
    let address = spawn_app().await;
    let (recruiter, _) = signed_in_user(&address, "recruiter").await;
    let (student_a, _) = signed_in_user(&address, "student").await;
    let (student_b, _) = signed_in_user(&address, "student").await;

    let created: serde_json::Value = recruiter
        .post(&format!("{}/jobs/create", address))
        .json(&serde_json::json!({ "title": "QA role", "description": "testing" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = created["id"].as_i64().unwrap();

    // Out-of-range ratings are rejected (0 is the display sentinel)
    for stars in [0, 6] {
        let resp = student_a
            .post(&format!("{}/jobs/{}/rate", address, job_id))
            .json(&serde_json::json!({ "stars": stars }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400, "stars={} should fail", stars);
    }

    // First rating, then re-rating in place
    let first: serde_json::Value = student_a
        .post(&format!("{}/jobs/{}/rate", address, job_id))
        .json(&serde_json::json!({ "stars": 3 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["rating"].as_f64().unwrap(), 3.0);

    let second: serde_json::Value = student_a
        .post(&format!("{}/jobs/{}/rate", address, job_id))
        .json(&serde_json::json!({ "stars": 5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // Still a single row for (user, job): the average is exactly the new value
    assert_eq!(second["rating"].as_f64().unwrap(), 5.0);

    // A second rater moves the average
    let third: serde_json::Value = student_b
        .post(&format!("{}/jobs/{}/rate", address, job_id))
        .json(&serde_json::json!({ "stars": 4 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(third["rating"].as_f64().unwrap(), 4.5);

    let jobs: Vec<serde_json::Value> = student_a
        .get(&format!("{}/jobs", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job = jobs
        .iter()
        .find(|j| j["id"].as_i64() == Some(job_id))
        .unwrap();
    assert_eq!(job["rating"].as_f64().unwrap(), 4.5);
}

#[tokio::test]
async fn save_toggle_roundtrip() {
    let address = spawn_app().await;
    let (recruiter, _) = signed_in_user(&address, "recruiter").await;
    let (student, _) = signed_in_user(&address, "student").await;

    let created: serde_json::Value = recruiter
        .post(&format!("{}/jobs/create", address))
        .json(&serde_json::json!({ "title": "Data role", "description": "pipelines" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job_id = created["id"].as_i64().unwrap();

    let saved: serde_json::Value = student
        .post(&format!("{}/jobs/{}/save", address, job_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["saved"], true);

    let jobs: Vec<serde_json::Value> = student
        .get(&format!("{}/jobs", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let job = jobs
        .iter()
        .find(|j| j["id"].as_i64() == Some(job_id))
        .unwrap();
    assert_eq!(job["is_saved"], true);

    let unsaved: serde_json::Value = student
        .post(&format!("{}/jobs/{}/save", address, job_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unsaved["saved"], false);
}
