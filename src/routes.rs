// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::MAX_UPLOAD_BYTES,
    handlers::{applications, auth, forum, jobs, messages, notifications, profile, search},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, forum, jobs, profile, applications,
///   messages, notifications, search).
/// * Applies global middleware (Trace, CORS with credentials for the
///   cookie-carried token).
/// * Serves uploaded files under /static/uploads.
pub fn create_router(state: AppState) -> Router {
    let origin = state
        .config
        .frontend_url
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // let governor_conf = GovernorConfigBuilder::default()
    //     .per_second(2)
    //     .burst_size(5)
    //     .finish()
    //     .unwrap();

    // let governor_conf = Arc::new(governor_conf);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/logout", post(auth::logout));

    let jobs_routes = Router::new()
        .route("/", get(jobs::list_jobs))
        .route("/create", post(jobs::create_job))
        .route("/{id}/apply", post(jobs::apply))
        .route("/{id}/save", post(jobs::toggle_save))
        .route("/{id}/rate", post(jobs::rate));

    let forum_routes = Router::new()
        .route("/", get(forum::get_feed))
        .route("/create", post(forum::create_post))
        .route("/{id}/like", post(forum::toggle_post_like))
        .route("/{id}/comment", post(forum::add_comment))
        .route("/comments/{id}/like", post(forum::toggle_comment_like));

    let profile_routes = Router::new()
        .route("/me", get(profile::get_me))
        .route("/update", put(profile::update_profile))
        .route("/follow/{id}", post(profile::toggle_follow))
        .route("/upload_pfp", post(profile::upload_pfp))
        .route("/{id}", get(profile::get_user));

    let applications_routes = Router::new()
        .route("/", get(applications::list_applications))
        .route("/{id}/status", put(applications::update_status));

    let messages_routes = Router::new()
        .route("/conversations", get(messages::list_conversations))
        .route("/send", post(messages::send_message))
        .route("/{id}/like", post(messages::toggle_message_like))
        .route("/{user_id}", get(messages::get_history));

    let notifications_routes = Router::new().route("/", get(notifications::list_notifications));

    // Everything except auth and search requires a valid credential.
    let protected_routes = Router::new()
        .nest("/jobs", jobs_routes)
        .nest("/forum", forum_routes)
        .nest("/profile", profile_routes)
        .nest("/applications", applications_routes)
        .nest("/messages", messages_routes)
        .nest("/notifications", notifications_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes)
        .route("/search", get(search::search))
        .nest_service(
            "/static/uploads",
            ServeDir::new(&state.config.upload_dir),
        )
        // Global Middleware (applied from outside in)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // .layer(GovernorLayer::new(governor_conf))
        .with_state(state)
}
