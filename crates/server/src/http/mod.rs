use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{AppState, middleware, routes};

mod auth;

pub fn router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/", delete(routes::submissions::delete_session))
        .route("/upload", post(routes::uploads::upload_photo))
        .route("/questions", put(routes::submissions::put_questions))
        .route("/await-questions", get(routes::submissions::await_questions))
        .route("/feedback", put(routes::submissions::put_feedback))
        .route("/await-image", get(routes::submissions::await_image))
        .route("/submission", get(routes::submissions::get_submission))
        .route("/regenerate", post(routes::submissions::regenerate))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::load_session_middleware,
        ));

    let workshop_scoped = Router::new()
        .route(
            "/",
            get(routes::workshops::get_workshop).delete(routes::workshops::delete_workshop),
        )
        .route("/active", put(routes::workshops::set_workshop_active))
        .route(
            "/submissions",
            get(routes::workshops::list_workshop_submissions),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::load_workshop_middleware,
        ));

    let admin_protected = Router::new()
        .route("/me", get(routes::admin::me))
        .route("/logout", post(routes::admin::logout))
        .route(
            "/config",
            get(routes::config::get_config).put(routes::config::update_config),
        )
        .route(
            "/workshops",
            get(routes::workshops::list_workshops).post(routes::workshops::create_workshop),
        )
        .nest("/workshops/{workshop_id}", workshop_scoped)
        .route("/gallery", post(routes::gallery::create_gallery_item))
        .route("/gallery/{item_id}", delete(routes::gallery::delete_gallery_item))
        .layer(from_fn_with_state(state.clone(), auth::require_admin));

    let admin_routes = Router::new()
        .route("/setup", post(routes::admin::setup))
        .route("/login", post(routes::admin::login))
        .merge(admin_protected);

    let api_routes = Router::new()
        .route("/entry", post(routes::entry::enter))
        .route("/generation/callback", post(routes::generation::callback))
        .route("/gallery", get(routes::gallery::list_gallery))
        .nest("/sessions/{session_id}", session_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .nest_service(
            "/storage",
            ServeDir::new(state.store().root().to_path_buf()),
        )
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
