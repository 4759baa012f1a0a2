use crate::{
    auth::require_auth,
    handlers::{courses, users},
    middleware::{
        cors_layer, health_check, request_id_layer, route_not_found, trace_layer,
        validate_request_size, welcome,
    },
    state::AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;

/// Build the application router with every route and layer attached.
pub fn create_app(state: AppState) -> Router {
    // Routes open to anyone
    let public_routes = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/users", post(users::create_user))
        .route("/courses", get(courses::list_courses))
        .route("/courses/:id", get(courses::get_course));

    // Routes behind the Basic Auth gate. The gate is attached per method
    // router so unsupported methods still fall through to a 405.
    let auth_gate = from_fn_with_state(state.auth_service.clone(), require_auth);
    let protected_routes = Router::new()
        .route(
            "/users",
            get(users::current_user).route_layer(auth_gate.clone()),
        )
        .route(
            "/courses",
            post(courses::create_course).route_layer(auth_gate.clone()),
        )
        .route(
            "/courses/:id",
            put(courses::update_course)
                .delete(courses::delete_course)
                .route_layer(auth_gate),
        );

    let body_limit = usize::try_from(state.config.limits.max_body_size).unwrap_or(usize::MAX);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                // Request tracing
                .layer(trace_layer())
                // Request ID
                .layer(request_id_layer())
                // CORS
                .layer(cors_layer(&state.config))
                // Request size validation
                .layer(from_fn_with_state(
                    state.config.clone(),
                    validate_request_size,
                ))
                // Body size limit
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
