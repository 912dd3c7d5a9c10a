use aide::scalar::Scalar;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    config::Config,
    db::DB,
    errors::{self, on_error, ErrorResponse},
    openapi::{
        self,
        aide::axum::{routing::get as api_get, ApiRouter, IntoApiResponse},
        OpenApi,
    },
    state::AppState,
};

pub struct AppParams<Router>
where
    Router: FnOnce(AppState) -> ApiRouter,
{
    pub db: DB,
    pub config: Config,
    pub router: Router,
}

pub async fn create<R>(AppParams { db, config, router }: AppParams<R>) -> errors::Result<(Router, OpenApi)>
where
    R: FnOnce(AppState) -> ApiRouter,
{
    let mut api = OpenApi::default();

    let cors = cors_layer(&config);
    let state = AppState {
        db,
        config: Arc::new(config),
    };

    let docs_router = axum::Router::new()
        .route(
            "/__docs__",
            get(Scalar::new("/__docs__/spec.json")
                .with_title("Notes API")
                .axum_handler()),
        )
        .route("/__docs__/spec.json", get(serve_docs));

    let health_router = ApiRouter::new()
        .api_route("/api/health", api_get(health))
        .with_state(state.clone());

    let app = ApiRouter::new()
        .merge(docs_router)
        .merge(health_router)
        .merge(router(state))
        .finish_api_with(&mut api, |t| {
            t.title("Notes API").default_response::<openapi::Json<ErrorResponse>>()
        })
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(Extension(Arc::new(api.clone())))
                .layer(middleware::from_fn(on_error)),
        );

    Ok((app, api))
}

/// Any origin when none are configured.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(error) => {
                tracing::warn!(%origin, %error, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[derive(Serialize, schemars::JsonSchema)]
struct Health {
    success: bool,
    message: String,
    timestamp: chrono::DateTime<Utc>,
    version: String,
}

async fn health(State(state): State<AppState>) -> impl IntoApiResponse {
    openapi::Json(Health {
        success: true,
        message: "Notes API is running".into(),
        timestamp: Utc::now(),
        version: state.config.version.clone(),
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(ErrorResponse::new("API endpoint not found")),
    )
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoResponse {
    axum::Json(api.as_ref()).into_response()
}
