use axum::Router;
use axum::http::{HeaderValue, Method, header};
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::Config;
use crate::task::{DbTaskStore, TaskState, api};

/// OpenAPI description of the task API.
#[derive(OpenApi)]
#[openapi(
    paths(
        api::list_tasks_handler,
        api::get_task_handler,
        api::create_task_handler,
        api::update_task_handler,
        api::delete_task_handler,
    ),
    components(schemas(
        api::TaskJson,
        api::CreateTaskRequest,
        api::UpdateTaskRequest,
        api::ErrorResponse,
        api::ValidationErrorResponse,
        api::FieldError,
    )),
    tags((name = "Tasks", description = "Task list CRUD endpoints"))
)]
pub struct ApiDoc;

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origin = config.allowed_origin.parse::<HeaderValue>()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Builds the application router: task routes, the health check and the
/// OpenAPI document, wrapped in request tracing and the single-origin CORS
/// policy.
pub fn app_router(state: TaskState, config: &Config) -> anyhow::Result<Router> {
    let task_router = api::create_task_router(state);
    let app = Router::new()
        .merge(task_router)
        .route("/health", axum::routing::get(health_check_handler))
        .route(
            "/api-docs/openapi.json",
            axum::routing::get(openapi_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)?),
        );
    Ok(app)
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let task_state = TaskState {
        store: Arc::new(DbTaskStore::new(db)),
    };
    let app = app_router(task_state, &config)?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "Server is healthy"
}

/// Serves the OpenAPI document as plain JSON.
pub async fn openapi_handler() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}
