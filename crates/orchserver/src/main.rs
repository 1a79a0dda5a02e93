use actix_cors::Cors;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use futures::StreamExt;
use orchcore::{OrchestratorError, RunStatus};
use orchruntime::{OrchestratorRegistry, OrchestratorRuntime, RuntimeConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
struct AppState {
    runtime: Arc<OrchestratorRuntime>,
}

/// Optional `?framework=` query parameter
#[derive(Debug, Deserialize)]
struct FrameworkQuery {
    framework: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateYamlRequest {
    yaml_content: String,
}

/// Request body for starting or streaming a run
#[derive(Debug, Deserialize)]
struct StartRequest {
    workflow: serde_json::Value,
    framework: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StopRequest {
    workflow_id: String,
    framework: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StopResponse {
    workflow_id: String,
    status: RunStatus,
    message: String,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supported: Option<Vec<String>>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            errors: None,
            supported: None,
        }
    }
}

/// Map a runtime error onto a status code and JSON body
fn error_response(e: OrchestratorError) -> HttpResponse {
    match e {
        OrchestratorError::NotSupported { .. } => {
            let supported = e.supported_frameworks().map(<[String]>::to_vec);
            HttpResponse::BadRequest().json(ErrorResponse {
                supported,
                ..ErrorResponse::new(e.to_string())
            })
        }
        OrchestratorError::InvalidDefinition { ref report, .. } => {
            HttpResponse::UnprocessableEntity().json(ErrorResponse {
                errors: report.errors(),
                ..ErrorResponse::new(e.to_string())
            })
        }
        OrchestratorError::Definition(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new(e.to_string()))
        }
        other => {
            error!("Request failed: {}", other);
            HttpResponse::InternalServerError().json(ErrorResponse::new(other.to_string()))
        }
    }
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "orchserver"
    }))
}

/// List registered frameworks
#[get("/api/workflows/frameworks")]
async fn list_frameworks(data: web::Data<AppState>) -> impl Responder {
    let registry = data.runtime.registry();
    let frameworks: Vec<_> = registry
        .supported_frameworks()
        .into_iter()
        .map(|name| {
            let metadata = registry.get_metadata(&name).unwrap_or_default();
            serde_json::json!({
                "name": name,
                "displayName": metadata.display_name,
                "description": metadata.description,
                "collections": metadata.collections,
            })
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "frameworks": frameworks,
        "default": data.runtime.default_framework(),
    }))
}

/// Validate a YAML definition without starting it
#[post("/api/yaml/validate")]
async fn validate_yaml(
    data: web::Data<AppState>,
    query: web::Query<FrameworkQuery>,
    req: web::Json<ValidateYamlRequest>,
) -> impl Responder {
    let outcome = data
        .runtime
        .validate_text(&req.yaml_content, query.framework.as_deref());

    HttpResponse::Ok().json(outcome)
}

/// Validate and start a run
#[post("/api/workflows/start")]
async fn start_workflow(data: web::Data<AppState>, req: web::Json<StartRequest>) -> impl Responder {
    let req = req.into_inner();

    match data.runtime.start(&req.workflow, req.framework.as_deref()).await {
        Ok(handle) => HttpResponse::Ok().json(handle),
        Err(e) => error_response(e),
    }
}

/// Status of a run
#[get("/api/workflows/{run_id}/status")]
async fn workflow_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<FrameworkQuery>,
) -> impl Responder {
    let run_id = path.into_inner();

    match data.runtime.status(&run_id, query.framework.as_deref()).await {
        Ok(status) if status.is_found() => HttpResponse::Ok().json(status),
        Ok(status) => HttpResponse::NotFound().json(status),
        Err(e) => error_response(e),
    }
}

/// Stop a run
#[post("/api/workflows/stop")]
async fn stop_workflow(data: web::Data<AppState>, req: web::Json<StopRequest>) -> impl Responder {
    let req = req.into_inner();

    match data.runtime.stop(&req.workflow_id, req.framework.as_deref()).await {
        Ok(true) => HttpResponse::Ok().json(StopResponse {
            workflow_id: req.workflow_id,
            status: RunStatus::Stopped,
            message: "Workflow stopped successfully".to_string(),
        }),
        Ok(false) => HttpResponse::NotFound().json(ErrorResponse::new(format!(
            "Workflow {} not found",
            req.workflow_id
        ))),
        Err(e) => error_response(e),
    }
}

/// Run a definition and return every progress update
#[post("/api/workflows/stream")]
async fn stream_workflow(
    data: web::Data<AppState>,
    req: web::Json<StartRequest>,
) -> impl Responder {
    let req = req.into_inner();

    match data.runtime.stream(&req.workflow, req.framework.as_deref()).await {
        Ok(updates) => {
            let updates: Vec<_> = updates.collect().await;
            HttpResponse::Ok().json(updates)
        }
        Err(e) => error_response(e),
    }
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(list_frameworks)
        .service(validate_yaml)
        .service(start_workflow)
        .service(workflow_status)
        .service(stop_workflow)
        .service(stream_workflow);
}

fn build_runtime(config: RuntimeConfig) -> OrchestratorRuntime {
    let mut registry = OrchestratorRegistry::new();
    orchadapters::register_all(&mut registry);
    OrchestratorRuntime::with_config(Arc::new(registry), config)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting orchestrator server");

    let runtime = build_runtime(RuntimeConfig::from_env());
    if !runtime.registry().contains(runtime.default_framework()) {
        anyhow::bail!(
            "Default framework '{}' is not registered",
            runtime.default_framework()
        );
    }

    info!(
        "Runtime initialized with frameworks: {}",
        runtime.registry().supported_frameworks().join(", ")
    );

    let app_state = web::Data::new(AppState {
        runtime: Arc::new(runtime),
    });

    let bind_address =
        std::env::var("ORCH_BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    info!("Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .configure(configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
