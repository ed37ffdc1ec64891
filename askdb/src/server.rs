//! HTTP surface for the query pipeline.
//!
//! Each endpoint is registered exactly once:
//! - GET / - service banner
//! - POST /query - question in, sql and rows out
//! - GET /schema - rendered schema snapshot
//! - GET /health - database probe and model credential status

use actix_cors::Cors;
use actix_web::http::{Method, StatusCode};
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Responder, ResponseError};
use common::{AppConfig, HealthReport, QueryPipeline, StageError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

const SERVICE_NAME: &str = "askdb";

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: String,
    stage: &'a str,
}

/// pipeline failure mapped onto an http status
#[derive(Debug)]
pub struct ApiError(StageError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.0.source.to_string(),
            stage: self.0.stage.as_str(),
        })
    }
}

impl From<StageError> for ApiError {
    fn from(e: StageError) -> Self {
        ApiError(e)
    }
}

pub fn build_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_any_header()
        .expose_any_header();

    if allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
        tracing::debug!("cors: allowing any origin");
    } else {
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        cors = cors.supports_credentials();
        tracing::debug!("cors: allowed origins {:?}", allowed_origins);
    }

    cors
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/query", web::post().to(query))
        .route("/schema", web::get().to(schema))
        .route("/health", web::get().to(health));
}

async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "query": "/query (POST)",
            "schema": "/schema"
        }
    }))
}

async fn query(
    pipeline: web::Data<QueryPipeline>,
    body: web::Json<QueryRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = pipeline.run(&body.question).await.map_err(|e| {
        if e.is_client_error() {
            tracing::warn!(stage = %e.stage, "question produced unrunnable sql: {}", e.source);
        } else {
            tracing::error!(stage = %e.stage, "query processing failed: {}", e.source);
        }
        ApiError(e)
    })?;
    Ok(HttpResponse::Ok().json(response))
}

async fn schema(pipeline: web::Data<QueryPipeline>) -> Result<HttpResponse, ApiError> {
    let schema = pipeline.schema().await?;
    Ok(HttpResponse::Ok().json(json!({ "schema": schema })))
}

async fn health(pipeline: web::Data<QueryPipeline>) -> HttpResponse {
    let report = pipeline.health().await;
    let body = health_body(&report);
    if report.database_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

pub fn health_body(report: &HealthReport) -> Value {
    let model_api = if report.model_configured {
        "configured"
    } else {
        "not_configured"
    };

    match &report.detail {
        None if report.database_ok => json!({
            "status": "healthy",
            "database": "connected",
            "model_api": model_api,
        }),
        detail => json!({
            "status": "unhealthy",
            "database": "unavailable",
            "model_api": model_api,
            "detail": format!(
                "Service unhealthy: {}",
                detail.as_deref().unwrap_or("database probe failed")
            ),
        }),
    }
}

pub async fn run(config: AppConfig, pipeline: QueryPipeline) -> anyhow::Result<()> {
    tracing::warn!(
        "generated sql is executed verbatim with no read-only enforcement; \
         restrict the database role if mutating statements must be prevented"
    );

    let data = web::Data::new(pipeline);
    let origins = config.allowed_origins.clone();

    tracing::info!("listening on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&origins))
            .wrap(middleware::Logger::default())
            .app_data(data.clone())
            .configure(configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use async_trait::async_trait;
    use common::agent::SqlGenerator;
    use common::db::{ColumnDescriptor, Database, RawResultSet, RawValue, SchemaSnapshot, TableDescriptor};
    use common::llm::{LanguageModel, Message};
    use common::{AskError, Result};
    use std::sync::Arc;

    struct InvoiceDb {
        reachable: bool,
    }

    #[async_trait]
    impl Database for InvoiceDb {
        async fn snapshot(&self) -> Result<SchemaSnapshot> {
            if !self.reachable {
                return Err(AskError::Connection("could not connect to server".into()));
            }
            let col = |name: &str, data_type: &str| ColumnDescriptor {
                name: name.to_string(),
                data_type: data_type.to_string(),
                nullable: true,
            };
            Ok(SchemaSnapshot::new(vec![TableDescriptor {
                name: "invoices".to_string(),
                columns: vec![
                    col("id", "uuid"),
                    col("documentId", "uuid"),
                    col("invoiceTotal", "numeric"),
                ],
            }]))
        }

        async fn execute(&self, sql: &str) -> Result<RawResultSet> {
            if sql.contains("nonexistent") {
                return Err(AskError::Execution(
                    "relation \"nonexistent\" does not exist".into(),
                ));
            }
            Ok(RawResultSet {
                columns: vec!["id".into(), "documentId".into(), "invoiceTotal".into()],
                rows: vec![vec![
                    RawValue::from("i-1"),
                    RawValue::from("d-1"),
                    RawValue::from(10.25f64),
                ]],
            })
        }

        async fn ping(&self) -> Result<()> {
            if self.reachable {
                Ok(())
            } else {
                Err(AskError::Connection("could not connect to server".into()))
            }
        }
    }

    struct FixedModel(&'static str);

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn generate(&self, _messages: Vec<Message>) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn pipeline(reachable: bool, reply: &'static str) -> web::Data<QueryPipeline> {
        web::Data::new(QueryPipeline::new(
            Arc::new(InvoiceDb { reachable }),
            SqlGenerator::new(Arc::new(FixedModel(reply))),
        ))
    }

    async fn json_body<B: actix_web::body::MessageBody>(resp: actix_web::dev::ServiceResponse<B>) -> Value {
        test::read_body_json(resp).await
    }

    #[actix_web::test]
    async fn test_query_returns_rows() {
        let app = test::init_service(
            App::new()
                .app_data(pipeline(true, "```sql\nSELECT * FROM invoices\n```"))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(json!({ "question": "Show me all invoices" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["sql"], "SELECT * FROM invoices");
        assert_eq!(body["results"][0]["invoiceTotal"], 10.25);
        assert_eq!(
            body["explanation"],
            "Generated and executed query for: Show me all invoices"
        );
    }

    #[actix_web::test]
    async fn test_bad_sql_is_client_error() {
        let app = test::init_service(
            App::new()
                .app_data(pipeline(true, "SELECT * FROM nonexistent"))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(json!({ "question": "Show me everything in nonexistent" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = json_body(resp).await;
        assert_eq!(body["stage"], "execution");
        assert!(body["detail"].as_str().unwrap().contains("nonexistent"));
    }

    #[actix_web::test]
    async fn test_unreachable_database_is_server_error() {
        let app = test::init_service(
            App::new()
                .app_data(pipeline(false, "SELECT 1"))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(json!({ "question": "q" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await["stage"], "introspection");
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(
            App::new()
                .app_data(pipeline(true, "SELECT 1"))
                .configure(configure_routes),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
        assert_eq!(body["model_api"], "configured");

        let app = test::init_service(
            App::new()
                .app_data(pipeline(false, "SELECT 1"))
                .configure(configure_routes),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "unhealthy");
        assert!(body["detail"].as_str().unwrap().contains("could not connect"));
    }

    #[actix_web::test]
    async fn test_schema_and_root() {
        let app = test::init_service(
            App::new()
                .app_data(pipeline(true, "SELECT 1"))
                .configure(configure_routes),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/schema").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert!(body["schema"].as_str().unwrap().contains("  - invoiceTotal: numeric NULL"));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(json_body(resp).await["service"], "askdb");
    }

    #[actix_web::test]
    async fn test_health_body_not_configured() {
        let body = health_body(&HealthReport {
            database_ok: true,
            model_configured: false,
            detail: None,
        });
        assert_eq!(body["model_api"], "not_configured");
    }
}
