use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use common::agent::SqlGenerator;
use common::config::{parse_origins, AppConfig};
use common::db::PgDatabase;
use common::llm::{GroqClient, ModelConfig};
use common::tracing::{init_tracing, TracingConfig};
use common::QueryPipeline;
use std::sync::Arc;

use crate::server;

#[derive(Parser)]
#[command(name = "askdb")]
#[command(about = "answer natural-language questions with sql against postgres", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    conn: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// PostgreSQL connection url
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true, default_value = "")]
    database_url: String,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    groq_api_key: Option<String>,

    /// Chat model used for sql generation
    #[arg(long, env = "GROQ_MODEL", global = true, default_value = common::llm::model::DEFAULT_MODEL)]
    model: String,

    /// Base url of the openai-compatible api
    #[arg(long, env = "GROQ_BASE_URL", global = true, default_value = common::llm::model::DEFAULT_BASE_URL)]
    model_base_url: String,

    /// Sampling temperature
    #[arg(long, global = true, default_value = "0.1")]
    temperature: f32,

    /// Output token ceiling per completion
    #[arg(long, global = true, default_value = "1024")]
    max_tokens: u32,

    /// Export spans over OTLP
    #[arg(long, env = "ASKDB_ENABLE_TRACING", global = true, default_value = "false")]
    enable_tracing: bool,

    /// OTLP collector endpoint
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", global = true)]
    otlp_endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Interface to bind
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Listening port
        #[arg(short, long, env = "PORT", default_value = "8000")]
        port: u16,

        /// Comma separated list of allowed CORS origins (* for any)
        #[arg(long, env = "ALLOWED_ORIGINS", default_value = "*")]
        allowed_origins: String,
    },
    /// Answer one question and print the response as json
    Ask {
        /// Natural-language question
        question: String,
    },
    /// Print the rendered schema snapshot
    Schema,
    /// Probe the database and report service health
    Health,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let _guard = init_tracing(
            "askdb",
            &TracingConfig {
                enabled: self.conn.enable_tracing,
                otlp_endpoint: self.conn.otlp_endpoint.clone(),
            },
        )?;

        match self.command {
            Commands::Serve {
                host,
                port,
                allowed_origins,
            } => {
                let config = self.conn.into_config(host, port, parse_origins(&allowed_origins));
                config.validate()?;
                let pipeline = build_pipeline(&config)?;
                server::run(config, pipeline).await
            }
            Commands::Ask { question } => {
                let pipeline = build_pipeline(&self.conn.into_cli_config())?;
                let response = pipeline.run(&question).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
                Ok(())
            }
            Commands::Schema => {
                let pipeline = build_pipeline(&self.conn.into_cli_config())?;
                println!("{}", pipeline.schema().await?);
                Ok(())
            }
            Commands::Health => {
                let pipeline = build_pipeline(&self.conn.into_cli_config())?;
                let report = pipeline.health().await;
                println!("{}", serde_json::to_string_pretty(&server::health_body(&report))?);
                if !report.database_ok {
                    return Err(anyhow::anyhow!("database probe failed"));
                }
                Ok(())
            }
        }
    }
}

impl ConnectionArgs {
    fn into_config(self, host: String, port: u16, allowed_origins: Vec<String>) -> AppConfig {
        AppConfig {
            database_url: self.database_url,
            model: ModelConfig {
                model: self.model,
                base_url: self.model_base_url,
                api_key: self.groq_api_key,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            },
            allowed_origins,
            host,
            port,
        }
    }

    // one-shot commands never bind a socket
    fn into_cli_config(self) -> AppConfig {
        self.into_config("127.0.0.1".to_string(), 0, vec!["*".to_string()])
    }
}

fn build_pipeline(config: &AppConfig) -> Result<QueryPipeline> {
    config.validate()?;

    let db = Arc::new(PgDatabase::new(config.database_url.clone())?);
    let model = Arc::new(GroqClient::new(config.model.clone())?);

    if !config.model.has_api_key() {
        tracing::warn!("GROQ_API_KEY is not set; /query will fail until it is configured");
    }

    Ok(QueryPipeline::new(db, SqlGenerator::new(model)))
}
