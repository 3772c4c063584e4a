use clap::Parser;
use statushook_core::StatusTracker;
use statushook_integrations::mongo::MongoBackend;
use statushook_integrations::wekan::WekanBackend;
use statushook_server::cli::{Cli, Commands};
use statushook_server::server::{self, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // JSON stdout logs unless STATUSHOOK_LOG_FORMAT=pretty.
    statushook_core::o11y::init_global_from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Board { listen, wekan } => {
            let addr = listen.addr()?;
            let backend = WekanBackend::new(wekan.to_config())?;
            // Bad credentials should stop startup, not the first event.
            let session = backend.authorize().await?;
            tracing::info!(
                user_id = %session.user_id,
                board = %backend.config().board,
                list = %backend.config().list,
                "wekan session established"
            );
            let tracker = StatusTracker::new(Arc::new(backend));
            server::serve(addr, AppState::new(tracker)).await?;
        }
        Commands::Documents { listen, mongo } => {
            let addr = listen.addr()?;
            let cfg = mongo.to_config();
            let backend = MongoBackend::connect(&cfg).await?;
            tracing::info!(
                database = %cfg.database,
                collection = %cfg.collection,
                "mongodb collection ready"
            );
            let tracker = StatusTracker::new(Arc::new(backend))
                .with_path_field(cfg.path_field.clone())
                .with_status_field(cfg.state_field.clone());
            server::serve(addr, AppState::new(tracker)).await?;
        }
        Commands::Config => {
            fn redact(s: &str) -> String {
                let n = s.chars().count();
                if n <= 8 {
                    return "***".to_string();
                }
                let head: String = s.chars().take(4).collect();
                let tail: String = s.chars().skip(n - 4).collect();
                format!("{head}***{tail}")
            }
            fn var(name: &str) -> Option<String> {
                std::env::var(name).ok()
            }

            let cfg = serde_json::json!({
                "HOST": var("HOST"),
                "PORT": var("PORT"),
                "GRAPHQL_URL": var("GRAPHQL_URL"),
                "USER": var("USER"),
                "PASS": var("PASS").map(|_| "<set>".to_string()),
                "BOARD": var("BOARD"),
                "LIST": var("LIST"),
                "WEKAN_TIMEOUT_MS": var("WEKAN_TIMEOUT_MS"),
                "MONGODB_URI": var("MONGODB_URI").map(|v| redact(&v)),
                "DATABASE": var("DATABASE"),
                "COLLECTION": var("COLLECTION"),
                "PATH_FIELD": var("PATH_FIELD"),
                "STATE_FIELD": var("STATE_FIELD"),
                "STATUSHOOK_LOG_FORMAT": var("STATUSHOOK_LOG_FORMAT"),
                "RUST_LOG": var("RUST_LOG"),
            });
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
    }

    Ok(())
}
