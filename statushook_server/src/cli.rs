use clap::{Args, Parser, Subcommand};
use statushook_integrations::mongo::MongoConfig;
use statushook_integrations::wekan::WekanConfig;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "statushook",
    version,
    about = "Writes pipeline job status onto board cards or documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve events against cards of a Wekan board list (GraphQL API).
    Board {
        #[command(flatten)]
        listen: ListenArgs,
        #[command(flatten)]
        wekan: WekanArgs,
    },

    /// Serve events against documents of a MongoDB collection.
    Documents {
        #[command(flatten)]
        listen: ListenArgs,
        #[command(flatten)]
        mongo: MongoArgs,
    },

    /// Print current configuration (redacted secrets).
    Config,
}

#[derive(Debug, Clone, Args)]
pub struct ListenArgs {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "PORT", default_value = "80")]
    pub port: u16,
}

impl ListenArgs {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Args)]
pub struct WekanArgs {
    /// GraphQL endpoint, e.g. http://wekan-graphql:80
    #[arg(long, env = "GRAPHQL_URL")]
    pub graphql_url: String,

    #[arg(long, env = "USER")]
    pub user: String,

    #[arg(long, env = "PASS", hide_env_values = true)]
    pub pass: String,

    /// Board title.
    #[arg(long, env = "BOARD")]
    pub board: String,

    /// List title within the board.
    #[arg(long, env = "LIST")]
    pub list: String,

    #[arg(long, env = "WEKAN_TIMEOUT_MS", default_value = "20000")]
    pub timeout_ms: u64,
}

impl WekanArgs {
    pub fn to_config(&self) -> WekanConfig {
        WekanConfig {
            graphql_url: self.graphql_url.clone(),
            user: self.user.clone(),
            password: self.pass.clone(),
            board: self.board.clone(),
            list: self.list.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct MongoArgs {
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: String,

    #[arg(long, env = "DATABASE")]
    pub database: String,

    #[arg(long, env = "COLLECTION")]
    pub collection: String,

    /// Document key holding the evidence path.
    #[arg(long, env = "PATH_FIELD", default_value = "path")]
    pub path_field: String,

    /// Document key the event status is written to.
    #[arg(long, env = "STATE_FIELD", default_value = "state")]
    pub state_field: String,
}

impl MongoArgs {
    pub fn to_config(&self) -> MongoConfig {
        MongoConfig {
            uri: self.mongodb_uri.clone(),
            database: self.database.clone(),
            collection: self.collection.clone(),
            path_field: self.path_field.clone(),
            state_field: self.state_field.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_board_flags() {
        let cli = Cli::try_parse_from([
            "statushook",
            "board",
            "--port",
            "8080",
            "--graphql-url",
            "http://wekan:80",
            "--user",
            "ci",
            "--pass",
            "pw",
            "--board",
            "Evidence",
            "--list",
            "Runs",
        ])
        .unwrap();
        let Commands::Board { listen, wekan } = cli.command else {
            panic!("expected board command");
        };
        assert_eq!(listen.port, 8080);
        let cfg = wekan.to_config();
        assert_eq!(cfg.graphql_url, "http://wekan:80");
        assert_eq!(cfg.password, "pw");
        assert_eq!(cfg.timeout, Duration::from_secs(20));
    }

    #[test]
    fn parses_document_flags_with_defaults() {
        let cli = Cli::try_parse_from([
            "statushook",
            "documents",
            "--host",
            "127.0.0.1",
            "--port",
            "8081",
            "--mongodb-uri",
            "mongodb://db:27017",
            "--database",
            "ci",
            "--collection",
            "runs",
        ])
        .unwrap();
        let Commands::Documents { listen, mongo } = cli.command else {
            panic!("expected documents command");
        };
        assert_eq!(listen.addr().unwrap().to_string(), "127.0.0.1:8081");
        let cfg = mongo.to_config();
        assert_eq!(cfg.path_field, "path");
        assert_eq!(cfg.state_field, "state");
    }

    #[test]
    fn rejects_a_bad_port() {
        let err = Cli::try_parse_from([
            "statushook",
            "documents",
            "--port",
            "eighty",
            "--mongodb-uri",
            "mongodb://db:27017",
            "--database",
            "ci",
            "--collection",
            "runs",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("eighty"), "{err}");
    }
}
