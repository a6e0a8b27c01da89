//! Representativeness model service - main entry point

use clap::Parser;
use repscore::server::{run_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "repscore", about = "Representativeness scoring service")]
struct Args {
    /// Address to bind
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "API_PORT", default_value_t = 8080)]
    port: u16,

    /// Directory for job status and persisted ensembles
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    data_dir: std::path::PathBuf,

    /// Shared secret expected in the Auth-Token header
    #[arg(long, env = "API_AUTH_TOKEN")]
    auth_token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repscore=info".into()),
        )
        .init();

    let args = Args::parse();
    run_server(ServerConfig {
        host: args.host,
        port: args.port,
        data_dir: args.data_dir,
        auth_token: args.auth_token,
    })
    .await
}
