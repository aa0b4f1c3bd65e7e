use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use serde_json::{json, Value};

use blest::client::{Client, ClientError};
use blest::config::ClientConfig;

#[derive(Parser)]
#[command(name = "blest-cli")]
#[command(about = "Batching client for a BLEST server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080/")]
    url: String,

    /// Bearer token sent as the Authorization header
    #[arg(short, long)]
    key: Option<String>,

    /// Most calls per HTTP batch
    #[arg(long, default_value_t = 25)]
    max_batch_size: usize,

    /// Flush window in milliseconds
    #[arg(long, default_value_t = 10)]
    batch_delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a single route
    Call {
        route: String,
        /// Parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,
        /// Selector as a JSON array
        #[arg(short, long)]
        selector: Option<String>,
    },
    /// Issue every call in a file concurrently: [[route, params?, selector?], ...]
    Batch { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ClientConfig {
        url: cli.url,
        max_batch_size: cli.max_batch_size,
        batch_delay_ms: cli.batch_delay_ms,
        ..ClientConfig::default()
    };
    if let Some(key) = cli.key {
        config
            .headers
            .insert("authorization".to_string(), format!("Bearer {key}"));
    }
    let client = Client::http(&config)?;

    match cli.command {
        Commands::Call {
            route,
            params,
            selector,
        } => {
            let params = params.as_deref().map(serde_json::from_str).transpose()?;
            let selector = selector.as_deref().map(serde_json::from_str).transpose()?;
            let outcome = client.request(&route, params, selector).await;
            print_outcome(&route, outcome)?;
        }
        Commands::Batch { file } => {
            let content = std::fs::read_to_string(&file)?;
            let calls: Vec<Vec<Value>> = serde_json::from_str(&content)?;

            let requests = calls.into_iter().map(|call| {
                let client = client.clone();
                let mut parts = call.into_iter();
                let route = match parts.next() {
                    Some(Value::String(route)) => route,
                    _ => String::new(),
                };
                let params = parts.next();
                let selector = parts.next();
                async move {
                    let outcome = client.request(&route, params, selector).await;
                    (route, outcome)
                }
            });

            for (route, outcome) in join_all(requests).await {
                print_outcome(&route, outcome)?;
            }
        }
    }

    Ok(())
}

fn print_outcome(
    route: &str,
    outcome: Result<serde_json::Map<String, Value>, ClientError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let line = match outcome {
        Ok(result) => json!({ "route": route, "result": result }),
        Err(ClientError::Remote(error)) => json!({ "route": route, "error": error }),
        Err(e) => json!({ "route": route, "error": { "message": e.to_string() } }),
    };
    println!("{}", serde_json::to_string_pretty(&line)?);
    Ok(())
}
