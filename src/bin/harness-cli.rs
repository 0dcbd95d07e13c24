use clap::{Parser, Subcommand};
use serde_json::Value;

use request_harness::client::Fetcher;
use request_harness::config::ClientConfig;
use request_harness::http::{decode, Payload, Request};

#[derive(Parser)]
#[command(name = "harness-cli")]
#[command(about = "Client for the request harness", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Request timeout in seconds. Waits indefinitely when omitted.
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path
    Get { path: String },
    /// POST to a path
    Post {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// PUT to a path
    Put {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// PATCH a path
    Patch {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// DELETE a path
    Delete { path: String },
    /// List diagnostic records
    Records {
        #[arg(long)]
        method: Option<String>,
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        status: Option<u16>,
        /// NotFound, EmptyBody, ParseError or ServerFault
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        faulted: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let fetcher = Fetcher::from_config(&ClientConfig {
        base_url: cli.url,
        timeout_secs: cli.timeout,
    })?;

    let request = match cli.command {
        Commands::Get { path } => Request::get(&path),
        Commands::Post { path, data } => with_data(Request::post(&path), data)?,
        Commands::Put { path, data } => with_data(Request::put(&path), data)?,
        Commands::Patch { path, data } => with_data(Request::patch(&path), data)?,
        Commands::Delete { path } => Request::delete(&path),
        Commands::Records {
            method,
            path,
            status,
            kind,
            faulted,
        } => {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            if let Some(method) = method {
                query.append_pair("method", &method);
            }
            if let Some(path) = path {
                query.append_pair("path", &path);
            }
            if let Some(status) = status {
                query.append_pair("status", &status.to_string());
            }
            if let Some(kind) = kind {
                query.append_pair("kind", &kind);
            }
            if faulted {
                query.append_pair("faulted", "true");
            }
            Request::get(&format!("/_harness/records?{}", query.finish()))
        }
    };

    let response = fetcher.send(request).await?;
    println!("Status: {}", response.status);
    if let Some(fault) = &response.fault {
        println!("Fault: {}", fault);
    }

    match request_harness::client::decode_response(&response) {
        Ok(payload) => {
            let value: &Value = payload.as_value();
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Err(fault) => eprintln!("Error: {}", fault),
    }

    Ok(())
}

fn with_data(request: Request, data: Option<String>) -> Result<Request, Box<dyn std::error::Error>> {
    match data {
        Some(data) => {
            let payload: Payload = decode(data.as_bytes())?;
            Ok(request.json(&payload))
        }
        None => Ok(request),
    }
}
