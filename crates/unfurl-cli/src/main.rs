//! Unfurl CLI - run the link-to-embed pipeline over a message body
//!
//! Feeds a message text through the pipeline and prints the resulting
//! reply plan as JSON. Stands in for a chat-platform client during
//! development and debugging.

use clap::Parser;
use std::io::Read;
use tracing_subscriber::EnvFilter;
use unfurl::UnfurlService;

/// Unfurl - rich embed previews for illustration links
#[derive(Parser, Debug)]
#[command(name = "unfurl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Message body to unfurl; reads stdin when omitted
    message: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let body = match cli.message {
        Some(message) => message,
        None => {
            let mut buffer = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading stdin: {e}");
                std::process::exit(1);
            }
            buffer
        }
    };

    let service = UnfurlService::new();
    let plan = service.unfurl_message(&body).await;

    if plan.batches.is_empty() {
        eprintln!("No supported links produced embeds");
    }

    let serialized = if cli.pretty {
        serde_json::to_string_pretty(&plan)
    } else {
        serde_json::to_string(&plan)
    };

    match serialized {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing reply plan: {e}");
            std::process::exit(1);
        }
    }
}
