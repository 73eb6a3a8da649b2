use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use vast_resolver::{
    fetch_document_with, resolve, Document, Fetch, FetchOptions, HttpFetcher, RedirectBudget,
};

/// Parse, validate and resolve VAST documents
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Extra request header as `name:value`, may be repeated
    #[arg(long = "header", value_parser = parse_header, global = true)]
    headers: Vec<(String, String)>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 3, global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a VAST file or URL and print its document graph
    Parse {
        /// Path to the VAST file or URL
        #[arg(short, long)]
        input: String,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Check a VAST file or URL against the VAST structural rules
    Validate {
        /// Path to the VAST file or URL
        #[arg(short, long)]
        input: String,
    },

    /// Follow every wrapper ad and print the resolved document
    Resolve {
        /// Path to the VAST file or URL
        #[arg(short, long)]
        input: String,

        /// Maximum number of resolution passes (unlimited when omitted)
        #[arg(short, long)]
        max_redirects: Option<u32>,

        /// Print the document graph as JSON instead of VAST XML
        #[arg(long)]
        json: bool,

        /// Output file path (if not specified, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a VAST URL and print it back as VAST XML
    Fetch {
        /// URL of the VAST document
        #[arg(short, long)]
        input: String,

        /// Resolve wrapper ads before printing
        #[arg(short, long)]
        resolve: bool,

        /// Maximum number of resolution passes (unlimited when omitted)
        #[arg(short, long)]
        max_redirects: Option<u32>,

        /// Output file path (if not specified, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_header(header: &str) -> Result<(String, String), String> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| format!("expected `name:value`, got `{}`", header))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

/// Read a local file, or fetch anything else through the fetcher
async fn load(fetcher: &HttpFetcher, input: &str) -> Result<String, Box<dyn std::error::Error>> {
    if std::path::Path::new(input).exists() {
        log::debug!("Reading from local file: {}", input);
        return Ok(tokio::fs::read_to_string(input).await?);
    }

    Ok(fetcher.fetch(input).await?)
}

async fn emit(text: &str, output: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            tokio::fs::write(path, text).await?;
            println!("VAST written to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    let fetcher = HttpFetcher::builder()
        .headers(cli.headers.iter().cloned())
        .timeout(Duration::from_secs(cli.timeout))
        .build()?;

    match &cli.command {
        Commands::Parse { input, pretty } => {
            let document = Document::from_xml(&load(&fetcher, input).await?)?;

            if *pretty {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                println!("{}", serde_json::to_string(&document)?);
            }
        }
        Commands::Validate { input } => {
            let document = Document::from_xml(&load(&fetcher, input).await?)?;

            match document.validate().reasons {
                None => println!("VAST is valid"),
                Some(reasons) => {
                    for reason in &reasons {
                        println!("{}", reason);
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Resolve {
            input,
            max_redirects,
            json,
            output,
        } => {
            let document = Document::from_xml(&load(&fetcher, input).await?)?;
            let budget = RedirectBudget::from(*max_redirects);
            let resolved = resolve(&document, &fetcher, budget).await?;

            let text = if *json {
                serde_json::to_string_pretty(&resolved)?
            } else {
                resolved.to_xml()?
            };
            emit(&text, output.as_ref()).await?;
        }
        Commands::Fetch {
            input,
            resolve,
            max_redirects,
            output,
        } => {
            let options = FetchOptions {
                headers: cli.headers.clone(),
                resolve_wrappers: *resolve,
                max_redirects: RedirectBudget::from(*max_redirects),
            };
            let document = fetch_document_with(&fetcher, input, &options).await?;
            emit(&document.to_xml()?, output.as_ref()).await?;
        }
    }

    Ok(())
}
