use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use wojak::{HttpConfig, KvClient, RedisConfig, RequestBuilder, Response, StoredValue};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct RequestOpts {
    /// Target url, falls back to HTTP_BASE_URL
    url: Option<String>,
    /// Path segment appended to the url
    #[arg(long)]
    path: Option<String>,
    /// Header as key:value, may be repeated
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
    /// Query parameter as key=value, may be repeated
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Decode the `json` field of the reply
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a key from the store
    Get { key: String },
    /// Store a plain string
    Set { key: String, value: String },
    /// Store a record, replacing any previous value
    Hset {
        key: String,
        /// Fields as field=value
        #[arg(required = true)]
        fields: Vec<String>,
    },
    #[command(name = "rm")]
    Remove { key: String },
    /// Send a GET request
    Fetch {
        #[command(flatten)]
        opts: RequestOpts,
    },
    /// Send a POST request
    Post {
        #[command(flatten)]
        opts: RequestOpts,
        /// Raw request body
        #[arg(long, conflicts_with = "json_body")]
        data: Option<String>,
        /// JSON request body
        #[arg(long)]
        json_body: Option<String>,
    },
}

fn split_pair(raw: &str, separator: char) -> Result<(&str, &str)> {
    match raw.split_once(separator) {
        Some((key, value)) if !key.is_empty() => Ok((key.trim(), value.trim())),
        _ => bail!("expected key{separator}value, got {raw:?}"),
    }
}

fn build_request(opts: &RequestOpts) -> Result<RequestBuilder> {
    let mut builder = RequestBuilder::from_config(&HttpConfig::from_env()?);
    if let Some(url) = &opts.url {
        builder = builder.with_base(url.clone());
    }
    if builder.url().is_empty() {
        bail!("no url given and HTTP_BASE_URL is not set");
    }
    if let Some(path) = &opts.path {
        builder = builder.append_path(path);
    }
    if let Some(ms) = opts.timeout_ms {
        builder = builder.with_timeout(Duration::from_millis(ms));
    }
    for header in &opts.headers {
        let (key, value) = split_pair(header, ':')?;
        builder = builder.with_header(key, value);
    }
    for param in &opts.params {
        let (key, value) = split_pair(param, '=')?;
        builder = builder.with_param(key, value);
    }
    Ok(builder)
}

/// Print the response as one JSON line and turn its outcome into an exit code.
fn report<T: Serialize>(response: &Response<T>) -> Result<ExitCode> {
    println!("{}", serde_json::to_string(response)?);
    Ok(if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn send(builder: RequestBuilder, post: bool, json: bool) -> Result<ExitCode> {
    let response = if post {
        builder.execute_post()
    } else {
        builder.execute_get()
    };
    if json {
        report(&response.as_json())
    } else {
        report(&response.map(|body| String::from_utf8_lossy(&body).into_owned()))
    }
}

fn main() -> Result<ExitCode> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Get { key } => report(&store()?.get(&key)),
        Commands::Set { key, value } => report(&store()?.set(&key, value)),
        Commands::Hset { key, fields } => {
            let fields = fields
                .iter()
                .map(|field| split_pair(field, '='))
                .collect::<Result<Vec<_>>>()?;
            report(&store()?.set(&key, StoredValue::record(fields)))
        }
        Commands::Remove { key } => report(&store()?.delete(&key)),
        Commands::Fetch { opts } => send(build_request(&opts)?, false, opts.json),
        Commands::Post {
            opts,
            data,
            json_body,
        } => {
            let mut builder = build_request(&opts)?;
            if let Some(data) = data {
                builder = builder.with_body(data);
            }
            if let Some(json_body) = json_body {
                let value: serde_json::Value =
                    serde_json::from_str(&json_body).context("--json-body is not valid JSON")?;
                builder = builder.with_json_body(&value)?;
            }
            send(builder, true, opts.json)
        }
    }
}

fn store() -> Result<KvClient<wojak::RedisEngine>> {
    let config = RedisConfig::from_env()?;
    Ok(KvClient::connect(&config)?)
}
