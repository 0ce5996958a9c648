//! factcheck-cli — command-line client for the factcheck HTTP API
//!
//! # Subcommands
//! - `status`            — show server health
//! - `list`              — list stored facts
//! - `get <id>`          — show one stored fact
//! - `qid <qid>`         — show shaped facts for an entity QID
//! - `random`            — show one shaped fact picked at random
//! - `accept <fact_id>`  — mark a fact as accepted
//! - `reject <fact_id>`  — mark a fact as rejected
//!
//! Every read command takes `--json` to print the raw response body.

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "factcheck-cli", version, about = "Review Wikidata facts over HTTP")]
struct Cli {
    /// Factcheck HTTP server URL (overrides FACTCHECK_HTTP_URL env var)
    #[arg(long, env = "FACTCHECK_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show server status
    Status,

    /// List stored facts
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one stored fact by id
    Get {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Show shaped facts whose entity ends with the given QID
    Qid {
        qid: String,

        #[arg(long)]
        json: bool,
    },

    /// Show one shaped fact picked at random
    Random {
        #[arg(long)]
        json: bool,
    },

    /// Mark a fact as accepted
    Accept { fact_id: i64 },

    /// Mark a fact as rejected
    Reject { fact_id: i64 },
}

// ============================================================================
// API Response Types
// ============================================================================

/// A shaped fact as returned by /facts/qid/:qid and /facts/random
#[derive(Debug, Deserialize)]
pub struct ShapedFact {
    pub id: i64,
    pub property: String,
    pub question: Option<serde_json::Value>,
    #[serde(rename = "wikipediaLink")]
    pub wikipedia_link: Option<serde_json::Value>,
    #[serde(rename = "wikidataLink")]
    pub wikidata_link: String,
    pub text: Option<serde_json::Value>,
    pub evidence: Option<serde_json::Value>,
    #[serde(rename = "startIdx")]
    pub start_idx: Option<serde_json::Value>,
    #[serde(rename = "endIdx")]
    pub end_idx: Option<serde_json::Value>,
    pub object: Option<serde_json::Value>,
}

/// Render an optional JSON value for humans: strings unquoted, null as "-".
fn display_value(v: &Option<serde_json::Value>) -> String {
    match v {
        None | Some(serde_json::Value::Null) => "-".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Multi-line human-readable rendering of a shaped fact.
pub fn format_shaped(f: &ShapedFact) -> String {
    let span = match (&f.start_idx, &f.end_idx) {
        (Some(s), Some(e)) if !s.is_null() && !e.is_null() => format!(" [{}..{}]", s, e),
        _ => String::new(),
    };

    let evidence: String = display_value(&f.evidence).chars().take(200).collect();

    format!(
        "#{} {} {} = {}\nQuestion:  {}\nHighlight: {}{}\nEvidence:  {}\nWikipedia: {}\n",
        f.id,
        f.wikidata_link,
        f.property,
        display_value(&f.object),
        display_value(&f.question),
        display_value(&f.text),
        span,
        evidence,
        display_value(&f.wikipedia_link),
    )
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

/// Send a request and return the JSON body, exiting with the server's detail on
/// a non-success status.
fn fetch(req: reqwest::blocking::RequestBuilder, url: &str) -> anyhow::Result<serde_json::Value> {
    let resp = match req.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("factcheck-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();

    if !status.is_success() {
        let detail = body["detail"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        eprintln!("factcheck-cli: server returned {}: {}", status, detail);
        std::process::exit(1);
    }

    Ok(body)
}

fn print_json(body: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}

fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let body = fetch(client()?.get(&url), &url)?;
    println!("Factcheck server: {}", body["status"].as_str().unwrap_or("unknown"));
    println!("Version:          {}", body["version"].as_str().unwrap_or("?"));
    println!("Backend:          {}", body["backend"].as_str().unwrap_or("?"));
    Ok(())
}

fn do_list(server: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/facts", server);
    let body = fetch(client()?.get(&url), &url)?;
    if json_output {
        return print_json(&body);
    }

    let facts = body.as_array().cloned().unwrap_or_default();
    if facts.is_empty() {
        eprintln!("No facts stored");
        return Ok(());
    }
    for f in &facts {
        let verdict = match f["feedback"]["value"].as_bool() {
            Some(true) => "accepted",
            Some(false) => "rejected",
            None => "pending",
        };
        println!(
            "#{:<6} {:<8} {:<10} {}",
            f["id"],
            f["wikidata_property"].as_str().unwrap_or("?"),
            verdict,
            f["wikidata_entity"].as_str().unwrap_or("?"),
        );
    }
    Ok(())
}

fn do_get(server: &str, id: i64, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/facts/{}", server, id);
    let body = fetch(client()?.get(&url), &url)?;
    if json_output {
        return print_json(&body);
    }
    println!("#{} {}", body["id"], body["wikidata_entity"].as_str().unwrap_or("?"));
    println!("Property:  {}", body["wikidata_property"].as_str().unwrap_or("?"));
    println!("Value:     {}", body["data_value"]);
    println!("Feedback:  {}", body["feedback"]);
    Ok(())
}

fn do_qid(server: &str, qid: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/facts/qid/{}", server, qid);
    let body = fetch(client()?.get(&url), &url)?;
    if json_output {
        return print_json(&body);
    }

    let facts: Vec<ShapedFact> = serde_json::from_value(body)?;
    if facts.is_empty() {
        eprintln!("No facts found for: {}", qid);
        return Ok(());
    }
    for f in &facts {
        println!("{}", format_shaped(f));
    }
    Ok(())
}

fn do_random(server: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/facts/random", server);
    let body = fetch(client()?.get(&url), &url)?;
    if json_output {
        return print_json(&body);
    }
    let fact: ShapedFact = serde_json::from_value(body)?;
    println!("{}", format_shaped(&fact));
    Ok(())
}

fn do_feedback(server: &str, action: &str, fact_id: i64) -> anyhow::Result<()> {
    let url = format!("{}/facts/{}", server, action);
    let req = client()?
        .post(&url)
        .json(&serde_json::json!({ "fact_id": fact_id }));
    let body = fetch(req, &url)?;
    println!("{}", body["message"].as_str().unwrap_or("ok"));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Status => do_status(&server),
        Commands::List { json } => do_list(&server, json),
        Commands::Get { id, json } => do_get(&server, id, json),
        Commands::Qid { qid, json } => do_qid(&server, &qid, json),
        Commands::Random { json } => do_random(&server, json),
        Commands::Accept { fact_id } => do_feedback(&server, "accept", fact_id),
        Commands::Reject { fact_id } => do_feedback(&server, "reject", fact_id),
    };

    if let Err(e) = result {
        eprintln!("factcheck-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
