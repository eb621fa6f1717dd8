//! Ledger dispatch server binary
//!
//! Serves ledger operations as line-delimited JSON over stdin/stdout: each
//! request line is a JSON array of strings, function name first, e.g.
//! `["createWallet", "w1", "hash1"]`. Each response line is a JSON object
//! with `status`, `message`, and `payload`.

use anyhow::Context;
use coin_ledger::{Config, Dispatcher, Ledger};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    tracing::info!("Starting coin ledger server");

    // Load configuration: an explicit config file wins over env variables
    let config = match std::env::var("LEDGER_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::from_env()?,
    };

    // Open ledger; bootstrap only on first start
    let ledger = Ledger::open(config)?;
    if ledger.get_treasure(None)?.is_none() {
        ledger.init(None, None)?;
    }
    tracing::info!("Ledger opened successfully");

    let dispatcher = Dispatcher::new(ledger);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read request line")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match parse_request(&line) {
            Ok((function, args)) => dispatcher.invoke(&function, &args),
            Err(message) => {
                tracing::warn!(%message, "Malformed request line");
                writeln!(
                    out,
                    "{}",
                    json!({"status": 500, "message": message, "payload": Value::Null})
                )?;
                continue;
            }
        };

        let payload = if response.payload.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&response.payload).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&response.payload).into_owned())
            })
        };

        writeln!(
            out,
            "{}",
            json!({
                "status": response.status,
                "message": response.message,
                "payload": payload,
            })
        )?;
    }

    tracing::info!("Shutting down coin ledger server");
    Ok(())
}

fn parse_request(line: &str) -> Result<(String, Vec<String>), String> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| format!("request is not valid JSON: {}", e))?;

    let items = value
        .as_array()
        .ok_or_else(|| "request must be a JSON array of strings".to_string())?;

    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let s = item
            .as_str()
            .ok_or_else(|| "request arguments must all be strings".to_string())?;
        parts.push(s.to_string());
    }

    let mut iter = parts.into_iter();
    let function = iter
        .next()
        .ok_or_else(|| "request must name a function".to_string())?;

    Ok((function, iter.collect()))
}
