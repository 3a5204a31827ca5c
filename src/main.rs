// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! csp-sentinel CLI
//!
//! Replays recorded violation events through a monitor and analyzes policies.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context};
use serde_json::json;

use csp_sentinel::policy::{extract_policy_from_html, DirectiveAnalyzer, DomainAnalyzer};
use csp_sentinel::{load_events, MonitorConfig, MonitorController};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("csp_sentinel=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "replay" => {
            if args.len() < 3 {
                eprintln!("Usage: csp-sentinel replay <events-file> [OPTIONS]");
                return ExitCode::from(1);
            }
            replay(&args[2], &args[3..]).await
        }
        "analyze" => {
            if args.len() < 3 {
                eprintln!("Usage: csp-sentinel analyze <policy|file> [OPTIONS]");
                return ExitCode::from(1);
            }
            analyze(&args[2], &args[3..])
        }
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(ExitCode::SUCCESS)
        }
        "--version" | "-v" | "version" => {
            println!("csp-sentinel {}", csp_sentinel::VERSION);
            Ok(ExitCode::SUCCESS)
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Ok(ExitCode::from(1))
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"csp-sentinel - CSP Violation Monitor

USAGE:
    csp-sentinel <COMMAND> [OPTIONS]

COMMANDS:
    replay <events-file>    Feed recorded violation events through a monitor
    analyze <policy|file>   Analyze a CSP policy string, policy file or HTML page
    help                    Show this help message
    version                 Show version information

REPLAY OPTIONS:
    --config <file>         Monitor config (JSON, camelCase keys)
    --endpoint <url>        Collector endpoint
    --page-url <url>        Page URL recorded in reports
    --max-queue <n>         Queue capacity
    --retries <n>           Drain passes
    --enable                Enable delivery and drain the queue

ANALYZE OPTIONS:
    --require <directive>   Required directive (repeatable)
    --allow <domain>        Allowed domain (repeatable)

EXAMPLES:
    csp-sentinel replay violations.jsonl --endpoint https://collector.example.com/csp --enable
    csp-sentinel analyze "default-src 'self'; script-src 'self' 'unsafe-inline'"
    csp-sentinel analyze index.html --allow example.com
"#
    );
}

/// Value following `name`, if given
fn option<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Every value following a repeatable `name`
fn options<'a>(args: &'a [String], name: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|w| w[0] == name)
        .map(|w| w[1].as_str())
        .collect()
}

fn flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

async fn replay(events_file: &str, args: &[String]) -> anyhow::Result<ExitCode> {
    let mut config = match option(args, "--config") {
        Some(path) => MonitorConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path))?,
        None => MonitorConfig::new(),
    };
    if let Some(endpoint) = option(args, "--endpoint") {
        config = config.endpoint(endpoint);
    }
    if let Some(page_url) = option(args, "--page-url") {
        config = config.page_url(page_url);
    }
    if let Some(size) = option(args, "--max-queue") {
        config = config.max_queue_size(size.parse().context("--max-queue expects a number")?);
    }
    if let Some(retries) = option(args, "--retries") {
        config = config.max_retries(retries.parse().context("--retries expects a number")?);
    }
    let enable = flag(args, "--enable");
    // Start disabled so every event is captured before delivery begins
    config = config.enabled(false);

    let events = load_events(events_file).with_context(|| format!("loading {}", events_file))?;
    let monitor = MonitorController::new(config).context("creating monitor")?;
    let sender = monitor.subscribe()?;

    let mut evicted = 0usize;
    for event in events {
        let outcome = sender.capture(event).await?;
        if outcome.evicted.is_some() {
            evicted += 1;
        }
    }

    let mut drain = None;
    if enable {
        // The flush pass runs first; the drain then retries what it left
        if let Some(flush) = monitor.enable() {
            flush.await.context("flush task failed")?;
        }
        drain = Some(monitor.send_queued().await);
    }

    let output = json!({
        "status": monitor.status(),
        "evicted": evicted,
        "drain": drain,
        "analysis": monitor.analyze_violations(false),
        "metrics": monitor.metrics(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    monitor.destroy();

    match drain {
        Some(outcome) if outcome.failed > 0 => Ok(ExitCode::from(2)),
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn analyze(input: &str, args: &[String]) -> anyhow::Result<ExitCode> {
    let (policy, source) = if Path::new(input).is_file() {
        let content =
            std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?;
        if content.trim_start().starts_with('<') {
            match extract_policy_from_html(&content) {
                Some(policy) => (policy, "meta"),
                None => (String::new(), "meta"),
            }
        } else {
            (content.trim().to_string(), "file")
        }
    } else if input.trim_start().starts_with('<') {
        bail!("HTML input must be given as a file path");
    } else {
        (input.to_string(), "argument")
    };

    let directives = DirectiveAnalyzer::with_required(options(args, "--require")).analyze(&policy);
    let domains = DomainAnalyzer::with_allowed(options(args, "--allow")).analyze(&policy);

    let output = json!({
        "source": source,
        "directives": directives,
        "domains": domains,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if directives.is_compliant && domains.is_secure {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}
