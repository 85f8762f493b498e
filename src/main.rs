// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::time::Instant;

use phaseflow::config::{load_config, EngineConfig};
use phaseflow::demos::{self, Demo};
use phaseflow::engine::{ExecutionOptions, ProcessExecutor};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn print_usage(program: &str) {
    let names: Vec<&str> = demos::all().iter().map(|demo| demo.name).collect();
    eprintln!("Usage: {} [--config <engine.yaml|engine.toml>] <demo|all> <number>", program);
    eprintln!("Demos: {}", names.join(", "));
    eprintln!("Example: {} linear 10", program);
    eprintln!("Example: {} --config engine.yaml all 3", program);
}

/// Print a result map with keys in a stable order.
fn print_map(title: &str, map: &HashMap<String, Value>) {
    println!("{}:", title);
    let sorted: BTreeMap<_, _> = map.iter().collect();
    for (key, value) in sorted {
        println!("  {} = {}", key, value);
    }
}

async fn run_demo(executor: &ProcessExecutor, demo: Demo, number: i64) {
    println!("▶ {}: {}", demo.name, demo.description);

    let started = Instant::now();
    let options = ExecutionOptions::new().with_input(json!({ "value": number }));
    match executor
        .execute(demo.process.clone(), &demo.beginning, options)
        .await
    {
        Ok(outcome) => {
            print_map("Results", &outcome.results);
            print_map("Phase results", &outcome.phase_results);
            if !outcome.errors.is_empty() {
                println!("Errors:");
                for error in &outcome.errors {
                    println!("  {}", error);
                }
            }
            if !outcome.pending_joins.is_empty() {
                println!("Pending joins: {}", outcome.pending_joins.join(", "));
            }
            println!("Completed in {:?}", started.elapsed());
        }
        Err(e) => {
            eprintln!("❌ {} failed: {}", demo.name, e);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("phaseflow");
    let mut rest = &args[1.min(args.len())..];

    let mut config = EngineConfig::default();
    if rest.first().map(String::as_str) == Some("--config") {
        let Some(path) = rest.get(1) else {
            print_usage(program);
            std::process::exit(1);
        };
        config = match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        };
        rest = &rest[2..];
    }

    let [selection, number] = rest else {
        print_usage(program);
        std::process::exit(1);
    };
    let Ok(number) = number.parse::<i64>() else {
        eprintln!("❌ '{}' is not an integer", number);
        std::process::exit(1);
    };

    let selected = if selection == "all" {
        demos::all()
    } else {
        match demos::by_name(selection) {
            Some(demo) => vec![demo],
            None => {
                eprintln!("❌ Unknown demo '{}'", selection);
                print_usage(program);
                std::process::exit(1);
            }
        }
    };

    println!("🚀 phaseflow demo");
    println!("═══════════════════════════════════");
    println!("Input: {{\"value\": {}}}", number);
    println!("Join policy: {:?}", config.join_policy);
    println!();

    let executor = ProcessExecutor::new(config);
    for (i, demo) in selected.into_iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(60));
        }
        run_demo(&executor, demo, number).await;
    }
}
