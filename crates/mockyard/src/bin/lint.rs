//! Mockyard Definitions Linter
//!
//! Loads a definitions folder exactly like the server does and reports every
//! alert raised along the way: unreadable files, invalid routes and
//! variants, broken collection references and `from` chains.
//!
//! Usage:
//!   mockyard-lint <path> [OPTIONS]
//!
//! Exits with status 1 when any alert is raised.

use clap::Parser;
use mockyard::alerts::{Alert, Alerts};
use mockyard::loader::read_definitions;
use mockyard::mock::{LoadSummary, Mock, MockOptions};
use mockyard_schema::Value;
use std::path::PathBuf;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Mockyard Definitions Linter
#[derive(Parser, Debug)]
#[command(name = "mockyard-lint")]
#[command(author, version, about = "Validate mockyard route and collection definitions")]
struct Args {
    /// Definitions folder (holding `collections.*` and `routes/`)
    #[arg(required = true)]
    path: PathBuf,

    /// Collection expected to be selectable (default: the first one defined)
    #[arg(short, long)]
    collection: Option<String>,

    /// Output format: text (default), json
    #[arg(short, long, default_value = "text")]
    output: String,
}

fn main() {
    let args = Args::parse();
    let json = args.output == "json";

    if !json {
        println!("{BOLD}{CYAN}Mockyard Definitions Linter{RESET}");
        println!("{DIM}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{RESET}");
        println!("{DIM}Scanning:{RESET} {CYAN}{}{RESET}", args.path.display());
    }

    let (summary, alerts) = match lint(&args) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{RED}{BOLD}error:{RESET} {e:#}");
            std::process::exit(2);
        }
    };

    if json {
        print_results_json(&args, &summary, &alerts);
    } else {
        print_results(&summary, &alerts);
    }

    std::process::exit(if alerts.is_empty() { 0 } else { 1 });
}

fn lint(args: &Args) -> Result<(LoadSummary, Vec<Alert>), anyhow::Error> {
    let alerts = Alerts::default();
    let definitions = read_definitions(&args.path, &alerts.collection("files"));

    // selection is a runtime setting; only an explicitly requested
    // collection that cannot be selected is worth reporting
    let selected = args.collection.clone().or_else(|| {
        definitions
            .collections
            .iter()
            .find_map(|c| c.get("id").and_then(Value::as_str).map(str::to_string))
    });
    let mock = Mock::new(
        MockOptions {
            selected_collection: selected,
            ..Default::default()
        },
        alerts.collection("mock"),
    )?;
    let summary = mock.load_definitions(definitions.routes, definitions.collections)?;

    Ok((summary, alerts.list()))
}

fn print_results_json(args: &Args, summary: &LoadSummary, alerts: &[Alert]) {
    let output = serde_json::json!({
        "path": args.path.to_string_lossy(),
        "routes": summary.routes,
        "variants": summary.variants,
        "collections": summary.collections,
        "invalid": summary.invalid,
        "alerts": alerts
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_results(summary: &LoadSummary, alerts: &[Alert]) {
    println!(
        "{DIM}Loaded:{RESET}   {BOLD}{}{RESET} route(s), {BOLD}{}{RESET} variant(s), {BOLD}{}{RESET} collection(s)\n",
        summary.routes, summary.variants, summary.collections
    );

    if alerts.is_empty() {
        println!("{GREEN}{BOLD}No issues found!{RESET}");
        return;
    }

    for alert in alerts {
        println!("{RED}{BOLD}error{RESET} {BOLD}[{}]{RESET}", alert.id);
        println!("   {}", alert.message);
        if let Some(error) = &alert.error {
            println!("   {DIM}caused by:{RESET} {YELLOW}{error}{RESET}");
        }
    }

    println!(
        "\n{RED}{BOLD}{} issue(s) found{RESET}, {} invalid definition(s) ignored",
        alerts.len(),
        summary.invalid
    );
}
