/// Content Linter: validates rule tables before they ship.
///
/// Usage: content_linter [<content_dir>]
///
/// With no directory the built-in tables are checked. Tables found in the
/// directory replace the built-in ones before validation.

use relationship_engine::core::content::{GameContent, Severity, TABLE_FILES};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: content_linter [<content_dir>]");
        println!("  Recognised files: {}", TABLE_FILES.join(", "));
        process::exit(0);
    }

    let mut content = match GameContent::builtin() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: Built-in content failed to load: {}", e);
            process::exit(1);
        }
    };

    if let Some(dir) = args.get(1) {
        let path = Path::new(dir);
        if !path.is_dir() {
            eprintln!("ERROR: Path '{}' is not a directory", dir);
            process::exit(1);
        }
        match content.load_dir(path) {
            Ok(0) => println!("No table files in '{}', checking built-in tables", dir),
            Ok(n) => println!("Loaded {} table(s) from '{}'", n, dir),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        }
    }

    println!(
        "{} training actions, {} + {} endings, {} scenarios, {} activities, {} scenes, {} personalities",
        content.training.actions.len(),
        content.endings.emotional.len(),
        content.endings.sexual.len(),
        content.scenarios.scenarios.len(),
        content.activities.activities.len(),
        content.scenes.scenes().len(),
        content.personalities.personalities.len(),
    );

    let issues = content.validate();

    println!("\n=== Content Lint Report ===\n");

    if issues.is_empty() {
        println!("All checks passed!");
    }

    for issue in issues.iter().filter(|i| i.severity == Severity::Warning) {
        println!("{}", issue);
    }
    for issue in issues.iter().filter(|i| i.severity == Severity::Error) {
        println!("{}", issue);
    }

    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    println!(
        "\nSummary: {} errors, {} warnings",
        errors,
        issues.len() - errors
    );

    if errors > 0 {
        process::exit(1);
    }
}
