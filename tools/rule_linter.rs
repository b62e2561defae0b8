/// Rule Linter — audits the cleanup rule tables and the phrase library.
///
/// Usage: rule_linter [library.ron] [--topic <phrase>]
///
/// Checks that no rule's replacement re-triggers a rule in its own table,
/// that cleanup is idempotent over every seed line, and warns about thin
/// seed categories.
use content_calendar::core::cleanup::{rule_tables, CleanupPipeline};
use content_calendar::core::history::SeedCategory;
use content_calendar::core::library::PhraseLibrary;
use content_calendar::core::topic::TopicVoice;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::process;

const MIN_SEEDS: usize = 3;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: rule_linter [library.ron] [--topic <phrase>]");
        process::exit(0);
    }

    let mut library_path = None;
    let mut topic = "best practices for meal prep".to_string();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--topic" && i + 1 < args.len() {
            i += 1;
            topic = args[i].clone();
        } else {
            library_path = Some(args[i].clone());
        }
        i += 1;
    }

    let library = match library_path {
        Some(ref path) => PhraseLibrary::load_from_ron(Path::new(path)),
        None => PhraseLibrary::builtin(),
    };
    let library = match library {
        Ok(library) => library,
        Err(e) => {
            eprintln!("ERROR: Failed to load phrase library: {}", e);
            process::exit(1);
        }
    };

    let (errors, warnings) = lint(&library, &topic);

    println!("\n=== Cleanup Rule Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }
    for warning in &warnings {
        println!("WARNING: {}", warning);
    }
    for error in &errors {
        println!("ERROR: {}", error);
    }
    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    process::exit(if errors.is_empty() { 0 } else { 1 });
}

fn lint(library: &PhraseLibrary, topic: &str) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for table in rule_tables() {
        println!("  Table '{}': {} rules", table.name, table.rules.len());
        for (producer, matcher, output) in table.self_triggering() {
            errors.push(format!(
                "Table '{}': output {:?} of rule '{}' is matched again by rule '{}'",
                table.name, output, producer, matcher
            ));
        }
    }

    let pipeline = CleanupPipeline::default();
    let mut rng = StdRng::seed_from_u64(0);
    let mut voice = TopicVoice::new(topic);
    let direct = voice.direct().to_string();
    let mut checked = 0;
    for line in library.all_seed_lines() {
        let filled = voice.inject(line, &mut rng);
        let once = pipeline.run(&filled, Some(&direct), &mut rng);
        let twice = pipeline.run(&once, Some(&direct), &mut rng);
        if once != twice {
            errors.push(format!(
                "Cleanup is not idempotent for seed {:?}: {:?} -> {:?}",
                line, once, twice
            ));
        }
        if once.is_empty() {
            warnings.push(format!("Seed {:?} cleans to an empty string", line));
        }
        checked += 1;
    }
    println!("  Checked {} seed lines", checked);

    for category in SeedCategory::ALL {
        let count = library.seeds(category).len();
        if count > 0 && count < MIN_SEEDS {
            warnings.push(format!(
                "Category {:?} has only {} seed lines (minimum {} recommended)",
                category, count, MIN_SEEDS
            ));
        }
    }

    (errors, warnings)
}
