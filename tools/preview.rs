/// Preview — generate a calendar from a request file and print it.
///
/// Usage: preview <input.json> [--seed <n>] [--week-start <YYYY-MM-DD>]
///                [--next] [--config <config.ron>] [--library <library.ron>] [--json]
///
/// `--next` also builds the following week from the first one.
use chrono::NaiveDate;
use content_calendar::{CalendarEngine, CalendarInput, WeekCalendar};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "content_calendar=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let input_path = &args[1];
    let mut seed: Option<u64> = None;
    let mut week_start: Option<NaiveDate> = None;
    let mut next = false;
    let mut json = false;
    let mut config_path = None;
    let mut library_path = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = match args[i].parse() {
                    Ok(s) => Some(s),
                    Err(_) => fail(&format!("invalid seed: {}", args[i])),
                };
            }
            "--week-start" if i + 1 < args.len() => {
                i += 1;
                week_start = match args[i].parse() {
                    Ok(d) => Some(d),
                    Err(_) => fail(&format!("invalid date (expected YYYY-MM-DD): {}", args[i])),
                };
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--library" if i + 1 < args.len() => {
                i += 1;
                library_path = Some(args[i].clone());
            }
            "--next" => next = true,
            "--json" => json = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let contents = match std::fs::read_to_string(input_path) {
        Ok(c) => c,
        Err(e) => fail(&format!("failed to read {input_path}: {e}")),
    };
    let mut input = match CalendarInput::from_json(&contents) {
        Ok(input) => input,
        Err(e) => fail(&format!("invalid input JSON: {e}")),
    };
    if week_start.is_some() {
        input.week_start = week_start;
    }

    let mut builder = CalendarEngine::builder();
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    if let Some(ref path) = library_path {
        builder = builder.library_path(path);
    }
    let engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => fail(&format!("engine build failed: {e}")),
    };

    let mut weeks = Vec::new();
    match engine.generate(&input) {
        Ok(calendar) => weeks.push(calendar),
        Err(e) => fail(&e.to_string()),
    }
    if next {
        match engine.generate_next_week(&input, &weeks[0]) {
            Ok(calendar) => weeks.push(calendar),
            Err(e) => fail(&e.to_string()),
        }
    }

    for calendar in &weeks {
        if json {
            match calendar.to_json_pretty() {
                Ok(text) => println!("{text}"),
                Err(e) => fail(&format!("serialization failed: {e}")),
            }
        } else {
            print_listing(calendar);
        }
    }
}

fn print_listing(calendar: &WeekCalendar) {
    println!(
        "=== Week of {} ({} posts) ===",
        calendar.week_start,
        calendar.posts.len()
    );
    let mut current = None;
    for slot in &calendar.posts {
        if current != Some(slot.date) {
            println!("\n{}", slot.date.format("%A %Y-%m-%d"));
            current = Some(slot.date);
        }
        println!("  [{}] {}", slot.community, slot.topic);
        println!("    {}: {}", slot.poster, slot.post_text);
        println!("      ↳ {}: {}", slot.commenter, slot.comment_text);
    }
    println!();
}

fn fail(message: &str) -> ! {
    eprintln!("ERROR: {message}");
    process::exit(1);
}

fn print_usage() {
    println!("Usage: preview <input.json> [options]");
    println!();
    println!("Options:");
    println!("  --seed <n>              Deterministic build seed");
    println!("  --week-start <date>     Override the week start (YYYY-MM-DD)");
    println!("  --next                  Also build the following week");
    println!("  --config <path>         GenerationConfig RON file");
    println!("  --library <path>        Phrase library RON file");
    println!("  --json                  Print JSON instead of a listing");
    println!();
    println!("Set RUST_LOG=content_calendar=debug to trace every slot.");
}
