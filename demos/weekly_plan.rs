//! Weekly plan — a full week for a small running-app company, then the
//! week after it.
//!
//! Run with: cargo run --example weekly_plan

use chrono::NaiveDate;
use content_calendar::{CalendarEngine, CalendarInput, CompanyInfo, Persona, WeekCalendar};

fn persona(name: &str, voice: &str, background: &str, pain: &str) -> Persona {
    Persona {
        name: name.to_string(),
        background: background.to_string(),
        voice: voice.to_string(),
        pain_points: vec![pain.to_string()],
    }
}

fn print_week(calendar: &WeekCalendar) {
    println!("=== Week of {} ===\n", calendar.week_start);
    for slot in &calendar.posts {
        println!("{} {} - {}", slot.date, slot.community, slot.topic);
        println!("  {} posts: {}", slot.poster, slot.post_text);
        println!("  {} replies: {}\n", slot.commenter, slot.comment_text);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input = CalendarInput {
        company: CompanyInfo {
            name: "Stride".to_string(),
            value_prop: "Adaptive training plans that track your progress".to_string(),
            ideal_customer: "amateur runners training for their first race".to_string(),
            tone: "encouraging".to_string(),
        },
        personas: vec![
            persona("Maya", "casual", "Ran her first 10k last spring", "shin splints"),
            persona("Tom", "analytical", "Tracks every run in a spreadsheet", "plateaued pace"),
            persona("Priya", "friendly", "Coaches a weekend running club", "keeping beginners motivated"),
        ],
        count: 3,
        communities: vec![
            "running".to_string(),
            "r/AdvancedRunning".to_string(),
            "/r/C25K".to_string(),
        ],
        themes: vec!["marathon training".to_string(), "injury prevention".to_string()],
        posts_per_week: 6,
        week_start: None,
    };

    let engine = CalendarEngine::builder()
        .seed(2024)
        .reference_date(NaiveDate::from_ymd_opt(2024, 1, 3).ok_or("bad date")?)
        .build()?;

    let week = engine.generate(&input)?;
    print_week(&week);

    let next = engine.generate_next_week(&input, &week)?;
    print_week(&next);

    Ok(())
}
