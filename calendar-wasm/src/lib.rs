//! WASM bindings for content-calendar — powers the browser demo.
//!
//! All data crosses the boundary as JSON strings in the same camelCase
//! shape the request layer uses.

use wasm_bindgen::prelude::*;

use content_calendar::{CalendarEngine, CalendarInput, WeekCalendar};

#[derive(serde::Serialize)]
struct DemoInfo {
    version: &'static str,
    seed: u64,
    max_posts_per_week: u32,
}

// ---------------------------------------------------------------------------
// CalendarDemo — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct CalendarDemo {
    engine: CalendarEngine,
    seed: u64,
}

#[wasm_bindgen]
impl CalendarDemo {
    /// Build a demo engine with the built-in phrase library.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<CalendarDemo, JsError> {
        let engine = CalendarEngine::builder()
            .seed(seed)
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        Ok(CalendarDemo { engine, seed })
    }

    /// Generate a week from a calendar request JSON.
    pub fn generate(&self, input_json: &str) -> Result<String, JsError> {
        let input = parse_input(input_json)?;
        let calendar = self
            .engine
            .generate(&input)
            .map_err(|e| JsError::new(&format!("Generation error: {e}")))?;
        to_json(&calendar)
    }

    /// Generate the week after a previously returned calendar.
    pub fn next_week(&self, input_json: &str, previous_json: &str) -> Result<String, JsError> {
        let input = parse_input(input_json)?;
        let previous = WeekCalendar::from_json(previous_json)
            .map_err(|e| JsError::new(&format!("Invalid calendar JSON: {e}")))?;
        let calendar = self
            .engine
            .generate_next_week(&input, &previous)
            .map_err(|e| JsError::new(&format!("Generation error: {e}")))?;
        to_json(&calendar)
    }

    pub fn info(&self) -> Result<String, JsError> {
        let info = DemoInfo {
            version: env!("CARGO_PKG_VERSION"),
            seed: self.seed,
            max_posts_per_week: self.engine.config().max_posts_per_week,
        };
        serde_json::to_string(&info)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }
}

fn parse_input(json: &str) -> Result<CalendarInput, JsError> {
    CalendarInput::from_json(json).map_err(|e| JsError::new(&format!("Invalid input JSON: {e}")))
}

fn to_json(calendar: &WeekCalendar) -> Result<String, JsError> {
    calendar
        .to_json_pretty()
        .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}
