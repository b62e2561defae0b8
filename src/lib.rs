//! Content Calendar — weekly post-and-reply calendar generation.
//!
//! Schedules topics, communities and author pairs across a week under
//! uniqueness and anti-repetition constraints, then renders each post and
//! reply from curated phrase libraries through a rule-based cleanup pipeline.
//! No language model is involved; every build is a pure function of the
//! input, the random seed and a fresh per-build history.

pub mod core;
pub mod schema;

pub use crate::core::pipeline::{CalendarEngine, CalendarError, GenerationConfig};
pub use crate::schema::calendar::{Community, Slot, WeekCalendar};
pub use crate::schema::input::{CalendarInput, CompanyInfo, InputError, Persona};
