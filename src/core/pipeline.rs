/// The calendar pipeline: input → topic pool → scheduled, written week.
///
/// Wires together validation, theme expansion, the per-build seed
/// history, and the slot scheduler.
use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::assembler::TextAssembler;
use crate::core::history::{SeedHistory, DEFAULT_CAP, DEFAULT_WINDOW};
use crate::core::library::{LibraryError, PhraseLibrary};
use crate::core::scheduler::{ScheduleRequest, SlotScheduler};
use crate::core::themes::expand_themes;
use crate::schema::calendar::{monday_of, WeekCalendar, DEFAULT_COMMUNITY_PREFIX};
use crate::schema::input::{CalendarInput, InputError};

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),
    #[error("phrase library error: {0}")]
    Library(#[from] LibraryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables for a build. Every field has a default, so a RON file only
/// needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub community_prefix: String,
    /// Community attempts per slot, as a multiple of the pool size.
    pub community_retry_factor: usize,
    pub history_window: usize,
    pub history_cap: usize,
    pub company_mention_chance: f64,
    pub micro_reaction_chance: f64,
    pub humor_chance: f64,
    pub tone_prefix_chance: f64,
    pub style_prefix_chance: f64,
    /// Requests above this are clamped.
    pub max_posts_per_week: u32,
    /// First "part N" number used once the topic pool runs out.
    pub continuation_start: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            community_prefix: DEFAULT_COMMUNITY_PREFIX.to_string(),
            community_retry_factor: 3,
            history_window: DEFAULT_WINDOW,
            history_cap: DEFAULT_CAP,
            company_mention_chance: 0.20,
            micro_reaction_chance: 0.20,
            humor_chance: 0.30,
            tone_prefix_chance: 0.30,
            style_prefix_chance: 0.35,
            max_posts_per_week: 70,
            continuation_start: 2,
        }
    }
}

impl GenerationConfig {
    pub fn load_from_ron(path: &Path) -> Result<GenerationConfig, CalendarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<GenerationConfig, CalendarError> {
        Ok(ron::from_str(input)?)
    }
}

/// The top-level calendar engine. Built via `CalendarEngine::builder()`.
///
/// The engine is immutable once built; every call to `generate` owns its
/// own rng and seed history, so one engine can serve concurrent builds.
#[derive(Debug, Clone)]
pub struct CalendarEngine {
    library: PhraseLibrary,
    config: GenerationConfig,
    seed: Option<u64>,
    reference_date: Option<NaiveDate>,
}

/// Builder for constructing a `CalendarEngine`.
#[derive(Debug, Default)]
pub struct CalendarEngineBuilder {
    seed: Option<u64>,
    reference_date: Option<NaiveDate>,
    library_path: Option<String>,
    config_path: Option<String>,
    /// Directly provided library (for testing without files).
    library: Option<PhraseLibrary>,
    /// Directly provided config (for testing without files).
    config: Option<GenerationConfig>,
}

impl CalendarEngine {
    pub fn builder() -> CalendarEngineBuilder {
        CalendarEngineBuilder::default()
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn library(&self) -> &PhraseLibrary {
        &self.library
    }

    /// The week a build of `input` covers: its explicit `weekStart`, or
    /// the Monday of the reference date's week.
    pub fn week_start_for(&self, input: &CalendarInput) -> NaiveDate {
        input.week_start.unwrap_or_else(|| {
            let today = self
                .reference_date
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            monday_of(today)
        })
    }

    /// Build a week. With a seed, the same input always yields the same
    /// calendar; each week start draws from a different stream.
    pub fn generate(&self, input: &CalendarInput) -> Result<WeekCalendar, CalendarError> {
        input.validate()?;
        let week_start = self.week_start_for(input);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(
                seed.wrapping_add(week_start.num_days_from_ce() as i64 as u64),
            ),
            None => StdRng::from_entropy(),
        };
        Ok(self.build(input, week_start, &mut rng))
    }

    /// Build a week drawing every random choice from `rng`.
    pub fn generate_with_rng(
        &self,
        input: &CalendarInput,
        rng: &mut StdRng,
    ) -> Result<WeekCalendar, CalendarError> {
        input.validate()?;
        let week_start = self.week_start_for(input);
        Ok(self.build(input, week_start, rng))
    }

    /// The week after `previous`, built from the same input with a fresh
    /// history.
    pub fn generate_next_week(
        &self,
        input: &CalendarInput,
        previous: &WeekCalendar,
    ) -> Result<WeekCalendar, CalendarError> {
        let next = CalendarInput {
            week_start: Some(previous.next_week_start()),
            ..input.clone()
        };
        self.generate(&next)
    }

    /// JSON in, pretty JSON out.
    pub fn generate_json(&self, input: &str) -> Result<String, CalendarError> {
        let input = CalendarInput::from_json(input)?;
        Ok(self.generate(&input)?.to_json_pretty()?)
    }

    fn build(&self, input: &CalendarInput, week_start: NaiveDate, rng: &mut StdRng) -> WeekCalendar {
        let mut history = SeedHistory::new(self.config.history_window, self.config.history_cap);
        history.reset();

        let topic_pool = expand_themes(&input.themes);
        let posts = input.posts_per_week.min(self.config.max_posts_per_week);
        if posts < input.posts_per_week {
            warn!(
                requested = input.posts_per_week,
                max = self.config.max_posts_per_week,
                "postsPerWeek clamped"
            );
        }

        let assembler = TextAssembler::new(&self.library, &self.config, &input.company);
        let scheduler = SlotScheduler::new(&self.config, assembler);
        let request = ScheduleRequest {
            week_start,
            posts,
            topic_pool: &topic_pool,
            themes: &input.themes,
            communities: &input.communities,
            personas: &input.personas,
        };
        let slots = scheduler.schedule(&request, &mut history, rng);

        info!(
            %week_start,
            posts = slots.len(),
            topics = topic_pool.len(),
            "calendar built"
        );
        WeekCalendar {
            week_start,
            posts: slots,
        }
    }
}

impl CalendarEngineBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The "today" used to find the default week start.
    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn library_path(mut self, path: &str) -> Self {
        self.library_path = Some(path.to_string());
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    /// Provide a library directly (for testing without files).
    pub fn with_library(mut self, library: PhraseLibrary) -> Self {
        self.library = Some(library);
        self
    }

    /// Provide a config directly (for testing without files).
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Files named by path win over directly provided values.
    pub fn build(self) -> Result<CalendarEngine, CalendarError> {
        let library = match (&self.library_path, self.library) {
            (Some(path), _) => PhraseLibrary::load_from_ron(Path::new(path))?,
            (None, Some(library)) => library,
            (None, None) => PhraseLibrary::builtin()?,
        };
        let config = match (&self.config_path, self.config) {
            (Some(path), _) => GenerationConfig::load_from_ron(Path::new(path))?,
            (None, Some(config)) => config,
            (None, None) => GenerationConfig::default(),
        };

        Ok(CalendarEngine {
            library,
            config,
            seed: self.seed,
            reference_date: self.reference_date,
        })
    }
}
