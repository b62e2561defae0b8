/// Per-build anti-repetition memory for phrase picks.
///
/// One `SeedHistory` lives for exactly one calendar build. It is passed
/// by `&mut` through the scheduler and assembler, never stored globally.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::assembler::LengthMode;

/// Categories of phrase choices tracked for repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedCategory {
    Intro,
    Reflection,
    Struggle,
    Advice,
    Closing,
    ShortReply,
    Affirmation,
    Humor,
    Pattern,
    StyleMode,
}

impl SeedCategory {
    pub const ALL: [SeedCategory; 10] = [
        SeedCategory::Intro,
        SeedCategory::Reflection,
        SeedCategory::Struggle,
        SeedCategory::Advice,
        SeedCategory::Closing,
        SeedCategory::ShortReply,
        SeedCategory::Affirmation,
        SeedCategory::Humor,
        SeedCategory::Pattern,
        SeedCategory::StyleMode,
    ];
}

pub const DEFAULT_WINDOW: usize = 2;
pub const DEFAULT_CAP: usize = 10;

/// Recently used picks per category, plus the week-level length tracker.
#[derive(Debug, Clone)]
pub struct SeedHistory {
    picks: FxHashMap<SeedCategory, Vec<String>>,
    last_post_length: Option<LengthMode>,
    window: usize,
    cap: usize,
}

impl Default for SeedHistory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_CAP)
    }
}

impl SeedHistory {
    /// `window` recent picks are avoided; at most `cap` are remembered.
    pub fn new(window: usize, cap: usize) -> Self {
        Self {
            picks: FxHashMap::default(),
            last_post_length: None,
            window,
            cap: cap.max(window),
        }
    }

    /// Forget everything. Called once at the start of every build.
    pub fn reset(&mut self) {
        self.picks.clear();
        self.last_post_length = None;
    }

    /// Pick a candidate not among the last `window` picks of `category`.
    ///
    /// If every candidate is in the window the restriction is dropped.
    /// Returns `None` only when `candidates` is empty.
    pub fn pick_unique<S: AsRef<str>>(
        &mut self,
        category: SeedCategory,
        candidates: &[S],
        rng: &mut StdRng,
    ) -> Option<String> {
        let recent = self.recent(category);
        let fresh: Vec<&str> = candidates
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| !recent.iter().any(|r| r == c))
            .collect();

        let picked = if fresh.is_empty() {
            candidates.choose(rng)?.as_ref().to_string()
        } else {
            fresh.choose(rng)?.to_string()
        };

        self.record(category, &picked);
        Some(picked)
    }

    /// Append a pick to a category's history, keeping the newest `cap`.
    pub fn record(&mut self, category: SeedCategory, value: &str) {
        let entries = self.picks.entry(category).or_default();
        entries.push(value.to_string());
        if entries.len() > self.cap {
            let overflow = entries.len() - self.cap;
            entries.drain(..overflow);
        }
    }

    /// The last `window` picks of a category, oldest first.
    pub fn recent(&self, category: SeedCategory) -> &[String] {
        let entries = self.history(category);
        &entries[entries.len().saturating_sub(self.window)..]
    }

    /// Full remembered history of a category, oldest first.
    pub fn history(&self, category: SeedCategory) -> &[String] {
        self.picks.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.picks.values().all(Vec::is_empty) && self.last_post_length.is_none()
    }

    pub fn last_post_length(&self) -> Option<LengthMode> {
        self.last_post_length
    }

    pub fn set_last_post_length(&mut self, mode: LengthMode) {
        self.last_post_length = Some(mode);
    }
}
