/// Slot scheduler — spreads a week's posts over seven days and assigns
/// topic, community, poster and commenter to each slot.
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::core::assembler::TextAssembler;
use crate::core::history::SeedHistory;
use crate::core::pipeline::GenerationConfig;
use crate::core::themes::clean_theme;
use crate::schema::calendar::{Community, Slot};
use crate::schema::input::Persona;

pub const DAYS_PER_WEEK: u32 = 7;

/// Everything one week's schedule is drawn from.
#[derive(Debug, Clone)]
pub struct ScheduleRequest<'r> {
    pub week_start: NaiveDate,
    pub posts: u32,
    pub topic_pool: &'r [String],
    pub themes: &'r [String],
    pub communities: &'r [String],
    pub personas: &'r [Persona],
}

/// Posts per day: each day takes `ceil(remaining / remaining_days)`, so
/// earlier days carry the extra slot.
pub fn daily_counts(posts: u32, days: u32) -> Vec<u32> {
    let mut remaining = posts;
    (0..days)
        .map(|day| {
            let today = remaining.div_ceil(days - day);
            remaining -= today;
            today
        })
        .collect()
}

/// Topic draw order for one build: the shuffled pool without reuse, then
/// numbered continuations of the cleaned themes. Always holds at least
/// one cleaned theme.
#[derive(Debug, Clone)]
pub struct TopicRotation {
    pool: Vec<String>,
    cursor: usize,
    used: FxHashSet<String>,
    themes: Vec<String>,
    continuations: usize,
    continuation_start: u32,
}

impl TopicRotation {
    /// `None` when no theme survives cleaning.
    pub fn new<S: AsRef<str>>(
        pool: Vec<String>,
        themes: &[S],
        continuation_start: u32,
    ) -> Option<Self> {
        let mut seen = FxHashSet::default();
        let themes: Vec<String> = themes
            .iter()
            .map(|t| clean_theme(t.as_ref()))
            .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
            .collect();
        if themes.is_empty() {
            return None;
        }
        Some(Self {
            pool,
            cursor: 0,
            used: FxHashSet::default(),
            themes,
            continuations: 0,
            continuation_start,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.pool.iter().all(|t| self.used.contains(t))
    }

    pub fn next_topic(&mut self) -> String {
        for _ in 0..self.pool.len() {
            let candidate = &self.pool[self.cursor % self.pool.len()];
            self.cursor += 1;
            if self.used.insert(candidate.clone()) {
                return candidate.clone();
            }
        }
        self.next_continuation()
    }

    fn next_continuation(&mut self) -> String {
        if self.continuations == 0 {
            warn!(pool = self.pool.len(), "topic pool exhausted, using continuation topics");
        }
        let round = self.themes.len();
        let theme = &self.themes[self.continuations % round];
        let part = self.continuation_start as usize + self.continuations / round;
        self.continuations += 1;
        let topic = format!("{theme} (part {part})");
        self.used.insert(topic.clone());
        topic
    }
}

/// Cyclic community rotation with same-day and back-to-back avoidance.
#[derive(Debug, Clone)]
pub struct CommunityRotation {
    items: Vec<Community>,
    cursor: usize,
    retry_factor: usize,
}

impl CommunityRotation {
    /// Normalizes and de-duplicates `raw` (first occurrence wins), then
    /// shuffles once.
    pub fn new<S: AsRef<str>>(
        raw: &[S],
        prefix: &str,
        retry_factor: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut items: Vec<Community> = Vec::with_capacity(raw.len());
        for community in raw {
            let normalized = Community::normalize(community.as_ref(), prefix);
            if !items.contains(&normalized) {
                items.push(normalized);
            }
        }
        items.shuffle(rng);
        Self {
            items,
            cursor: 0,
            retry_factor: retry_factor.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn advance(&mut self) -> Option<&Community> {
        if self.items.is_empty() {
            return None;
        }
        let item = &self.items[self.cursor % self.items.len()];
        self.cursor += 1;
        Some(item)
    }

    /// The next community not used today and not equal to `previous`.
    ///
    /// Falls back to dropping the same-day rule, then to accepting the
    /// next candidate outright.
    pub fn next_community(
        &mut self,
        used_today: &[Community],
        previous: Option<&Community>,
    ) -> Option<Community> {
        let size = self.items.len();
        for _ in 0..self.retry_factor * size {
            let candidate = self.advance()?;
            if !used_today.contains(candidate) && previous != Some(candidate) {
                return Some(candidate.clone());
            }
        }

        warn!(communities = size, "same-day community constraint relaxed");
        for _ in 0..size {
            let candidate = self.advance()?;
            if previous != Some(candidate) {
                return Some(candidate.clone());
            }
        }

        warn!(communities = size, "back-to-back community constraint relaxed");
        self.advance().cloned()
    }
}

/// Assigns slots for one week and has the assembler write them.
#[derive(Debug, Clone)]
pub struct SlotScheduler<'a> {
    config: &'a GenerationConfig,
    assembler: TextAssembler<'a>,
}

impl<'a> SlotScheduler<'a> {
    pub fn new(config: &'a GenerationConfig, assembler: TextAssembler<'a>) -> Self {
        Self { config, assembler }
    }

    pub fn schedule(
        &self,
        request: &ScheduleRequest<'_>,
        history: &mut SeedHistory,
        rng: &mut StdRng,
    ) -> Vec<Slot> {
        let mut pool = request.topic_pool.to_vec();
        pool.shuffle(rng);
        let Some(mut topics) =
            TopicRotation::new(pool, request.themes, self.config.continuation_start)
        else {
            warn!("no usable themes, nothing scheduled");
            return Vec::new();
        };
        let mut communities = CommunityRotation::new(
            request.communities,
            &self.config.community_prefix,
            self.config.community_retry_factor,
            rng,
        );
        let mut personas: Vec<&Persona> = request.personas.iter().collect();
        personas.shuffle(rng);

        if communities.is_empty() || personas.is_empty() {
            return Vec::new();
        }

        let mut slots: Vec<Slot> = Vec::with_capacity(request.posts as usize);
        let mut poster_cursor = 0;

        for (day, count) in daily_counts(request.posts, DAYS_PER_WEEK).into_iter().enumerate() {
            let date = request.week_start + Days::new(day as u64);
            let mut used_today: Vec<Community> = Vec::with_capacity(count as usize);

            for _ in 0..count {
                let topic = topics.next_topic();
                let previous = slots.last().map(|s| &s.community);
                let Some(community) = communities.next_community(&used_today, previous) else {
                    break;
                };
                used_today.push(community.clone());

                let poster = personas[poster_cursor % personas.len()];
                poster_cursor += 1;
                let commenter = pick_commenter(&personas, poster, rng);

                let post = self.assembler.post(&topic, poster, history, rng);
                let comment_text =
                    self.assembler
                        .comment(&topic, commenter, post.length, history, rng);

                debug!(
                    %date,
                    %community,
                    poster = %poster.name,
                    commenter = %commenter.name,
                    topic = %topic,
                    length = post.length.name(),
                    "slot scheduled"
                );

                slots.push(Slot {
                    date,
                    community,
                    poster: poster.name.clone(),
                    commenter: commenter.name.clone(),
                    topic,
                    post_text: post.text,
                    comment_text,
                });
            }
        }
        slots
    }
}

/// A random persona other than the poster; the poster itself only when
/// no one else is available.
fn pick_commenter<'p>(personas: &[&'p Persona], poster: &'p Persona, rng: &mut StdRng) -> &'p Persona {
    let others: Vec<&'p Persona> = personas
        .iter()
        .copied()
        .filter(|p| p.name != poster.name)
        .collect();
    others.choose(rng).copied().unwrap_or(poster)
}
