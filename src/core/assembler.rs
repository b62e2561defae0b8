/// Text assembler — turns a (persona, topic) pair into a polished draft.
///
/// Chooses a length mode, fills a sentence template from the phrase
/// library through the anti-repetition picker, optionally swaps in a
/// company mention and persona flavor, then runs the cleanup pipeline.
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::cleanup::{find_word_matches, CleanupPipeline};
use crate::core::history::{SeedCategory, SeedHistory};
use crate::core::library::{PhraseLibrary, Template, Token};
use crate::core::pipeline::GenerationConfig;
use crate::core::themes::is_complex_topic;
use crate::core::topic::TopicVoice;
use crate::core::voice::{apply_prefixes, resolve_tone_prefix, StyleMode};
use crate::schema::input::{CompanyInfo, Persona};

/// How long a draft runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthMode {
    Short,
    Medium,
    Long,
}

impl LengthMode {
    pub const ALL: [LengthMode; 3] = [LengthMode::Short, LengthMode::Medium, LengthMode::Long];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

const POST_WEIGHTS: [u32; 3] = [25, 45, 30];
const COMPLEX_POST_WEIGHTS: [u32; 3] = [10, 45, 45];

/// Comment length weights, keyed by the paired post's length.
fn comment_weights(post: LengthMode) -> [u32; 3] {
    match post {
        LengthMode::Long => [50, 40, 10],
        LengthMode::Medium => [40, 45, 15],
        LengthMode::Short => [35, 50, 15],
    }
}

fn draw_length(weights: [u32; 3], rng: &mut StdRng) -> LengthMode {
    match WeightedIndex::new(weights) {
        Ok(dist) => LengthMode::ALL[dist.sample(rng)],
        Err(_) => LengthMode::Medium,
    }
}

fn chance(rng: &mut StdRng, probability: f64) -> bool {
    rng.gen::<f64>() < probability
}

/// Keyword buckets for company-mention sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionBucket {
    TaskAutomation,
    ProgressTracking,
    FocusSimplification,
    Generic,
}

impl MentionBucket {
    const KEYWORDS: [(MentionBucket, &'static [&'static str]); 3] = [
        (MentionBucket::TaskAutomation, &["automat", "workflow", "repetitive"]),
        (
            MentionBucket::ProgressTracking,
            &["track", "progress", "analytic", "insight", "metric"],
        ),
        (
            MentionBucket::FocusSimplification,
            &["focus", "simpl", "priorit", "distraction", "clarity"],
        ),
    ];

    /// The first bucket whose keywords appear in the value proposition.
    pub fn for_value_prop(value_prop: &str) -> MentionBucket {
        let lower = value_prop.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(bucket, _)| *bucket)
            .unwrap_or(MentionBucket::Generic)
    }

    fn lines<'a>(&self, library: &'a PhraseLibrary) -> &'a [String] {
        let mentions = &library.company_mentions;
        let lines = match self {
            Self::TaskAutomation => &mentions.task_automation,
            Self::ProgressTracking => &mentions.progress_tracking,
            Self::FocusSimplification => &mentions.focus_simplification,
            Self::Generic => &mentions.generic,
        };
        if lines.is_empty() {
            &mentions.generic
        } else {
            lines
        }
    }
}

/// An assembled post and the length mode it was drawn with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub length: LengthMode,
}

/// Assembles drafts for one build. Holds only shared, read-only state;
/// the history and rng are threaded through every call.
#[derive(Debug, Clone)]
pub struct TextAssembler<'a> {
    library: &'a PhraseLibrary,
    config: &'a GenerationConfig,
    company: &'a CompanyInfo,
    cleanup: CleanupPipeline,
}

impl<'a> TextAssembler<'a> {
    pub fn new(
        library: &'a PhraseLibrary,
        config: &'a GenerationConfig,
        company: &'a CompanyInfo,
    ) -> Self {
        Self {
            library,
            config,
            company,
            cleanup: CleanupPipeline::default(),
        }
    }

    /// Draw a post length. Complex topics lean long, and a short post is
    /// never followed by another short post within the week.
    pub fn choose_post_length(
        &self,
        topic: &str,
        history: &SeedHistory,
        rng: &mut StdRng,
    ) -> LengthMode {
        let mut weights = if is_complex_topic(topic) {
            COMPLEX_POST_WEIGHTS
        } else {
            POST_WEIGHTS
        };
        if history.last_post_length() == Some(LengthMode::Short) {
            weights[0] = 0;
        }
        draw_length(weights, rng)
    }

    /// Draw a comment length from the paired post's length.
    pub fn choose_comment_length(&self, post: LengthMode, rng: &mut StdRng) -> LengthMode {
        draw_length(comment_weights(post), rng)
    }

    pub fn post(
        &self,
        topic: &str,
        persona: &Persona,
        history: &mut SeedHistory,
        rng: &mut StdRng,
    ) -> Draft {
        let length = self.choose_post_length(topic, history, rng);
        history.set_last_post_length(length);
        Draft {
            text: self.assemble(length, topic, persona, history, rng),
            length,
        }
    }

    /// A reply to a post of length `post`. Some replies are canned
    /// micro-reactions that skip assembly and cleanup entirely.
    pub fn comment(
        &self,
        topic: &str,
        persona: &Persona,
        post: LengthMode,
        history: &mut SeedHistory,
        rng: &mut StdRng,
    ) -> String {
        if chance(rng, self.config.micro_reaction_chance) {
            let reactions = self.library.seeds(SeedCategory::Affirmation);
            if let Some(reaction) = history.pick_unique(SeedCategory::Affirmation, reactions, rng) {
                return reaction;
            }
        }
        let length = self.choose_comment_length(post, rng);
        self.assemble(length, topic, persona, history, rng)
    }

    /// Assemble and polish a draft of a fixed length.
    pub fn assemble(
        &self,
        length: LengthMode,
        topic: &str,
        persona: &Persona,
        history: &mut SeedHistory,
        rng: &mut StdRng,
    ) -> String {
        let mut voice = TopicVoice::new(topic);
        let draft = match length {
            LengthMode::Short => self.assemble_short(&mut voice, persona, history, rng),
            LengthMode::Medium | LengthMode::Long => {
                self.assemble_prose(length, &mut voice, persona, history, rng)
            }
        };
        self.polish(&draft, voice.direct(), rng)
    }

    fn assemble_short(
        &self,
        voice: &mut TopicVoice,
        persona: &Persona,
        history: &mut SeedHistory,
        rng: &mut StdRng,
    ) -> String {
        let Some(template) = pick_template(&self.library.short_templates, history, rng) else {
            return String::new();
        };
        let tail_category = if chance(rng, self.config.humor_chance) {
            SeedCategory::Humor
        } else {
            SeedCategory::Closing
        };
        template.render(|token| match token {
            Token::Tail => self.seed_line(tail_category, voice, history, rng),
            Token::Intro => self.opener(voice, persona, history, rng),
            Token::ShortReply => self.seed_line(SeedCategory::ShortReply, voice, history, rng),
            _ => None,
        })
    }

    fn assemble_prose(
        &self,
        length: LengthMode,
        voice: &mut TopicVoice,
        persona: &Persona,
        history: &mut SeedHistory,
        rng: &mut StdRng,
    ) -> String {
        let templates = match length {
            LengthMode::Medium => &self.library.medium_templates,
            _ => &self.library.long_templates,
        };
        let Some(template) = pick_template(templates, history, rng) else {
            return String::new();
        };
        let mention = self.company_mention(rng);
        let with_humor = chance(rng, self.config.humor_chance);

        let body = template.render(|token| match token {
            Token::Advice if mention.is_some() => mention.clone(),
            Token::Humor if !with_humor => None,
            Token::Tail => None,
            Token::Intro => self.opener(voice, persona, history, rng),
            token => self.seed_line(seed_category(token)?, voice, history, rng),
        });

        // An intro slot already carries the opener, tone prefix included.
        if template.tokens().next() == Some(Token::Intro) {
            return body;
        }
        let style = StyleMode::pick(history, rng);
        let mut prefixes = Vec::with_capacity(2);
        if chance(rng, self.config.style_prefix_chance) {
            if let Some(opener) = style.openers().choose(rng) {
                prefixes.push(*opener);
            }
        }
        if chance(rng, self.config.tone_prefix_chance) {
            prefixes.push(resolve_tone_prefix(&persona.voice, rng));
        }
        apply_prefixes(&body, &prefixes)
    }

    /// Fill an intro slot: the persona's tone prefix, or an intro seed.
    fn opener(
        &self,
        voice: &mut TopicVoice,
        persona: &Persona,
        history: &mut SeedHistory,
        rng: &mut StdRng,
    ) -> Option<String> {
        if chance(rng, self.config.tone_prefix_chance) {
            let prefix = resolve_tone_prefix(&persona.voice, rng);
            if !prefix.is_empty() {
                return Some(prefix.to_string());
            }
        }
        self.seed_line(SeedCategory::Intro, voice, history, rng)
    }

    fn seed_line(
        &self,
        category: SeedCategory,
        voice: &mut TopicVoice,
        history: &mut SeedHistory,
        rng: &mut StdRng,
    ) -> Option<String> {
        let seed = history.pick_unique(category, self.library.seeds(category), rng)?;
        Some(voice.inject(&seed, rng))
    }

    fn company_mention(&self, rng: &mut StdRng) -> Option<String> {
        if !chance(rng, self.config.company_mention_chance) {
            return None;
        }
        MentionBucket::for_value_prop(&self.company.value_prop)
            .lines(self.library)
            .choose(rng)
            .map(|line| line.replace("{company}", self.company.name.trim()))
    }

    /// Strip any verbatim value proposition, then clean up.
    fn polish(&self, draft: &str, topic: &str, rng: &mut StdRng) -> String {
        let value_prop = self.company.value_prop.trim();
        let stripped = strip_phrase(draft, value_prop);
        let cleaned = self.cleanup.run(&stripped, Some(topic), rng);
        if contains_phrase(&cleaned, value_prop) {
            let again = strip_phrase(&cleaned, value_prop);
            return self.cleanup.run(&again, Some(topic), rng);
        }
        cleaned
    }
}

fn seed_category(token: Token) -> Option<SeedCategory> {
    match token {
        Token::Intro => Some(SeedCategory::Intro),
        Token::Reflection => Some(SeedCategory::Reflection),
        Token::Struggle => Some(SeedCategory::Struggle),
        Token::Advice => Some(SeedCategory::Advice),
        Token::Closing => Some(SeedCategory::Closing),
        Token::ShortReply => Some(SeedCategory::ShortReply),
        Token::Affirmation => Some(SeedCategory::Affirmation),
        Token::Humor => Some(SeedCategory::Humor),
        Token::Tail => None,
    }
}

/// Pick a template through the `Pattern` history, keyed by its source.
fn pick_template<'t>(
    templates: &'t [Template],
    history: &mut SeedHistory,
    rng: &mut StdRng,
) -> Option<&'t Template> {
    let sources: Vec<&str> = templates.iter().map(|t| t.source.as_str()).collect();
    let picked = history.pick_unique(SeedCategory::Pattern, &sources, rng)?;
    templates.iter().find(|t| t.source == picked)
}

/// Lowercasing `text` shifts byte offsets, so word matching is unavailable.
fn offsets_shift(text: &str) -> bool {
    text.to_lowercase().len() != text.len()
}

fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    if offsets_shift(text) {
        return text.contains(phrase);
    }
    !find_word_matches(text, phrase).is_empty()
}

/// Replace whole-word, case-insensitive occurrences of `phrase` with "it".
fn strip_phrase(text: &str, phrase: &str) -> String {
    if phrase.is_empty() {
        return text.to_string();
    }
    if offsets_shift(text) {
        return text.replace(phrase, "it");
    }
    let matches = find_word_matches(text, phrase);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in matches {
        out.push_str(&text[last..start]);
        out.push_str("it");
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::voice::Tone;
    use crate::schema::input::tests::{persona, sample_input};
    use rand::SeedableRng;

    fn fixtures() -> (PhraseLibrary, GenerationConfig, CompanyInfo) {
        (
            PhraseLibrary::builtin().unwrap(),
            GenerationConfig::default(),
            sample_input().company,
        )
    }

    #[test]
    fn short_never_follows_short() {
        let (library, config, company) = fixtures();
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        history.set_last_post_length(LengthMode::Short);
        for seed in 0..300 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_ne!(
                assembler.choose_post_length("sleep", &history, &mut rng),
                LengthMode::Short
            );
        }
    }

    #[test]
    fn complex_topics_lean_long() {
        let (library, config, company) = fixtures();
        let assembler = TextAssembler::new(&library, &config, &company);
        let history = SeedHistory::default();
        let mut rng = StdRng::seed_from_u64(5);
        let count = |topic: &str, rng: &mut StdRng| {
            (0..2000)
                .filter(|_| assembler.choose_post_length(topic, &history, rng) == LengthMode::Short)
                .count()
        };
        let plain = count("sleep", &mut rng);
        let complex = count("best practices for sleep", &mut rng);
        assert!(complex < plain, "complex {complex} vs plain {plain}");
    }

    #[test]
    fn comments_under_long_posts_run_shorter() {
        let (library, config, company) = fixtures();
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut rng = StdRng::seed_from_u64(8);
        let draws: Vec<LengthMode> = (0..2000)
            .map(|_| assembler.choose_comment_length(LengthMode::Long, &mut rng))
            .collect();
        let short = draws.iter().filter(|m| **m == LengthMode::Short).count();
        let long = draws.iter().filter(|m| **m == LengthMode::Long).count();
        assert!(short > long * 2);
    }

    #[test]
    fn post_records_its_length() {
        let (library, config, company) = fixtures();
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        let mut rng = StdRng::seed_from_u64(1);
        let draft = assembler.post("sleep", &persona("Ava", "casual"), &mut history, &mut rng);
        assert_eq!(history.last_post_length(), Some(draft.length));
        assert!(!draft.text.is_empty());
    }

    #[test]
    fn micro_reactions_skip_assembly() {
        let (library, mut config, company) = fixtures();
        config.micro_reaction_chance = 1.0;
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            let comment = assembler.comment(
                "sleep",
                &persona("Ben", "formal"),
                LengthMode::Medium,
                &mut history,
                &mut rng,
            );
            assert!(library.seeds.affirmation.contains(&comment), "{comment}");
        }
    }

    #[test]
    fn drafts_are_clean_and_terminated() {
        let (library, config, company) = fixtures();
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        let cleanup = CleanupPipeline::default();
        for seed in 0..60 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mode = LengthMode::ALL[seed as usize % 3];
            let topic = "common struggles with meal prep";
            let text = assembler.assemble(mode, topic, &persona("Ava", "casual"), &mut history, &mut rng);
            assert!(text.ends_with(['.', '!', '?']), "{text}");
            assert!(!text.contains("{topic}") && !text.contains("  "), "{text}");
            assert!(!text.contains(". ."), "{text}");
            assert_eq!(cleanup.run(&text, Some("meal prep"), &mut rng), text);
        }
    }

    #[test]
    fn short_drafts_use_humor_or_closing_not_both() {
        let (library, mut config, company) = fixtures();
        config.humor_chance = 1.0;
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = assembler
                .assemble(LengthMode::Short, "sleep", &persona("Ava", "casual"), &mut history, &mut rng)
                .to_lowercase();
            assert!(
                !library.seeds.closing.iter().any(|c| text.contains(&c.to_lowercase())),
                "{text}"
            );
        }
    }

    #[test]
    fn company_mentions_use_name_never_value_prop() {
        let (library, mut config, company) = fixtures();
        config.company_mention_chance = 1.0;
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        let mut mentioned = 0;
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = assembler.assemble(
                LengthMode::Long,
                "smart task prioritization",
                &persona("Ava", "casual"),
                &mut history,
                &mut rng,
            );
            assert!(!text.to_lowercase().contains("smart task prioritization"), "{text}");
            if text.contains("Slatebox") {
                mentioned += 1;
            }
        }
        assert!(mentioned > 0);
    }

    #[test]
    fn buckets_match_value_prop_keywords() {
        assert_eq!(
            MentionBucket::for_value_prop("Automates repetitive busywork"),
            MentionBucket::TaskAutomation
        );
        assert_eq!(
            MentionBucket::for_value_prop("Track your training progress"),
            MentionBucket::ProgressTracking
        );
        assert_eq!(
            MentionBucket::for_value_prop("smart task prioritization"),
            MentionBucket::FocusSimplification
        );
        assert_eq!(
            MentionBucket::for_value_prop("artisanal coffee"),
            MentionBucket::Generic
        );
    }

    #[test]
    fn strip_phrase_is_case_insensitive() {
        assert_eq!(
            strip_phrase("I love Smart Task Prioritization a lot", "smart task prioritization"),
            "I love it a lot"
        );
        assert_eq!(
            strip_phrase("smart task prioritization helps", "Smart Task Prioritization"),
            "it helps"
        );
    }

    #[test]
    fn strip_phrase_keeps_words_that_merely_contain_it() {
        assert_eq!(strip_phrase("I refocused on focus", "focus"), "I refocused on it");
        assert_eq!(strip_phrase("Focus, then unfocus.", "focus"), "it, then unfocus.");
        assert!(!contains_phrase("I refocused today", "focus"));
        assert!(contains_phrase("Focus first", "focus"));
    }

    #[test]
    fn capitalized_value_prop_never_leaks() {
        let (library, mut config, mut company) = fixtures();
        config.company_mention_chance = 1.0;
        company.value_prop = "Smart Task Prioritization".to_string();
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mode = LengthMode::ALL[seed as usize % 3];
            let text = assembler.assemble(
                mode,
                "smart task prioritization",
                &persona("Ava", "casual"),
                &mut history,
                &mut rng,
            );
            assert!(!text.to_lowercase().contains("smart task prioritization"), "{text}");
        }
    }

    #[test]
    fn short_drafts_open_with_persona_tone() {
        let (library, mut config, company) = fixtures();
        config.tone_prefix_chance = 1.0;
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        let casual = Tone::Casual.prefixes();
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = assembler.assemble(
                LengthMode::Short,
                "sleep",
                &persona("Ava", "casual"),
                &mut history,
                &mut rng,
            );
            assert!(casual.iter().any(|p| text.starts_with(p)), "{text}");
        }
    }

    #[test]
    fn short_drafts_always_have_an_opener() {
        let (library, mut config, company) = fixtures();
        config.tone_prefix_chance = 0.0;
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = assembler.assemble(
                LengthMode::Short,
                "sleep",
                &persona("Ben", "analytical"),
                &mut history,
                &mut rng,
            );
            assert!(
                library.seeds.intro.iter().any(|intro| text.starts_with(intro.as_str())),
                "{text}"
            );
        }
    }

    #[test]
    fn intro_led_prose_takes_the_tone_prefix() {
        let (library, mut config, company) = fixtures();
        config.tone_prefix_chance = 1.0;
        config.style_prefix_chance = 0.0;
        let mut library = library;
        library.medium_templates = vec![Template::parse("{intro} {reflection}. {advice}.").unwrap()];
        let assembler = TextAssembler::new(&library, &config, &company);
        let mut history = SeedHistory::default();
        let analytical = Tone::Analytical.prefixes();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = assembler.assemble(
                LengthMode::Medium,
                "sleep",
                &persona("Ben", "analytical"),
                &mut history,
                &mut rng,
            );
            assert!(analytical.iter().any(|p| text.starts_with(p)), "{text}");
        }
    }
}
