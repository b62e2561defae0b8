/// Cleanup pipeline — ordered text-rewrite passes applied to every draft.
///
/// Rewrites are data: each pass that pattern-matches owns a [`RuleSet`] of
/// (matcher, rewrite) rules evaluated in order. The full pass sequence is
/// repeated until the text stops changing, so running the pipeline on its
/// own output is a no-op.
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::{Captures, Regex};

/// How a matched span is rewritten.
#[derive(Debug, Clone, Copy)]
pub enum Rewrite {
    /// Regex replacement string; `$1`-style group references allowed.
    Template(&'static str),
    /// One alternative chosen at random per match.
    OneOf(&'static [&'static str]),
    /// Keep the match but map its last capture group through a table.
    MapLastGroup(&'static [(&'static str, &'static str)]),
}

/// A single matcher/rewriter pair.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub rewrite: Rewrite,
}

impl RewriteRule {
    pub fn apply(&self, text: &str, rng: &mut StdRng) -> String {
        match self.rewrite {
            Rewrite::Template(replacement) => {
                self.pattern.replace_all(text, replacement).into_owned()
            }
            Rewrite::OneOf(alternatives) => self
                .pattern
                .replace_all(text, |caps: &Captures| {
                    alternatives
                        .choose(rng)
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
            Rewrite::MapLastGroup(table) => self
                .pattern
                .replace_all(text, |caps: &Captures| map_last_group(caps, table))
                .into_owned(),
        }
    }

    /// Literal outputs this rule can produce. Templates with group
    /// references and mapped groups are left out.
    pub fn literal_outputs(&self) -> Vec<&'static str> {
        match self.rewrite {
            Rewrite::Template(r) if !r.contains('$') => vec![r],
            Rewrite::Template(_) => Vec::new(),
            Rewrite::OneOf(alternatives) => alternatives.to_vec(),
            Rewrite::MapLastGroup(table) => table.iter().map(|(_, to)| *to).collect(),
        }
    }
}

fn map_last_group(caps: &Captures, table: &[(&str, &str)]) -> String {
    let whole = &caps[0];
    let Some(group) = (1..caps.len()).rev().find_map(|i| caps.get(i)) else {
        return whole.to_string();
    };
    let base = caps.get(0).map(|m| m.start()).unwrap_or(0);
    let key = group.as_str().to_lowercase();
    match table.iter().find(|(from, _)| *from == key) {
        Some((_, to)) => format!(
            "{}{}{}",
            &whole[..group.start() - base],
            to,
            &whole[group.end() - base..]
        ),
        None => whole.to_string(),
    }
}

/// An ordered table of rewrite rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: &'static str,
    pub rules: Vec<RewriteRule>,
}

impl RuleSet {
    fn new(name: &'static str, rules: &[(&'static str, &str, Rewrite)]) -> RuleSet {
        RuleSet {
            name,
            rules: rules
                .iter()
                .map(|&(rule_name, pattern, rewrite)| RewriteRule {
                    name: rule_name,
                    pattern: Regex::new(pattern).unwrap(),
                    rewrite,
                })
                .collect(),
        }
    }

    /// Apply every rule in order, each on the previous rule's output.
    pub fn apply(&self, text: &str, rng: &mut StdRng) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc, rng))
    }

    /// Rules whose literal output is matched again by a rule in this
    /// table, as `(producing rule, matching rule, output)`.
    pub fn self_triggering(&self) -> Vec<(&'static str, &'static str, &'static str)> {
        let mut found = Vec::new();
        for producer in &self.rules {
            for output in producer.literal_outputs() {
                for matcher in &self.rules {
                    if matcher.pattern.is_match(output) {
                        found.push((producer.name, matcher.name, output));
                    }
                }
            }
        }
        found
    }
}

static FILLER_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "filler",
        &[
            (
                "end_of_day",
                r"(?i)\bat the end of the day\b",
                Rewrite::OneOf(&["ultimately", "in the end"]),
            ),
            (
                "is_what_it_is",
                r"(?i)\bit is what it is\b",
                Rewrite::OneOf(&["that's just how it goes", "that's the reality"]),
            ),
            (
                "needless_to_say",
                r"(?i)\bneedless to say\b",
                Rewrite::OneOf(&["of course", "naturally"]),
            ),
            ("in_order_to", r"(?i)\bin order to\b", Rewrite::OneOf(&["to"])),
            (
                "due_to_the_fact",
                r"(?i)\bdue to the fact that\b",
                Rewrite::OneOf(&["because", "since"]),
            ),
            (
                "kind_of_sort_of",
                r"(?i)\bkind of sort of\b",
                Rewrite::OneOf(&["somewhat", "a bit"]),
            ),
            (
                "thing_is_is",
                r"(?i)\bthe thing is,? is that\b",
                Rewrite::OneOf(&["the thing is", "the point is"]),
            ),
            (
                "point_in_time",
                r"(?i)\bat this point in time\b",
                Rewrite::OneOf(&["right now", "at this point"]),
            ),
            (
                "intents_and_purposes",
                r"(?i)\bfor all intents and purposes\b",
                Rewrite::OneOf(&["basically", "in practice"]),
            ),
        ],
    )
});

const PLURAL_AGREEMENT: &[(&str, &str)] = &[
    ("is", "are"),
    ("was", "were"),
    ("has", "have"),
    ("does", "do"),
    ("isn't", "aren't"),
    ("wasn't", "weren't"),
    ("doesn't", "don't"),
    ("struggles", "struggle"),
    ("needs", "need"),
    ("wants", "want"),
    ("tends", "tend"),
    ("seems", "seem"),
    ("makes", "make"),
    ("gets", "get"),
    ("feels", "feel"),
];

static AGREEMENT_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "agreement",
        &[(
            "plural_subject_singular_verb",
            r"(?i)(^|[.!?]\s+)((?:most |many |some |a lot of |lots of )?(?:people|beginners|newcomers|teams|folks|founders|runners|users|habits|routines))\s+(is|was|has|does|isn't|wasn't|doesn't|struggles|needs|wants|tends|seems|makes|gets|feels)\b",
            Rewrite::MapLastGroup(PLURAL_AGREEMENT),
        )],
    )
});

static PUNCTUATION_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "punctuation",
        &[
            ("space_before_mark", r"\s+([,.!?;:])", Rewrite::Template("$1")),
            ("repeated_soft_marks", r"([,;:])[,;:]+", Rewrite::Template("$1")),
            ("soft_before_hard", r"[,;:]+([.!?])", Rewrite::Template("$1")),
            ("hard_before_soft", r"([.!?])[,;:]+", Rewrite::Template("$1")),
            ("repeated_terminators", r"([.!?])[.!?]+", Rewrite::Template("$1")),
            ("space_after_soft_mark", r"([,;!?])([A-Za-z])", Rewrite::Template("$1 $2")),
            ("space_after_period", r"(\.)([A-Z])", Rewrite::Template("$1 $2")),
            ("leading_marks", r"^[\s,.;:!?]+", Rewrite::Template("")),
            ("lowercase_i", r"\bi\b", Rewrite::Template("I")),
        ],
    )
});

static SMOOTHING_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "smoothing",
        &[
            ("dash_spacing", r"\s*(?:--+|—|–)\s*", Rewrite::Template(" - ")),
            ("whitespace", r"\s{2,}|[\t\n\r]", Rewrite::Template(" ")),
        ],
    )
});

static CONNECTIVE_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "connectives",
        &[
            ("but_but", r"(?i)\b(but)(?:\s+but)+\b", Rewrite::Template("$1")),
            ("and_and", r"(?i)\b(and)(?:\s+and)+\b", Rewrite::Template("$1")),
            ("so_so", r"(?i)\b(so)(?:\s+so)+\b", Rewrite::Template("$1")),
            ("or_or", r"(?i)\b(or)(?:\s+or)+\b", Rewrite::Template("$1")),
            ("then_then", r"(?i)\b(then)(?:\s+then)+\b", Rewrite::Template("$1")),
            ("because_because", r"(?i)\b(because)(?:\s+because)+\b", Rewrite::Template("$1")),
        ],
    )
});

static PHRASE_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "phrases",
        &[
            ("could_of", r"(?i)\bcould of\b", Rewrite::Template("could have")),
            ("should_of", r"(?i)\bshould of\b", Rewrite::Template("should have")),
            ("would_of", r"(?i)\bwould of\b", Rewrite::Template("would have")),
            ("more_better", r"(?i)\bmore better\b", Rewrite::Template("better")),
            ("most_easiest", r"(?i)\bmost easiest\b", Rewrite::Template("easiest")),
            ("in_regards_to", r"(?i)\bin regards to\b", Rewrite::Template("regarding")),
            ("alot", r"(?i)\balot\b", Rewrite::Template("a lot")),
            ("irregardless", r"(?i)\birregardless\b", Rewrite::Template("regardless")),
            (
                "better_at_getting_better",
                r"(?i)\bgetting better at getting better\b",
                Rewrite::Template("getting better"),
            ),
            (
                "started_with_getting_started",
                r"(?i)\bgetting started with getting started\b",
                Rewrite::Template("getting started"),
            ),
        ],
    )
});

/// Replacements for repeated mentions of the topic.
pub const TOPIC_STAND_INS: [&str; 4] = ["it", "this", "that", "the whole thing"];

/// One pass of the cleanup pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPass {
    TopicRepetition,
    FillerReplacement,
    GrammarPolish,
    WhitespaceSmoothing,
    PhraseSubstitution,
    DuplicateSentences,
}

impl CleanupPass {
    pub const ORDER: [CleanupPass; 6] = [
        CleanupPass::TopicRepetition,
        CleanupPass::FillerReplacement,
        CleanupPass::GrammarPolish,
        CleanupPass::WhitespaceSmoothing,
        CleanupPass::PhraseSubstitution,
        CleanupPass::DuplicateSentences,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TopicRepetition => "topic_repetition",
            Self::FillerReplacement => "filler_replacement",
            Self::GrammarPolish => "grammar_polish",
            Self::WhitespaceSmoothing => "whitespace_smoothing",
            Self::PhraseSubstitution => "phrase_substitution",
            Self::DuplicateSentences => "duplicate_sentences",
        }
    }

    pub fn apply(&self, text: &str, topic: Option<&str>, rng: &mut StdRng) -> String {
        match self {
            Self::TopicRepetition => match topic {
                Some(topic) => reduce_topic_repetition(text, topic, rng),
                None => text.to_string(),
            },
            Self::FillerReplacement => FILLER_RULES.apply(text, rng),
            Self::GrammarPolish => grammar_polish(text, rng),
            Self::WhitespaceSmoothing => smooth_whitespace(text, rng),
            Self::PhraseSubstitution => PHRASE_RULES.apply(text, rng),
            Self::DuplicateSentences => remove_duplicate_sentences(text),
        }
    }
}

/// The rule tables behind the pattern-driven passes, for auditing.
pub fn rule_tables() -> [&'static RuleSet; 6] {
    [
        &*FILLER_RULES,
        &*AGREEMENT_RULES,
        &*PUNCTUATION_RULES,
        &*SMOOTHING_RULES,
        &*CONNECTIVE_RULES,
        &*PHRASE_RULES,
    ]
}

/// The ordered cleanup pipeline.
#[derive(Debug, Clone)]
pub struct CleanupPipeline {
    passes: Vec<CleanupPass>,
    max_rounds: usize,
}

impl Default for CleanupPipeline {
    fn default() -> Self {
        Self {
            passes: CleanupPass::ORDER.to_vec(),
            max_rounds: 8,
        }
    }
}

impl CleanupPipeline {
    pub fn passes(&self) -> &[CleanupPass] {
        &self.passes
    }

    /// Polish a draft. `topic` is the phrase as it appears in the draft.
    pub fn run(&self, text: &str, topic: Option<&str>, rng: &mut StdRng) -> String {
        let mut current = text.to_string();
        for _ in 0..self.max_rounds {
            let next = self.run_once(&current, topic, rng);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// A single sweep through every pass in order.
    pub fn run_once(&self, text: &str, topic: Option<&str>, rng: &mut StdRng) -> String {
        self.passes
            .iter()
            .fold(text.to_string(), |acc, pass| pass.apply(&acc, topic, rng))
    }
}

/// Keep the first mention of `topic`; swap later ones for stand-ins.
pub fn reduce_topic_repetition(text: &str, topic: &str, rng: &mut StdRng) -> String {
    let topic = topic.trim();
    let occurrences = find_word_matches(text, topic);
    if occurrences.len() < 2 {
        return text.to_string();
    }
    let stand_ins: Vec<&str> = TOPIC_STAND_INS
        .iter()
        .copied()
        .filter(|s| find_word_matches(s, topic).is_empty())
        .collect();
    if stand_ins.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in occurrences.into_iter().skip(1) {
        out.push_str(&text[last..start]);
        out.push_str(stand_ins.choose(rng).copied().unwrap_or("it"));
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

/// Case-insensitive, whole-word occurrences of `needle` as byte ranges.
pub(crate) fn find_word_matches(text: &str, needle: &str) -> Vec<(usize, usize)> {
    let lower = text.to_lowercase();
    let needle = needle.to_lowercase();
    if needle.is_empty() || lower.len() != text.len() {
        return Vec::new();
    }
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '\'');
    lower
        .match_indices(&needle)
        .map(|(start, m)| (start, start + m.len()))
        .filter(|&(start, end)| {
            !is_word(lower[..start].chars().next_back()) && !is_word(lower[end..].chars().next())
        })
        .collect()
}

fn grammar_polish(text: &str, rng: &mut StdRng) -> String {
    let text = AGREEMENT_RULES.apply(text, rng);
    let text = collapse_repeated_spans(&text, 3);
    let text = PUNCTUATION_RULES.apply(&text, rng);
    let text = capitalize_sentences(text.trim());
    ensure_terminal_punctuation(&text)
}

fn smooth_whitespace(text: &str, rng: &mut StdRng) -> String {
    let text = SMOOTHING_RULES.apply(text, rng);
    let text = collapse_repeated_spans(text.trim(), 5);
    CONNECTIVE_RULES.apply(&text, rng)
}

const SOFT_MARKS: [char; 4] = [',', ';', ':', '-'];
const TERMINATORS: [char; 3] = ['.', '!', '?'];

fn split_trailing_marks(token: &str) -> (&str, &str) {
    let word = token.trim_end_matches(|c: char| TERMINATORS.contains(&c) || SOFT_MARKS.contains(&c));
    (word, &token[word.len()..])
}

/// Collapse immediately repeated word spans of up to `max_span` words
/// ("really really", "on the plan on the plan"). Spans never cross a
/// punctuation mark; the second copy's trailing mark is kept.
pub fn collapse_repeated_spans(text: &str, max_span: usize) -> String {
    let mut tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();

    'scan: loop {
        for n in (1..=max_span).rev() {
            if tokens.len() < 2 * n {
                continue;
            }
            for i in 0..=tokens.len() - 2 * n {
                if spans_repeat(&tokens[i..i + n], &tokens[i + n..i + 2 * n]) {
                    let (_, marks) = split_trailing_marks(&tokens[i + 2 * n - 1]);
                    let marks = marks.to_string();
                    tokens[i + n - 1].push_str(&marks);
                    tokens.drain(i + n..i + 2 * n);
                    continue 'scan;
                }
            }
        }
        break;
    }

    tokens.join(" ")
}

fn spans_repeat(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b).enumerate().all(|(k, (x, y))| {
        let (wx, mx) = split_trailing_marks(x);
        let (wy, my) = split_trailing_marks(y);
        let words_match = !wx.is_empty()
            && wx.chars().any(char::is_alphanumeric)
            && wx.to_lowercase() == wy.to_lowercase();
        let last_of_b = k == b.len() - 1;
        words_match && mx.is_empty() && (last_of_b || my.is_empty())
    })
}

fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_start = true;
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if prev.is_some_and(|p| TERMINATORS.contains(&p)) && c.is_whitespace() {
            at_start = true;
        }
        if at_start && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
            at_start = false;
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

fn ensure_terminal_punctuation(text: &str) -> String {
    let trimmed = text.trim_end();
    match trimmed.chars().last() {
        None => String::new(),
        Some(c) if TERMINATORS.contains(&c) => trimmed.to_string(),
        Some(c) if SOFT_MARKS.contains(&c) => {
            let body = trimmed.trim_end_matches(|c: char| SOFT_MARKS.contains(&c) || c.is_whitespace());
            if body.is_empty() {
                String::new()
            } else {
                ensure_terminal_punctuation(body)
            }
        }
        Some(_) => format!("{trimmed}."),
    }
}

/// Split on sentence boundaries and drop any sentence that repeats the
/// one before it (case-insensitive, ignoring its terminator).
pub fn remove_duplicate_sentences(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut last_key: Option<String> = None;
    for sentence in split_sentences(text) {
        let key = sentence
            .trim_end_matches(|c: char| TERMINATORS.contains(&c))
            .trim()
            .to_lowercase();
        if last_key.as_deref() == Some(key.as_str()) {
            continue;
        }
        last_key = Some(key);
        kept.push(sentence);
    }
    kept.join(" ")
}

/// Sentences of `text`, trimmed, terminators attached.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !TERMINATORS.contains(&c) {
            continue;
        }
        let boundary = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if boundary {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}
