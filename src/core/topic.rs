/// Reduces a scheduled topic to the phrase used inside prose, and hands out references to it.
use once_cell::sync::Lazy;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::Regex;

static CONTINUATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\(part \d+\)\s*$").unwrap());

/// Framing phrases mapped to the plainer wording used inside prose.
const CANONICAL_SYNONYMS: &[(&str, &str)] = &[
    ("best practices for ", ""),
    ("common struggles with ", ""),
    ("tips on improving ", "improving "),
    ("how to get better at ", "getting better at "),
    ("common mistakes in ", ""),
    ("overlooked aspects of ", ""),
    ("advice for newcomers to ", "getting started with "),
    ("improving my ", "improving "),
];

/// Infinitive verbs and their gerunds for "how to X" smoothing.
const GERUNDS: &[(&str, &str)] = &[
    ("balance", "balancing"),
    ("build", "building"),
    ("find", "finding"),
    ("focus", "focusing"),
    ("get", "getting"),
    ("handle", "handling"),
    ("improve", "improving"),
    ("keep", "keeping"),
    ("learn", "learning"),
    ("make", "making"),
    ("manage", "managing"),
    ("organize", "organizing"),
    ("plan", "planning"),
    ("prioritize", "prioritizing"),
    ("run", "running"),
    ("set", "setting"),
    ("start", "starting"),
    ("stay", "staying"),
    ("track", "tracking"),
    ("train", "training"),
    ("use", "using"),
    ("write", "writing"),
];

const INFINITIVE_LEADS: [&str; 3] = ["how to ", "ways to ", "learning to "];

/// Paraphrases used when a topic is referenced by implication.
pub const IMPLIED_REFERENCES: [&str; 4] = [
    "this whole area",
    "that side of things",
    "stuff like this",
    "this kind of thing",
];

/// How one mention of the topic is phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicReference {
    Direct,
    Implied,
    Pronoun,
}

/// Reduce a scheduled topic to the phrase that reads naturally inside a
/// sentence: drop continuation markers, swap framings for plain wording,
/// smooth infinitive leads into gerunds, and keep at most two clauses.
pub fn simplify_topic(topic: &str) -> String {
    let mut text = CONTINUATION_MARKER.replace(topic.trim(), "").to_string();

    for (framing, plain) in CANONICAL_SYNONYMS {
        if !text.to_lowercase().starts_with(framing) {
            continue;
        }
        if let Some(rest) = text.get(framing.len()..) {
            text = format!("{plain}{rest}");
        }
        break;
    }

    text = smooth_gerund(&text);
    collapse_clauses(&text, 2)
}

/// Rewrite a leading "how to <verb>" into "<verb>ing" when the verb is known.
pub fn smooth_gerund(text: &str) -> String {
    let lower = text.to_lowercase();
    for lead in INFINITIVE_LEADS {
        let Some(rest) = lower.strip_prefix(lead) else {
            continue;
        };
        let verb = rest.split_whitespace().next().unwrap_or("");
        if let Some((_, gerund)) = GERUNDS.iter().find(|(v, _)| *v == verb) {
            let tail = text.get(lead.len() + verb.len()..).unwrap_or("");
            return format!("{gerund}{tail}");
        }
    }
    text.to_string()
}

/// Keep at most `max` clauses of a multi-clause phrase, joined by "and".
pub fn collapse_clauses(text: &str, max: usize) -> String {
    let clauses: Vec<&str> = text
        .split(',')
        .flat_map(|part| part.split(" and "))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    clauses
        .into_iter()
        .take(max.max(1))
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Hands out topic references for one draft. The first mention is
/// always direct; later ones vary to avoid verbatim repetition.
#[derive(Debug, Clone)]
pub struct TopicVoice {
    direct: String,
    mentions: usize,
}

impl TopicVoice {
    pub fn new(topic: &str) -> Self {
        Self {
            direct: simplify_topic(topic),
            mentions: 0,
        }
    }

    pub fn direct(&self) -> &str {
        &self.direct
    }

    pub fn next_reference(&mut self, rng: &mut StdRng) -> String {
        let kind = if self.mentions == 0 {
            TopicReference::Direct
        } else {
            pick_reference_kind(rng)
        };
        self.mentions += 1;
        match kind {
            TopicReference::Direct => self.direct.clone(),
            TopicReference::Implied => IMPLIED_REFERENCES
                .choose(rng)
                .copied()
                .unwrap_or("this")
                .to_string(),
            TopicReference::Pronoun => "it".to_string(),
        }
    }

    /// Replace the `{topic}` placeholder in a seed line, if present.
    pub fn inject(&mut self, seed: &str, rng: &mut StdRng) -> String {
        if seed.contains("{topic}") {
            let reference = self.next_reference(rng);
            seed.replacen("{topic}", &reference, 1)
        } else {
            seed.to_string()
        }
    }
}

fn pick_reference_kind(rng: &mut StdRng) -> TopicReference {
    const KINDS: [TopicReference; 3] = [
        TopicReference::Direct,
        TopicReference::Implied,
        TopicReference::Pronoun,
    ];
    match WeightedIndex::new([2u32, 1, 1]) {
        Ok(dist) => KINDS[dist.sample(rng)],
        Err(_) => TopicReference::Direct,
    }
}
