/// Voice system — persona tone prefixes and style-mode openers.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::core::history::{SeedCategory, SeedHistory};

/// The tone a persona writes in, resolved from its free-form voice label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Casual,
    Friendly,
    Analytical,
    Formal,
    Professional,
}

impl Default for Tone {
    fn default() -> Self {
        Self::Friendly
    }
}

impl Tone {
    /// Resolve a voice label. Matching is by keyword so labels like
    /// "Casual and a bit sarcastic" still resolve; anything unknown
    /// (including an empty label) is `Friendly`.
    pub fn from_label(label: &str) -> Tone {
        let label = label.trim().to_lowercase();
        [
            ("informal", Tone::Casual),
            ("casual", Tone::Casual),
            ("analytical", Tone::Analytical),
            ("formal", Tone::Formal),
            ("professional", Tone::Professional),
            ("friendly", Tone::Friendly),
        ]
        .into_iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|(_, tone)| tone)
        .unwrap_or_default()
    }

    /// Opening phrases for this tone. Each ends with a comma so the
    /// following clause starts lowercase.
    pub fn prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::Casual => &["Honestly,", "Not gonna lie,", "Real talk,", "Okay so,"],
            Self::Friendly => &[
                "Just wanted to share,",
                "Hope this helps someone,",
                "For what it's worth,",
            ],
            Self::Analytical => &[
                "Looking at it objectively,",
                "If you break it down,",
                "From what I've measured,",
            ],
            Self::Formal => &[
                "In my experience,",
                "From what I have observed,",
                "Speaking from experience,",
            ],
            Self::Professional => &[
                "From a practical standpoint,",
                "In my day-to-day work,",
                "Working with clients,",
            ],
        }
    }
}

/// Pick a tone prefix for a persona's voice label.
pub fn resolve_tone_prefix(voice_label: &str, rng: &mut StdRng) -> &'static str {
    Tone::from_label(voice_label)
        .prefixes()
        .choose(rng)
        .copied()
        .unwrap_or("")
}

/// Overall flavour of a single draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleMode {
    Analytical,
    Introspective,
    Motivational,
    Casual,
}

impl StyleMode {
    pub const ALL: [StyleMode; 4] = [
        StyleMode::Analytical,
        StyleMode::Introspective,
        StyleMode::Motivational,
        StyleMode::Casual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Analytical => "analytical",
            Self::Introspective => "introspective",
            Self::Motivational => "motivational",
            Self::Casual => "casual",
        }
    }

    pub fn from_name(name: &str) -> Option<StyleMode> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn openers(&self) -> &'static [&'static str] {
        match self {
            Self::Analytical => &["Thinking about it logically,", "When I look at the pattern,"],
            Self::Introspective => &["Looking back,", "The more I reflect on it,"],
            Self::Motivational => &["If you're stuck right now,", "For anyone feeling behind,"],
            Self::Casual => &["So yeah,", "Anyway,"],
        }
    }

    /// Pick the next style mode through the anti-repetition picker.
    pub fn pick(history: &mut SeedHistory, rng: &mut StdRng) -> StyleMode {
        let names = Self::ALL.map(|m| m.name());
        history
            .pick_unique(SeedCategory::StyleMode, &names, rng)
            .and_then(|name| Self::from_name(&name))
            .unwrap_or(StyleMode::Casual)
    }
}

/// Join an optional style opener and tone prefix ahead of `body`.
///
/// The body's first letter is lowered unless it starts with the pronoun "I".
pub fn apply_prefixes(body: &str, prefixes: &[&str]) -> String {
    let prefixes: Vec<&str> = prefixes
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if prefixes.is_empty() || body.is_empty() {
        return body.to_string();
    }

    // Only the first prefix keeps its capital.
    let mut joined = String::new();
    for (i, prefix) in prefixes.iter().enumerate() {
        if i == 0 {
            joined.push_str(prefix);
        } else {
            joined.push(' ');
            joined.push_str(&lower_first(prefix));
        }
    }
    format!("{} {}", joined, lower_first(body))
}

pub(crate) fn lower_first(text: &str) -> String {
    let first_word = text.split_whitespace().next().unwrap_or("");
    let keeps_capital = first_word == "I"
        || first_word.starts_with("I'")
        || first_word.chars().nth(1).is_some_and(|c| c.is_uppercase());
    if keeps_capital {
        return text.to_string();
    }
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn labels_resolve_by_keyword() {
        assert_eq!(Tone::from_label("casual"), Tone::Casual);
        assert_eq!(Tone::from_label("  Analytical "), Tone::Analytical);
        assert_eq!(Tone::from_label("formal but kind"), Tone::Formal);
        assert_eq!(Tone::from_label("Professional"), Tone::Professional);
    }

    #[test]
    fn unknown_or_empty_voice_is_friendly() {
        assert_eq!(Tone::from_label(""), Tone::Friendly);
        assert_eq!(Tone::from_label("mysterious"), Tone::Friendly);
    }

    #[test]
    fn prefix_comes_from_resolved_tone() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let prefix = resolve_tone_prefix("formal", &mut rng);
            assert!(Tone::Formal.prefixes().contains(&prefix));
        }
    }

    #[test]
    fn style_mode_rotates() {
        let mut history = SeedHistory::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut previous: Vec<StyleMode> = Vec::new();
        for _ in 0..12 {
            let mode = StyleMode::pick(&mut history, &mut rng);
            let n = previous.len();
            assert!(!previous[n.saturating_sub(2)..].contains(&mode));
            previous.push(mode);
        }
    }

    #[test]
    fn prefixes_lower_the_body() {
        let out = apply_prefixes("Most people skip warmups.", &["Looking back,", "Honestly,"]);
        assert_eq!(out, "Looking back, honestly, most people skip warmups.");
    }

    #[test]
    fn pronoun_i_keeps_capital() {
        assert_eq!(
            apply_prefixes("I stopped doing that.", &["Real talk,"]),
            "Real talk, I stopped doing that."
        );
        assert_eq!(
            apply_prefixes("AI tools helped.", &["Honestly,"]),
            "Honestly, AI tools helped."
        );
    }

    #[test]
    fn no_prefixes_is_identity() {
        assert_eq!(apply_prefixes("Same text.", &[]), "Same text.");
        assert_eq!(apply_prefixes("Same text.", &["  "]), "Same text.");
    }
}
