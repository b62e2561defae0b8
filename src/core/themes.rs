/// Expands raw themes into the topic pool for one build.
///
/// Fully deterministic; variety comes from how the scheduler draws
/// from the pool, never from here.
use rustc_hash::FxHashSet;

/// Reframings applied to every cleaned theme, in pool order.
pub const FRAMINGS: [&str; 7] = [
    "best practices for {}",
    "common struggles with {}",
    "tips on improving {}",
    "how to get better at {}",
    "common mistakes in {}",
    "overlooked aspects of {}",
    "advice for newcomers to {}",
];

/// Awkward theme phrasings and their smoother equivalents.
const THEME_REWRITES: &[(&str, &str)] = &[
    ("how to how to ", "how to "),
    ("ways on how to ", "ways to "),
    ("improving on improving ", "improving "),
    ("in regards to ", "around "),
    ("stuff related to ", ""),
    ("things about ", ""),
    ("the the ", "the "),
];

const MAX_CLAUSES: usize = 2;

/// Clean one raw theme: collapse whitespace, normalize comma joiners to
/// "and", keep at most two clauses, and rewrite known awkward phrasings.
pub fn clean_theme(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c.is_ascii_punctuation() && c != '\'');

    let clauses: Vec<&str> = trimmed
        .split([',', ';', '&'])
        .flat_map(|part| part.split(" and "))
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    let mut theme = clauses
        .iter()
        .take(MAX_CLAUSES)
        .copied()
        .collect::<Vec<_>>()
        .join(" and ");

    for (awkward, smooth) in THEME_REWRITES {
        theme = replace_ignore_case(&theme, awkward, smooth);
    }
    lower_leading_word(theme.trim())
}

/// Expand themes into the topic pool: each cleaned theme followed by its
/// seven reframings. Duplicates across themes are kept once, first wins.
pub fn expand_themes<S: AsRef<str>>(themes: &[S]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut pool = Vec::with_capacity(themes.len() * (FRAMINGS.len() + 1));

    for theme in themes {
        let base = clean_theme(theme.as_ref());
        if base.is_empty() {
            continue;
        }
        let phrasings = std::iter::once(base.clone())
            .chain(FRAMINGS.iter().map(|f| f.replace("{}", &base)));
        for topic in phrasings {
            if seen.insert(topic.to_lowercase()) {
                pool.push(topic);
            }
        }
    }
    pool
}

/// Topic markers that push a post toward medium or long form.
pub const COMPLEX_MARKERS: [&str; 7] = [
    "best practices",
    "common struggles",
    "common challenges",
    "common mistakes",
    "tips on",
    "improving my",
    "how to get better",
];

/// Whether a topic phrase reads as a "complex" subject.
pub fn is_complex_topic(topic: &str) -> bool {
    let lower = topic.to_lowercase();
    COMPLEX_MARKERS.iter().any(|m| lower.contains(m))
}

pub(crate) fn replace_ignore_case(text: &str, needle: &str, replacement: &str) -> String {
    let lower = text.to_lowercase();
    let needle = needle.to_lowercase();
    // Only safe when lowercasing keeps byte offsets.
    if lower.len() != text.len() || needle.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in lower.match_indices(&needle) {
        if start < last {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(replacement);
        last = start + needle.len();
    }
    out.push_str(&text[last..]);
    out
}

/// Lowercase the first letter unless the first word carries an inner
/// capital ("AI tools", "GitHub workflows").
fn lower_leading_word(text: &str) -> String {
    let first_word = text.split_whitespace().next().unwrap_or("");
    if first_word.chars().skip(1).any(char::is_uppercase) {
        return text.to_string();
    }
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
