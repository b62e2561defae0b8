/// Phrase library — seed lines, sentence templates, and their RON loading.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::history::SeedCategory;

/// The library compiled into the crate.
pub const BUILTIN_LIBRARY: &str = include_str!("../../phrase_data/library.ron");

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("template parse error: {0}")]
    TemplateParse(String),
    #[error("unknown template token '{0}'")]
    UnknownToken(String),
    #[error("phrase category '{0}' has no entries")]
    EmptyCategory(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A named slot inside a sentence template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Intro,
    Reflection,
    Struggle,
    Advice,
    Closing,
    ShortReply,
    Affirmation,
    Humor,
    /// Closing line or humor line, whichever the short assembly chose.
    Tail,
}

impl Token {
    pub fn from_name(name: &str) -> Option<Token> {
        match name {
            "intro" => Some(Self::Intro),
            "reflection" => Some(Self::Reflection),
            "struggle" => Some(Self::Struggle),
            "advice" => Some(Self::Advice),
            "closing" => Some(Self::Closing),
            "short_reply" => Some(Self::ShortReply),
            "affirmation" => Some(Self::Affirmation),
            "humor" => Some(Self::Humor),
            "tail" => Some(Self::Tail),
            _ => None,
        }
    }
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// A token slot: `{reflection}`.
    Slot(Token),
}

/// A parsed sentence template. `source` doubles as its identity for
/// the anti-repetition picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub source: String,
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{token}` → `Slot`
    /// - `{{` / `}}` → literal braces
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, LibraryError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            match chars[i] {
                '{' if i + 1 < len && chars[i + 1] == '{' => {
                    literal_buf.push('{');
                    i += 2;
                }
                '{' => {
                    if !literal_buf.is_empty() {
                        segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                    }

                    let start = i + 1;
                    let mut end = start;
                    while end < len && chars[end] != '}' {
                        if chars[end] == '{' {
                            return Err(LibraryError::TemplateParse(
                                "nested braces are not allowed".to_string(),
                            ));
                        }
                        end += 1;
                    }
                    if end == len {
                        return Err(LibraryError::TemplateParse("unclosed brace".to_string()));
                    }

                    let name: String = chars[start..end].iter().collect();
                    if name.is_empty() {
                        return Err(LibraryError::TemplateParse("empty braces".to_string()));
                    }
                    let token =
                        Token::from_name(&name).ok_or(LibraryError::UnknownToken(name))?;
                    segments.push(TemplateSegment::Slot(token));
                    i = end + 1;
                }
                '}' if i + 1 < len && chars[i + 1] == '}' => {
                    literal_buf.push('}');
                    i += 2;
                }
                '}' => {
                    return Err(LibraryError::TemplateParse(
                        "unmatched closing brace".to_string(),
                    ));
                }
                c => {
                    literal_buf.push(c);
                    i += 1;
                }
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template {
            source: input.to_string(),
            segments,
        })
    }

    /// Tokens referenced by this template, in order.
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Slot(t) => Some(*t),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Fill the template. Slots without a value render as empty strings;
    /// the cleanup pipeline drops the empty sentences that leaves behind.
    ///
    /// A value that follows a comma-terminated value (an intro such as
    /// "Yeah,") has its first letter lowered.
    pub fn render<F>(&self, mut value_of: F) -> String
    where
        F: FnMut(Token) -> Option<String>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Slot(token) => {
                    let value = value_of(*token).unwrap_or_default();
                    if out.trim_end().ends_with(',') {
                        out.push_str(&crate::core::voice::lower_first(&value));
                    } else {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }
}

/// Seed lines per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedLines {
    pub intro: Vec<String>,
    pub reflection: Vec<String>,
    pub struggle: Vec<String>,
    pub advice: Vec<String>,
    pub closing: Vec<String>,
    pub short_reply: Vec<String>,
    pub affirmation: Vec<String>,
    pub humor: Vec<String>,
}

/// Hand-written company sentences, bucketed by what the product does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyMentions {
    pub task_automation: Vec<String>,
    pub progress_tracking: Vec<String>,
    pub focus_simplification: Vec<String>,
    pub generic: Vec<String>,
}

/// The full phrase library used by the assembler.
#[derive(Debug, Clone)]
pub struct PhraseLibrary {
    pub seeds: SeedLines,
    pub short_templates: Vec<Template>,
    pub medium_templates: Vec<Template>,
    pub long_templates: Vec<Template>,
    pub company_mentions: CompanyMentions,
}

// RON shape of the library: templates are stored as plain strings.
#[derive(Debug, Deserialize)]
struct RonLibrary {
    seeds: SeedLines,
    short_templates: Vec<String>,
    medium_templates: Vec<String>,
    long_templates: Vec<String>,
    company_mentions: CompanyMentions,
}

impl PhraseLibrary {
    /// The built-in library.
    pub fn builtin() -> Result<PhraseLibrary, LibraryError> {
        Self::parse_ron(BUILTIN_LIBRARY)
    }

    /// Load a library from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<PhraseLibrary, LibraryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a library from a RON string. Every seed category, template
    /// list and the generic company bucket must be non-empty.
    pub fn parse_ron(input: &str) -> Result<PhraseLibrary, LibraryError> {
        let raw: RonLibrary = ron::from_str(input)?;

        let library = PhraseLibrary {
            seeds: raw.seeds,
            short_templates: parse_templates(&raw.short_templates)?,
            medium_templates: parse_templates(&raw.medium_templates)?,
            long_templates: parse_templates(&raw.long_templates)?,
            company_mentions: raw.company_mentions,
        };
        library.check_non_empty()?;
        Ok(library)
    }

    /// Seed lines for a phrase category. `Pattern` and `StyleMode` are
    /// not phrase categories and have no seed lines.
    pub fn seeds(&self, category: SeedCategory) -> &[String] {
        let s = &self.seeds;
        match category {
            SeedCategory::Intro => &s.intro,
            SeedCategory::Reflection => &s.reflection,
            SeedCategory::Struggle => &s.struggle,
            SeedCategory::Advice => &s.advice,
            SeedCategory::Closing => &s.closing,
            SeedCategory::ShortReply => &s.short_reply,
            SeedCategory::Affirmation => &s.affirmation,
            SeedCategory::Humor => &s.humor,
            SeedCategory::Pattern | SeedCategory::StyleMode => &[],
        }
    }

    /// Every seed line in the library, for auditing tools.
    pub fn all_seed_lines(&self) -> impl Iterator<Item = &str> {
        SeedCategory::ALL
            .into_iter()
            .flat_map(move |c| self.seeds(c).iter().map(String::as_str))
    }

    fn check_non_empty(&self) -> Result<(), LibraryError> {
        let lists: [(&str, usize); 12] = [
            ("intro", self.seeds.intro.len()),
            ("reflection", self.seeds.reflection.len()),
            ("struggle", self.seeds.struggle.len()),
            ("advice", self.seeds.advice.len()),
            ("closing", self.seeds.closing.len()),
            ("short_reply", self.seeds.short_reply.len()),
            ("affirmation", self.seeds.affirmation.len()),
            ("humor", self.seeds.humor.len()),
            ("short_templates", self.short_templates.len()),
            ("medium_templates", self.medium_templates.len()),
            ("long_templates", self.long_templates.len()),
            ("company_mentions.generic", self.company_mentions.generic.len()),
        ];
        match lists.iter().find(|(_, len)| *len == 0) {
            Some((name, _)) => Err(LibraryError::EmptyCategory(name.to_string())),
            None => Ok(()),
        }
    }
}

fn parse_templates(sources: &[String]) -> Result<Vec<Template>, LibraryError> {
    sources.iter().map(|s| Template::parse(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Hello, world.".to_string())]
        );
    }

    #[test]
    fn parse_slots_and_literals() {
        let t = Template::parse("{reflection}. {struggle}.").unwrap();
        assert_eq!(
            t.segments,
            vec![
                TemplateSegment::Slot(Token::Reflection),
                TemplateSegment::Literal(". ".to_string()),
                TemplateSegment::Slot(Token::Struggle),
                TemplateSegment::Literal(".".to_string()),
            ]
        );
        assert_eq!(t.tokens().collect::<Vec<_>>(), vec![Token::Reflection, Token::Struggle]);
    }

    #[test]
    fn parse_escaped_braces() {
        let t = Template::parse("Use {{braces}} here.").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Use {braces} here.".to_string())]
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(Template::parse("Bad {} here"), Err(LibraryError::TemplateParse(_))));
        assert!(Template::parse("Bad {outer{inner}} here").is_err());
        assert!(Template::parse("Bad {unclosed here").is_err());
        assert!(Template::parse("Bad } here").is_err());
        assert!(matches!(
            Template::parse("{sparkle}"),
            Err(LibraryError::UnknownToken(name)) if name == "sparkle"
        ));
    }

    #[test]
    fn render_leaves_missing_slots_empty() {
        let t = Template::parse("{reflection}. {humor}. {advice}.").unwrap();
        let out = t.render(|token| match token {
            Token::Reflection => Some("First".to_string()),
            Token::Advice => Some("Third".to_string()),
            _ => None,
        });
        assert_eq!(out, "First. . Third.");
    }

    #[test]
    fn render_lowers_value_after_comma_intro() {
        let t = Template::parse("{intro} {reflection}.").unwrap();
        let out = t.render(|token| match token {
            Token::Intro => Some("Yeah,".to_string()),
            Token::Reflection => Some("Most people skip this".to_string()),
            _ => None,
        });
        assert_eq!(out, "Yeah, most people skip this.");
    }

    #[test]
    fn builtin_library_loads() {
        let library = PhraseLibrary::builtin().unwrap();
        assert_eq!(library.medium_templates.len(), 4);
        assert_eq!(library.long_templates.len(), 9);
        assert!(!library.short_templates.is_empty());
        for category in SeedCategory::ALL {
            match category {
                SeedCategory::Pattern | SeedCategory::StyleMode => {
                    assert!(library.seeds(category).is_empty())
                }
                _ => assert!(!library.seeds(category).is_empty(), "{category:?} empty"),
            }
        }
    }

    #[test]
    fn builtin_short_templates_open_on_an_intro() {
        let library = PhraseLibrary::builtin().unwrap();
        for template in &library.short_templates {
            assert_eq!(template.tokens().next(), Some(Token::Intro), "{}", template.source);
        }
    }

    #[test]
    fn builtin_seed_lines_are_unterminated() {
        let library = PhraseLibrary::builtin().unwrap();
        for category in [
            SeedCategory::Reflection,
            SeedCategory::Struggle,
            SeedCategory::Advice,
            SeedCategory::Closing,
            SeedCategory::ShortReply,
            SeedCategory::Humor,
        ] {
            for line in library.seeds(category) {
                assert!(
                    !line.ends_with(['.', '!', '?']),
                    "{category:?} line carries its own terminator: {line}"
                );
            }
        }
    }

    #[test]
    fn empty_category_rejected() {
        let start = BUILTIN_LIBRARY.find("humor: [").unwrap();
        let end = start + BUILTIN_LIBRARY[start..].find(']').unwrap();
        let input = format!("{}humor: [{}", &BUILTIN_LIBRARY[..start], &BUILTIN_LIBRARY[end..]);
        assert!(matches!(
            PhraseLibrary::parse_ron(&input),
            Err(LibraryError::EmptyCategory(name)) if name == "humor"
        ));
    }

    #[test]
    fn malformed_ron_rejected() {
        assert!(matches!(
            PhraseLibrary::parse_ron("(seeds: ("),
            Err(LibraryError::Ron(_))
        ));
    }
}
