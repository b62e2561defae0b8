use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::calendar::{Community, DEFAULT_COMMUNITY_PREFIX};
use crate::core::themes::{clean_theme, expand_themes};

/// Reasons a calendar request is rejected before any slot is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("at least 2 personas are required, got {0}")]
    TooFewPersonas(usize),
    #[error("persona count must be at least 2, got {0}")]
    CountTooSmall(u32),
    #[error("at least one community is required")]
    NoCommunities,
    #[error("at least one theme is required")]
    NoThemes,
    #[error("postsPerWeek must be a positive integer, got {0}")]
    InvalidPostsPerWeek(u32),
    #[error("required field is missing or blank: {0}")]
    MissingField(String),
    #[error("persona name is used more than once: {0}")]
    DuplicatePersona(String),
}

/// The company the calendar is written on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    pub value_prop: String,
    pub ideal_customer: String,
    pub tone: String,
}

/// A posting identity. `name` is the unique key across a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub name: String,
    pub background: String,
    /// Free-form voice label, e.g. "casual" or "analytical".
    #[serde(default)]
    pub voice: String,
    pub pain_points: Vec<String>,
}

/// A complete calendar request, as handed over by the request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarInput {
    pub company: CompanyInfo,
    pub personas: Vec<Persona>,
    pub count: u32,
    pub communities: Vec<String>,
    pub themes: Vec<String>,
    pub posts_per_week: u32,
    /// Explicit week start (continuation override), ISO `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<chrono::NaiveDate>,
}

impl CalendarInput {
    /// Parse a request from its JSON form. Field-level checks still
    /// require a call to [`CalendarInput::validate`].
    pub fn from_json(input: &str) -> Result<CalendarInput, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Check every structural constraint on the request.
    ///
    /// Persona, community and theme counts are checked first so the
    /// error names the most fundamental problem.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.personas.len() < 2 {
            return Err(InputError::TooFewPersonas(self.personas.len()));
        }
        if self.communities.is_empty() {
            return Err(InputError::NoCommunities);
        }
        if self.themes.is_empty() {
            return Err(InputError::NoThemes);
        }
        if self.count < 2 {
            return Err(InputError::CountTooSmall(self.count));
        }
        if self.posts_per_week == 0 {
            return Err(InputError::InvalidPostsPerWeek(self.posts_per_week));
        }

        require_text("company.name", &self.company.name)?;
        require_text("company.valueProp", &self.company.value_prop)?;
        require_text("company.idealCustomer", &self.company.ideal_customer)?;
        require_text("company.tone", &self.company.tone)?;

        let mut seen = FxHashSet::default();
        for (i, persona) in self.personas.iter().enumerate() {
            require_text(&format!("personas[{i}].name"), &persona.name)?;
            require_text(&format!("personas[{i}].background"), &persona.background)?;
            if persona.pain_points.iter().all(|p| p.trim().is_empty()) {
                return Err(InputError::MissingField(format!("personas[{i}].painPoints")));
            }
            if !seen.insert(persona.name.trim()) {
                return Err(InputError::DuplicatePersona(persona.name.clone()));
            }
        }

        for (i, community) in self.communities.iter().enumerate() {
            if Community::bare_name(community, DEFAULT_COMMUNITY_PREFIX).is_empty() {
                return Err(InputError::MissingField(format!("communities[{i}]")));
            }
        }
        // A theme must still say something once cleaned.
        if expand_themes(&self.themes).is_empty() {
            return Err(InputError::NoThemes);
        }
        for (i, theme) in self.themes.iter().enumerate() {
            if clean_theme(theme).is_empty() {
                return Err(InputError::MissingField(format!("themes[{i}]")));
            }
        }

        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), InputError> {
    if value.trim().is_empty() {
        Err(InputError::MissingField(field.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn persona(name: &str, voice: &str) -> Persona {
        Persona {
            name: name.to_string(),
            background: format!("{name} has been at this for a few years"),
            voice: voice.to_string(),
            pain_points: vec!["too many tasks, not enough time".to_string()],
        }
    }

    pub(crate) fn sample_input() -> CalendarInput {
        CalendarInput {
            company: CompanyInfo {
                name: "Slatebox".to_string(),
                value_prop: "smart task prioritization".to_string(),
                ideal_customer: "busy solo founders".to_string(),
                tone: "warm".to_string(),
            },
            personas: vec![persona("Ava", "casual"), persona("Ben", "analytical")],
            count: 2,
            communities: vec!["productivity".to_string(), "r/startups".to_string()],
            themes: vec!["time management".to_string()],
            posts_per_week: 3,
            week_start: None,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert_eq!(sample_input().validate(), Ok(()));
    }

    #[test]
    fn rejects_single_persona() {
        let mut input = sample_input();
        input.personas.truncate(1);
        assert_eq!(input.validate(), Err(InputError::TooFewPersonas(1)));
    }

    #[test]
    fn rejects_empty_lists() {
        let mut input = sample_input();
        input.communities.clear();
        assert_eq!(input.validate(), Err(InputError::NoCommunities));

        let mut input = sample_input();
        input.themes.clear();
        assert_eq!(input.validate(), Err(InputError::NoThemes));
    }

    #[test]
    fn rejects_zero_posts() {
        let mut input = sample_input();
        input.posts_per_week = 0;
        assert_eq!(input.validate(), Err(InputError::InvalidPostsPerWeek(0)));
    }

    #[test]
    fn rejects_blank_fields() {
        let mut input = sample_input();
        input.company.value_prop = "   ".to_string();
        assert_eq!(
            input.validate(),
            Err(InputError::MissingField("company.valueProp".to_string()))
        );

        let mut input = sample_input();
        input.personas[1].pain_points = vec![" ".to_string()];
        assert_eq!(
            input.validate(),
            Err(InputError::MissingField("personas[1].painPoints".to_string()))
        );

        let mut input = sample_input();
        input.communities.push("r/".to_string());
        assert_eq!(
            input.validate(),
            Err(InputError::MissingField("communities[2]".to_string()))
        );
    }

    #[test]
    fn rejects_themes_that_clean_to_nothing() {
        let mut input = sample_input();
        input.themes = vec!["...".to_string()];
        assert_eq!(input.validate(), Err(InputError::NoThemes));

        let mut input = sample_input();
        input.themes = vec!["...".to_string(), " , ".to_string()];
        assert_eq!(input.validate(), Err(InputError::NoThemes));

        let mut input = sample_input();
        input.themes.push(" , ".to_string());
        assert_eq!(
            input.validate(),
            Err(InputError::MissingField("themes[1]".to_string()))
        );
    }

    #[test]
    fn rejects_duplicate_persona_names() {
        let mut input = sample_input();
        input.personas.push(persona("Ava", "formal"));
        assert_eq!(
            input.validate(),
            Err(InputError::DuplicatePersona("Ava".to_string()))
        );
    }

    #[test]
    fn error_message_names_constraint() {
        let msg = InputError::TooFewPersonas(1).to_string();
        assert!(msg.contains("2 personas"));
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"{
            "company": {"name": "Slatebox", "valueProp": "x", "idealCustomer": "y", "tone": "z"},
            "personas": [
                {"name": "A", "background": "b", "voice": "casual", "painPoints": ["p"]},
                {"name": "B", "background": "b", "painPoints": ["p"]}
            ],
            "count": 2,
            "communities": ["running"],
            "themes": ["marathon training"],
            "postsPerWeek": 3,
            "weekStart": "2024-01-01"
        }"#;
        let input = CalendarInput::from_json(json).unwrap();
        assert_eq!(input.posts_per_week, 3);
        assert_eq!(input.personas[1].voice, "");
        assert_eq!(
            input.week_start,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert!(input.validate().is_ok());
    }

    #[test]
    fn non_integer_posts_rejected_at_parse() {
        let json = r#"{
            "company": {"name": "S", "valueProp": "x", "idealCustomer": "y", "tone": "z"},
            "personas": [],
            "count": 2,
            "communities": ["running"],
            "themes": ["t"],
            "postsPerWeek": 2.5
        }"#;
        assert!(CalendarInput::from_json(json).is_err());
    }
}
