use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical community prefix used when no configuration overrides it.
pub const DEFAULT_COMMUNITY_PREFIX: &str = "r/";

/// A normalized community label in `prefix/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Community(pub String);

impl Community {
    /// Normalize a raw community string: trim, drop leading slashes, strip
    /// the prefix (case-insensitively) if present, then re-add it.
    ///
    /// `"running"`, `"r/running"` and `"/R/running"` all become `"r/running"`.
    pub fn normalize(raw: &str, prefix: &str) -> Community {
        Community(format!("{}{}", prefix, Self::bare_name(raw, prefix)))
    }

    /// The community name with any prefix and surrounding noise removed.
    pub fn bare_name<'a>(raw: &'a str, prefix: &str) -> &'a str {
        let trimmed = raw.trim().trim_start_matches('/');
        let stripped = match trimmed.get(..prefix.len()) {
            Some(head) if !prefix.is_empty() && head.eq_ignore_ascii_case(prefix) => {
                &trimmed[prefix.len()..]
            }
            _ => trimmed,
        };
        stripped.trim_matches('/').trim()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scheduled post with its paired reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub date: NaiveDate,
    pub community: Community,
    pub poster: String,
    pub commenter: String,
    /// The topic phrase as scheduled, before prose simplification.
    pub topic: String,
    pub post_text: String,
    pub comment_text: String,
}

/// A week of scheduled slots, the single output of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekCalendar {
    pub week_start: NaiveDate,
    pub posts: Vec<Slot>,
}

impl WeekCalendar {
    pub fn from_json(input: &str) -> Result<WeekCalendar, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Last day covered by this calendar (inclusive).
    pub fn week_end(&self) -> NaiveDate {
        self.week_start + Days::new(6)
    }

    /// Start date of the following week.
    pub fn next_week_start(&self) -> NaiveDate {
        self.week_start + Days::new(7)
    }

    /// Slots scheduled on `date`, in schedule order.
    pub fn slots_on(&self, date: NaiveDate) -> impl Iterator<Item = &Slot> {
        self.posts.iter().filter(move |s| s.date == date)
    }
}

/// Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn normalize_adds_and_keeps_prefix() {
        let a = Community::normalize("running", "r/");
        let b = Community::normalize("r/running", "r/");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "r/running");
    }

    #[test]
    fn normalize_handles_noise() {
        assert_eq!(Community::normalize("  /R/running/ ", "r/").0, "r/running");
        assert_eq!(Community::normalize("/running", "r/").0, "r/running");
    }

    #[test]
    fn normalize_is_stable() {
        let once = Community::normalize("startups", "r/");
        let twice = Community::normalize(once.as_str(), "r/");
        assert_eq!(once, twice);
    }

    #[test]
    fn bare_name_of_prefix_only_is_empty() {
        assert_eq!(Community::bare_name("r/", "r/"), "");
        assert_eq!(Community::bare_name(" / ", "r/"), "");
    }

    #[test]
    fn monday_alignment() {
        // 2024-01-03 is a Wednesday.
        assert_eq!(monday_of(ymd(2024, 1, 3)), ymd(2024, 1, 1));
        assert_eq!(monday_of(ymd(2024, 1, 1)), ymd(2024, 1, 1));
        assert_eq!(monday_of(ymd(2024, 1, 7)), ymd(2024, 1, 1));
    }

    #[test]
    fn week_bounds() {
        let cal = WeekCalendar {
            week_start: ymd(2024, 1, 1),
            posts: Vec::new(),
        };
        assert_eq!(cal.week_end(), ymd(2024, 1, 7));
        assert_eq!(cal.next_week_start(), ymd(2024, 1, 8));
    }

    #[test]
    fn serializes_camel_case() {
        let cal = WeekCalendar {
            week_start: ymd(2024, 1, 1),
            posts: vec![Slot {
                date: ymd(2024, 1, 2),
                community: Community::normalize("running", "r/"),
                poster: "Ava".to_string(),
                commenter: "Ben".to_string(),
                topic: "marathon training".to_string(),
                post_text: "Post.".to_string(),
                comment_text: "Reply.".to_string(),
            }],
        };
        let json = serde_json::to_string(&cal).unwrap();
        assert!(json.contains("\"weekStart\":\"2024-01-01\""));
        assert!(json.contains("\"community\":\"r/running\""));
        assert!(json.contains("\"postText\""));
        assert!(json.contains("\"commentText\""));

        let back = WeekCalendar::from_json(&json).unwrap();
        assert_eq!(back, cal);
    }
}
