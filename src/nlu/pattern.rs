//! Offline pattern-based NLU provider.
//!
//! Keyword and regex heuristics covering the common booking phrasings.
//! Far less capable than the LLM provider, but deterministic and
//! dependency-free: it backs the agent when no NLU endpoint is
//! configured and gives tests a stable fixture.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use regex::Regex;

use crate::error::Result;
use crate::session::ChatTurn;

use super::provider::NluProvider;
use super::types::{ExtractedFields, Intent, IntentClassification};

// ============================================================================
// Pattern Tables
// ============================================================================

static BOOK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(book|schedule|set\s+up|arrange|reserve)\b").unwrap()
});

static AVAILABILITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(available|availability|free\s+time|free\s+slot|when\s+(am|are|can))\b")
        .unwrap()
});

static CANCEL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcancel\b").unwrap());

static MODIFY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(reschedule|move|postpone)\b").unwrap());

static ISO_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

static NEXT_WEEKDAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnext\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .unwrap()
});

static CLOCK_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b|\b(\d{1,2}):(\d{2})\b").unwrap()
});

static DURATION_MINUTES_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*min(?:ute)?s?\b").unwrap());

static DURATION_HOURS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+|an?)\s*h(?:ou)?rs?\b").unwrap());

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static QUOTED_TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).unwrap());

/// Words that can follow a booking verb without being a title.
const TITLE_STOPWORDS: &[&str] = &[
    "tomorrow", "today", "next", "this", "something", "me", "it",
];

static VERB_TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:book|schedule|set\s+up|arrange|reserve)\s+(?:(?:an|a|my|the)\s+)?(?:\d+\s*(?:min(?:ute)?s?|h(?:ou)?rs?)\s+)?([a-zA-Z][a-zA-Z -]{0,40}?)(?:\s+(?:on|at|for|with|tomorrow|today|next|this|from|in)\b|\s*$)",
    )
    .unwrap()
});

// ============================================================================
// Pattern NLU Provider
// ============================================================================

/// Heuristic NLU provider built from regex pattern tables.
#[derive(Debug, Clone, Default)]
pub struct PatternNlu;

impl PatternNlu {
    /// Create a new pattern provider.
    pub fn new() -> Self {
        Self
    }

    fn classify(&self, text: &str) -> IntentClassification {
        if CANCEL_PATTERN.is_match(text) {
            return IntentClassification::new(Intent::CancelAppointment, 0.9);
        }
        if MODIFY_PATTERN.is_match(text) {
            return IntentClassification::new(Intent::ModifyAppointment, 0.85);
        }
        if BOOK_PATTERN.is_match(text) {
            return IntentClassification::new(Intent::BookAppointment, 0.9);
        }
        if AVAILABILITY_PATTERN.is_match(text) {
            return IntentClassification::new(Intent::CheckAvailability, 0.85);
        }
        IntentClassification::new(Intent::GeneralQuery, 0.5)
    }

    fn extract_date(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        if let Some(caps) = ISO_DATE_PATTERN.captures(text) {
            let parsed = NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            );
            if parsed.is_some() {
                return parsed;
            }
        }

        let lower = text.to_lowercase();
        if lower.contains("tomorrow") {
            return Some(today + Duration::days(1));
        }
        if lower.contains("today") {
            return Some(today);
        }

        if let Some(caps) = NEXT_WEEKDAY_PATTERN.captures(text) {
            let target = parse_weekday(&caps[1])?;
            let current = today.weekday().num_days_from_monday() as i64;
            let wanted = target.num_days_from_monday() as i64;
            let mut ahead = (wanted - current).rem_euclid(7);
            if ahead == 0 {
                ahead = 7;
            }
            return Some(today + Duration::days(ahead));
        }

        if lower.contains("next week") {
            let days_to_monday = 7 - today.weekday().num_days_from_monday() as i64;
            return Some(today + Duration::days(days_to_monday));
        }

        None
    }

    fn extract_time(&self, text: &str) -> Option<NaiveTime> {
        if let Some(caps) = CLOCK_TIME_PATTERN.captures(text) {
            // am/pm form
            if let Some(hour) = caps.get(1) {
                let mut hour: u32 = hour.as_str().parse().ok()?;
                let minute: u32 = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
                let meridiem = caps.get(3)?.as_str().to_lowercase();
                if meridiem == "pm" && hour < 12 {
                    hour += 12;
                } else if meridiem == "am" && hour == 12 {
                    hour = 0;
                }
                return NaiveTime::from_hms_opt(hour, minute, 0);
            }
            // bare 24-hour HH:MM form
            if let (Some(hour), Some(minute)) = (caps.get(4), caps.get(5)) {
                return NaiveTime::from_hms_opt(
                    hour.as_str().parse().ok()?,
                    minute.as_str().parse().ok()?,
                    0,
                );
            }
        }

        let lower = text.to_lowercase();
        if lower.contains("morning") {
            return NaiveTime::from_hms_opt(9, 0, 0);
        }
        if lower.contains("afternoon") {
            return NaiveTime::from_hms_opt(14, 0, 0);
        }
        if lower.contains("evening") {
            return NaiveTime::from_hms_opt(18, 0, 0);
        }

        None
    }

    fn extract_duration(&self, text: &str) -> Option<u32> {
        if let Some(caps) = DURATION_MINUTES_PATTERN.captures(text) {
            return caps[1].parse().ok();
        }
        if let Some(caps) = DURATION_HOURS_PATTERN.captures(text) {
            let hours: u32 = match caps[1].to_lowercase().as_str() {
                "a" | "an" => 1,
                n => n.parse().ok()?,
            };
            return Some(hours * 60);
        }
        None
    }

    fn extract_title(&self, text: &str) -> Option<String> {
        if let Some(caps) = QUOTED_TITLE_PATTERN.captures(text) {
            let quoted = caps.get(1).or_else(|| caps.get(2))?;
            return Some(quoted.as_str().trim().to_string());
        }
        if let Some(caps) = VERB_TITLE_PATTERN.captures(text) {
            let title = caps[1].trim().to_string();
            let first_word = title.split_whitespace().next().unwrap_or("").to_lowercase();
            // A date word after the verb ("book tomorrow...") is not a title.
            if !title.is_empty() && !TITLE_STOPWORDS.contains(&first_word.as_str()) {
                return Some(title);
            }
        }
        None
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

#[async_trait]
impl NluProvider for PatternNlu {
    async fn classify_intent(
        &self,
        text: &str,
        _history: &[ChatTurn],
    ) -> Result<IntentClassification> {
        Ok(self.classify(text))
    }

    async fn extract_fields(&self, text: &str, now: DateTime<Utc>) -> Result<ExtractedFields> {
        let today = now.date_naive();
        Ok(ExtractedFields {
            title: self.extract_title(text),
            date: self.extract_date(text, today),
            start_time: self.extract_time(text),
            duration_minutes: self.extract_duration(text),
            attendees: EMAIL_PATTERN
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            description: None,
        })
    }

    async fn complete_freeform(&self, _text: &str, _context: &str) -> Result<String> {
        Ok("I can help you book appointments on your calendar. Tell me what \
            you'd like to schedule, along with a date and time, and I'll \
            check your availability."
            .to_string())
    }
}
