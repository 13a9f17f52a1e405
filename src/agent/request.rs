//! The booking request accumulator.
//!
//! Fields arrive piecemeal across turns. The accumulator merges each
//! turn's extraction with an overwrite-if-present reducer: a newly
//! extracted value replaces the stored one, an absent value never
//! erases what an earlier turn established.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::nlu::ExtractedFields;

/// A partially specified booking, accumulated across turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Appointment title or purpose.
    #[serde(default)]
    pub title: Option<String>,
    /// Requested calendar date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Requested start time of day.
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// Duration in minutes; defaults to 60 at use sites when absent.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Attendee addresses.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

impl BookingRequest {
    /// A request is complete once title, date, and start time are all
    /// known. Duration is never required; it defaults instead.
    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.date.is_some() && self.start_time.is_some()
    }

    /// Whether enough is known to search for availability.
    pub fn has_search_basis(&self) -> bool {
        self.title.is_some() && self.date.is_some()
    }

    /// Merge one turn's extraction into the accumulated request.
    pub fn merge(&mut self, fields: ExtractedFields) {
        if fields.title.is_some() {
            self.title = fields.title;
        }
        if fields.date.is_some() {
            self.date = fields.date;
        }
        if fields.start_time.is_some() {
            self.start_time = fields.start_time;
        }
        if fields.duration_minutes.is_some() {
            self.duration_minutes = fields.duration_minutes;
        }
        if !fields.attendees.is_empty() {
            self.attendees = fields.attendees;
        }
        if fields.description.is_some() {
            self.description = fields.description;
        }
    }

    /// Labels for the required fields still missing, in fixed order:
    /// title, date, start time.
    pub fn missing_field_labels(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push("the purpose or title of your appointment");
        }
        if self.date.is_none() {
            missing.push("the date you'd prefer");
        }
        if self.start_time.is_none() {
            missing.push("what time you'd like to meet");
        }
        missing
    }

    /// The clarification question for the current gaps.
    ///
    /// One missing field reads "I need to know X to book your
    /// appointment."; two are joined with "and"; three or more use an
    /// Oxford-comma list.
    pub fn clarification_question(&self) -> String {
        let missing = self.missing_field_labels();
        match missing.as_slice() {
            [] => "Could you provide more details about your appointment?".to_string(),
            [only] => format!("I need to know {only} to book your appointment."),
            [first, second] => {
                format!("I need to know {first} and {second} to book your appointment.")
            }
            [init @ .., last] => {
                format!(
                    "I need to know {}, and {} to book your appointment.",
                    init.join(", "),
                    last
                )
            }
        }
    }
}
