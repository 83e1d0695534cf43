//! Enumerations and field types for todo tracking.
//!
//! This module defines the closed priority and status vocabularies shared by
//! the persisted format, the service layer, and the CLI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task priority classification.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
    #[serde(alias = "Urgent")]
    Urgent,
}

impl Priority {
    /// The band counted as "high priority" by aggregate statistics.
    pub fn is_high(self) -> bool {
        matches!(self, Priority::High | Priority::Urgent)
    }
}

/// Workflow status. Independent of the completion flag unless an explicit
/// coupling policy is in force.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    #[serde(alias = "Todo")]
    Todo,
    #[serde(alias = "InProgress")]
    InProgress,
    #[serde(alias = "Review")]
    Review,
    #[serde(alias = "Done")]
    Done,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Todo, Status::InProgress, Status::Review, Status::Done];

    /// Parse a raw status value. Anything outside the four statuses is rejected.
    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "todo" => Some(Status::Todo),
            "in-progress" => Some(Status::InProgress),
            "review" => Some(Status::Review),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    /// Wire name, identical to the persisted serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Review => "review",
            Status::Done => "done",
        }
    }
}

/// Format a priority level for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
        Priority::Urgent => "Urgent",
    }
}

/// Format a status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Todo => "Todo",
        Status::InProgress => "InProgress",
        Status::Review => "Review",
        Status::Done => "Done",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_the_four_statuses() {
        assert_eq!(Status::parse("todo"), Some(Status::Todo));
        assert_eq!(Status::parse("in-progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("review"), Some(Status::Review));
        assert_eq!(Status::parse("done"), Some(Status::Done));
    }

    #[test]
    fn parse_rejects_everything_else() {
        assert_eq!(Status::parse("bogus"), None);
        assert_eq!(Status::parse("Done"), None);
        assert_eq!(Status::parse(""), None);
    }

    #[test]
    fn wire_names_round_trip_through_serde() {
        for s in Status::ALL {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.as_str()));
            let back: Status = serde_json::from_str(&json).unwrap();
            assert_eq!(back, s);
        }
    }

    #[test]
    fn high_band_is_high_and_urgent() {
        assert!(!Priority::Low.is_high());
        assert!(!Priority::Medium.is_high());
        assert!(Priority::High.is_high());
        assert!(Priority::Urgent.is_high());
    }
}
