use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Observed condition of a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    Ok,
    #[serde(alias = "danificado")]
    Damaged,
    #[serde(alias = "sujo")]
    Dirty,
    #[serde(alias = "ausente")]
    Missing,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Damaged => "damaged",
            Self::Dirty => "dirty",
            Self::Missing => "missing",
        }
    }

    /// Damaged and missing items are priced by the cost rollup.
    pub fn needs_repair(&self) -> bool {
        matches!(self, Self::Damaged | Self::Missing)
    }

    /// Damaged or dirty, the two states a comparison treats as worn.
    pub fn is_worn(&self) -> bool {
        matches!(self, Self::Damaged | Self::Dirty)
    }
}

impl FromStr for ConditionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ok" => Ok(Self::Ok),
            "damaged" | "danificado" => Ok(Self::Damaged),
            "dirty" | "sujo" => Ok(Self::Dirty),
            "missing" | "ausente" => Ok(Self::Missing),
            _ => Err(DomainError::InvalidStatus {
                kind: "condition status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repair priority, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(DomainError::InvalidStatus {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison identity of a checklist entry within one inspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChecklistKey {
    pub room: String,
    pub item: String,
}

impl ChecklistKey {
    pub fn new(room: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            item: item.into(),
        }
    }
}

impl fmt::Display for ChecklistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.room, self.item)
    }
}

/// One observed item within one room of an inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub id: i64,
    pub inspection_id: i64,
    pub room: String,
    pub item: String,
    pub status: ConditionStatus,
    pub notes: Option<String>,
    pub ai_analysis: Option<String>,
    pub repair_cost_estimate: f64,
    pub priority: Priority,
}

impl ChecklistEntry {
    pub fn key(&self) -> ChecklistKey {
        ChecklistKey::new(self.room.clone(), self.item.clone())
    }
}

/// Fields needed to add an entry to an inspection.
#[derive(Debug, Clone)]
pub struct NewChecklistEntry {
    pub room: String,
    pub item: String,
    pub status: ConditionStatus,
    pub notes: Option<String>,
    pub priority: Priority,
}

impl NewChecklistEntry {
    pub fn new(room: impl Into<String>, item: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            room: room.into(),
            item: item.into(),
            status,
            notes: None,
            priority: Priority::default(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_status_aliases() {
        assert_eq!(
            "danificado".parse::<ConditionStatus>().unwrap(),
            ConditionStatus::Damaged
        );
        assert_eq!("sujo".parse::<ConditionStatus>().unwrap(), ConditionStatus::Dirty);
        assert_eq!(
            "ausente".parse::<ConditionStatus>().unwrap(),
            ConditionStatus::Missing
        );
        assert_eq!(" OK ".parse::<ConditionStatus>().unwrap(), ConditionStatus::Ok);
    }

    #[test]
    fn test_condition_status_rejects_unknown() {
        let err = "broken".parse::<ConditionStatus>().unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_condition_status_serde_stores_english() {
        let status: ConditionStatus = serde_json::from_str("\"ausente\"").unwrap();
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"missing\"");
    }

    #[test]
    fn test_needs_repair() {
        assert!(ConditionStatus::Damaged.needs_repair());
        assert!(ConditionStatus::Missing.needs_repair());
        assert!(!ConditionStatus::Dirty.needs_repair());
        assert!(!ConditionStatus::Ok.needs_repair());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(ChecklistKey::new("bathroom", "sink").to_string(), "bathroom/sink");
    }
}
