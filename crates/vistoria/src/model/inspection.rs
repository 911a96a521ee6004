use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Whether an inspection records the move-in or the move-out walkthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionKind {
    #[serde(alias = "entrada")]
    Entry,
    #[serde(alias = "saida", alias = "saída")]
    Exit,
}

impl InspectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

impl FromStr for InspectionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" | "entrada" => Ok(Self::Entry),
            "exit" | "saida" | "saída" => Ok(Self::Exit),
            _ => Err(DomainError::InvalidStatus {
                kind: "inspection kind",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InspectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an inspection. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    #[serde(alias = "rascunho")]
    Draft,
    #[serde(alias = "em_andamento")]
    InProgress,
    #[serde(alias = "concluida", alias = "concluída")]
    Completed,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn can_transition_to(&self, next: InspectionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Draft, Self::Completed)
        )
    }

    /// Validates a transition, returning the new status.
    pub fn transition_to(&self, next: InspectionStatus) -> Result<InspectionStatus, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl FromStr for InspectionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "rascunho" => Ok(Self::Draft),
            "in_progress" | "em_andamento" => Ok(Self::InProgress),
            "completed" | "concluida" | "concluída" => Ok(Self::Completed),
            _ => Err(DomainError::InvalidStatus {
                kind: "inspection status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checklist template the inspection was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    #[default]
    #[serde(alias = "apartamento")]
    Apartment,
    #[serde(alias = "casa")]
    House,
    #[serde(alias = "comercial")]
    Commercial,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::House => "house",
            Self::Commercial => "commercial",
        }
    }
}

impl FromStr for TemplateType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apartment" | "apartamento" => Ok(Self::Apartment),
            "house" | "casa" => Ok(Self::House),
            "commercial" | "comercial" => Ok(Self::Commercial),
            _ => Err(DomainError::InvalidStatus {
                kind: "template type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single walkthrough of a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: i64,
    pub property_address: String,
    pub landlord_name: Option<String>,
    pub tenant_name: Option<String>,
    pub kind: InspectionKind,
    pub status: InspectionStatus,
    pub template_type: TemplateType,
    pub region: String,
    pub total_cost_estimate: f64,
    pub created_at: String,
}

/// Fields needed to create an inspection.
#[derive(Debug, Clone)]
pub struct NewInspection {
    pub property_address: String,
    pub landlord_name: Option<String>,
    pub tenant_name: Option<String>,
    pub kind: InspectionKind,
    pub template_type: TemplateType,
    pub region: String,
}

impl NewInspection {
    pub fn new(property_address: impl Into<String>, kind: InspectionKind) -> Self {
        Self {
            property_address: property_address.into(),
            landlord_name: None,
            tenant_name: None,
            kind,
            template_type: TemplateType::default(),
            region: "RJ".to_string(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_parties(
        mut self,
        landlord_name: impl Into<String>,
        tenant_name: impl Into<String>,
    ) -> Self {
        self.landlord_name = Some(landlord_name.into());
        self.tenant_name = Some(tenant_name.into());
        self
    }
}
