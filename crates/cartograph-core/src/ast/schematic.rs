//! Schematic profiles: electrical, pneumatic, hydraulic, HVAC, control, digital and P&ID.
//!
//! All flavors share one model of parts with pins, named nets and
//! point-to-point connections; the flavor only changes the symbol catalog a
//! renderer picks from.

use std::fmt::{self, Display};

use serde::Serialize;

use super::{DataBag, ProfileKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchematicKind {
    Electrical,
    Pneumatic,
    Hydraulic,
    Hvac,
    Control,
    Digital,
    Pid,
}

impl SchematicKind {
    pub fn profile_kind(self) -> ProfileKind {
        match self {
            Self::Electrical => ProfileKind::Electrical,
            Self::Pneumatic => ProfileKind::Pneumatic,
            Self::Hydraulic => ProfileKind::Hydraulic,
            Self::Hvac => ProfileKind::Hvac,
            Self::Control => ProfileKind::Control,
            Self::Digital => ProfileKind::Digital,
            Self::Pid => ProfileKind::Pid,
        }
    }
}

impl Display for SchematicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.profile_kind())
    }
}

/// A reference to a part, optionally narrowed to one of its pins (`R1.a`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PinRef {
    pub part: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

impl PinRef {
    /// Splits `part.pin` at the first dot.
    pub fn parse(text: &str) -> Self {
        match text.split_once('.') {
            Some((part, pin)) if !pin.is_empty() => Self {
                part: part.to_string(),
                pin: Some(pin.to_string()),
            },
            _ => Self {
                part: text.trim_end_matches('.').to_string(),
                pin: None,
            },
        }
    }
}

impl Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pin {
            Some(pin) => write!(f, "{}.{}", self.part, pin),
            None => write!(f, "{}", self.part),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub id: String,
    /// Component type, e.g. `resistor`, `valve`, `and_gate`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pins: Vec<String>,
    #[serde(skip_serializing_if = "DataBag::is_empty")]
    pub data: DataBag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Net {
    pub name: String,
    pub connects: Vec<PinRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub from: PinRef,
    pub to: PinRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchematicProfile {
    pub kind: SchematicKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub parts: Vec<Part>,
    pub nets: Vec<Net>,
    pub connections: Vec<Connection>,
}

impl SchematicProfile {
    pub fn new(kind: SchematicKind) -> Self {
        Self {
            kind,
            name: None,
            parts: Vec::new(),
            nets: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn part(&self, id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == id)
    }
}
