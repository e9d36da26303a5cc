//! Sequence diagram profile.

use std::str::FromStr;

use serde::Serialize;

/// Endpoint name for a message arriving from outside the diagram.
pub const FOUND: &str = "found";
/// Endpoint name for a message leaving the diagram.
pub const LOST: &str = "lost";

/// Rendering role of a participant. Defaults to [`ParticipantKind::Entity`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Actor,
    #[default]
    Entity,
    Boundary,
    Control,
    Database,
}

impl ParticipantKind {
    pub const NAMES: &'static [&'static str] = &["actor", "entity", "boundary", "control", "database"];
}

impl FromStr for ParticipantKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "actor" => Ok(Self::Actor),
            "entity" => Ok(Self::Entity),
            "boundary" => Ok(Self::Boundary),
            "control" => Ok(Self::Control),
            "database" => Ok(Self::Database),
            _ => Err("Unsupported participant type"),
        }
    }
}

/// Message semantics. Defaults to [`MessageKind::Sync`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Sync,
    Async,
    Reply,
    Create,
    Destroy,
}

impl MessageKind {
    pub const NAMES: &'static [&'static str] = &["sync", "async", "reply", "create", "destroy"];
}

impl FromStr for MessageKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            "reply" => Ok(Self::Reply),
            "create" => Ok(Self::Create),
            "destroy" => Ok(Self::Destroy),
            _ => Err("Unsupported message type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    /// Slugified name; unique within the profile.
    pub id: String,
    pub name: String,
    pub kind: ParticipantKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub kind: MessageKind,
}

impl Message {
    /// A message whose sender is outside the diagram.
    pub fn is_found(&self) -> bool {
        self.from == FOUND
    }

    /// A message whose receiver is outside the diagram.
    pub fn is_lost(&self) -> bool {
        self.to == LOST
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceNote {
    pub text: String,
    pub over: Vec<String>,
}

/// One entry of the sequence timeline, in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SequenceStep {
    Message(Message),
    Note(SequenceNote),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SequenceProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub participants: Vec<Participant>,
    pub steps: Vec<SequenceStep>,
}

impl SequenceProfile {
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.steps.iter().filter_map(|step| match step {
            SequenceStep::Message(m) => Some(m),
            SequenceStep::Note(_) => None,
        })
    }
}
