//! Typed document model produced by the Cartograph parser.
//!
//! A source file holds one or more *profiles*, each a diagram sub-language
//! with its own statement grammar. After conversion every profile is one of
//! the closed set of variants in [`Profile`], so later stages match on a
//! finite set of shapes instead of probing strings.
//!
//! - [`diagram`] - Generic node/edge diagrams with nested containers ([`DiagramAst`])
//! - [`sequence`] - Sequence diagrams ([`SequenceProfile`])
//! - [`charts`] - Timeline, Wardley map, kanban, gitgraph and treemap profiles
//! - [`schematic`] - Electrical, fluid power, HVAC, control, digital and P&ID schematics
//! - [`notation`] - Railroad grammars and glyphsets

pub mod charts;
pub mod diagram;
pub mod notation;
pub mod schematic;
pub mod sequence;

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use indexmap::IndexMap;
use serde::Serialize;

pub use charts::*;
pub use diagram::*;
pub use notation::*;
pub use schematic::*;
pub use sequence::*;

/// Version stamped on every [`DiagramAst`] produced by this crate.
pub const AST_VERSION: u32 = 1;

/// A value stored in an opaque property bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataValue {
    String(String),
    Number(f32),
    Bool(bool),
    List(Vec<DataValue>),
}

impl DataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Ordered key/value bag attached to nodes, edges and containers.
pub type DataBag = IndexMap<String, DataValue>;

/// The keyword that opens a profile block in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Diagram,
    Sequence,
    Timeline,
    Wardley,
    Kanban,
    GitGraph,
    Treemap,
    Electrical,
    Pneumatic,
    Hydraulic,
    Hvac,
    Control,
    Digital,
    Pid,
    Railroad,
    Glyphset,
}

impl ProfileKind {
    /// Every profile keyword, in the order used for suggestions.
    pub const KEYWORDS: &'static [&'static str] = &[
        "diagram",
        "sequence",
        "timeline",
        "wardley",
        "kanban",
        "gitgraph",
        "treemap",
        "electrical",
        "pneumatic",
        "hydraulic",
        "hvac",
        "control",
        "digital",
        "pid",
        "railroad",
        "glyphset",
    ];

    /// Returns the schematic flavor for schematic keywords.
    pub fn schematic_kind(self) -> Option<SchematicKind> {
        match self {
            Self::Electrical => Some(SchematicKind::Electrical),
            Self::Pneumatic => Some(SchematicKind::Pneumatic),
            Self::Hydraulic => Some(SchematicKind::Hydraulic),
            Self::Hvac => Some(SchematicKind::Hvac),
            Self::Control => Some(SchematicKind::Control),
            Self::Digital => Some(SchematicKind::Digital),
            Self::Pid => Some(SchematicKind::Pid),
            _ => None,
        }
    }
}

impl FromStr for ProfileKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diagram" => Ok(Self::Diagram),
            "sequence" => Ok(Self::Sequence),
            "timeline" => Ok(Self::Timeline),
            "wardley" => Ok(Self::Wardley),
            "kanban" => Ok(Self::Kanban),
            "gitgraph" => Ok(Self::GitGraph),
            "treemap" => Ok(Self::Treemap),
            "electrical" => Ok(Self::Electrical),
            "pneumatic" => Ok(Self::Pneumatic),
            "hydraulic" => Ok(Self::Hydraulic),
            "hvac" => Ok(Self::Hvac),
            "control" => Ok(Self::Control),
            "digital" => Ok(Self::Digital),
            "pid" => Ok(Self::Pid),
            "railroad" => Ok(Self::Railroad),
            "glyphset" => Ok(Self::Glyphset),
            _ => Err("Unsupported profile"),
        }
    }
}

impl From<ProfileKind> for &'static str {
    fn from(val: ProfileKind) -> Self {
        match val {
            ProfileKind::Diagram => "diagram",
            ProfileKind::Sequence => "sequence",
            ProfileKind::Timeline => "timeline",
            ProfileKind::Wardley => "wardley",
            ProfileKind::Kanban => "kanban",
            ProfileKind::GitGraph => "gitgraph",
            ProfileKind::Treemap => "treemap",
            ProfileKind::Electrical => "electrical",
            ProfileKind::Pneumatic => "pneumatic",
            ProfileKind::Hydraulic => "hydraulic",
            ProfileKind::Hvac => "hvac",
            ProfileKind::Control => "control",
            ProfileKind::Digital => "digital",
            ProfileKind::Pid => "pid",
            ProfileKind::Railroad => "railroad",
            ProfileKind::Glyphset => "glyphset",
        }
    }
}

impl Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// A converted profile block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "profile", rename_all = "snake_case")]
pub enum Profile {
    Diagram(DiagramAst),
    Sequence(SequenceProfile),
    Timeline(TimelineProfile),
    Wardley(WardleyProfile),
    Kanban(KanbanProfile),
    GitGraph(GitGraphProfile),
    Treemap(TreemapProfile),
    Schematic(SchematicProfile),
    Railroad(RailroadProfile),
    Glyphset(GlyphsetProfile),
}

impl Profile {
    /// Source keyword this profile was declared with.
    pub fn kind(&self) -> ProfileKind {
        match self {
            Self::Diagram(_) => ProfileKind::Diagram,
            Self::Sequence(_) => ProfileKind::Sequence,
            Self::Timeline(_) => ProfileKind::Timeline,
            Self::Wardley(_) => ProfileKind::Wardley,
            Self::Kanban(_) => ProfileKind::Kanban,
            Self::GitGraph(_) => ProfileKind::GitGraph,
            Self::Treemap(_) => ProfileKind::Treemap,
            Self::Schematic(s) => s.kind.profile_kind(),
            Self::Railroad(_) => ProfileKind::Railroad,
            Self::Glyphset(_) => ProfileKind::Glyphset,
        }
    }

    /// Display name given in the profile header, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Diagram(p) => p.name.as_deref(),
            Self::Sequence(p) => p.name.as_deref(),
            Self::Timeline(p) => p.name.as_deref(),
            Self::Wardley(p) => p.name.as_deref(),
            Self::Kanban(p) => p.name.as_deref(),
            Self::GitGraph(p) => p.name.as_deref(),
            Self::Treemap(p) => p.name.as_deref(),
            Self::Schematic(p) => p.name.as_deref(),
            Self::Railroad(p) => p.name.as_deref(),
            Self::Glyphset(p) => p.name.as_deref(),
        }
    }

    pub fn as_diagram(&self) -> Option<&DiagramAst> {
        match self {
            Self::Diagram(d) => Some(d),
            _ => None,
        }
    }
}

/// All profiles parsed from one source text, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub profiles: Vec<Profile>,
}

impl Document {
    /// The first declared profile.
    pub fn primary(&self) -> Option<&Profile> {
        self.profiles.first()
    }

    /// Iterates over the generic diagram profiles only.
    pub fn diagrams(&self) -> impl Iterator<Item = &DiagramAst> {
        self.profiles.iter().filter_map(Profile::as_diagram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_kind_roundtrip() {
        for keyword in ProfileKind::KEYWORDS {
            let kind: ProfileKind = keyword.parse().expect("known keyword");
            assert_eq!(kind.to_string(), *keyword);
        }
        assert!("diagrams".parse::<ProfileKind>().is_err());
    }

    #[test]
    fn test_schematic_kind_mapping() {
        assert_eq!(
            ProfileKind::Pid.schematic_kind(),
            Some(SchematicKind::Pid)
        );
        assert_eq!(ProfileKind::Kanban.schematic_kind(), None);
        assert_eq!(SchematicKind::Hvac.profile_kind(), ProfileKind::Hvac);
    }

    #[test]
    fn test_data_value_display() {
        let value = DataValue::List(vec![
            DataValue::Number(1.5),
            DataValue::String("x".to_string()),
            DataValue::Bool(true),
        ]);
        assert_eq!(value.to_string(), "[1.5, x, true]");
    }

    #[test]
    fn test_document_diagrams_filters_profiles() {
        let document = Document {
            profiles: vec![
                Profile::Sequence(SequenceProfile::default()),
                Profile::Diagram(DiagramAst::default()),
            ],
        };
        assert_eq!(document.diagrams().count(), 1);
        assert_eq!(document.primary().map(Profile::kind), Some(ProfileKind::Sequence));
    }
}
