//! Notation profiles: railroad (syntax) diagrams and glyphsets.

use serde::Serialize;

/// A railroad diagram expression tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RailroadExpr {
    Terminal(String),
    NonTerminal(String),
    Sequence(Vec<RailroadExpr>),
    Choice(Vec<RailroadExpr>),
    Optional(Box<RailroadExpr>),
    Repeat(Box<RailroadExpr>),
}

impl RailroadExpr {
    /// Names of every non-terminal referenced in this expression, in order.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Terminal(_) => {}
            Self::NonTerminal(name) => out.push(name),
            Self::Sequence(items) | Self::Choice(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Self::Optional(inner) | Self::Repeat(inner) => inner.collect_references(out),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RailroadRule {
    pub name: String,
    pub expr: RailroadExpr,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RailroadProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rules: Vec<RailroadRule>,
}

/// One entry of a glyphset, possibly with nested entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphItem {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GlyphItem>,
}

/// A templated list graphic (process steps, pyramid, cycle, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlyphsetProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Layout template name, e.g. `process`, `cycle`, `pyramid`.
    pub kind: String,
    pub items: Vec<GlyphItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_railroad_references() {
        let expr = RailroadExpr::Sequence(vec![
            RailroadExpr::NonTerminal("term".to_string()),
            RailroadExpr::Repeat(Box::new(RailroadExpr::Sequence(vec![
                RailroadExpr::Terminal("+".to_string()),
                RailroadExpr::NonTerminal("term".to_string()),
            ]))),
            RailroadExpr::Optional(Box::new(RailroadExpr::NonTerminal("suffix".to_string()))),
        ]);
        assert_eq!(expr.references(), vec!["term", "term", "suffix"]);
    }
}
