//! Concrete syntax tree produced by the grammar parser.
//!
//! The tree is profile-agnostic: every profile shares one statement grammar
//! and meaning is assigned later by the per-profile converters.

use std::fmt;

use crate::span::{Span, Spanned};

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'src> {
    pub profiles: Vec<ProfileBlock<'src>>,
}

/// `KEYWORD ["Title"] property* { statement* }`
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileBlock<'src> {
    pub keyword: Spanned<&'src str>,
    pub title: Option<Spanned<String>>,
    pub properties: Vec<Property<'src>>,
    pub body: Vec<Statement<'src>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'src> {
    /// `key: value` on its own line.
    Setting(Property<'src>),
    Edge(EdgeStatement<'src>),
    Command(Command<'src>),
}

impl Statement<'_> {
    pub fn span(&self) -> Span {
        match self {
            Statement::Setting(property) => property.span(),
            Statement::Edge(edge) => edge.span,
            Statement::Command(command) => command.span,
        }
    }
}

/// The connector between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    Arrow,
    DashedArrow,
    DoubleArrow,
    LeftArrow,
    ThickArrow,
    DashedLine,
    Line,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Connector::Arrow => "->",
            Connector::DashedArrow => "-->",
            Connector::DoubleArrow => "<->",
            Connector::LeftArrow => "<-",
            Connector::ThickArrow => "=>",
            Connector::DashedLine => "--",
            Connector::Line => "-",
        };
        f.write_str(text)
    }
}

/// `from CONNECTOR to (value | property)*`
///
/// Endpoints are always [`Value::Identifier`] or [`Value::String`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStatement<'src> {
    pub from: Spanned<Value<'src>>,
    pub connector: Spanned<Connector>,
    pub to: Spanned<Value<'src>>,
    pub args: Vec<Spanned<Value<'src>>>,
    pub properties: Vec<Property<'src>>,
    pub span: Span,
}

/// `KEYWORD (value | property)* [{ statement* }]`
#[derive(Debug, Clone, PartialEq)]
pub struct Command<'src> {
    pub keyword: Spanned<&'src str>,
    pub args: Vec<Spanned<Value<'src>>>,
    pub properties: Vec<Property<'src>>,
    pub body: Option<Vec<Statement<'src>>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property<'src> {
    pub key: Spanned<&'src str>,
    pub value: Spanned<Value<'src>>,
}

impl Property<'_> {
    pub fn span(&self) -> Span {
        self.key.span().union(self.value.span())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value<'src> {
    Identifier(&'src str),
    String(String),
    Number(f32),
    /// `@name`
    ShapeRef(&'src str),
    List(Vec<Spanned<Value<'src>>>),
}

impl Value<'_> {
    /// Text of an identifier, string or shape reference.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Identifier(text) | Value::ShapeRef(text) => Some(text),
            Value::String(text) => Some(text),
            Value::Number(_) | Value::List(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// A short description used in "expected X, found Y" messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Identifier(_) => "identifier",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::ShapeRef(_) => "shape reference",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Identifier(text) => write!(f, "{text}"),
            Value::String(text) => write!(f, "\"{text}\""),
            Value::Number(n) => write!(f, "{n}"),
            Value::ShapeRef(text) => write!(f, "@{text}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.inner())?;
                }
                write!(f, "]")
            }
        }
    }
}
