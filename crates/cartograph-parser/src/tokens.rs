use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// Token types for the Cartograph language.
///
/// Profile and statement keywords are ordinary identifiers; their meaning
/// depends on the enclosing profile and is decided during conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Literals
    StringLiteral(String),
    Number(f32),
    /// Words, including dotted port references such as `R1.a`.
    Identifier(&'src str),

    // Connectors
    Arrow,       // ->
    DashedArrow, // -->
    DoubleArrow, // <->
    LeftArrow,   // <-
    ThickArrow,  // =>
    DashedLine,  // --
    Line,        // -

    // Punctuation
    Colon,        // :
    At,           // @
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Semicolon,    // ;
    Comma,        // ,

    LineComment(&'src str),
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// True for tokens that join two endpoints into an edge.
    pub fn is_connector(&self) -> bool {
        matches!(
            self,
            Token::Arrow
                | Token::DashedArrow
                | Token::DoubleArrow
                | Token::LeftArrow
                | Token::ThickArrow
                | Token::DashedLine
                | Token::Line
        )
    }

    /// True for tokens the grammar never looks at.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::LineComment(_))
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl Location for PositionedToken<'_> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Number(n) => write!(f, "{n}"),
            Token::Identifier(id) => write!(f, "{id}"),
            Token::Arrow => write!(f, "->"),
            Token::DashedArrow => write!(f, "-->"),
            Token::DoubleArrow => write!(f, "<->"),
            Token::LeftArrow => write!(f, "<-"),
            Token::ThickArrow => write!(f, "=>"),
            Token::DashedLine => write!(f, "--"),
            Token::Line => write!(f, "-"),
            Token::Colon => write!(f, ":"),
            Token::At => write!(f, "@"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::LineComment(c) => write!(f, "//{c}"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Newline => write!(f, "newline"),
        }
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}
