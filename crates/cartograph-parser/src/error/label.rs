//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A message attached to a span of source text.
///
/// A diagnostic normally has one primary label marking where the problem is,
/// plus secondary labels pointing at related locations:
///
/// ```text
/// error[E205]: node `api` is defined more than once
///   --> system.cg:10:11
///    |
/// 10 |     shape api @rect
///    |           ^^^ duplicate definition
///    |
///  5 |     shape api @cylinder
///    |           --- first defined here
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_kinds() {
        let primary = Label::primary(Span::new(10..20), "duplicate definition");
        assert!(primary.is_primary());
        assert_eq!(primary.span().start(), 10);
        assert_eq!(primary.message(), "duplicate definition");

        let secondary = Label::secondary(Span::new(5..8), "first defined here");
        assert!(secondary.is_secondary());
        assert_eq!(secondary.span().end(), 8);
    }
}
