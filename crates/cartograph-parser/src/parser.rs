//! Grammar parser for Cartograph tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer)
//! into the concrete syntax tree defined in
//! [`parser_types`](super::parser_types). The public entry point is
//! [`build_document`]. Unlike the lexer, the grammar stops at the first error.

use winnow::{
    Parser as _,
    combinator::{alt, opt, preceded, repeat, separated, terminated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// What was being parsed when the error occurred.
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) where the failing construct began.
    StartOffset(usize),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
type Arguments<'src> = (Vec<Spanned<types::Value<'src>>>, Vec<types::Property<'src>>);

/// Runs `f`, promoting any failure to a cut error that remembers where the
/// construct started.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

fn cut_error_from_offset(
    start_offset: usize,
    label: &'static str,
) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::Label(label));
    e.push(Context::StartOffset(start_offset));
    ErrMode::Cut(e)
}

fn cover(base: Span, spans: impl IntoIterator<Item = Span>) -> Span {
    spans.into_iter().fold(base, |acc, span| acc.union(span))
}

/// Whitespace and comments within a line.
fn inline_ws(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        0..,
        any.verify(|token: &PositionedToken<'_>| {
            matches!(token.token, Token::Whitespace | Token::LineComment(_))
        }),
    )
    .parse_next(input)
}

/// Whitespace, comments and newlines; used inside brackets.
fn multiline_ws(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        0..,
        any.verify(|token: &PositionedToken<'_>| {
            matches!(
                token.token,
                Token::Whitespace | Token::Newline | Token::LineComment(_)
            )
        }),
    )
    .parse_next(input)
}

/// Anything that may sit between statements.
fn separators(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        0..,
        any.verify(|token: &PositionedToken<'_>| {
            matches!(
                token.token,
                Token::Whitespace | Token::Newline | Token::LineComment(_) | Token::Semicolon
            )
        }),
    )
    .parse_next(input)
}

fn punct<'src>(
    expected: Token<'static>,
    label: &'static str,
) -> impl FnMut(&mut Input<'src>) -> IResult<Span> {
    move |input: &mut Input<'src>| {
        any.verify(|token: &PositionedToken<'_>| token.token == expected)
            .map(|token: &PositionedToken<'_>| token.span)
            .context(Context::Label(label))
            .parse_next(input)
    }
}

fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::Identifier(name) => Some(Spanned::new(name, token.span)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

fn string_literal(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
        _ => None,
    })
    .context(Context::Label("string literal"))
    .parse_next(input)
}

/// An edge endpoint: identifier (possibly `part.pin`) or quoted name.
fn endpoint<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Value<'src>>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(types::Value::Identifier(*name), token.span)),
        Token::StringLiteral(s) => Some(Spanned::new(types::Value::String(s.clone()), token.span)),
        _ => None,
    })
    .context(Context::Label("endpoint"))
    .parse_next(input)
}

fn connector(input: &mut Input<'_>) -> IResult<Spanned<types::Connector>> {
    any.verify_map(|token: &PositionedToken<'_>| {
        let connector = match token.token {
            Token::Arrow => types::Connector::Arrow,
            Token::DashedArrow => types::Connector::DashedArrow,
            Token::DoubleArrow => types::Connector::DoubleArrow,
            Token::LeftArrow => types::Connector::LeftArrow,
            Token::ThickArrow => types::Connector::ThickArrow,
            Token::DashedLine => types::Connector::DashedLine,
            Token::Line => types::Connector::Line,
            _ => return None,
        };
        Some(Spanned::new(connector, token.span))
    })
    .context(Context::Label("connector"))
    .parse_next(input)
}

fn scalar_value<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Value<'src>>> {
    any.verify_map(|token: &PositionedToken<'src>| {
        let value = match &token.token {
            Token::Identifier(name) => types::Value::Identifier(*name),
            Token::StringLiteral(s) => types::Value::String(s.clone()),
            Token::Number(n) => types::Value::Number(*n),
            _ => return None,
        };
        Some(Spanned::new(value, token.span))
    })
    .parse_next(input)
}

/// `@name`
fn shape_ref<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Value<'src>>> {
    let at = punct(Token::At, "@").parse_next(input)?;
    // Once `@` is seen the name is required.
    let name = cut_err(input, |input| {
        identifier
            .context(Context::Label("shape name after `@`"))
            .parse_next(input)
    })?;
    Ok(Spanned::new(
        types::Value::ShapeRef(*name.inner()),
        at.union(name.span()),
    ))
}

/// `[value, value, ...]`; newlines and a trailing comma are allowed.
fn list_value<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Value<'src>>> {
    let open = punct(Token::LeftBracket, "`[`").parse_next(input)?;
    cut_err(input, |input| {
        multiline_ws.parse_next(input)?;
        let items: Vec<Spanned<types::Value<'src>>> = separated(
            0..,
            terminated(value, multiline_ws),
            (punct(Token::Comma, "`,`"), multiline_ws),
        )
        .parse_next(input)?;
        opt((punct(Token::Comma, "`,`"), multiline_ws)).parse_next(input)?;
        let close = punct(Token::RightBracket, "closing `]`").parse_next(input)?;
        Ok(Spanned::new(types::Value::List(items), open.union(close)))
    })
}

fn value<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Value<'src>>> {
    alt((scalar_value, shape_ref, list_value))
        .context(Context::Label("value"))
        .parse_next(input)
}

/// `key: value [,]`
fn property<'src>(input: &mut Input<'src>) -> IResult<types::Property<'src>> {
    let key = identifier.parse_next(input)?;
    (inline_ws, punct(Token::Colon, "`:`")).parse_next(input)?;
    let value = cut_err(input, |input| {
        preceded(inline_ws, value)
            .context(Context::Label("property value"))
            .parse_next(input)
    })?;
    opt(preceded(inline_ws, punct(Token::Comma, "`,`"))).parse_next(input)?;
    Ok(types::Property { key, value })
}

/// Positional values and properties in any order, up to the end of the line.
fn arguments<'src>(input: &mut Input<'src>) -> IResult<Arguments<'src>> {
    let mut args = Vec::new();
    let mut properties = Vec::new();

    loop {
        let checkpoint = input.checkpoint();
        inline_ws.parse_next(input)?;

        if let Some(property) = opt(property).parse_next(input)? {
            properties.push(property);
            continue;
        }
        if let Some(value) = opt(value).parse_next(input)? {
            args.push(value);
            continue;
        }

        input.reset(&checkpoint);
        break;
    }

    Ok((args, properties))
}

fn setting<'src>(input: &mut Input<'src>) -> IResult<types::Statement<'src>> {
    property.map(types::Statement::Setting).parse_next(input)
}

fn edge_statement<'src>(input: &mut Input<'src>) -> IResult<types::Statement<'src>> {
    let from = endpoint.parse_next(input)?;
    let connector = preceded(inline_ws, connector).parse_next(input)?;

    cut_err(input, |input| {
        let to = preceded(inline_ws, endpoint)
            .context(Context::Label("edge target"))
            .parse_next(input)?;
        let (args, properties) = arguments(input)?;

        let span = cover(
            from.span().union(to.span()),
            args.iter()
                .map(Spanned::span)
                .chain(properties.iter().map(types::Property::span)),
        );
        Ok(types::Statement::Edge(types::EdgeStatement {
            from,
            connector,
            to,
            args,
            properties,
            span,
        }))
    })
}

fn command<'src>(input: &mut Input<'src>) -> IResult<types::Statement<'src>> {
    let keyword = identifier.parse_next(input)?;
    let (args, properties) = arguments(input)?;
    let body = opt(preceded(inline_ws, block)).parse_next(input)?;

    let span = cover(
        keyword.span(),
        args.iter()
            .map(Spanned::span)
            .chain(properties.iter().map(types::Property::span))
            .chain(body.as_ref().map(|(_, close)| *close)),
    );
    Ok(types::Statement::Command(types::Command {
        keyword,
        args,
        properties,
        body: body.map(|(statements, _)| statements),
        span,
    }))
}

fn statement<'src>(input: &mut Input<'src>) -> IResult<types::Statement<'src>> {
    alt((setting, edge_statement, command))
        .context(Context::Label("statement"))
        .parse_next(input)
}

fn at_block_end(input: &Input<'_>) -> bool {
    input
        .peek_token()
        .is_none_or(|token| matches!(token.token, Token::RightBrace))
}

/// Statements up to (not including) the closing brace or end of input.
fn statements<'src>(input: &mut Input<'src>) -> IResult<Vec<types::Statement<'src>>> {
    let mut statements = Vec::new();

    loop {
        separators.parse_next(input)?;
        if at_block_end(input) {
            break;
        }

        let start_offset = input.eof_offset();
        let statement = cut_err(input, statement)?;
        inline_ws.parse_next(input)?;

        // Statements end at a newline, `;` or the closing brace.
        let terminated = input.peek_token().is_none_or(|token| {
            matches!(
                token.token,
                Token::Newline | Token::Semicolon | Token::RightBrace
            )
        });
        if !terminated {
            return Err(cut_error_from_offset(start_offset, "end of statement"));
        }

        statements.push(statement);
    }

    Ok(statements)
}

/// `{ statement* }`, returning the statements and the closing brace span.
fn block<'src>(input: &mut Input<'src>) -> IResult<(Vec<types::Statement<'src>>, Span)> {
    punct(Token::LeftBrace, "`{`").parse_next(input)?;
    cut_err(input, |input| {
        let body = statements(input)?;
        let close = punct(Token::RightBrace, "closing `}`").parse_next(input)?;
        Ok((body, close))
    })
}

fn profile<'src>(input: &mut Input<'src>) -> IResult<types::ProfileBlock<'src>> {
    let keyword = identifier
        .context(Context::Label("profile keyword"))
        .parse_next(input)?;

    cut_err(input, |input| {
        let title = opt(preceded(inline_ws, string_literal)).parse_next(input)?;
        let properties: Vec<types::Property<'src>> =
            repeat(0.., preceded(inline_ws, property)).parse_next(input)?;
        multiline_ws.parse_next(input)?;
        let (body, close) = block
            .context(Context::Label("profile body"))
            .parse_next(input)?;

        Ok(types::ProfileBlock {
            span: keyword.span().union(close),
            keyword,
            title,
            properties,
            body,
        })
    })
}

fn document<'src>(input: &mut Input<'src>) -> IResult<types::Document<'src>> {
    let mut profiles = Vec::new();

    loop {
        separators.parse_next(input)?;
        if input.eof_offset() == 0 {
            break;
        }
        profiles.push(cut_err(input, profile)?);
    }

    Ok(types::Document { profiles })
}

fn is_layout_token(token: &PositionedToken<'_>) -> bool {
    matches!(
        token.token,
        Token::Whitespace | Token::Newline | Token::LineComment(_)
    )
}

/// Builds a diagnostic from a parse failure.
///
/// The span runs from the start of the failing construct (recorded as
/// `StartOffset`) to the token where parsing stopped.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let end_offset = tokens.len() - current_remaining.min(tokens.len());
    let at_eof = tokens[end_offset..].iter().all(is_layout_token);

    let context = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => Some(e),
        ErrMode::Incomplete(_) => None,
    };

    let start_offset = context
        .as_ref()
        .and_then(|e| {
            e.context().find_map(|ctx| match ctx {
                Context::StartOffset(n) => Some(tokens.len() - (*n).min(tokens.len())),
                Context::Label(_) => None,
            })
        })
        .unwrap_or(end_offset);

    let labels: Vec<&'static str> = context
        .as_ref()
        .map(|e| {
            e.context()
                .filter_map(|ctx| match ctx {
                    Context::Label(label) => Some(*label),
                    Context::StartOffset(_) => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let expected = labels.first().copied();

    let span = if at_eof {
        // Point at the last real token rather than the whole file.
        tokens
            .iter()
            .rev()
            .find(|t| !is_layout_token(t))
            .map(|t| t.span)
            .unwrap_or_default()
    } else {
        let mut meaningful = tokens[start_offset.min(end_offset)..=end_offset]
            .iter()
            .filter(|t| !is_layout_token(t))
            .map(|t| t.span);
        match meaningful.next() {
            Some(first) => meaningful.fold(first, |acc, span| acc.union(span)),
            None => tokens[end_offset].span,
        }
    };

    if at_eof {
        let message = match expected {
            Some(label) => format!("unexpected end of input, expected {label}"),
            None => "unexpected end of input".to_string(),
        };
        return Diagnostic::error(message)
            .with_code(ErrorCode::E101)
            .with_label(span, "input ends here")
            .with_help("check for a missing closing `}` or `]`");
    }

    let found = &tokens[end_offset];
    let message = match expected {
        Some(label) => format!("expected {label}, found `{found}`"),
        None => format!("unexpected token `{found}`"),
    };
    let trail = if labels.len() > 1 {
        Some(format!("while parsing {}", labels[1..].join(" → ")))
    } else {
        None
    };

    Diagnostic::error(message)
        .with_code(ErrorCode::E100)
        .with_label(span, "unexpected token")
        .with_secondary_label(found.span, "parsing stopped here")
        .with_optional_help(trail)
}

/// Builds the concrete syntax tree from tokens.
pub fn build_document<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<types::Document<'src>, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    document
        .parse_next(&mut token_slice)
        .map_err(|e| convert_error(e, tokens, token_slice.eof_offset()))
}
