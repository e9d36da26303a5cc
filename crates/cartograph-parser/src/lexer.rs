//! Lexical analyzer for Cartograph source text.
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    ascii::{float, multispace1},
    combinator::{alt, cut_err, delimited, not, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    span::Span,
    tokens::{PositionedToken, Token},
    unescape::unescape_string,
};

/// Rich diagnostic information for lexer errors, attached via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// `\u{XXXX}` after the backslash: 1-6 hex digits forming a valid codepoint.
fn string_escape_unicode(input: &mut Input<'_>, escape_start: usize) -> IResult<char> {
    preceded(
        'u',
        cut_err(
            delimited(
                '{',
                take_while(1..=6, |c: char| c.is_ascii_hexdigit()).context(LexerDiagnostic {
                    code: ErrorCode::E006,
                    message: "empty unicode escape",
                    help: Some("provide 1-6 hex digits: `\\u{1F602}`"),
                    start: escape_start,
                }),
                '}',
            )
            .context(LexerDiagnostic {
                code: ErrorCode::E004,
                message: "invalid unicode escape",
                help: Some("use format `\\u{XXXX}` with 1-6 hex digits"),
                start: escape_start,
            })
            .verify_map(|hex_str: &str| {
                u32::from_str_radix(hex_str, 16)
                    .ok()
                    .and_then(char::from_u32)
            })
            .context(LexerDiagnostic {
                code: ErrorCode::E005,
                message: "invalid unicode codepoint",
                help: Some("valid range: `0x0000`-`0xD7FF` or `0xE000`-`0x10FFFF`"),
                start: escape_start,
            }),
        ),
    )
    .parse_next(input)
}

fn string_escape_char(input: &mut Input<'_>) -> IResult<char> {
    one_of(['n', 'r', 't', 'b', 'f', '\\', '/', '\'', '"', '0']).parse_next(input)
}

/// Backslash followed by whitespace; the whitespace is dropped from the value.
fn string_escape_whitespace(input: &mut Input<'_>) -> IResult<char> {
    multispace1.value(' ').parse_next(input)
}

/// Validates one escape sequence.
///
/// Decoding happens afterwards in [`unescape_string`] so there is a single
/// definition of what each escape means.
fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();

    '\\'.parse_next(input)?;

    match string_escape_unicode(input, escape_start) {
        Ok(ch) => return Ok(ch),
        Err(ErrMode::Backtrack(_)) => {}
        Err(e) => return Err(e),
    }

    if let Ok(ch) = string_escape_char(input) {
        return Ok(ch);
    }

    if let Ok(ch) = string_escape_whitespace(input) {
        return Ok(ch);
    }

    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some(
                "valid escapes: `\\n`, `\\r`, `\\t`, `\\b`, `\\f`, `\\\\`, `\\/`, `\\'`, `\\\"`, `\\0`, `\\u{}`",
            ),
            start: escape_start,
        },
    )))
}

fn string_char(input: &mut Input<'_>) -> IResult<char> {
    none_of(['"', '\\', '\n', '\r']).parse_next(input)
}

fn string_content(input: &mut Input<'_>) -> IResult<()> {
    repeat(0.., alt((string_escape, string_char))).parse_next(input)
}

/// A double-quoted string literal. Strings may not span lines unless the
/// line break is escaped.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();

    let raw = (
        '"',
        cut_err(terminated(string_content, '"')).context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"`"),
            start: start_pos,
        }),
    )
        .take()
        .parse_next(input)?;

    Ok(Token::StringLiteral(unescape_string(raw)))
}

/// Signed decimal number, optionally with exponent: `-3`, `0.75`, `1e3`.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    // Not followed by identifier characters, so `2x` never splits into `2` and `x`.
    (
        float,
        peek(not(one_of(|c: char| c.is_alphanumeric() || c == '_'))),
    )
        .map(|(f, _)| Token::Number(f))
        .parse_next(input)
}

fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Identifiers start with a letter or underscore. Dots are allowed inside so
/// that port references like `R1.a` stay one token.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_word_char)
        .verify(|s: &str| {
            s.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && !s.ends_with('.')
        })
        .map(Token::Identifier)
        .parse_next(input)
}

/// Words starting with a digit that are not numbers, e.g. `10k` or `2N2222`.
fn bare_word<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_word_char)
        .verify(|s: &str| {
            s.starts_with(|c: char| c.is_ascii_digit())
                && s.contains(|c: char| c.is_ascii_alphabetic() || c == '_')
                && s.parse::<f32>().is_err()
        })
        .map(Token::Identifier)
        .parse_next(input)
}

/// Multi-character connectors, longest first.
fn connector<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal("<->").value(Token::DoubleArrow),
        literal("-->").value(Token::DashedArrow),
        literal("->").value(Token::Arrow),
        literal("<-").value(Token::LeftArrow),
        literal("=>").value(Token::ThickArrow),
        literal("--").value(Token::DashedLine),
    ))
    .parse_next(input)
}

fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '-'.value(Token::Line),
        ':'.value(Token::Colon),
        '@'.value(Token::At),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        ';'.value(Token::Semicolon),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

/// Whitespace other than newlines.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,      // Must come before connectors
        string_literal,
        connector,         // Must come before numbers (`->` vs `-3`)
        identifier,        // Must come before numbers (`inf`, `nan`)
        bare_word,         // Must come before numbers (`10k`)
        number_literal,
        single_char_token,
        newline,           // Must come before whitespace
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    let diagnostic = Self::convert_err_mode(e, error_pos);
                    let in_string = matches!(
                        diagnostic.code(),
                        Some(
                            ErrorCode::E001
                                | ErrorCode::E003
                                | ErrorCode::E004
                                | ErrorCode::E005
                                | ErrorCode::E006
                        )
                    );
                    self.diagnostics.emit(diagnostic);

                    if in_string {
                        // Resume on the next line; the rest of a broken string
                        // would otherwise open a new unterminated one.
                        while input.peek_token().is_some_and(|c| c != '\n') {
                            input.next_token();
                        }
                    } else if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, Vec<Diagnostic>> {
        if self.diagnostics.has_errors() {
            Err(self.diagnostics.into_diagnostics())
        } else {
            Ok(self.tokens)
        }
    }

    /// Falls back to E002 (unexpected character) when no context is attached.
    fn convert_err_mode(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos);
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenizes `input`, recovering from errors so that every lexical problem
/// is reported in one pass.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, Vec<Diagnostic>> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}
