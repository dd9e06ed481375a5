//! Lexical analyzer for composed task definitions.
//!
//! The lexer converts source text into a sequence of [`Token`]s for the
//! parser. Spaces and tabs are dropped, newlines are kept because they can
//! separate steps.
//!
//! Tokenization is total: input that cannot be recognized becomes an
//! [`TokenKind::Error`] token and lexing carries on behind it. The parser
//! reports the first such token. The sequence always ends with a single
//! [`TokenKind::Eof`] token.

use winnow::{
    Parser as _,
    combinator::{alt, not, repeat, terminated},
    error::{ContextError, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{none_of, one_of, take_till, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode},
    span::Span,
    tokens::{Token, TokenKind},
};

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError>;

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Characters that can appear in an unquoted argument value.
pub(crate) fn is_argument_value_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '\'' | '"' | '<' | '>' | '(' | ')' | '|' | '&')
}

/// Parse spaces, tabs and carriage returns
fn blanks(input: &mut Input<'_>) -> IResult<()> {
    take_while(0.., [' ', '\t', '\r']).void().parse_next(input)
}

/// Parse an identifier: `[A-Za-z0-9_.][A-Za-z0-9_.-]*`
///
/// A `-` directly followed by `>` is the start of an arrow, not part of the
/// identifier, so `a->b` lexes as three tokens.
fn identifier(input: &mut Input<'_>) -> IResult<TokenKind> {
    (
        one_of(is_identifier_char),
        repeat::<_, _, (), _, _>(
            0..,
            alt((
                one_of(is_identifier_char).void(),
                terminated('-', not('>')).void(),
            )),
        ),
    )
        .value(TokenKind::Identifier)
        .parse_next(input)
}

/// Parse a string delimited by `quote`; a doubled quote is an escaped quote.
fn quoted(input: &mut Input<'_>, quote: char) -> IResult<TokenKind> {
    (
        quote,
        repeat::<_, _, (), _, _>(
            0..,
            alt(((quote, quote).void(), none_of([quote, '\n']).void())),
        ),
        quote,
    )
        .value(TokenKind::StringArg)
        .parse_next(input)
}

/// Parse a single or double quoted string argument
fn string_arg(input: &mut Input<'_>) -> IResult<TokenKind> {
    alt((
        |input: &mut Input<'_>| quoted(input, '\''),
        |input: &mut Input<'_>| quoted(input, '"'),
    ))
    .parse_next(input)
}

/// Parse operators and punctuation (longest first)
fn fixed_token(input: &mut Input<'_>) -> IResult<TokenKind> {
    alt((
        "||".value(TokenKind::DoublePipe),
        "&&".value(TokenKind::AmpAmp),
        "->".value(TokenKind::Arrow),
        "--".value(TokenKind::DoubleMinus),
        '\n'.value(TokenKind::Newline),
        ':'.value(TokenKind::Colon),
        '*'.value(TokenKind::Star),
        '('.value(TokenKind::LeftParen),
        ')'.value(TokenKind::RightParen),
        '<'.value(TokenKind::LeftAngle),
        '>'.value(TokenKind::RightAngle),
        '='.value(TokenKind::Equals),
    ))
    .parse_next(input)
}

/// Parse the value following `--key=`
fn argument_value(input: &mut Input<'_>) -> IResult<TokenKind> {
    alt((
        string_arg,
        take_while(1.., is_argument_value_char).value(TokenKind::ArgValue),
    ))
    .parse_next(input)
}

/// Parse any token
fn token_kind(input: &mut Input<'_>) -> IResult<TokenKind> {
    alt((fixed_token, string_arg, identifier)).parse_next(input)
}

/// Lexer accumulating tokens over one source text.
struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
        }
    }

    fn tokenize(mut self) -> Vec<Token<'a>> {
        let mut input = LocatingSlice::new(self.source);

        loop {
            // Cannot fail: zero blanks is a match.
            let _ = blanks(&mut input);
            if input.eof_offset() == 0 {
                break;
            }

            let start = input.current_token_start();
            let checkpoint = input.checkpoint();
            let after_equals = self
                .tokens
                .last()
                .is_some_and(|token| token.is(TokenKind::Equals));

            let result = if after_equals {
                alt((argument_value, token_kind)).parse_next(&mut input)
            } else {
                token_kind(&mut input)
            };

            let kind = match result {
                Ok(kind) => kind,
                Err(_) => {
                    input.reset(&checkpoint);
                    Self::skip_unrecognized(&mut input);
                    TokenKind::Error
                }
            };

            let end = input.current_token_start();
            self.push(kind, start..end);
        }

        let end = self.source.len();
        self.push(TokenKind::Eof, end..end);
        self.tokens
    }

    /// Consume the input making up an error token.
    ///
    /// An unterminated string swallows the rest of its line, anything else
    /// a single character.
    fn skip_unrecognized(input: &mut Input<'a>) {
        match input.peek_token() {
            Some('\'' | '"') => {
                let _: IResult<&str> = take_till(0.., '\n').parse_next(input);
            }
            Some(_) => {
                input.next_token();
            }
            None => {}
        }
    }

    fn push(&mut self, kind: TokenKind, range: std::ops::Range<usize>) {
        let text = &self.source[range.clone()];
        self.tokens.push(Token::new(kind, text, Span::new(range)));
    }
}

/// Tokenize a composed task definition.
///
/// Never fails; see the module documentation for how unrecognized input is
/// represented.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    Lexer::new(source).tokenize()
}

/// Build the diagnostic reported for a [`TokenKind::Error`] token.
pub(crate) fn error_diagnostic(token: &Token<'_>) -> Diagnostic {
    if token.text.starts_with(['\'', '"']) {
        Diagnostic::error("unterminated quoted string")
            .with_code(ErrorCode::E001)
            .with_label(token.span, ErrorCode::E001.description())
            .with_help("close the string on the same line; write a quote twice to include it")
    } else {
        Diagnostic::error(format!("unexpected character `{}`", token.text))
            .with_code(ErrorCode::E002)
            .with_label(token.span, ErrorCode::E002.description())
            .with_help("operators are `&&`, `||`, `->`, `<`, `>`, `(`, `)` and `:`")
    }
}
