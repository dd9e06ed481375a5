//! Parser for composed task tokens.
//!
//! This module turns the token stream produced by the [`lexer`](super::lexer)
//! into a [`ComposedTask`]. The public entry point is [`parse`].
//!
//! ```text
//! task        := NL* (sequence NL*)? EOF
//! sequence    := step (separator step)*
//! separator   := NL* '&&' NL* | NL+
//! step        := label? (task_app | split) | '(' NL* sequence NL* ')'
//! label       := IDENT ':'
//! task_app    := IDENT argument* transition*
//! argument    := '--' IDENT '=' (ARGVALUE | STRING | IDENT)
//! split       := '<' NL* sequence (NL* '||' NL* sequence)* NL* '>' transition*
//! transition  := (STRING | IDENT | '*') '->' IDENT
//! ```
//!
//! Once a construct is recognized (`--`, `<`, `(`, `&&`, or an exit
//! status) the parser commits to it, so errors point at the offending token
//! rather than at the start of the step.

use log::{debug, trace};
use winnow::{
    Parser as _,
    combinator::{opt, repeat, terminated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    ast::{Argument, ComposedTask, ExitStatus, Sequence, Split, Step, TaskApp, Transition},
    config::ParserConfig,
    error::{Diagnostic, ErrorCode},
    lexer,
    span::{Span, Spanned},
    tokens::{Token, TokenKind},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// What the parser was looking for
    Expected(&'static str),
}

type Input<'src> = TokenSlice<'src, Token<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Backtrack error recording what was expected at the current token.
fn expected(label: &'static str) -> ErrMode<ContextError<Context>> {
    let mut error = ContextError::new();
    error.push(Context::Expected(label));
    ErrMode::Backtrack(error)
}

/// Kind of the next token, without consuming it.
fn peek_kind(input: &Input<'_>) -> TokenKind {
    input
        .peek_token()
        .map(|token| token.kind)
        .unwrap_or(TokenKind::Eof)
}

/// Parse a single token of the given kind
fn token<'src>(kind: TokenKind) -> impl FnMut(&mut Input<'src>) -> IResult<&'src Token<'src>> {
    move |input: &mut Input<'src>| {
        any.verify(move |token: &Token<'_>| token.kind == kind)
            .context(Context::Expected(kind.description()))
            .parse_next(input)
    }
}

/// Parse zero or more newlines
fn newlines0(input: &mut Input<'_>) -> IResult<()> {
    repeat(0.., token(TokenKind::Newline).void()).parse_next(input)
}

fn identifier(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &Token<'_>| {
        token
            .is(TokenKind::Identifier)
            .then(|| Spanned::new(token.text.to_string(), token.span))
    })
    .context(Context::Expected("identifier"))
    .parse_next(input)
}

/// Strip the quotes of a string argument and collapse doubled quotes.
fn unquote(text: &str) -> String {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close => {
            let doubled = format!("{open}{open}");
            chars.as_str().replace(&doubled, &open.to_string())
        }
        _ => text.to_string(),
    }
}

/// Parse the value of an argument
fn argument_value(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &Token<'_>| match token.kind {
        TokenKind::ArgValue | TokenKind::Identifier => {
            Some(Spanned::new(token.text.to_string(), token.span))
        }
        TokenKind::StringArg => Some(Spanned::new(unquote(token.text), token.span)),
        _ => None,
    })
    .context(Context::Expected("argument value"))
    .parse_next(input)
}

/// Parse `--key=value`
fn argument(input: &mut Input<'_>) -> IResult<Argument> {
    token(TokenKind::DoubleMinus).parse_next(input)?;

    let body = |input: &mut Input<'_>| -> IResult<Argument> {
        let key = identifier(input)?;
        token(TokenKind::Equals).parse_next(input)?;
        let value = argument_value(input)?;
        Ok(Argument { key, value })
    };
    body(input).map_err(ErrMode::cut)
}

/// Parse the exit status a transition fires on
fn exit_status(input: &mut Input<'_>) -> IResult<Spanned<ExitStatus>> {
    any.verify_map(|token: &Token<'_>| {
        let status = match token.kind {
            TokenKind::Star => ExitStatus::Wildcard,
            TokenKind::Identifier => ExitStatus::Code(token.text.to_string()),
            TokenKind::StringArg => match unquote(token.text) {
                code if code == "*" => ExitStatus::Wildcard,
                code => ExitStatus::Code(code),
            },
            _ => return None,
        };
        Some(Spanned::new(status, token.span))
    })
    .context(Context::Expected("exit status"))
    .parse_next(input)
}

/// Parse `'STATUS' -> target`
fn transition(input: &mut Input<'_>) -> IResult<Spanned<Transition>> {
    let on_exit = exit_status(input)?;

    let target = (|input: &mut Input<'_>| -> IResult<Spanned<String>> {
        token(TokenKind::Arrow).parse_next(input)?;
        identifier(input)
    })(input)
    .map_err(ErrMode::cut)?;

    let span = on_exit.span().union(target.span());
    Ok(Spanned::new(Transition { on_exit, target }, span))
}

fn transitions(input: &mut Input<'_>) -> IResult<Vec<Spanned<Transition>>> {
    repeat(0.., transition).parse_next(input)
}

/// Parse a task app: name, arguments and transitions
fn task_app(input: &mut Input<'_>, label: Option<Spanned<String>>) -> IResult<Spanned<TaskApp>> {
    let name = identifier(input)?;
    let arguments: Vec<Argument> = repeat(0.., argument).parse_next(input)?;
    let transitions = transitions(input)?;

    let start = label.as_ref().map_or(name.span(), |label| label.span());
    let span = arguments
        .iter()
        .map(Argument::span)
        .chain(transitions.iter().map(|transition| transition.span()))
        .fold(start.union(name.span()), |acc, span| acc.union(span));

    Ok(Spanned::new(
        TaskApp {
            label,
            name,
            arguments,
            transitions,
        },
        span,
    ))
}

/// Parse the branches of a split up to and including the closing `>`.
fn split_branches(input: &mut Input<'_>) -> IResult<(Vec<Sequence>, Span)> {
    let mut branches = Vec::new();
    loop {
        newlines0(input)?;
        branches.push(sequence(input)?);
        newlines0(input)?;

        match peek_kind(input) {
            TokenKind::DoublePipe => {
                token(TokenKind::DoublePipe).parse_next(input)?;
            }
            TokenKind::RightAngle => {
                let close = token(TokenKind::RightAngle).parse_next(input)?;
                return Ok((branches, close.span));
            }
            _ => return Err(expected("`||` or `>`")),
        }
    }
}

/// Parse `<a || b>` with its transitions
fn split(input: &mut Input<'_>, label: Option<Spanned<String>>) -> IResult<Spanned<Split>> {
    let open = token(TokenKind::LeftAngle).parse_next(input)?;
    let (branches, close) = split_branches(input).map_err(ErrMode::cut)?;
    let transitions = transitions(input)?;

    let start = label.as_ref().map_or(open.span, |label| label.span());
    let span = transitions
        .iter()
        .map(|transition| transition.span())
        .fold(start.union(close), |acc, span| acc.union(span));

    Ok(Spanned::new(
        Split {
            label,
            branches,
            transitions,
        },
        span,
    ))
}

/// Parse an optionally labelled task app or split
fn labelled_step(input: &mut Input<'_>) -> IResult<Step> {
    let label = opt(terminated(identifier, token(TokenKind::Colon))).parse_next(input)?;
    let labelled = label.is_some();

    let result = match peek_kind(input) {
        TokenKind::LeftAngle => split(input, label).map(Step::Split),
        TokenKind::Identifier => task_app(input, label).map(Step::TaskApp),
        _ => Err(expected("task app or split")),
    };

    if labelled {
        result.map_err(ErrMode::cut)
    } else {
        result
    }
}

/// Parse one step into `steps`; a parenthesized group contributes all of
/// its steps.
fn step(input: &mut Input<'_>, steps: &mut Vec<Step>) -> IResult<()> {
    if peek_kind(input) != TokenKind::LeftParen {
        steps.push(labelled_step(input)?);
        return Ok(());
    }

    token(TokenKind::LeftParen).parse_next(input)?;
    let group = (|input: &mut Input<'_>| -> IResult<Sequence> {
        newlines0(input)?;
        let group = sequence(input)?;
        newlines0(input)?;
        token(TokenKind::RightParen).parse_next(input)?;
        Ok(group)
    })(input)
    .map_err(ErrMode::cut)?;

    steps.extend(group.steps);
    Ok(())
}

fn starts_step(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier | TokenKind::LeftAngle | TokenKind::LeftParen
    )
}

/// Parse steps separated by `&&` or line breaks
fn sequence(input: &mut Input<'_>) -> IResult<Sequence> {
    let mut steps = Vec::new();
    step(input, &mut steps)?;

    loop {
        let checkpoint = input.checkpoint();
        let before = input.eof_offset();
        newlines0(input)?;
        let crossed_newline = input.eof_offset() < before;

        match peek_kind(input) {
            TokenKind::AmpAmp => {
                token(TokenKind::AmpAmp).parse_next(input)?;
                newlines0(input)?;
                step(input, &mut steps).map_err(ErrMode::cut)?;
            }
            kind if crossed_newline && starts_step(kind) => {
                step(input, &mut steps).map_err(ErrMode::cut)?;
            }
            _ => {
                input.reset(&checkpoint);
                break;
            }
        }
    }

    Ok(Sequence::new(steps))
}

/// Parse a whole definition
fn task(input: &mut Input<'_>) -> IResult<Sequence> {
    newlines0(input)?;
    if peek_kind(input) == TokenKind::Eof {
        return Ok(Sequence::default());
    }

    let sequence = sequence(input)?;
    newlines0(input)?;
    if peek_kind(input) != TokenKind::Eof {
        return Err(expected("`&&` or end of input").cut());
    }
    Ok(sequence)
}

/// Build the diagnostic for a failed parse.
///
/// The offending token is the one the parser stopped at: `remaining` is the
/// number of tokens left unconsumed.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[Token<'_>],
    remaining: usize,
) -> Diagnostic {
    let expected = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().find_map(|ctx| match ctx {
            Context::Expected(label) => Some(*label),
        }),
        ErrMode::Incomplete(_) => None,
    };

    let index = tokens
        .len()
        .saturating_sub(remaining)
        .min(tokens.len().saturating_sub(1));
    let Some(token) = tokens.get(index) else {
        return Diagnostic::error("unexpected end of input").with_code(ErrorCode::E101);
    };

    let message = match expected {
        Some(label) => format!("unexpected {token}: expected {label}"),
        None => format!("unexpected {token}"),
    };
    let code = if token.is(TokenKind::Eof) {
        ErrorCode::E101
    } else {
        ErrorCode::E100
    };

    let diagnostic = Diagnostic::error(message)
        .with_code(code)
        .with_label(token.span, code.description());
    match expected {
        Some(label) => diagnostic.with_help(format!("insert {label} here")),
        None => diagnostic,
    }
}

/// Parse a composed task definition.
///
/// Lexer errors are reported before any parsing; the first one wins. The
/// tree is not validated, see [`validate`](crate::validate::validate).
///
/// # Errors
///
/// Returns a [`Diagnostic`] locating the first lexical or syntax error, or
/// an `E102` diagnostic for an empty definition when
/// [`ParserConfig::allow_empty_graphs`] is off.
pub fn parse(name: &str, source: &str, config: &ParserConfig) -> Result<ComposedTask, Diagnostic> {
    let tokens = lexer::tokenize(source);
    trace!(token_count = tokens.len(); "Tokenized task definition");

    if let Some(bad) = tokens.iter().find(|token| token.is(TokenKind::Error)) {
        return Err(lexer::error_diagnostic(bad));
    }

    let mut token_slice = TokenSlice::new(&tokens);
    let sequence = match task(&mut token_slice) {
        Ok(sequence) => sequence,
        Err(e) => {
            let remaining = token_slice.eof_offset();
            return Err(convert_error(e, &tokens, remaining));
        }
    };

    if sequence.steps.is_empty() && !config.allow_empty_graphs {
        return Err(Diagnostic::error("task definition is empty")
            .with_code(ErrorCode::E102)
            .with_label(Span::new(0..source.len()), ErrorCode::E102.description())
            .with_help("add at least one task app"));
    }

    debug!(name, steps = sequence.steps.len(); "Parsed task definition");
    Ok(ComposedTask::new(name, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(source: &str) -> Result<ComposedTask, Diagnostic> {
        parse("test", source, &ParserConfig::default())
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'FAILED'"), "FAILED");
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("'it''s'"), "it's");
        assert_eq!(unquote("\"say \"\"hi\"\"\""), "say \"hi\"");
        assert_eq!(unquote("''"), "");
    }

    #[test]
    fn test_identifier() {
        let tokens = lexer::tokenize("timestamp");
        let mut slice = TokenSlice::new(&tokens);

        let name = identifier(&mut slice).unwrap();
        assert_eq!(name.inner(), "timestamp");
        assert_eq!(name.span(), Span::new(0..9));
    }

    #[test]
    fn test_transition_commits_after_status() {
        let tokens = lexer::tokenize("'FAILED' b");
        let mut slice = TokenSlice::new(&tokens);

        assert!(matches!(transition(&mut slice), Err(ErrMode::Cut(_))));
    }

    #[test]
    fn test_transition_backtracks_without_status() {
        let tokens = lexer::tokenize("&& b");
        let mut slice = TokenSlice::new(&tokens);

        assert!(matches!(transition(&mut slice), Err(ErrMode::Backtrack(_))));
        assert_eq!(slice.eof_offset(), tokens.len());
    }

    #[test]
    fn test_convert_error_points_at_offending_token() {
        let err = parse_default("foo && && bar").unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert_eq!(err.primary_span(), Some(Span::new(7..9)));
        assert_eq!(
            err.message(),
            "unexpected `&&`: expected task app or split"
        );
    }

    #[test]
    fn test_convert_error_at_end_of_input() {
        let err = parse_default("foo &&").unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E101));
        assert_eq!(err.primary_span(), Some(Span::new(6..6)));
    }

    #[test]
    fn test_lexer_error_reported_first() {
        let err = parse_default("foo | bar &&").unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E002));
        assert_eq!(err.primary_span(), Some(Span::new(4..5)));
    }

    #[test]
    fn test_empty_definition() {
        assert!(parse_default("  \n ").unwrap().is_empty());

        let config = ParserConfig {
            allow_empty_graphs: false,
            ..ParserConfig::default()
        };
        let err = parse("test", "", &config).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E102));
    }
}
