use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Everything that can go wrong while compiling or evaluating an expression.
///
/// Variants that point at a location in the expression text carry a label, so
/// a [`miette::Report`] built from them can render the offending spot once the
/// source code is attached.
#[derive(Debug, Clone, PartialEq, Diagnostic, Error)]
pub enum Error {
    #[error("empty expression")]
    #[diagnostic(code(calculate::empty_expression))]
    EmptyExpression,

    #[error("bad name '{name}'")]
    #[diagnostic(
        code(calculate::bad_name),
        help("variable, function and constant names may only contain ASCII letters")
    )]
    BadName { name: String },

    #[error("duplicate variable name '{name}'")]
    #[diagnostic(code(calculate::duplicate_name))]
    DuplicateName { name: String },

    #[error("undefined symbol{}", quoted(.token))]
    #[diagnostic(code(calculate::undefined_symbol))]
    UndefinedSymbol {
        token: Option<String>,
        #[label("not recognized here")]
        span: Option<SourceSpan>,
    },

    #[error("syntax error")]
    #[diagnostic(code(calculate::syntax_error))]
    SyntaxError {
        reason: String,
        #[label("{reason}")]
        span: SourceSpan,
    },

    #[error("parenthesis mismatch")]
    #[diagnostic(code(calculate::parenthesis_mismatch))]
    ParenthesisMismatch {
        #[label("this has no matching parenthesis")]
        span: SourceSpan,
    },

    #[error("missing arguments for '{symbol}'")]
    #[diagnostic(code(calculate::missing_arguments))]
    MissingArguments {
        symbol: String,
        expected: usize,
        found: usize,
        #[label("expected {expected} arguments, found {found}")]
        span: SourceSpan,
    },

    #[error("too many constants")]
    #[diagnostic(
        code(calculate::constants_excess),
        help("an operator or separator is probably missing")
    )]
    ConstantsExcess {
        #[label("this value is never used")]
        span: SourceSpan,
    },

    #[error("expression nested too deeply")]
    #[diagnostic(
        code(calculate::too_deep),
        help("split the expression into smaller ones, at most {limit} levels deep")
    )]
    TooDeep {
        limit: usize,
        #[label("this goes over the limit")]
        span: SourceSpan,
    },

    #[error("expected {expected} values, got {found}")]
    #[diagnostic(code(calculate::evaluation_error))]
    EvaluationError { expected: usize, found: usize },
}

fn quoted(token: &Option<String>) -> String {
    token
        .as_ref()
        .map(|t| format!(" '{t}'"))
        .unwrap_or_default()
}
