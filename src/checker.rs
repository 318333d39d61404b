use crate::error::Error;
use crate::token::{Token, TokenClass};

fn syntax_error(token: &Token, reason: &str) -> Error {
    Error::SyntaxError {
        reason: reason.to_string(),
        span: token.span.into(),
    }
}

/// Validates the order of a token sequence in a single forward pass and
/// hands it back unchanged.
///
/// Only adjacent pairs are inspected. Operand juxtapositions such as `2 3` or
/// `2 (3)` pass this stage and are rejected when the tree is built.
pub fn check(tokens: Vec<Token>) -> crate::Result<Vec<Token>> {
    let (first, last) = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(Error::UndefinedSymbol {
                token: None,
                span: None,
            })
        }
    };

    if tokens.len() == 1 && first.class() != TokenClass::Constant {
        return Err(syntax_error(first, "expected a number or variable"));
    }

    if matches!(
        first.class(),
        TokenClass::Right | TokenClass::Separator | TokenClass::Operator
    ) {
        return Err(syntax_error(first, "expression cannot start here"));
    }

    for pair in tokens.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        match current.class() {
            // Anything may follow an operand.
            TokenClass::Constant | TokenClass::Right => {}
            TokenClass::Left | TokenClass::Separator | TokenClass::Operator => {
                if !matches!(
                    next.class(),
                    TokenClass::Constant | TokenClass::Left | TokenClass::Function
                ) {
                    return Err(syntax_error(next, "expected an operand"));
                }
            }
            TokenClass::Function => {
                if next.class() != TokenClass::Left {
                    return Err(syntax_error(next, "expected '('"));
                }
            }
        }
    }

    if matches!(
        last.class(),
        TokenClass::Left | TokenClass::Separator | TokenClass::Operator | TokenClass::Function
    ) {
        return Err(syntax_error(last, "expression cannot end here"));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::registry::Registry;

    fn check_source(source: &str) -> crate::Result<Vec<Token>> {
        let registry = Registry::default();
        check(tokenize(source, &["x".to_string(), "y".to_string()], &registry)?)
    }

    #[test]
    fn accepts_valid_sequences() {
        for input in [
            "1",
            "x",
            "(x)",
            "x + y * 2",
            "sin(x) ^ 2",
            "max(x, (y))",
            "((1))",
            "-2 * x",
            // Caught later by the tree builder.
            "2 3",
            "2 (3)",
        ] {
            let tokens = check_source(input);
            assert!(tokens.is_ok(), "rejected '{input}': {tokens:?}");
        }
    }

    #[test]
    fn rejects_invalid_sequences() {
        for (input, offset) in [
            ("(", 0),
            ("sin", 0),
            ("+ 1", 0),
            (") 1", 0),
            (", 1", 0),
            ("1 +", 2),
            ("1 + * 2", 4),
            ("(,1)", 1),
            ("sin x", 4),
            ("sin + 1", 4),
            ("max(1,)", 6),
            ("()", 1),
            ("1 ,", 2),
        ] {
            match check_source(input) {
                Err(Error::SyntaxError { span, .. }) => {
                    assert_eq!(span.offset(), offset, "when checking '{input}'")
                }
                other => panic!("expected a syntax error for '{input}', got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_input_is_undefined() {
        assert_eq!(
            check(Vec::new()).unwrap_err(),
            Error::UndefinedSymbol {
                token: None,
                span: None
            }
        );
    }
}
