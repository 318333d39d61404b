use std::sync::Arc;

use crate::error::Error;
use crate::registry::Function;
use crate::token::{Span, Token, TokenClass, TokenKind};

/// An open parenthesis, and the function it calls if any.
struct Group {
    call: Option<Call>,
}

struct Call {
    function: Arc<Function>,
    span: Span,
    arguments: usize,
    // Start of the first argument past the function's arity.
    excess: Option<Span>,
}

fn mismatch(span: Span) -> Error {
    Error::ParenthesisMismatch { span: span.into() }
}

/// Whether `top` must leave the operator stack before `operator` is pushed.
fn yields_to(operator: &TokenKind, top: &TokenKind) -> bool {
    match (operator, top) {
        (TokenKind::Operator(current), TokenKind::Operator(top)) => {
            if current.is_left_associative() {
                current.precedence <= top.precedence
            } else {
                current.precedence < top.precedence
            }
        }
        _ => false,
    }
}

/// Reorders a checked infix token sequence into postfix order with the
/// shunting-yard algorithm.
///
/// Besides balancing parentheses, the number of arguments in every function
/// call is compared against the function's arity.
pub fn to_postfix(infix: Vec<Token>) -> crate::Result<Vec<Token>> {
    let mut postfix = Vec::with_capacity(infix.len());
    let mut operations: Vec<Token> = Vec::new();
    let mut groups: Vec<Group> = Vec::new();

    let mut tokens = infix.into_iter().peekable();
    while let Some(token) = tokens.next() {
        match token.class() {
            TokenClass::Constant => postfix.push(token),
            TokenClass::Function => operations.push(token),
            TokenClass::Separator => {
                loop {
                    match operations.last() {
                        Some(top) if top.kind.is(TokenClass::Left) => break,
                        Some(_) => postfix.extend(operations.pop()),
                        None => return Err(mismatch(token.span)),
                    }
                }

                if let Some(Group { call: Some(call) }) = groups.last_mut() {
                    call.arguments += 1;
                    if call.arguments > call.function.arity && call.excess.is_none() {
                        call.excess = Some(tokens.peek().map_or(token.span, |t| t.span));
                    }
                }
            }
            TokenClass::Operator => {
                while let Some(top) = operations.last() {
                    match top.class() {
                        TokenClass::Left => break,
                        TokenClass::Function => {
                            postfix.extend(operations.pop());
                            break;
                        }
                        _ if yields_to(&token.kind, &top.kind) => {
                            postfix.extend(operations.pop());
                        }
                        _ => break,
                    }
                }
                operations.push(token);
            }
            TokenClass::Left => {
                let call = match operations.last() {
                    Some(Token {
                        kind: TokenKind::Function(function),
                        span,
                    }) => Some(Call {
                        function: function.clone(),
                        span: *span,
                        arguments: 1,
                        excess: None,
                    }),
                    _ => None,
                };
                groups.push(Group { call });
                operations.push(token);
            }
            TokenClass::Right => {
                loop {
                    match operations.pop() {
                        Some(top) if top.kind.is(TokenClass::Left) => break,
                        Some(top) => postfix.push(top),
                        None => return Err(mismatch(token.span)),
                    }
                }

                let group = groups.pop().ok_or_else(|| mismatch(token.span))?;
                if let Some(call) = group.call {
                    check_arguments(&call)?;
                    // The function sits right below its opening parenthesis.
                    postfix.extend(operations.pop());
                }
            }
        }
    }

    while let Some(top) = operations.pop() {
        if top.kind.is(TokenClass::Left) {
            return Err(mismatch(top.span));
        }
        postfix.push(top);
    }

    Ok(postfix)
}

fn check_arguments(call: &Call) -> crate::Result<()> {
    let expected = call.function.arity;
    if call.arguments < expected {
        return Err(Error::MissingArguments {
            symbol: call.function.name.clone(),
            expected,
            found: call.arguments,
            span: call.span.into(),
        });
    }
    if let Some(excess) = call.excess {
        return Err(Error::ConstantsExcess {
            span: excess.into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::check;
    use crate::lexer::tokenize;
    use crate::registry::{Associativity, Operator, Registry};

    fn render(tokens: &[Token], source: &str) -> String {
        tokens
            .iter()
            .map(|t| t.text(source))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn convert_with(source: &str, registry: &Registry) -> crate::Result<String> {
        let variables = ["x".to_string(), "y".to_string()];
        let postfix = to_postfix(check(tokenize(source, &variables, registry)?)?)?;
        Ok(render(&postfix, source))
    }

    fn convert(source: &str) -> crate::Result<String> {
        convert_with(source, &Registry::default())
    }

    #[test]
    fn test_to_postfix() {
        for (input, expected) in [
            ("3 + 4 * 2", "3 4 2 * +"),
            ("(3 + 4) * 2", "3 4 + 2 *"),
            ("1 - 2 - 3", "1 2 - 3 -"),
            ("2 ^ 3 ^ 2", "2 3 2 ^ ^"),
            ("x / y % 2", "x y / 2 %"),
            ("sin(x)", "x sin"),
            ("max(x, y + 1)", "x y 1 + max"),
            ("2 * sin(x) + 1", "2 x sin * 1 +"),
            ("sin(x) ^ 2", "x sin 2 ^"),
            ("max(min(x, 1), cos(y))", "x 1 min y cos max"),
            ("3-4", "3 4 -"),
        ] {
            assert_eq!(convert(input).unwrap(), expected, "when converting '{input}'");
        }
    }

    #[test]
    fn custom_operators_respect_precedence() {
        let mut registry = Registry::default();
        registry
            .add_operator(Operator::new("&", 1, Associativity::Left, f64::min))
            .unwrap();

        assert_eq!(convert_with("x + 1 & y * 2", &registry).unwrap(), "x 1 + y 2 * &");
    }

    #[test]
    fn unbalanced_parentheses() {
        for (input, offset) in [
            ("(1 + 2", 0),
            ("1 + 2)", 5),
            ("((1)", 0),
            ("(1))", 3),
            ("1, 2", 1),
            ("max(1, 2))", 9),
        ] {
            match convert(input) {
                Err(Error::ParenthesisMismatch { span }) => {
                    assert_eq!(span.offset(), offset, "when converting '{input}'")
                }
                other => panic!("expected a mismatch for '{input}', got {other:?}"),
            }
        }
    }

    #[test]
    fn call_arguments_are_counted() {
        match convert("max(1)") {
            Err(Error::MissingArguments {
                symbol,
                expected,
                found,
                span,
            }) => {
                assert_eq!(symbol, "max");
                assert_eq!((expected, found), (2, 1));
                assert_eq!(span.offset(), 0);
            }
            other => panic!("unexpected {other:?}"),
        }

        match convert("sin(x, y)") {
            Err(Error::ConstantsExcess { span }) => assert_eq!(span.offset(), 7),
            other => panic!("unexpected {other:?}"),
        }

        // Without counting, this would read as max(3, 1).
        assert!(matches!(
            convert("3 max(1)"),
            Err(Error::MissingArguments { .. })
        ));
    }
}
