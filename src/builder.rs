use crate::ast::Node;
use crate::error::Error;
use crate::token::{Span, Token, TokenKind};

/// Deepest tree [`build_tree`] accepts, counting leaves as one level.
///
/// Evaluating, cloning and dropping a tree all recurse once per level, so
/// this bounds their stack use. A chain like `1 + 1 + ... + 1` nests one level
/// per operator.
pub const MAX_DEPTH: usize = 512;

/// Assembles a postfix token sequence into a single-rooted tree.
pub fn build_tree(postfix: Vec<Token>) -> crate::Result<Node> {
    let mut operands: Vec<(Node, Span, usize)> = Vec::new();

    for token in postfix {
        let mut span = token.span;
        let mut depth = 1;
        let node = match token.kind {
            TokenKind::Constant(value) => Node::Constant(value),
            TokenKind::Variable(index) => Node::Variable(index),
            TokenKind::Function(function) => {
                let arity = function.arity;
                if operands.len() < arity {
                    return Err(Error::MissingArguments {
                        symbol: function.name.clone(),
                        expected: arity,
                        found: operands.len(),
                        span: token.span.into(),
                    });
                }

                let first = operands.len() - arity;
                let args = operands
                    .drain(first..)
                    .map(|(node, operand, nested)| {
                        span = span.union(operand);
                        depth = depth.max(nested + 1);
                        node
                    })
                    .collect();
                Node::Function { function, args }
            }
            TokenKind::Operator(operator) => {
                let (rhs, lhs) = match (operands.pop(), operands.pop()) {
                    (Some((rhs, rhs_span, rhs_depth)), Some((lhs, lhs_span, lhs_depth))) => {
                        span = span.union(lhs_span).union(rhs_span);
                        depth = lhs_depth.max(rhs_depth) + 1;
                        (rhs, lhs)
                    }
                    (rhs, _) => {
                        return Err(Error::MissingArguments {
                            symbol: operator.symbol.clone(),
                            expected: 2,
                            found: usize::from(rhs.is_some()),
                            span: token.span.into(),
                        })
                    }
                };
                Node::Operator {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            TokenKind::Left | TokenKind::Right | TokenKind::Separator => {
                return Err(Error::UndefinedSymbol {
                    token: Some(token.kind.to_string()),
                    span: Some(token.span.into()),
                })
            }
        };

        if depth > MAX_DEPTH {
            return Err(Error::TooDeep {
                limit: MAX_DEPTH,
                span: token.span.into(),
            });
        }
        operands.push((node, span, depth));
    }

    let mut operands = operands.into_iter();
    match (operands.next(), operands.next()) {
        (Some((root, _, _)), None) => Ok(root),
        (Some(_), Some((_, span, _))) => Err(Error::ConstantsExcess { span: span.into() }),
        (None, _) => Err(Error::UndefinedSymbol {
            token: None,
            span: None,
        }),
    }
}
