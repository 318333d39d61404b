use regex::CaptureMatches;

use crate::error::Error;
use crate::registry::Registry;
use crate::token::{Span, Token, TokenClass, TokenKind};

/// Splits expression text into tokens using the registry's composite pattern.
///
/// Whitespace between tokens is skipped. Any other text the pattern does not
/// match is reported as an undefined symbol.
pub struct Lexer<'source, 'context> {
    source: &'source str,
    variables: &'context [String],
    registry: &'context Registry,
    matches: CaptureMatches<'context, 'source>,
    position: usize,
    previous: Option<TokenClass>,
    peeked: Option<Token>,
}

impl<'source, 'context> Lexer<'source, 'context> {
    pub fn new(
        source: &'source str,
        variables: &'context [String],
        registry: &'context Registry,
    ) -> Self {
        Self {
            source,
            variables,
            registry,
            matches: registry.pattern().captures_iter(source),
            position: 0,
            previous: None,
            peeked: None,
        }
    }

    fn undefined(&self, span: Span) -> Error {
        Error::UndefinedSymbol {
            token: Some(self.source[span.start..span.end].to_string()),
            span: Some(span.into()),
        }
    }

    /// Text the pattern skipped over must be whitespace.
    fn check_gap(&self, end: usize) -> crate::Result<()> {
        let gap = &self.source[self.position..end];
        match gap.find(|c: char| !c.is_whitespace()) {
            Some(offset) => {
                let start = self.position + offset;
                let trimmed = gap[offset..].trim_end();
                Err(self.undefined(Span::new(start, start + trimmed.len())))
            }
            None => Ok(()),
        }
    }

    fn parse_number(&mut self, text: &str, span: Span) -> crate::Result<Token> {
        // A leading minus right after an operand is a subtraction, not a sign.
        if text.starts_with('-')
            && matches!(
                self.previous,
                Some(TokenClass::Constant) | Some(TokenClass::Right)
            )
        {
            let minus = Span::new(span.start, span.start + 1);
            let operator = self
                .registry
                .operator("-")
                .ok_or_else(|| self.undefined(minus))?;

            self.peeked = Some(Token {
                kind: TokenKind::Constant(parse_literal(&text[1..])),
                span: Span::new(minus.end, span.end),
            });
            return Ok(Token {
                kind: TokenKind::Operator(operator.clone()),
                span: minus,
            });
        }

        Ok(Token {
            kind: TokenKind::Constant(parse_literal(text)),
            span,
        })
    }

    fn parse_name(&self, name: &str, span: Span) -> crate::Result<Token> {
        let kind = if let Some(index) = self.variables.iter().position(|v| v == name) {
            TokenKind::Variable(index)
        } else if let Some(function) = self.registry.function(name) {
            TokenKind::Function(function.clone())
        } else if let Some(value) = self.registry.constant(name) {
            TokenKind::Constant(value)
        } else {
            return Err(self.undefined(span));
        };

        Ok(Token { kind, span })
    }

    fn parse_symbol(&self, symbol: &str, span: Span) -> crate::Result<Token> {
        let kind = match symbol {
            "(" => TokenKind::Left,
            ")" => TokenKind::Right,
            "," => TokenKind::Separator,
            symbol => match self.registry.operator(symbol) {
                Some(operator) => TokenKind::Operator(operator.clone()),
                None => return Err(self.undefined(span)),
            },
        };

        Ok(Token { kind, span })
    }
}

impl Iterator for Lexer<'_, '_> {
    type Item = crate::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(peeked) = self.peeked.take() {
            self.previous = Some(peeked.class());
            return Some(Ok(peeked));
        }

        let captures = match self.matches.next() {
            Some(captures) => captures,
            None => {
                // Trailing text after the last token.
                let end = self.source.len();
                let result = self.check_gap(end);
                self.position = end;
                return result.err().map(Err);
            }
        };

        let whole = captures.get(0).expect("capture group 0 is always present");
        let span = Span::new(whole.start(), whole.end());
        if let Err(e) = self.check_gap(span.start) {
            self.position = self.source.len();
            return Some(Err(e));
        }
        self.position = span.end;

        let token = if captures.name("number").is_some() {
            self.parse_number(whole.as_str(), span)
        } else if captures.name("name").is_some() {
            self.parse_name(whole.as_str(), span)
        } else {
            self.parse_symbol(whole.as_str(), span)
        };

        if let Ok(token) = &token {
            self.previous = Some(token.class());
        }
        Some(token)
    }
}

/// Tokenizes the whole expression, stopping at the first unknown symbol.
pub fn tokenize(
    source: &str,
    variables: &[String],
    registry: &Registry,
) -> crate::Result<Vec<Token>> {
    Lexer::new(source, variables, registry).collect()
}

fn parse_literal(literal: &str) -> f64 {
    // The pattern only admits digits with at most one decimal point, which
    // `f64::from_str` accepts, including forms like "1." and ".5".
    literal
        .parse()
        .expect("numeric literals matched by the pattern always parse")
}
