use std::collections::HashSet;
use std::str::FromStr;

use crate::ast::Node;
use crate::builder::build_tree;
use crate::builtins::BUILTINS;
use crate::checker::check;
use crate::error::Error;
use crate::lexer::tokenize;
use crate::optimizer::fold;
use crate::postfix::to_postfix;
use crate::registry::{is_valid_name, Registry};

/// Anything that names the variables of an expression, in slot order.
///
/// A string is read as a comma-separated list: all whitespace is removed and
/// a trailing comma is ignored, so `"x, y"` and `"x,y,"` both declare `x`
/// then `y`, and `""` declares nothing.
pub trait IntoVariables {
    fn into_variables(self) -> Vec<String>;
}

impl IntoVariables for &str {
    fn into_variables(self) -> Vec<String> {
        let compact: String = self.chars().filter(|c| !c.is_whitespace()).collect();
        let mut names: Vec<String> = compact.split(',').map(str::to_string).collect();
        if names.last().is_some_and(String::is_empty) {
            names.pop();
        }
        names
    }
}

impl<S: AsRef<str>> IntoVariables for &[S] {
    fn into_variables(self) -> Vec<String> {
        self.iter().map(|name| name.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoVariables for &Vec<S> {
    fn into_variables(self) -> Vec<String> {
        self.as_slice().into_variables()
    }
}

impl<S: AsRef<str>> IntoVariables for Vec<S> {
    fn into_variables(self) -> Vec<String> {
        self.as_slice().into_variables()
    }
}

impl<S: AsRef<str>, const N: usize> IntoVariables for [S; N] {
    fn into_variables(self) -> Vec<String> {
        self.as_slice().into_variables()
    }
}

fn validate(variables: Vec<String>) -> crate::Result<Vec<String>> {
    if let Some(name) = variables.iter().find(|name| !is_valid_name(name)) {
        return Err(Error::BadName { name: name.clone() });
    }

    let mut seen = HashSet::with_capacity(variables.len());
    if let Some(name) = variables.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(Error::DuplicateName { name: name.clone() });
    }

    Ok(variables)
}

/// A compiled arithmetic expression, ready to be evaluated many times.
///
/// Each declared variable owns one slot. Evaluating writes the given values
/// into the slots and walks the tree; nothing is parsed again.
///
/// ```
/// use calculate::Expression;
///
/// let mut area = Expression::new("pi * r ^ 2", "r")?;
/// assert_eq!(area.evaluate_single(1.0)?, std::f64::consts::PI);
///
/// let mut hypot = Expression::new("sqrt(a^2 + b^2)", ["a", "b"])?;
/// assert_eq!(hypot.evaluate_with(&[3.0, 4.0])?, 5.0);
/// # Ok::<(), calculate::Error>(())
/// ```
#[derive(Debug)]
pub struct Expression {
    expression: String,
    variables: Vec<String>,
    tree: Node,
    slots: Box<[f64]>,
    scratch: Vec<f64>,
}

impl Expression {
    /// Compiles `expression` against the builtin operators, functions and
    /// constants.
    pub fn new(expression: &str, variables: impl IntoVariables) -> crate::Result<Self> {
        Self::with_registry(expression, variables, &BUILTINS)
    }

    /// Compiles `expression` against a custom set of symbols.
    pub fn with_registry(
        expression: &str,
        variables: impl IntoVariables,
        registry: &Registry,
    ) -> crate::Result<Self> {
        let variables = validate(variables.into_variables())?;
        if expression.is_empty() {
            return Err(Error::EmptyExpression);
        }

        let tokens = check(tokenize(expression, &variables, registry)?)?;
        let tree = build_tree(to_postfix(tokens)?)?;
        debug_assert!(tree.max_variable().map_or(true, |i| i < variables.len()));

        Ok(Self {
            expression: expression.to_string(),
            slots: vec![0.0; variables.len()].into_boxed_slice(),
            scratch: Vec::with_capacity(tree.scratch_depth()),
            variables,
            tree,
        })
    }

    /// Folds constant subtrees, so `2 * pi * r` multiplies once per
    /// evaluation instead of twice.
    ///
    /// Function calls with constant arguments run once, right here, and never
    /// again. Only use this when every callable in the expression is pure.
    pub fn optimized(self) -> Self {
        Self {
            tree: fold(self.tree),
            ..self
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    /// Current variable values, in declaration order.
    pub fn slots(&self) -> &[f64] {
        &self.slots
    }

    /// Lets callers set variables ahead of [`Expression::evaluate`].
    pub fn slots_mut(&mut self) -> &mut [f64] {
        &mut self.slots
    }

    /// Evaluates with whatever the slots currently hold: zeros right after
    /// construction, otherwise the values of the last call.
    pub fn evaluate(&mut self) -> f64 {
        self.tree.evaluate(&self.slots, &mut self.scratch)
    }

    /// Writes `value` into the last declared variable and evaluates.
    pub fn evaluate_single(&mut self, value: f64) -> crate::Result<f64> {
        let Some(last) = self.slots.last_mut() else {
            return Err(Error::EvaluationError {
                expected: 0,
                found: 1,
            });
        };

        *last = value;
        Ok(self.evaluate())
    }

    /// Writes one value per declared variable, in order, and evaluates.
    pub fn evaluate_with(&mut self, values: &[f64]) -> crate::Result<f64> {
        if values.len() != self.slots.len() {
            return Err(Error::EvaluationError {
                expected: self.slots.len(),
                found: values.len(),
            });
        }

        self.slots.copy_from_slice(values);
        Ok(self.evaluate())
    }
}

impl Clone for Expression {
    /// The copy gets its own zeroed slots, as if compiled afresh from the same
    /// text and variables.
    fn clone(&self) -> Self {
        Self {
            expression: self.expression.clone(),
            variables: self.variables.clone(),
            tree: self.tree.clone(),
            slots: vec![0.0; self.slots.len()].into_boxed_slice(),
            scratch: Vec::with_capacity(self.scratch.capacity()),
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

impl FromStr for Expression {
    type Err = Error;

    /// Parses an expression without variables.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s, "")
    }
}
