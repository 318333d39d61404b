use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::Regex;

use crate::error::Error;

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z]+$").expect("name pattern is valid"));

/// Variable, function and constant names are plain ASCII letters.
pub(crate) fn is_valid_name(name: &str) -> bool {
    NAME.is_match(name)
}

fn is_valid_operator_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol.chars().any(|c| {
            c.is_alphanumeric() || c.is_whitespace() || matches!(c, '.' | '(' | ')' | ',')
        })
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

type BinaryFn = dyn Fn(f64, f64) -> f64 + Send + Sync;
type NaryFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

pub struct Operator {
    pub symbol: String,
    pub precedence: u8,
    pub associativity: Associativity,
    callable: Box<BinaryFn>,
}

impl Operator {
    pub fn new<F>(
        symbol: impl Into<String>,
        precedence: u8,
        associativity: Associativity,
        callable: F,
    ) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            symbol: symbol.into(),
            precedence,
            associativity,
            callable: Box::new(callable),
        }
    }

    pub fn is_left_associative(&self) -> bool {
        self.associativity == Associativity::Left
    }

    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        (self.callable)(lhs, rhs)
    }
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("symbol", &self.symbol)
            .field("precedence", &self.precedence)
            .field("associativity", &self.associativity)
            .finish_non_exhaustive()
    }
}

/// A native callable taking a fixed number of `f64` arguments.
///
/// Implemented for every `Fn(f64, ..) -> f64` with one to four parameters, so
/// the arity of a function is read off its type at registration:
///
/// ```
/// use calculate::Function;
///
/// let hypot = Function::new("hypot", f64::hypot);
/// assert_eq!(hypot.arity, 2);
/// assert_eq!(hypot.call(&[3.0, 4.0]), 5.0);
/// ```
pub trait NativeFunction<Args>: Send + Sync + 'static {
    const ARITY: usize;

    /// `args` always holds exactly `ARITY` values.
    fn invoke(&self, args: &[f64]) -> f64;
}

macro_rules! native_function {
    (@f64 $_index:tt) => { f64 };
    ($arity:literal; $($index:tt),+) => {
        impl<F> NativeFunction<($(native_function!(@f64 $index),)+)> for F
        where
            F: Fn($(native_function!(@f64 $index)),+) -> f64 + Send + Sync + 'static,
        {
            const ARITY: usize = $arity;

            fn invoke(&self, args: &[f64]) -> f64 {
                self($(args[$index]),+)
            }
        }
    };
}

native_function!(1; 0);
native_function!(2; 0, 1);
native_function!(3; 0, 1, 2);
native_function!(4; 0, 1, 2, 3);

pub struct Function {
    pub name: String,
    pub arity: usize,
    callable: Box<NaryFn>,
}

impl Function {
    pub fn new<Args, F>(name: impl Into<String>, callable: F) -> Self
    where
        F: NativeFunction<Args>,
    {
        Self {
            name: name.into(),
            arity: <F as NativeFunction<Args>>::ARITY,
            callable: Box::new(move |args: &[f64]| callable.invoke(args)),
        }
    }

    /// Registers a callable that receives its arguments as a slice of exactly
    /// `arity` values.
    pub fn with_arity<F>(name: impl Into<String>, arity: NonZeroUsize, callable: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity: arity.get(),
            callable: Box::new(callable),
        }
    }

    pub fn call(&self, args: &[f64]) -> f64 {
        debug_assert_eq!(args.len(), self.arity);
        (self.callable)(args)
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// The symbols an expression may refer to besides its own variables.
///
/// [`Registry::default`] holds the builtin operators, functions and
/// constants; [`Registry::empty`] starts from nothing.
#[derive(Debug, Clone)]
pub struct Registry {
    operators: HashMap<String, Arc<Operator>>,
    functions: HashMap<String, Arc<Function>>,
    constants: HashMap<String, f64>,
    pattern: OnceLock<Regex>,
}

impl Default for Registry {
    fn default() -> Self {
        crate::builtins::registry()
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
            functions: HashMap::new(),
            constants: HashMap::new(),
            pattern: OnceLock::new(),
        }
    }

    pub fn add_operator(&mut self, operator: Operator) -> crate::Result<&mut Self> {
        if !is_valid_operator_symbol(&operator.symbol) {
            return Err(Error::BadName {
                name: operator.symbol,
            });
        }

        self.operators
            .insert(operator.symbol.clone(), Arc::new(operator));
        self.pattern = OnceLock::new();
        Ok(self)
    }

    pub fn add_function(&mut self, function: Function) -> crate::Result<&mut Self> {
        if !is_valid_name(&function.name) {
            return Err(Error::BadName {
                name: function.name,
            });
        }

        self.constants.remove(&function.name);
        self.functions
            .insert(function.name.clone(), Arc::new(function));
        Ok(self)
    }

    pub fn add_constant(&mut self, name: impl Into<String>, value: f64) -> crate::Result<&mut Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(Error::BadName { name });
        }

        self.functions.remove(&name);
        self.constants.insert(name, value);
        Ok(self)
    }

    pub fn operator(&self, symbol: &str) -> Option<&Arc<Operator>> {
        self.operators.get(symbol)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(name)
    }

    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }

    /// Composite token pattern: numbers, names, then every operator symbol
    /// longest first, then parentheses and the separator.
    pub(crate) fn pattern(&self) -> &Regex {
        self.pattern.get_or_init(|| {
            let mut symbols: Vec<&str> = self.operators.keys().map(String::as_str).collect();
            symbols.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

            let mut pattern = String::from(
                r"(?P<number>-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))|(?P<name>[A-Za-z]+)",
            );
            for symbol in symbols {
                pattern.push('|');
                pattern.push_str(&regex::escape(symbol));
            }
            pattern.push_str(r"|[(),]");

            Regex::new(&pattern).expect("escaped operator symbols always form a valid pattern")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_is_inferred_from_the_callable() {
        assert_eq!(Function::new("sin", f64::sin).arity, 1);
        assert_eq!(Function::new("pow", f64::powf).arity, 2);
        assert_eq!(
            Function::new("fma", |a: f64, b: f64, c: f64| a.mul_add(b, c)).arity,
            3
        );

        let sum = Function::with_arity("sum", NonZeroUsize::new(4).unwrap(), |args| {
            args.iter().sum()
        });
        assert_eq!(sum.arity, 4);
        assert_eq!(sum.call(&[1.0, 2.0, 3.0, 4.0]), 10.0);
    }

    #[test]
    fn names_are_validated() {
        let mut registry = Registry::empty();

        assert!(registry.add_constant("tau", std::f64::consts::TAU).is_ok());
        assert_eq!(
            registry.add_constant("tau2", 1.0).unwrap_err(),
            Error::BadName {
                name: "tau2".to_string()
            }
        );
        assert!(registry
            .add_function(Function::new("log_2", f64::log2))
            .is_err());

        for bad in ["", "a", "+1", "(", ",", ".", "< >"] {
            let operator = Operator::new(bad, 1, Associativity::Left, |a, _| a);
            assert!(registry.add_operator(operator).is_err(), "accepted {bad:?}");
        }
        for good in ["+", "**", "<=>", "&"] {
            let operator = Operator::new(good, 1, Associativity::Left, |a, _| a);
            assert!(registry.add_operator(operator).is_ok(), "rejected {good:?}");
        }
    }

    #[test]
    fn functions_and_constants_share_a_namespace() {
        let mut registry = Registry::empty();
        registry.add_constant("half", 0.5).unwrap();
        registry
            .add_function(Function::new("half", |x: f64| x / 2.0))
            .unwrap();

        assert!(registry.constant("half").is_none());
        assert!(registry.function("half").is_some());
    }

    #[test]
    fn pattern_prefers_longer_operators() {
        let mut registry = Registry::empty();
        registry
            .add_operator(Operator::new("*", 3, Associativity::Left, |a, b| a * b))
            .unwrap()
            .add_operator(Operator::new("**", 4, Associativity::Right, f64::powf))
            .unwrap();

        let matches: Vec<&str> = registry
            .pattern()
            .find_iter("2**3*4")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(matches, ["2", "**", "3", "*", "4"]);
    }

    #[test]
    fn mutating_resets_the_pattern() {
        let mut registry = Registry::empty();
        assert_eq!(registry.pattern().find_iter("1 # 2").count(), 2);

        registry
            .add_operator(Operator::new("#", 1, Associativity::Left, |a, b| a.max(b)))
            .unwrap();
        assert_eq!(registry.pattern().find_iter("1 # 2").count(), 3);
    }
}
