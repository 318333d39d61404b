use std::f64::consts;
use std::sync::{Arc, LazyLock};

use crate::registry::{Associativity, Function, Operator, Registry};

/// The registry shared by every expression built with [`crate::Expression::new`].
pub static BUILTINS: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(registry()));

pub(crate) fn registry() -> Registry {
    let mut registry = Registry::empty();

    for operator in operators() {
        registry
            .add_operator(operator)
            .expect("builtin operator symbols are valid");
    }
    for function in functions() {
        registry
            .add_function(function)
            .expect("builtin function names are valid");
    }

    // Constants
    for (name, value) in [("pi", consts::PI), ("e", consts::E)] {
        registry
            .add_constant(name, value)
            .expect("builtin constant names are valid");
    }

    registry
}

// Precedence follows the usual conventions, exponentiation binds tightest and
// is right associative.
fn operators() -> [Operator; 6] {
    use Associativity::{Left, Right};

    [
        Operator::new("+", 2, Left, |a, b| a + b),
        Operator::new("-", 2, Left, |a, b| a - b),
        Operator::new("*", 3, Left, |a, b| a * b),
        Operator::new("/", 3, Left, |a, b| a / b),
        Operator::new("%", 3, Left, |a, b| a % b),
        Operator::new("^", 4, Right, f64::powf),
    ]
}

fn functions() -> Vec<Function> {
    vec![
        Function::new("abs", f64::abs),
        Function::new("sqrt", f64::sqrt),
        Function::new("cbrt", f64::cbrt),
        Function::new("exp", f64::exp),
        Function::new("ln", f64::ln),
        Function::new("log", f64::ln),
        Function::new("lg", f64::log10),
        Function::new("lb", f64::log2),
        Function::new("sin", f64::sin),
        Function::new("cos", f64::cos),
        Function::new("tan", f64::tan),
        Function::new("asin", f64::asin),
        Function::new("acos", f64::acos),
        Function::new("atan", f64::atan),
        Function::new("sinh", f64::sinh),
        Function::new("cosh", f64::cosh),
        Function::new("tanh", f64::tanh),
        Function::new("asinh", f64::asinh),
        Function::new("acosh", f64::acosh),
        Function::new("atanh", f64::atanh),
        Function::new("ceil", f64::ceil),
        Function::new("floor", f64::floor),
        Function::new("round", f64::round),
        Function::new("trunc", f64::trunc),
        Function::new("sign", sign),
        // Binary
        Function::new("pow", f64::powf),
        Function::new("hypot", f64::hypot),
        Function::new("atanxy", f64::atan2),
        Function::new("mod", |a: f64, b: f64| a % b),
        Function::new("min", f64::min),
        Function::new("max", f64::max),
        Function::new("logb", |base: f64, x: f64| x.log(base)),
    ]
}

// `f64::signum` returns 1 for +0.0.
fn sign(x: f64) -> f64 {
    if x == 0.0 || x.is_nan() {
        x
    } else {
        x.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = registry();

        for symbol in ["+", "-", "*", "/", "%", "^"] {
            assert!(registry.operator(symbol).is_some(), "missing {symbol}");
        }
        assert!(!registry.operator("^").unwrap().is_left_associative());
        assert!(
            registry.operator("*").unwrap().precedence
                > registry.operator("+").unwrap().precedence
        );

        assert_eq!(registry.function("sin").unwrap().arity, 1);
        assert_eq!(registry.function("logb").unwrap().arity, 2);
        assert_eq!(registry.constant("pi"), Some(consts::PI));
        assert!(registry.function("pi").is_none());
    }

    #[test]
    fn sign_keeps_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-3.5), -1.0);
        assert_eq!(sign(2.0), 1.0);
        assert!(sign(f64::NAN).is_nan());
    }

    #[test]
    fn logb_takes_the_base_first() {
        let logb = registry().function("logb").cloned().unwrap();
        assert!((logb.call(&[2.0, 8.0]) - 3.0).abs() < 1e-12);
    }
}
