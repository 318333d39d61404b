use std::sync::Arc;

use crate::registry::{Function, Operator};

/// A compiled expression tree.
///
/// Every node owns its children. Variables are indices into the slot array
/// passed to [`Node::evaluate`], so a tree can be evaluated against any array
/// of the right length.
#[derive(Debug, Clone)]
pub enum Node {
    Constant(f64),
    Variable(usize),
    Operator {
        operator: Arc<Operator>,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Function {
        function: Arc<Function>,
        args: Vec<Node>,
    },
}

impl Node {
    /// Evaluates the tree bottom-up against the current slot values.
    ///
    /// Function arguments are staged on `scratch`, which is left as it was
    /// found. Reusing one scratch buffer across calls keeps evaluation free of
    /// allocations once it has grown to the deepest call.
    pub fn evaluate(&self, slots: &[f64], scratch: &mut Vec<f64>) -> f64 {
        match self {
            Node::Constant(value) => *value,
            Node::Variable(index) => slots[*index],
            Node::Operator { operator, lhs, rhs } => {
                let lhs = lhs.evaluate(slots, scratch);
                let rhs = rhs.evaluate(slots, scratch);
                operator.apply(lhs, rhs)
            }
            Node::Function { function, args } => {
                let base = scratch.len();
                for arg in args {
                    let value = arg.evaluate(slots, scratch);
                    scratch.push(value);
                }
                let result = function.call(&scratch[base..]);
                scratch.truncate(base);
                result
            }
        }
    }

    /// Number of values [`Node::evaluate`] stages on the scratch buffer at
    /// most.
    pub fn scratch_depth(&self) -> usize {
        match self {
            Node::Constant(_) | Node::Variable(_) => 0,
            Node::Operator { lhs, rhs, .. } => lhs.scratch_depth().max(rhs.scratch_depth()),
            Node::Function { args, .. } => args
                .iter()
                .enumerate()
                .map(|(i, arg)| i + arg.scratch_depth())
                .max()
                .unwrap_or(0)
                .max(args.len()),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Node::Constant(_))
    }

    /// Largest variable index referenced by the tree.
    pub fn max_variable(&self) -> Option<usize> {
        match self {
            Node::Constant(_) => None,
            Node::Variable(index) => Some(*index),
            Node::Operator { lhs, rhs, .. } => lhs.max_variable().max(rhs.max_variable()),
            Node::Function { args, .. } => args.iter().filter_map(Node::max_variable).max(),
        }
    }
}

impl std::fmt::Display for Node {
    /// Fully parenthesized infix form, variables shown by slot index.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Constant(value) => write!(f, "{value}"),
            Node::Variable(index) => write!(f, "${index}"),
            Node::Operator { operator, lhs, rhs } => {
                write!(f, "({lhs} {} {rhs})", operator.symbol)
            }
            Node::Function { function, args } => {
                write!(f, "{}(", function.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn operator(symbol: &str, lhs: Node, rhs: Node) -> Node {
        Node::Operator {
            operator: Registry::default().operator(symbol).cloned().unwrap(),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn function(name: &str, args: Vec<Node>) -> Node {
        Node::Function {
            function: Registry::default().function(name).cloned().unwrap(),
            args,
        }
    }

    #[test]
    fn evaluates_against_slots() {
        // (x + 2) * max(y, 1)
        let tree = operator(
            "*",
            operator("+", Node::Variable(0), Node::Constant(2.0)),
            function("max", vec![Node::Variable(1), Node::Constant(1.0)]),
        );

        let mut scratch = Vec::new();
        assert_eq!(tree.evaluate(&[1.0, 5.0], &mut scratch), 15.0);
        assert_eq!(tree.evaluate(&[0.0, -5.0], &mut scratch), 2.0);
        assert!(scratch.is_empty());
        assert_eq!(tree.to_string(), "(($0 + 2) * max($1, 1))");
    }

    #[test]
    fn scratch_depth_covers_nested_calls() {
        // max(1, max(2, max(3, 4)))
        let tree = function(
            "max",
            vec![
                Node::Constant(1.0),
                function(
                    "max",
                    vec![
                        Node::Constant(2.0),
                        function("max", vec![Node::Constant(3.0), Node::Constant(4.0)]),
                    ],
                ),
            ],
        );
        assert_eq!(tree.scratch_depth(), 1 + 1 + 2);

        let mut scratch = Vec::with_capacity(tree.scratch_depth());
        let capacity = scratch.capacity();
        assert_eq!(tree.evaluate(&[], &mut scratch), 4.0);
        assert_eq!(scratch.capacity(), capacity);
    }

    #[test]
    fn max_variable() {
        assert_eq!(Node::Constant(1.0).max_variable(), None);
        let tree = operator("+", Node::Variable(3), function("sin", vec![Node::Variable(1)]));
        assert_eq!(tree.max_variable(), Some(3));
    }
}
