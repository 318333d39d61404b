use crate::ast::Node;

/// Replaces every operator or function node whose operands are all constants
/// with the value it computes.
///
/// The folded callables run here, once, instead of on every evaluation, so
/// only fold trees whose callables are pure. See [`crate::Expression::optimized`].
pub fn fold(tree: Node) -> Node {
    match tree {
        Node::Operator { operator, lhs, rhs } => {
            let lhs = fold(*lhs);
            let rhs = fold(*rhs);
            if let (Node::Constant(a), Node::Constant(b)) = (&lhs, &rhs) {
                return Node::Constant(operator.apply(*a, *b));
            }

            Node::Operator {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }
        }
        Node::Function { function, args } => {
            let args: Vec<Node> = args.into_iter().map(fold).collect();
            if args.iter().all(Node::is_constant) {
                let values: Vec<f64> = args
                    .iter()
                    .filter_map(|arg| match arg {
                        Node::Constant(value) => Some(*value),
                        _ => None,
                    })
                    .collect();
                return Node::Constant(function.call(&values));
            }

            Node::Function { function, args }
        }

        leaf @ (Node::Constant(_) | Node::Variable(_)) => leaf,
    }
}
