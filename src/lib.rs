pub mod ast;
pub mod builder;
pub mod builtins;
pub mod checker;
mod error;
pub mod expression;
pub mod lexer;
pub mod optimizer;
pub mod postfix;
pub mod registry;
pub mod token;

pub use builtins::BUILTINS;
pub use error::Error;
pub use expression::{Expression, IntoVariables};
pub use registry::{Associativity, Function, NativeFunction, Operator, Registry};

pub type Result<T> = std::result::Result<T, Error>;
