// Query executor surface (data access layer)
// Expressions are compiled to positional SQL before binding.

pub mod derived;
pub mod expr;
pub mod value;

pub use derived::{DerivedQuery, Operator, Predicate};
pub use expr::QueryExpr;
pub use value::Value;
