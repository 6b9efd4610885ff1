mod constraint;
mod expr;
mod problem;
mod simplex;
mod solution;
mod tableau;

pub use constraint::{Comparison, Constraint, EPSILON, Side, SlackKind};
pub use expr::{CONSTANT, Expression, Term};
pub use problem::{Direction, Problem};
pub use simplex::Solver;
pub use solution::{Analysis, ReducedCost, ShadowPrice, Solution, Status, VariableValue};
pub use tableau::{Row, Tableau, TableauError};
