mod error;
mod problem;
mod simplex;
mod solution;
mod tableau;

pub use error::SimplexError;
pub use problem::{Constraint, LpProblem, Objective};
pub use simplex::Solver;
pub use solution::{Analysis, ReducedCost, ShadowPrice, Solution};
pub use tableau::{Tableau, TableauStatus};
