use crate::error::SimplexError;
use crate::tableau::Tableau;

/// A `<=` constraint: `coefficients · x <= rhs`.
///
/// `2x - 3y <= 15` is `Constraint::new(vec![2.0, -3.0], 15.0)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics only)
    pub name: Option<String>,
    /// Left-hand side coefficients, one per variable
    pub coefficients: Vec<f64>,
    /// Right-hand side value
    pub rhs: f64,
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self {
            name: None,
            coefficients,
            rhs,
        }
    }

    pub fn named(name: impl Into<String>, coefficients: Vec<f64>, rhs: f64) -> Self {
        Self {
            name: Some(name.into()),
            coefficients,
            rhs,
        }
    }
}

/// Coefficients of the objective function, which is always maximized.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Objective {
    pub coefficients: Vec<f64>,
}

impl Objective {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

impl From<Vec<f64>> for Objective {
    fn from(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }
}

/// Represents a linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Variable names, aligned with coefficient order
    pub variables: Vec<String>,
    /// Objective function coefficients (maximized)
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective::new(vec![0.0; n]),
            constraints: Vec::new(),
        }
    }

    /// Create a problem with `n` variables named `x1..xn`.
    pub fn with_variables(n: usize) -> Self {
        Self::new((1..=n).map(|i| format!("x{}", i)).collect())
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>) {
        self.objective = Objective::new(coefficients);
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Display name of constraint `i`, falling back to `c{i+1}`.
    pub fn constraint_name(&self, i: usize) -> String {
        self.constraints
            .get(i)
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| format!("c{}", i + 1))
    }

    pub fn build_tableau(&self) -> Result<Tableau, SimplexError> {
        Tableau::new(&self.constraints, &self.objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_variable_names() {
        let problem = LpProblem::with_variables(3);
        assert_eq!(problem.variables, vec!["x1", "x2", "x3"]);
        assert_eq!(problem.objective.coefficients, vec![0.0; 3]);
    }

    #[test]
    fn test_constraint_names() {
        let mut problem = LpProblem::with_variables(2);
        problem.add_constraint(Constraint::named("mill", vec![2.0, 1.0], 18.0));
        problem.add_constraint(Constraint::new(vec![6.0, 5.0], 60.0));
        assert_eq!(problem.constraint_name(0), "mill");
        assert_eq!(problem.constraint_name(1), "c2");
    }

    #[test]
    fn test_build_tableau_checks_dimensions() {
        let mut problem = LpProblem::with_variables(2);
        problem.set_objective(vec![2.0, 3.0]);
        problem.add_constraint(Constraint::new(vec![2.0], 18.0));
        assert_eq!(
            problem.build_tableau().unwrap_err(),
            SimplexError::DimensionMismatch {
                constraint: 0,
                expected: 2,
                found: 1,
            }
        );
    }
}
