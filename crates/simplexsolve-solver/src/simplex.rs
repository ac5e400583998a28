use log::debug;

use crate::error::SimplexError;
use crate::problem::LpProblem;
use crate::solution::{Analysis, ReducedCost, ShadowPrice, Solution};
use crate::tableau::Tableau;

/// Simplex solver for maximization problems with `<=` constraints
#[derive(Debug, Clone, Default)]
pub struct Solver {
    /// Maximum pivots before giving up; `None` runs until a terminal state
    max_iterations: Option<usize>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    /// Solve the LP problem from the all-slack starting basis
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SimplexError> {
        let mut tableau = problem.build_tableau()?;
        self.solve_tableau(&mut tableau, problem)
    }

    /// Drive an already-built tableau to optimality and read the solution
    pub fn solve_tableau(
        &self,
        tableau: &mut Tableau,
        problem: &LpProblem,
    ) -> Result<Solution, SimplexError> {
        let iterations = tableau.solve_bounded(self.max_iterations)?;
        let (values, objective_value) = tableau.extract_solution()?;
        let analysis = self.analyze(tableau, problem, &values);

        debug!(
            "solved {} variables x {} constraints in {} pivots",
            problem.num_variables(),
            problem.num_constraints(),
            iterations
        );

        Ok(Solution {
            values,
            objective_value,
            iterations,
            analysis,
        })
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64]) -> Analysis {
        let n_vars = tableau.num_variables();
        let obj_row = tableau.num_constraints();

        // Slack column i carries the dual value of constraint i
        let shadow_prices: Vec<ShadowPrice> = (0..tableau.num_constraints())
            .map(|i| {
                let slack_col = n_vars + i;
                ShadowPrice {
                    constraint: problem.constraint_name(i),
                    value: tableau.get(obj_row, slack_col),
                    slack: tableau.column_value(slack_col),
                }
            })
            .collect();

        let reduced_costs = values
            .iter()
            .enumerate()
            .map(|(j, &value)| ReducedCost {
                variable: problem
                    .variables
                    .get(j)
                    .cloned()
                    .unwrap_or_else(|| format!("x{}", j + 1)),
                value,
                reduced_cost: tableau.get(obj_row, j),
                is_basic: tableau.basic_row(j).is_some(),
            })
            .collect();

        let binding_constraints = shadow_prices
            .iter()
            .filter(|sp| sp.value > 0.0)
            .map(|sp| sp.constraint.clone())
            .collect();

        Analysis {
            shadow_prices,
            reduced_costs,
            binding_constraints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Constraint;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "got {} (expected {})",
            actual,
            expected
        );
    }

    fn production_problem() -> LpProblem {
        // Maximize: 2x + 3y
        // Subject to:
        //   2x +  y <= 18
        //   6x + 5y <= 60
        //   2x + 5y <= 40
        // Optimal: x=5, y=6, obj=28
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![2.0, 3.0]);
        problem.add_constraint(Constraint::named("a", vec![2.0, 1.0], 18.0));
        problem.add_constraint(Constraint::named("b", vec![6.0, 5.0], 60.0));
        problem.add_constraint(Constraint::named("c", vec![2.0, 5.0], 40.0));
        problem
    }

    #[test]
    fn test_simple_maximization() {
        let _ = env_logger::builder().is_test(true).try_init();

        let solution = Solver::new().solve(&production_problem()).unwrap();

        assert_eq!(solution.values.len(), 2);
        assert_close(solution.value(0), 5.0);
        assert_close(solution.value(1), 6.0);
        assert_close(solution.objective_value, 28.0);
        assert_eq!(solution.iterations, 2);
    }

    #[test]
    fn test_analysis() {
        let solution = Solver::new().solve(&production_problem()).unwrap();
        let analysis = &solution.analysis;

        assert_eq!(analysis.shadow_prices.len(), 3);
        assert_close(analysis.shadow_prices[0].value, 0.0);
        assert_close(analysis.shadow_prices[1].value, 0.2);
        assert_close(analysis.shadow_prices[2].value, 0.4);
        assert_close(analysis.shadow_prices[0].slack, 2.0);
        assert_close(analysis.shadow_prices[1].slack, 0.0);

        assert_eq!(analysis.binding_constraints, vec!["b", "c"]);
        assert!(analysis.is_binding("c"));
        assert!(!analysis.is_binding("a"));

        assert_eq!(analysis.reduced_costs[0].variable, "x");
        assert!(analysis.reduced_costs[0].is_basic);
        assert!(analysis.reduced_costs[1].is_basic);
        assert_close(analysis.reduced_costs[1].reduced_cost, 0.0);
    }

    #[test]
    fn test_shadow_prices_match_objective() {
        // Strong duality: b · y equals the optimal objective
        let problem = production_problem();
        let solution = Solver::new().solve(&problem).unwrap();
        let dual_objective: f64 = problem
            .constraints
            .iter()
            .zip(&solution.analysis.shadow_prices)
            .map(|(c, sp)| c.rhs * sp.value)
            .sum();
        assert_close(dual_objective, solution.objective_value);
    }

    #[test]
    fn test_unbounded() {
        // Maximize: 3x + 2y - 5z
        //   4x - 2y + 2z <= 4
        //   2x -  y +  z <= 1
        let mut problem = LpProblem::with_variables(3);
        problem.set_objective(vec![3.0, 2.0, -5.0]);
        problem.add_constraint(Constraint::new(vec![4.0, -2.0, 2.0], 4.0));
        problem.add_constraint(Constraint::new(vec![2.0, -1.0, 1.0], 1.0));

        let err = Solver::new().solve(&problem).unwrap_err();
        assert!(err.is_unbounded(), "got {:?}", err);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut problem = LpProblem::with_variables(2);
        problem.set_objective(vec![1.0, 1.0]);
        problem.add_constraint(Constraint::new(vec![1.0, 1.0, 1.0], 3.0));

        let err = Solver::new().solve(&problem).unwrap_err();
        assert!(matches!(err, SimplexError::DimensionMismatch { found: 3, .. }));
    }

    #[test]
    fn test_iteration_limit() {
        let solver = Solver::new().with_max_iterations(1);
        assert_eq!(solver.max_iterations(), Some(1));

        let err = solver.solve(&production_problem()).unwrap_err();
        assert_eq!(err, SimplexError::IterationLimit { iterations: 1 });

        let solution = Solver::new()
            .with_max_iterations(10)
            .solve(&production_problem())
            .unwrap();
        assert_close(solution.objective_value, 28.0);
    }

    #[test]
    fn test_already_optimal() {
        // Nothing to gain from a non-positive objective
        let mut problem = LpProblem::with_variables(2);
        problem.set_objective(vec![-1.0, -1.0]);
        problem.add_constraint(Constraint::new(vec![1.0, 1.0], 4.0));

        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.values, vec![0.0, 0.0]);
        assert_eq!(solution.objective_value, 0.0);
        assert!(solution.analysis.binding_constraints.is_empty());
    }

    #[test]
    fn test_three_variable_problem() {
        // Maximize: 3x + y + 2z
        //   x +  y + 3z <= 30
        //  2x + 2y + 5z <= 24
        //  4x +  y + 2z <= 36
        // Optimal: x=8, y=4, z=0, obj=28
        let mut problem = LpProblem::with_variables(3);
        problem.set_objective(vec![3.0, 1.0, 2.0]);
        problem.add_constraint(Constraint::new(vec![1.0, 1.0, 3.0], 30.0));
        problem.add_constraint(Constraint::new(vec![2.0, 2.0, 5.0], 24.0));
        problem.add_constraint(Constraint::new(vec![4.0, 1.0, 2.0], 36.0));

        let solution = Solver::new().solve(&problem).unwrap();
        assert_close(solution.value(0), 8.0);
        assert_close(solution.value(1), 4.0);
        assert_close(solution.value(2), 0.0);
        assert_close(solution.objective_value, 28.0);
    }
}
