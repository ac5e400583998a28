use std::collections::{HashMap, HashSet};

use log::warn;
use simplexsolve_solver::{Constraint, LpProblem};
use thiserror::Error;

use crate::ast::*;
use crate::parser::{ParseError, Parser};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Missing objective: expected a `maximize` line")]
    MissingObjective,
    #[error("Only one objective is allowed")]
    DuplicateObjective,
    #[error("Constraint {constraint} uses `{relation}`; only `<=` constraints are supported")]
    UnsupportedRelation { constraint: String, relation: String },
    #[error("Duplicate constraint name: {0}")]
    DuplicateConstraint(String),
}

/// Assigns each variable a column in order of first appearance
#[derive(Debug, Default)]
struct VariableTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl VariableTable {
    fn intern(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }

    /// Dense coefficient vector; repeated variables are summed.
    fn coefficients(&self, terms: &[Term]) -> Vec<f64> {
        let mut coefs = vec![0.0; self.names.len()];
        for term in terms {
            coefs[self.index[&term.variable]] += term.coefficient;
        }
        coefs
    }
}

/// Compiler for converting AST to LP problems
#[derive(Debug, Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    /// Parse and compile in one step
    pub fn compile_source(&self, source: &str) -> Result<LpProblem, CompileError> {
        let program = Parser::parse(source)?;
        self.compile(&program)
    }

    pub fn compile(&self, program: &Program) -> Result<LpProblem, CompileError> {
        let mut objectives = program.objectives();
        let objective = objectives.next().ok_or(CompileError::MissingObjective)?;
        if objectives.next().is_some() {
            return Err(CompileError::DuplicateObjective);
        }

        // Objective variables come first, then anything new in the constraints
        let mut vars = VariableTable::default();
        for term in &objective.terms {
            vars.intern(&term.variable);
        }

        let mut seen_names = HashSet::new();
        for (i, c) in program.constraints().enumerate() {
            let label = c.name.clone().unwrap_or_else(|| format!("c{}", i + 1));
            if c.relation != Relation::Le {
                return Err(CompileError::UnsupportedRelation {
                    constraint: label,
                    relation: c.relation.symbol().to_string(),
                });
            }
            if let Some(name) = &c.name {
                if !seen_names.insert(name.clone()) {
                    return Err(CompileError::DuplicateConstraint(name.clone()));
                }
            }
            if c.rhs < 0.0 {
                warn!(
                    "constraint {} has negative right-hand side {}; the all-slack basis is infeasible",
                    label, c.rhs
                );
            }
            for term in &c.terms {
                vars.intern(&term.variable);
            }
        }

        let mut problem = LpProblem::new(vars.names.clone());
        problem.set_objective(vars.coefficients(&objective.terms));
        for c in program.constraints() {
            let coefficients = vars.coefficients(&c.terms);
            problem.add_constraint(match &c.name {
                Some(name) => Constraint::named(name.clone(), coefficients, c.rhs),
                None => Constraint::new(coefficients, c.rhs),
            });
        }

        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplexsolve_solver::Solver;

    fn compile(source: &str) -> Result<LpProblem, CompileError> {
        Compiler::new().compile_source(source)
    }

    #[test]
    fn test_compile_production_problem() {
        let source = r#"
            maximize 2x + 3y
            subject to
              a: 2x + y <= 18
              b: 6x + 5y <= 60
              2x + 5y <= 40
        "#;
        let problem = compile(source).unwrap();
        assert_eq!(problem.variables, vec!["x", "y"]);
        assert_eq!(problem.objective.coefficients, vec![2.0, 3.0]);
        assert_eq!(problem.num_constraints(), 3);
        assert_eq!(problem.constraints[0].coefficients, vec![2.0, 1.0]);
        assert_eq!(problem.constraint_name(1), "b");
        assert_eq!(problem.constraint_name(2), "c3");

        let solution = Solver::new().solve(&problem).unwrap();
        assert!((solution.values[0] - 5.0).abs() < 1e-6);
        assert!((solution.values[1] - 6.0).abs() < 1e-6);
        assert!((solution.objective_value - 28.0).abs() < 1e-6);
    }

    #[test]
    fn test_variable_order_and_missing_terms() {
        // z only appears in a constraint; y is absent from the first one
        let problem = compile("max y + x\nx + z <= 4\ny <= 2").unwrap();
        assert_eq!(problem.variables, vec!["y", "x", "z"]);
        assert_eq!(problem.objective.coefficients, vec![1.0, 1.0, 0.0]);
        assert_eq!(problem.constraints[0].coefficients, vec![0.0, 1.0, 1.0]);
        assert_eq!(problem.constraints[1].coefficients, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_repeated_terms_are_summed() {
        let problem = compile("max x + x - 0.5x\n2x - x <= 3").unwrap();
        assert_eq!(problem.objective.coefficients, vec![1.5]);
        assert_eq!(problem.constraints[0].coefficients, vec![1.0]);
    }

    #[test]
    fn test_constraint_before_objective() {
        let problem = compile("y <= 3\nmax x").unwrap();
        assert_eq!(problem.variables, vec!["x", "y"]);
        assert_eq!(problem.constraints[0].coefficients, vec![0.0, 1.0]);
    }

    #[test]
    fn test_unbounded_problem() {
        let problem = compile("max 3a + 2b - 5c\n4a - 2b + 2c <= 4\n2a - b + c <= 1").unwrap();
        let err = Solver::new().solve(&problem).unwrap_err();
        assert!(err.is_unbounded());
    }

    #[test]
    fn test_demo_files() {
        let problem = compile(include_str!("../../../demos/production.lp")).unwrap();
        assert_eq!(problem.constraint_name(2), "materials");
        let solution = Solver::new().solve(&problem).unwrap();
        assert!((solution.objective_value - 28.0).abs() < 1e-6);
        assert_eq!(solution.analysis.binding_constraints, vec!["machine", "materials"]);

        let problem = compile(include_str!("../../../demos/unbounded.lp")).unwrap();
        assert!(Solver::new().solve(&problem).unwrap_err().is_unbounded());
    }

    #[test]
    fn test_missing_objective() {
        assert_eq!(compile("x <= 1").unwrap_err(), CompileError::MissingObjective);
    }

    #[test]
    fn test_duplicate_objective() {
        assert_eq!(
            compile("max x\nmax y").unwrap_err(),
            CompileError::DuplicateObjective
        );
    }

    #[test]
    fn test_rejects_ge_and_eq() {
        assert_eq!(
            compile("max x\nfloor: x >= 1").unwrap_err(),
            CompileError::UnsupportedRelation {
                constraint: "floor".to_string(),
                relation: ">=".to_string(),
            }
        );
        assert!(matches!(
            compile("max x\nx = 1").unwrap_err(),
            CompileError::UnsupportedRelation { ref constraint, .. } if constraint == "c1"
        ));
    }

    #[test]
    fn test_duplicate_constraint_name() {
        assert_eq!(
            compile("max x\ncap: x <= 1\ncap: x <= 2").unwrap_err(),
            CompileError::DuplicateConstraint("cap".to_string())
        );
    }

    #[test]
    fn test_parse_error_is_wrapped() {
        assert!(matches!(
            compile("max x\nx <= ").unwrap_err(),
            CompileError::Parse(ParseError::UnexpectedEof)
        ));
    }
}
