use std::fmt;

use log::{debug, trace};

use crate::error::SimplexError;
use crate::problem::{Constraint, Objective};

/// Where a tableau sits in the simplex state machine.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableauStatus {
    /// The objective row still has a negative reduced cost
    Unsolved,
    /// No negative reduced cost remains
    Optimal,
    /// An improving column exists but no row can leave the basis
    Unbounded,
}

/// Dense simplex tableau for `maximize c·x s.t. Ax <= b, x >= 0`.
///
/// For `m` constraints over `n` variables the matrix is `(m + 1) x (n + m + 1)`:
/// `n` structural columns, `m` slack columns, then the right-hand side.
/// Rows `0..m` are constraints and row `m` is the objective row.
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    data: Vec<Vec<f64>>,
    n_vars: usize,
    n_constraints: usize,
}

impl Tableau {
    /// Build the initial all-slack tableau.
    ///
    /// Constraint `i` becomes `[coefficients | e_i | rhs]` and the objective
    /// row is `[-objective | 0 ... 0]`. Right-hand sides are not checked; a
    /// negative one makes the starting basis infeasible and the result of
    /// pivoting undefined.
    pub fn new(constraints: &[Constraint], objective: &Objective) -> Result<Self, SimplexError> {
        let n_vars = objective.len();
        let n_constraints = constraints.len();

        for (i, c) in constraints.iter().enumerate() {
            if c.coefficients.len() != n_vars {
                return Err(SimplexError::DimensionMismatch {
                    constraint: i,
                    expected: n_vars,
                    found: c.coefficients.len(),
                });
            }
        }

        let total_cols = n_vars + n_constraints + 1;
        let mut data = Vec::with_capacity(n_constraints + 1);

        for (i, c) in constraints.iter().enumerate() {
            let mut row = vec![0.0; total_cols];
            row[..n_vars].copy_from_slice(&c.coefficients);
            row[n_vars + i] = 1.0;
            row[total_cols - 1] = c.rhs;
            data.push(row);
        }

        let mut obj_row = vec![0.0; total_cols];
        for (j, &coef) in objective.coefficients.iter().enumerate() {
            obj_row[j] = -coef;
        }
        data.push(obj_row);

        trace!(
            "built tableau: {} constraints, {} variables, {}x{}",
            n_constraints,
            n_vars,
            n_constraints + 1,
            total_cols
        );

        Ok(Self {
            data,
            n_vars,
            n_constraints,
        })
    }

    /// Wrap an existing matrix laid out as described on [`Tableau`].
    ///
    /// The last row is the objective row. Ragged rows, or fewer columns than
    /// rows, are rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, SimplexError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);

        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(SimplexError::DimensionMismatch {
                    constraint: i,
                    expected: n_cols,
                    found: row.len(),
                });
            }
        }
        if n_rows == 0 || n_cols < n_rows {
            return Err(SimplexError::DimensionMismatch {
                constraint: n_rows.saturating_sub(1),
                expected: n_rows,
                found: n_cols,
            });
        }

        Ok(Self {
            data: rows,
            n_vars: n_cols - n_rows,
            n_constraints: n_rows - 1,
        })
    }

    pub fn rows(&self) -> usize {
        self.data.len()
    }

    pub fn cols(&self) -> usize {
        self.n_vars + self.n_constraints + 1
    }

    pub fn num_variables(&self) -> usize {
        self.n_vars
    }

    pub fn num_constraints(&self) -> usize {
        self.n_constraints
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row]
    }

    /// All rows, objective row last.
    pub fn as_rows(&self) -> &[Vec<f64>] {
        &self.data
    }

    fn rhs_col(&self) -> usize {
        self.cols() - 1
    }

    fn objective_row(&self) -> &[f64] {
        &self.data[self.n_constraints]
    }

    /// True when no objective-row coefficient (RHS excluded) is negative.
    pub fn is_optimal(&self) -> bool {
        let rhs_col = self.rhs_col();
        self.objective_row()[..rhs_col].iter().all(|&v| v >= 0.0)
    }

    /// Entering column: the most negative reduced cost, earliest on ties.
    ///
    /// Returns `None` when the tableau is optimal.
    pub fn select_pivot_column(&self) -> Option<usize> {
        let rhs_col = self.rhs_col();
        let mut min_val = 0.0;
        let mut min_col = None;

        for (j, &v) in self.objective_row()[..rhs_col].iter().enumerate() {
            if v < min_val {
                min_val = v;
                min_col = Some(j);
            }
        }

        min_col
    }

    /// Leaving row for `col` by the minimum-ratio test.
    ///
    /// Only rows with a positive entry in `col` and a strictly positive ratio
    /// compete; ties go to the earliest row. `None` means the column can be
    /// increased without limit.
    pub fn select_pivot_row(&self, col: usize) -> Option<usize> {
        let rhs_col = self.rhs_col();
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for (i, row) in self.data[..self.n_constraints].iter().enumerate() {
            let val = row[col];
            if val > 0.0 {
                let ratio = row[rhs_col] / val;
                if ratio > 0.0 && ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    /// The entering column that has no pivot row, if the tableau is unbounded.
    fn blocked_column(&self) -> Option<usize> {
        let col = self.select_pivot_column()?;
        match self.select_pivot_row(col) {
            Some(_) => None,
            None => Some(col),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.blocked_column().is_some()
    }

    pub fn status(&self) -> TableauStatus {
        if self.is_optimal() {
            TableauStatus::Optimal
        } else if self.is_unbounded() {
            TableauStatus::Unbounded
        } else {
            TableauStatus::Unsolved
        }
    }

    /// One Gauss-Jordan step making `col` basic in `row`.
    ///
    /// The pivot row is scaled so `(row, col)` is 1, then that scaled row is
    /// used to clear `col` from every other row, objective row included.
    pub fn pivot(&mut self, row: usize, col: usize) {
        let pivot_val = self.data[row][col];
        debug_assert!(pivot_val != 0.0, "pivot on zero entry ({}, {})", row, col);

        let scale = 1.0 / pivot_val;
        for v in self.data[row].iter_mut() {
            *v *= scale;
        }
        self.data[row][col] = 1.0;

        let pivot_row = self.data[row].clone();
        for (i, target) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = target[col];
            if factor != 0.0 {
                for (v, &p) in target.iter_mut().zip(&pivot_row) {
                    *v += -factor * p;
                }
            }
            target[col] = 0.0;
        }
    }

    /// Run one iteration of the simplex loop.
    ///
    /// An optimal tableau is left untouched. Unboundedness is detected before
    /// anything is mutated.
    pub fn step(&mut self) -> Result<TableauStatus, SimplexError> {
        let Some(col) = self.select_pivot_column() else {
            return Ok(TableauStatus::Optimal);
        };
        let Some(row) = self.select_pivot_row(col) else {
            debug!("column {} has no pivot row, LP is unbounded", col);
            return Err(SimplexError::Unbounded { column: col });
        };

        self.pivot(row, col);
        debug!(
            "pivot ({}, {}), objective = {}",
            row,
            col,
            self.objective_value()
        );

        Ok(self.status())
    }

    /// Pivot until optimal, returning the number of pivots performed.
    ///
    /// There is no iteration cap; degenerate problems may cycle.
    pub fn solve(&mut self) -> Result<usize, SimplexError> {
        self.solve_bounded(None)
    }

    pub(crate) fn solve_bounded(&mut self, limit: Option<usize>) -> Result<usize, SimplexError> {
        let mut iterations = 0;

        while !self.is_optimal() {
            if let Some(max) = limit {
                if iterations >= max {
                    debug!("stopping after {} pivots", iterations);
                    return Err(SimplexError::IterationLimit { iterations });
                }
            }
            self.step()?;
            iterations += 1;
        }

        debug!(
            "optimal after {} pivots, objective = {}",
            iterations,
            self.objective_value()
        );
        Ok(iterations)
    }

    /// Constraint row in which `col` is basic.
    ///
    /// The column must hold exactly 1 in that row and exactly 0 everywhere
    /// else, objective row included; otherwise the variable is non-basic.
    pub fn basic_row(&self, col: usize) -> Option<usize> {
        let mut found = None;
        for (i, row) in self.data.iter().enumerate() {
            let v = row[col];
            if v == 0.0 {
                continue;
            }
            if v == 1.0 && i < self.n_constraints && found.is_none() {
                found = Some(i);
            } else {
                return None;
            }
        }
        found
    }

    /// Value of the variable in `col`; zero when non-basic.
    pub fn column_value(&self, col: usize) -> f64 {
        match self.basic_row(col) {
            Some(row) => self.data[row][self.rhs_col()],
            None => 0.0,
        }
    }

    /// Right-hand side of the objective row.
    pub fn objective_value(&self) -> f64 {
        self.objective_row()[self.rhs_col()]
    }

    /// Read the optimal assignment and objective value.
    ///
    /// Fails with `Unbounded` or `Unsolved` unless the tableau is optimal.
    pub fn extract_solution(&self) -> Result<(Vec<f64>, f64), SimplexError> {
        if !self.is_optimal() {
            return Err(match self.blocked_column() {
                Some(column) => SimplexError::Unbounded { column },
                None => SimplexError::Unsolved,
            });
        }

        let values = (0..self.n_vars).map(|j| self.column_value(j)).collect();
        Ok((values, self.objective_value()))
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rhs_col = self.rhs_col();
        for (i, row) in self.data.iter().enumerate() {
            if i == self.n_constraints {
                writeln!(f, "{}", "-".repeat(10 * self.cols() + 2))?;
            }
            for (j, v) in row.iter().enumerate() {
                if j == rhs_col {
                    write!(f, " |")?;
                }
                write!(f, "{:>10.4}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
