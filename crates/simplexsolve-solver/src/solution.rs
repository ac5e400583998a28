/// The result of solving an LP problem to optimality
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Optimal values for each variable, in coefficient order
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Number of pivots performed
    pub iterations: usize,
    /// Detailed analysis
    pub analysis: Analysis,
}

/// Dual information read off the optimal tableau
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Analysis {
    /// Shadow prices (dual values) for each constraint
    /// Indicates how much the objective would grow per unit of extra RHS
    pub shadow_prices: Vec<ShadowPrice>,

    /// Reduced costs for each variable
    pub reduced_costs: Vec<ReducedCost>,

    /// Constraints with a positive shadow price
    pub binding_constraints: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPrice {
    /// Constraint name
    pub constraint: String,
    /// Shadow price value
    pub value: f64,
    /// Unused capacity at the optimum
    pub slack: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Objective-row entry for the variable
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

impl Solution {
    /// Value of the variable at `index`, zero if out of range.
    pub fn value(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(0.0)
    }
}

impl Analysis {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_binding(&self, constraint: &str) -> bool {
        self.binding_constraints.iter().any(|c| c == constraint)
    }
}
