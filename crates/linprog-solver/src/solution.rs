/// Terminal state of a simplex run. These are expected outcomes of valid
/// input and are returned, never thrown.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// An optimal basic feasible solution was found.
    Optimal,
    /// No assignment satisfies every constraint.
    Infeasible,
    /// The objective can grow without bound over the feasible region.
    Unbounded,
    /// The iteration cap was exceeded without reaching optimality,
    /// signalling a degenerate or malformed problem.
    CycleDetected,
}

/// Value assigned to one variable in a solved problem.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct VariableValue {
    pub name: String,
    pub value: f64,
}

/// The result of solving a linear program.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: Status,
    /// One entry per structural variable, in tableau column order. Empty
    /// unless the status is [`Status::Optimal`].
    pub values: Vec<VariableValue>,
    /// Objective value in the problem's original orientation. NaN when no
    /// optimum was reached, ±infinity for unbounded problems.
    pub objective_value: f64,
    pub analysis: Analysis,
}

/// Post-solve diagnostics read off the final tableau.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Dual value per constraint: how the objective moves per unit of
    /// right-hand side, in the problem's original orientation.
    pub shadow_prices: Vec<ShadowPrice>,
    /// Reduced cost per structural variable.
    pub reduced_costs: Vec<ReducedCost>,
    /// Constraints tight at the optimum.
    pub binding_constraints: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ShadowPrice {
    /// Constraint label, or its position when unlabelled.
    pub constraint: String,
    pub value: f64,
    pub interpretation: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ReducedCost {
    pub variable: String,
    /// Value in the solution.
    pub value: f64,
    /// How far the variable's objective coefficient is from letting it
    /// enter the basis; 0 for basic variables.
    pub reduced_cost: f64,
    pub is_basic: bool,
}

impl Solution {
    pub fn infeasible() -> Self {
        Self {
            status: Status::Infeasible,
            values: Vec::new(),
            objective_value: f64::NAN,
            analysis: Analysis::empty(),
        }
    }

    /// `objective_value` is +infinity for an unbounded maximization and
    /// -infinity for an unbounded minimization.
    pub fn unbounded(objective_value: f64) -> Self {
        Self {
            status: Status::Unbounded,
            values: Vec::new(),
            objective_value,
            analysis: Analysis::empty(),
        }
    }

    pub fn cycle_detected() -> Self {
        Self {
            status: Status::CycleDetected,
            values: Vec::new(),
            objective_value: f64::NAN,
            analysis: Analysis::empty(),
        }
    }

    /// Value assigned to `name`, if it is one of the problem's variables.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
    }
}

impl Analysis {
    pub fn empty() -> Self {
        Self {
            shadow_prices: Vec::new(),
            reduced_costs: Vec::new(),
            binding_constraints: Vec::new(),
        }
    }
}
