use std::collections::HashSet;

use thiserror::Error;

use crate::constraint::{Comparison, Constraint};
use crate::expr::Expression;

#[derive(Debug, Error)]
pub enum TableauError {
    #[error("constraint {index} is not an equality; call standard_max_form first")]
    NotStandardized { index: usize },
}

/// One constraint row of a [`Tableau`].
#[derive(Debug, Clone)]
pub struct Row {
    /// Coefficients aligned to [`Tableau::variables`], right-hand side last.
    pub values: Vec<f64>,
    /// Name of the variable currently basic in this row.
    pub basic: String,
}

/// Dense simplex tableau.
///
/// Columns are ordered: structural variables first (first-seen across the
/// constraints, then the objective), then each row's slack/surplus in
/// constraint order, then artificial variables, with the right-hand side in
/// the final slot. The objective row stores the raw maximization
/// coefficients; once pivoted to optimality its right-hand side holds the
/// negated objective value.
#[derive(Debug, Clone)]
pub struct Tableau {
    /// Column names, right-hand side excluded.
    pub variables: Vec<String>,
    pub rows: Vec<Row>,
    /// Objective coefficients, one per column plus the right-hand side.
    pub objective: Vec<f64>,
    n_structural: usize,
    n_artificial: usize,
}

impl Tableau {
    /// Assemble a tableau from standard-max-form constraints and an
    /// objective expression.
    ///
    /// Rows are sign-flipped where needed so every right-hand side is
    /// non-negative. A row whose own slack survives the flip with
    /// coefficient +1 starts with that slack basic; every other row
    /// (equalities, surplus rows, flipped rows) gets an artificial variable
    /// so phase 1 of the solver has a feasible starting basis.
    pub fn build(constraints: &[Constraint], objective: &Expression) -> Result<Self, TableauError> {
        for (index, constraint) in constraints.iter().enumerate() {
            if constraint.comparison != Comparison::Eq {
                return Err(TableauError::NotStandardized { index });
            }
        }

        let slack_names: HashSet<&str> = constraints
            .iter()
            .filter_map(|c| c.slack_name())
            .collect();

        // Structural variables in first-seen order, then the per-row
        // slack/surplus columns.
        let mut variables: Vec<String> = Vec::new();
        for constraint in constraints {
            for (name, _) in constraint.left.variables() {
                if !slack_names.contains(name) && !variables.iter().any(|v| v == name) {
                    variables.push(name.to_string());
                }
            }
        }
        for (name, _) in objective.variables() {
            if !variables.iter().any(|v| v == name) {
                variables.push(name.to_string());
            }
        }
        let n_structural = variables.len();
        for constraint in constraints {
            if let Some(name) = constraint.slack_name() {
                variables.push(name.to_string());
            }
        }

        struct Pending {
            values: Vec<f64>,
            rhs: f64,
            basic: Option<String>,
        }

        let mut pending: Vec<Pending> = Vec::with_capacity(constraints.len());
        for constraint in constraints {
            let mut values: Vec<f64> = variables
                .iter()
                .map(|name| constraint.left.term_value(name))
                .collect();
            let mut rhs = constraint.right.constant();
            if rhs < 0.0 {
                rhs = -rhs;
                for value in &mut values {
                    *value = -*value;
                }
            }
            let basic = constraint.slack_name().and_then(|name| {
                let column = variables.iter().position(|v| v == name)?;
                (values[column] == 1.0).then(|| name.to_string())
            });
            pending.push(Pending { values, rhs, basic });
        }

        // Allocate one artificial column per row that still lacks a basis.
        let needs_artificial: Vec<usize> = pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.basic.is_none())
            .map(|(index, _)| index)
            .collect();
        let n_artificial = needs_artificial.len();
        for p in &mut pending {
            p.values.extend(std::iter::repeat(0.0).take(n_artificial));
        }
        let base_columns = variables.len();
        for (offset, &row_index) in needs_artificial.iter().enumerate() {
            let name = format!("artificial_{row_index}");
            pending[row_index].values[base_columns + offset] = 1.0;
            pending[row_index].basic = Some(name.clone());
            variables.push(name);
        }

        let mut rows = Vec::with_capacity(pending.len());
        for (index, mut p) in pending.into_iter().enumerate() {
            let basic = p
                .basic
                .take()
                .unwrap_or_else(|| format!("artificial_{index}"));
            p.values.push(p.rhs);
            rows.push(Row {
                values: p.values,
                basic,
            });
        }

        let mut objective_row: Vec<f64> = variables
            .iter()
            .map(|name| objective.term_value(name))
            .collect();
        objective_row.push(0.0);

        Ok(Self {
            variables,
            rows,
            objective: objective_row,
            n_structural,
            n_artificial,
        })
    }

    /// Number of structural (non-slack, non-artificial) variables; they
    /// occupy the leading columns.
    pub fn n_structural(&self) -> usize {
        self.n_structural
    }

    pub fn n_artificial(&self) -> usize {
        self.n_artificial
    }

    pub fn has_artificial(&self) -> bool {
        self.n_artificial > 0
    }

    /// Index of the first artificial column; equals the column count when
    /// there are none.
    pub fn artificial_start(&self) -> usize {
        self.variables.len() - self.n_artificial
    }

    pub fn rhs_column(&self) -> usize {
        self.variables.len()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }

    pub fn structural_variables(&self) -> &[String] {
        &self.variables[..self.n_structural]
    }

    /// Right-hand side of the row where `name` is basic, or 0 when it never
    /// entered the basis.
    pub fn value_of(&self, name: &str) -> f64 {
        let rhs = self.rhs_column();
        self.rows
            .iter()
            .find(|row| row.basic == name)
            .map(|row| row.values[rhs])
            .unwrap_or(0.0)
    }

    /// Negated right-hand side of the objective row (see the struct-level
    /// sign convention).
    pub fn objective_value(&self) -> f64 {
        -self.objective[self.rhs_column()]
    }
}
