use crate::constraint::Constraint;
use crate::expr::Expression;
use crate::tableau::{Tableau, TableauError};

/// Optimization direction of a [`Problem`]'s objective.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

/// A full linear program: an objective expression, the direction it is
/// optimized in, and the constraints it is optimized under.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Problem {
    pub direction: Direction,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
}

impl Problem {
    pub fn new(direction: Direction, objective: Expression) -> Self {
        Self {
            direction,
            objective,
            constraints: Vec::new(),
        }
    }

    pub fn maximize(objective: Expression) -> Self {
        Self::new(Direction::Maximize, objective)
    }

    pub fn minimize(objective: Expression) -> Self {
        Self::new(Direction::Minimize, objective)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Structural variable names in first-seen order across the constraints
    /// and the objective.
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &str, names: &mut Vec<String>| {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        };
        for constraint in &self.constraints {
            for (name, _) in constraint.left.variables() {
                push(name, &mut names);
            }
            for (name, _) in constraint.right.variables() {
                push(name, &mut names);
            }
        }
        for (name, _) in self.objective.variables() {
            push(name, &mut names);
        }
        names
    }

    /// Standard-max-form copies of the constraints, slack and surplus names
    /// indexed by constraint position.
    pub fn standardized(&self) -> Vec<Constraint> {
        self.constraints
            .iter()
            .enumerate()
            .map(|(index, constraint)| {
                let mut c = constraint.clone();
                c.standard_max_form(index);
                c
            })
            .collect()
    }

    /// The objective as maximization coefficients: negated for minimization
    /// problems, untouched otherwise.
    pub fn max_objective(&self) -> Expression {
        let mut objective = self.objective.clone();
        if self.direction == Direction::Minimize {
            objective.negate();
        }
        objective
    }

    /// Assemble the simplex tableau for this problem.
    pub fn tableau(&self) -> Result<Tableau, TableauError> {
        Tableau::build(&self.standardized(), &self.max_objective())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Comparison;
    use crate::expr::CONSTANT;

    fn expr(terms: &[(&str, f64)]) -> Expression {
        let mut e = Expression::new();
        for (name, value) in terms {
            e.add_term(name, *value);
        }
        e
    }

    #[test]
    fn test_standardized_indexes_slack_names() {
        let mut problem = Problem::maximize(expr(&[("x", 1.0)]));
        problem.add_constraint(Constraint::new(
            expr(&[("x", 1.0)]),
            expr(&[(CONSTANT, 4.0)]),
            Comparison::Le,
        ));
        problem.add_constraint(Constraint::new(
            expr(&[("x", 1.0)]),
            expr(&[(CONSTANT, 1.0)]),
            Comparison::Ge,
        ));
        let standardized = problem.standardized();
        assert_eq!(standardized[0].slack_name(), Some("slack_0"));
        assert_eq!(standardized[1].slack_name(), Some("surplus_1"));
        // the originals are untouched
        assert_eq!(problem.constraints[0].comparison, Comparison::Le);
    }

    #[test]
    fn test_variables_first_seen_order() {
        let mut problem = Problem::maximize(expr(&[("z", 1.0), ("x", 1.0)]));
        problem.add_constraint(Constraint::new(
            expr(&[("x", 1.0)]),
            expr(&[("y", 1.0), (CONSTANT, 2.0)]),
            Comparison::Le,
        ));
        assert_eq!(problem.variables(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_max_objective_negates_for_minimize() {
        let problem = Problem::minimize(expr(&[("x", 2.0), (CONSTANT, 1.0)]));
        let objective = problem.max_objective();
        assert_eq!(objective.term_value("x"), -2.0);
        assert_eq!(objective.constant(), -1.0);
    }
}
