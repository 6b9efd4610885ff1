use crate::constraint::{Constraint, EPSILON};
use crate::problem::{Direction, Problem};
use crate::solution::{Analysis, ReducedCost, ShadowPrice, Solution, Status, VariableValue};
use crate::tableau::Tableau;

/// Two-phase primal simplex over a dense [`Tableau`].
pub struct Solver {
    /// Pivot cap per phase; `None` scales with the tableau size.
    max_iterations: Option<usize>,
    /// Tolerance for floating point comparisons.
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: None,
            tolerance: EPSILON,
        }
    }
}

enum Phase1 {
    Feasible,
    Infeasible,
    IterationLimit,
}

enum Phase2 {
    Optimal,
    Unbounded,
    IterationLimit,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Solve a problem: standardizes a working copy of each constraint,
    /// assembles the tableau, and runs both simplex phases.
    pub fn solve(&self, problem: &Problem) -> Solution {
        let standardized = problem.standardized();
        let objective = problem.max_objective();
        let mut tableau = match Tableau::build(&standardized, &objective) {
            Ok(t) => t,
            // standardized() only produces equalities, so this is unreachable
            // in practice; fail closed rather than panic
            Err(_) => return Solution::infeasible(),
        };
        match self.solve_tableau(&mut tableau) {
            Status::Optimal => self.extract(&tableau, problem, &standardized),
            Status::Unbounded => Solution::unbounded(match problem.direction {
                Direction::Maximize => f64::INFINITY,
                Direction::Minimize => f64::NEG_INFINITY,
            }),
            Status::Infeasible => Solution::infeasible(),
            Status::CycleDetected => Solution::cycle_detected(),
        }
    }

    /// Run both phases over an already-built tableau, mutating it in place,
    /// and report the terminal status.
    pub fn solve_tableau(&self, tableau: &mut Tableau) -> Status {
        if tableau.has_artificial() {
            match self.phase1(tableau) {
                Phase1::Feasible => {}
                Phase1::Infeasible => return Status::Infeasible,
                Phase1::IterationLimit => return Status::CycleDetected,
            }
        }
        match self.phase2(tableau) {
            Phase2::Optimal => Status::Optimal,
            Phase2::Unbounded => Status::Unbounded,
            Phase2::IterationLimit => Status::CycleDetected,
        }
    }

    /// Drive the artificial variables out of the basis by maximizing their
    /// negated sum. Leaves the tableau holding the restored objective row
    /// on success.
    fn phase1(&self, tableau: &mut Tableau) -> Phase1 {
        let columns = tableau.rhs_column();
        let art_start = tableau.artificial_start();

        // Swap in the auxiliary objective: -1 on every artificial column.
        let mut saved = vec![0.0; columns + 1];
        std::mem::swap(&mut tableau.objective, &mut saved);
        for column in art_start..columns {
            tableau.objective[column] = -1.0;
        }
        // Cancel the -1 under each basic artificial so the auxiliary row is
        // consistent with the starting basis.
        for i in 0..tableau.rows.len() {
            let basic_column = tableau.column(&tableau.rows[i].basic);
            if matches!(basic_column, Some(c) if c >= art_start) {
                for column in 0..=columns {
                    tableau.objective[column] += tableau.rows[i].values[column];
                }
            }
        }

        let cap = self.iteration_cap(tableau);
        let mut reached_optimum = false;
        for _ in 0..cap {
            let Some(column) = self.entering_column(tableau, columns) else {
                reached_optimum = true;
                break;
            };
            let Some(row) = self.leaving_row(tableau, column) else {
                // the auxiliary objective is bounded above by zero; no
                // limiting row means the original problem has no feasible
                // point
                return Phase1::Infeasible;
            };
            self.pivot(tableau, row, column);
        }
        if !reached_optimum {
            return Phase1::IterationLimit;
        }

        // An artificial still basic at a nonzero level means infeasible.
        let rhs = tableau.rhs_column();
        for row in &tableau.rows {
            if let Some(column) = tableau.column(&row.basic) {
                if column >= art_start && row.values[rhs].abs() > self.tolerance {
                    return Phase1::Infeasible;
                }
            }
        }

        // Restore the real objective and cancel it under the current basis.
        tableau.objective = saved;
        for i in 0..tableau.rows.len() {
            let Some(basic_column) = tableau.column(&tableau.rows[i].basic) else {
                continue;
            };
            let factor = tableau.objective[basic_column];
            if factor.abs() > self.tolerance {
                for column in 0..=columns {
                    tableau.objective[column] -= factor * tableau.rows[i].values[column];
                }
            }
        }
        Phase1::Feasible
    }

    /// Optimize the real objective; artificial columns never re-enter.
    fn phase2(&self, tableau: &mut Tableau) -> Phase2 {
        let limit = tableau.artificial_start();
        let cap = self.iteration_cap(tableau);
        for _ in 0..cap {
            let Some(column) = self.entering_column(tableau, limit) else {
                return Phase2::Optimal;
            };
            let Some(row) = self.leaving_row(tableau, column) else {
                return Phase2::Unbounded;
            };
            self.pivot(tableau, row, column);
        }
        Phase2::IterationLimit
    }

    fn iteration_cap(&self, tableau: &Tableau) -> usize {
        self.max_iterations
            .unwrap_or(16 * (tableau.rows.len() + 1) * (tableau.variables.len() + 1))
    }

    /// Most positive objective coefficient among the first `limit` columns.
    /// Ties break to the leftmost column, which keeps runs reproducible.
    fn entering_column(&self, tableau: &Tableau, limit: usize) -> Option<usize> {
        let mut best = self.tolerance;
        let mut best_column = None;
        for column in 0..limit {
            if tableau.objective[column] > best {
                best = tableau.objective[column];
                best_column = Some(column);
            }
        }
        best_column
    }

    /// Minimum ratio test over rows with a strictly positive entry in the
    /// entering column. Ties break to the lowest row index.
    fn leaving_row(&self, tableau: &Tableau, column: usize) -> Option<usize> {
        let rhs = tableau.rhs_column();
        let mut best_ratio = f64::INFINITY;
        let mut best_row = None;
        for (index, row) in tableau.rows.iter().enumerate() {
            let value = row.values[column];
            if value > self.tolerance {
                let ratio = row.values[rhs] / value;
                if ratio >= 0.0 && ratio < best_ratio {
                    best_ratio = ratio;
                    best_row = Some(index);
                }
            }
        }
        best_row
    }

    /// Scale the pivot row so the entering coefficient is exactly 1, zero
    /// the entering column everywhere else, and relabel the row's basic
    /// variable.
    fn pivot(&self, tableau: &mut Tableau, row: usize, column: usize) {
        tableau.rows[row].basic = tableau.variables[column].clone();

        let pivot_value = tableau.rows[row].values[column];
        for value in &mut tableau.rows[row].values {
            *value /= pivot_value;
        }

        let width = tableau.rhs_column() + 1;
        for i in 0..tableau.rows.len() {
            if i == row {
                continue;
            }
            let factor = tableau.rows[i].values[column];
            if factor == 0.0 {
                continue;
            }
            for j in 0..width {
                let pivot_row_value = tableau.rows[row].values[j];
                tableau.rows[i].values[j] -= factor * pivot_row_value;
            }
        }
        let factor = tableau.objective[column];
        if factor != 0.0 {
            for j in 0..width {
                tableau.objective[j] -= factor * tableau.rows[row].values[j];
            }
        }
    }

    fn extract(
        &self,
        tableau: &Tableau,
        problem: &Problem,
        standardized: &[Constraint],
    ) -> Solution {
        let values: Vec<VariableValue> = tableau
            .structural_variables()
            .iter()
            .map(|name| VariableValue {
                name: name.clone(),
                value: tableau.value_of(name),
            })
            .collect();

        // Recompute from the original objective: this covers minimization
        // and any constant term without touching the tableau's convention.
        let mut objective_value = problem.objective.constant();
        for v in &values {
            objective_value += problem.objective.term_value(&v.name) * v.value;
        }

        let analysis = self.analyze(tableau, problem, standardized);
        Solution {
            status: Status::Optimal,
            values,
            objective_value,
            analysis,
        }
    }

    fn analyze(
        &self,
        tableau: &Tableau,
        problem: &Problem,
        standardized: &[Constraint],
    ) -> Analysis {
        let orientation = match problem.direction {
            Direction::Maximize => 1.0,
            Direction::Minimize => -1.0,
        };

        // Dual value of a constraint sits in the objective row under its
        // slack column, with the surplus sign folded in.
        let mut shadow_prices = Vec::new();
        for (index, constraint) in standardized.iter().enumerate() {
            let Some(name) = constraint.slack_name() else {
                continue;
            };
            let Some(column) = tableau.column(name) else {
                continue;
            };
            let sign = f64::from(constraint.slack_kind().sign());
            let value = -sign * tableau.objective[column] * orientation;
            let interpretation = if value.abs() < self.tolerance {
                "non-binding constraint".to_string()
            } else {
                format!("raising the right-hand side by 1 changes the objective by {value:.4}")
            };
            let label = constraint
                .label
                .clone()
                .unwrap_or_else(|| format!("constraint {index}"));
            shadow_prices.push(ShadowPrice {
                constraint: label,
                value,
                interpretation,
            });
        }

        let mut reduced_costs = Vec::new();
        for name in tableau.structural_variables() {
            let is_basic = tableau.rows.iter().any(|row| &row.basic == name);
            let reduced_cost = if is_basic {
                0.0
            } else {
                tableau
                    .column(name)
                    .map(|column| tableau.objective[column] * orientation)
                    .unwrap_or(0.0)
            };
            reduced_costs.push(ReducedCost {
                variable: name.clone(),
                value: tableau.value_of(name),
                reduced_cost,
                is_basic,
            });
        }

        let binding_constraints = shadow_prices
            .iter()
            .filter(|sp| sp.value.abs() > self.tolerance)
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
    use crate::constraint::Comparison;
    use crate::expr::{CONSTANT, Expression};

    fn expr(terms: &[(&str, f64)]) -> Expression {
        let mut e = Expression::new();
        for (name, value) in terms {
            e.add_term(name, *value);
        }
        e
    }

    fn le(terms: &[(&str, f64)], rhs: f64) -> Constraint {
        Constraint::new(expr(terms), expr(&[(CONSTANT, rhs)]), Comparison::Le)
    }

    fn ge(terms: &[(&str, f64)], rhs: f64) -> Constraint {
        Constraint::new(expr(terms), expr(&[(CONSTANT, rhs)]), Comparison::Ge)
    }

    fn eq(terms: &[(&str, f64)], rhs: f64) -> Constraint {
        Constraint::new(expr(terms), expr(&[(CONSTANT, rhs)]), Comparison::Eq)
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize 3x + 2y subject to x + y <= 4, x <= 3, y <= 3.
        // Optimal: x=3, y=1, objective 11.
        let mut problem = Problem::maximize(expr(&[("x", 3.0), ("y", 2.0)]));
        problem.add_constraint(le(&[("x", 1.0), ("y", 1.0)], 4.0));
        problem.add_constraint(le(&[("x", 1.0)], 3.0));
        problem.add_constraint(le(&[("y", 1.0)], 3.0));

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Optimal);
        assert!((solution.value("x").unwrap() - 3.0).abs() < 1e-6);
        assert!((solution.value("y").unwrap() - 1.0).abs() < 1e-6);
        assert!((solution.objective_value - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_maximization_with_nonnegativity_rows() {
        // Maximize 3x + 2y subject to x + y <= 4, x + 2y <= 5, x >= 0,
        // y >= 0. Optimal: x=4, y=0, objective 12.
        let mut problem = Problem::maximize(expr(&[("x", 3.0), ("y", 2.0)]));
        problem.add_constraint(le(&[("x", 1.0), ("y", 1.0)], 4.0));
        problem.add_constraint(le(&[("x", 1.0), ("y", 2.0)], 5.0));
        problem.add_constraint(ge(&[("x", 1.0)], 0.0));
        problem.add_constraint(ge(&[("y", 1.0)], 0.0));

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Optimal);
        assert!((solution.value("x").unwrap() - 4.0).abs() < 1e-6);
        assert!(solution.value("y").unwrap().abs() < 1e-6);
        assert!((solution.objective_value - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize 2x + 3y subject to x + y >= 4, x <= 3, y <= 3.
        // Optimal: x=3, y=1, objective 9.
        let mut problem = Problem::minimize(expr(&[("x", 2.0), ("y", 3.0)]));
        problem.add_constraint(ge(&[("x", 1.0), ("y", 1.0)], 4.0));
        problem.add_constraint(le(&[("x", 1.0)], 3.0));
        problem.add_constraint(le(&[("y", 1.0)], 3.0));

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Optimal);
        assert!((solution.value("x").unwrap() - 3.0).abs() < 1e-6);
        assert!((solution.value("y").unwrap() - 1.0).abs() < 1e-6);
        assert!((solution.objective_value - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_unbounded() {
        // Maximize x with only x >= 0: no limiting row.
        let mut problem = Problem::maximize(expr(&[("x", 1.0)]));
        problem.add_constraint(ge(&[("x", 1.0)], 0.0));

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Unbounded);
        assert_eq!(solution.objective_value, f64::INFINITY);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_infeasible() {
        // x >= 5 and x <= 3 cannot both hold.
        let mut problem = Problem::maximize(expr(&[("x", 1.0)]));
        problem.add_constraint(ge(&[("x", 1.0)], 5.0));
        problem.add_constraint(le(&[("x", 1.0)], 3.0));

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Infeasible);
    }

    #[test]
    fn test_equality_constraint() {
        // Maximize x subject to x + y = 4.
        let mut problem = Problem::maximize(expr(&[("x", 1.0)]));
        problem.add_constraint(eq(&[("x", 1.0), ("y", 1.0)], 4.0));

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Optimal);
        assert!((solution.value("x").unwrap() - 4.0).abs() < 1e-6);
        assert!(solution.value("y").unwrap().abs() < 1e-6);
        assert!((solution.objective_value - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_strict_inequality_relaxation() {
        // Maximize x subject to x < 4: the optimum sits EPSILON inside.
        let mut problem = Problem::maximize(expr(&[("x", 1.0)]));
        problem.add_constraint(Constraint::new(
            expr(&[("x", 1.0)]),
            expr(&[(CONSTANT, 4.0)]),
            Comparison::Lt,
        ));

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Optimal);
        let x = solution.value("x").unwrap();
        assert!(x < 4.0);
        assert!((x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_cycle_detected_on_forced_cap() {
        // The simple maximization needs two pivots; capping at one must
        // surface as a cycle report, not a wrong answer.
        let mut problem = Problem::maximize(expr(&[("x", 3.0), ("y", 2.0)]));
        problem.add_constraint(le(&[("x", 1.0), ("y", 1.0)], 4.0));
        problem.add_constraint(le(&[("x", 1.0)], 3.0));
        problem.add_constraint(le(&[("y", 1.0)], 3.0));

        let solution = Solver::new().with_max_iterations(1).solve(&problem);

        assert_eq!(solution.status, Status::CycleDetected);
    }

    #[test]
    fn test_solve_tableau_objective_convention() {
        let mut problem = Problem::maximize(expr(&[("x", 3.0), ("y", 2.0)]));
        problem.add_constraint(le(&[("x", 1.0), ("y", 1.0)], 4.0));
        problem.add_constraint(le(&[("x", 1.0), ("y", 2.0)], 5.0));

        let mut tableau = problem.tableau().unwrap();
        let status = Solver::new().solve_tableau(&mut tableau);

        assert_eq!(status, Status::Optimal);
        // the objective row's right-hand side is the negated optimum
        assert!((tableau.objective_value() - 12.0).abs() < 1e-6);
        assert!((tableau.value_of("x") - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_shadow_prices_and_binding_constraints() {
        let mut problem = Problem::maximize(expr(&[("x", 3.0), ("y", 2.0)]));
        let mut binding = le(&[("x", 1.0), ("y", 1.0)], 4.0);
        binding.label = Some("capacity".to_string());
        problem.add_constraint(binding);
        problem.add_constraint(le(&[("x", 1.0), ("y", 2.0)], 5.0));

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Optimal);
        let capacity = &solution.analysis.shadow_prices[0];
        assert_eq!(capacity.constraint, "capacity");
        assert!((capacity.value - 3.0).abs() < 1e-6);
        let slack = &solution.analysis.shadow_prices[1];
        assert!(slack.value.abs() < 1e-6);
        assert_eq!(
            solution.analysis.binding_constraints,
            vec!["capacity".to_string()]
        );
        // y never enters the basis; its reduced cost says how far off it is
        let y = solution
            .analysis
            .reduced_costs
            .iter()
            .find(|rc| rc.variable == "y")
            .unwrap();
        assert!(!y.is_basic);
        assert!((y.reduced_cost - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_problem_without_constraints_is_bounded_at_origin() {
        // Maximize -x with nothing else: the origin is optimal.
        let problem = Problem::maximize(expr(&[("x", -1.0)]));
        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.value("x"), Some(0.0));
        assert_eq!(solution.objective_value, 0.0);
    }
}
