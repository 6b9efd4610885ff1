use std::fmt;

use crate::expr::{CONSTANT, Expression};

/// Amount by which a strict inequality is tightened when relaxed to its
/// non-strict form, and the default floating-point tolerance of the solver.
/// The relaxation is a deliberate approximation, not exact arithmetic.
pub const EPSILON: f64 = 1e-6;

/// Comparison operator of a [`Constraint`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Equal (=)
    Eq,
    /// Strictly less than (<)
    Lt,
    /// Strictly greater than (>)
    Gt,
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
}

impl Comparison {
    /// The operator obtained by reflecting a constraint across the equals
    /// sign together with a coefficient negation. The mapping is fixed:
    /// `>=` ↔ `<` and `>` ↔ `<=`; applying it twice restores the original.
    pub fn negated(self) -> Self {
        match self {
            Comparison::Ge => Comparison::Lt,
            Comparison::Gt => Comparison::Le,
            Comparison::Le => Comparison::Gt,
            Comparison::Lt => Comparison::Ge,
            Comparison::Eq => Comparison::Eq,
        }
    }

    pub fn is_strict(self) -> bool {
        matches!(self, Comparison::Lt | Comparison::Gt)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparison::Eq => "=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        };
        write!(f, "{symbol}")
    }
}

/// One side of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// How a constraint was converted to an equality, kept for interpreting
/// the solved tableau.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlackKind {
    /// No slack or surplus added (equality constraints).
    None,
    /// A slack variable with coefficient +1, from a `<=`.
    Slack,
    /// A surplus variable with coefficient -1, from a `>=`.
    Surplus,
}

impl SlackKind {
    /// +1 for slack, -1 for surplus, 0 when nothing was added.
    pub fn sign(self) -> i8 {
        match self {
            SlackKind::None => 0,
            SlackKind::Slack => 1,
            SlackKind::Surplus => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TermKind {
    Variable,
    Constant,
}

/// Two expressions joined by a comparison operator.
///
/// A constraint moves one way through its lifecycle: parsed or constructed
/// with arbitrary sides, then [`normalize`](Constraint::normalize)d
/// (variables left, constants right, no strict operators), then rewritten
/// into [`standard_max_form`](Constraint::standard_max_form) for tableau
/// assembly. All methods mutate in place; each side is exclusively owned.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    pub left: Expression,
    pub right: Expression,
    pub comparison: Comparison,
    slack: SlackKind,
    slack_name: Option<String>,
    /// Label for diagnostics, typically the source line the constraint was
    /// parsed from. Not part of equality.
    pub label: Option<String>,
}

impl Constraint {
    pub fn new(left: Expression, right: Expression, comparison: Comparison) -> Self {
        Self {
            left,
            right,
            comparison,
            slack: SlackKind::None,
            slack_name: None,
            label: None,
        }
    }

    pub fn slack_kind(&self) -> SlackKind {
        self.slack
    }

    /// Name of the slack/surplus variable added by
    /// [`standard_max_form`](Constraint::standard_max_form), if any.
    pub fn slack_name(&self) -> Option<&str> {
        self.slack_name.as_deref()
    }

    /// Move every term of `kind` off `from`, negating it onto the opposite
    /// side and deleting it from `from`. The single primitive every other
    /// term-shuffling operation is built on.
    fn switch_sides(&mut self, from: Side, kind: TermKind) {
        let source = match from {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        let moved: Vec<(String, f64)> = match kind {
            TermKind::Variable => source
                .variables()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            TermKind::Constant => {
                if source.has_term(CONSTANT) {
                    vec![(CONSTANT.to_string(), source.constant())]
                } else {
                    Vec::new()
                }
            }
        };
        let (source, dest) = match from {
            Side::Left => (&mut self.left, &mut self.right),
            Side::Right => (&mut self.right, &mut self.left),
        };
        for (name, value) in moved {
            source.remove_term(&name);
            dest.add_term(&name, -value);
        }
    }

    /// Move all variable terms to `var_side` and all constant terms to the
    /// other side.
    pub fn isolate(&mut self, var_side: Side) {
        self.switch_sides(var_side.opposite(), TermKind::Variable);
        self.switch_sides(var_side, TermKind::Constant);
    }

    /// Negate both sides. The comparison is left untouched.
    pub fn negate(&mut self) {
        self.left.negate();
        self.right.negate();
    }

    /// Reflect the constraint: flip the comparison through
    /// [`Comparison::negated`] and negate both sides. An involution —
    /// applying it twice restores the original constraint.
    pub fn negate_comparison(&mut self) {
        self.comparison = self.comparison.negated();
        self.negate();
    }

    /// Relax a strict `<` or `>` to its non-strict form by tightening the
    /// constant side by [`EPSILON`]: `x < 4` becomes `x <= 4 - 1e-6`.
    /// Expects constants already on the right (see
    /// [`normalize`](Constraint::normalize)); non-strict operators pass
    /// through unchanged.
    pub fn relax_strict(&mut self) {
        match self.comparison {
            Comparison::Lt => {
                self.comparison = Comparison::Le;
                self.right.add_term(CONSTANT, -EPSILON);
            }
            Comparison::Gt => {
                self.comparison = Comparison::Ge;
                self.right.add_term(CONSTANT, EPSILON);
            }
            _ => {}
        }
    }

    /// Canonical form: variables on the left, constants on the right, no
    /// strict operators. Idempotent.
    pub fn normalize(&mut self) {
        self.isolate(Side::Left);
        self.relax_strict();
    }

    /// Append this row's slack variable (coefficient +1), named uniquely by
    /// the constraint's position in its problem.
    pub fn add_slack(&mut self, index: usize) {
        let name = format!("slack_{index}");
        self.left.add_term(&name, 1.0);
        self.slack = SlackKind::Slack;
        self.slack_name = Some(name);
    }

    /// Append this row's surplus variable (coefficient -1).
    pub fn add_surplus(&mut self, index: usize) {
        let name = format!("surplus_{index}");
        self.left.add_term(&name, -1.0);
        self.slack = SlackKind::Surplus;
        self.slack_name = Some(name);
    }

    /// Rewrite into standard maximization form: normalized, slack-augmented
    /// (slack for `<=`, surplus for `>=`, nothing for `=`), and an equality.
    /// `index` disambiguates the slack/surplus name when several constraints
    /// feed one tableau.
    pub fn standard_max_form(&mut self, index: usize) {
        self.normalize();
        match self.comparison {
            Comparison::Le | Comparison::Lt => self.add_slack(index),
            Comparison::Ge | Comparison::Gt => self.add_surplus(index),
            Comparison::Eq => {}
        }
        self.comparison = Comparison::Eq;
    }

    /// Scale both sides by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.left.scale(factor);
        self.right.scale(factor);
    }

    /// Move one named term to the requested side, negating it in transit.
    /// No-op when the term is absent from the other side.
    pub fn move_term(&mut self, name: &str, to: Side) {
        let (source, dest) = match to {
            Side::Left => (&mut self.right, &mut self.left),
            Side::Right => (&mut self.left, &mut self.right),
        };
        if source.has_term(name) {
            let value = source.term_value(name);
            source.remove_term(name);
            dest.add_term(name, -value);
        }
    }
}

impl PartialEq for Constraint {
    /// Field-by-field equality over both sides (algebraic), the comparison
    /// operator, and the slack bookkeeping. Labels are diagnostic only and
    /// do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.left == other.left
            && self.right == other.right
            && self.comparison == other.comparison
            && self.slack == other.slack
            && self.slack_name == other.slack_name
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.comparison, self.right)
    }
}
