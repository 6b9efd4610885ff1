use std::fmt;

/// Name reserved for the constant term of an [`Expression`].
pub const CONSTANT: &str = "1";

/// A single `(name, coefficient)` pair inside an [`Expression`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub name: String,
    pub coefficient: f64,
}

/// A linear combination of named terms.
///
/// The reserved name `"1"` holds the constant part, so `2x + 3y - 4` is
/// stored as `{x: 2, y: 3, "1": -4}`. Term names are unique within one
/// expression and kept in first-insertion order, which later fixes the
/// column order of the tableau.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Expression {
    terms: Vec<Term>,
}

impl Expression {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// An expression holding only a constant.
    pub fn constant_value(value: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(CONSTANT, value);
        expr
    }

    /// Add `value` to the coefficient of `name`, creating the term if absent.
    pub fn add_term(&mut self, name: &str, value: f64) {
        if let Some(term) = self.terms.iter_mut().find(|t| t.name == name) {
            term.coefficient += value;
        } else {
            self.terms.push(Term {
                name: name.to_string(),
                coefficient: value,
            });
        }
    }

    /// Delete the term entirely. Absent names are a no-op.
    pub fn remove_term(&mut self, name: &str) {
        self.terms.retain(|t| t.name != name);
    }

    pub fn has_term(&self, name: &str) -> bool {
        self.terms.iter().any(|t| t.name == name)
    }

    /// Coefficient of `name`, or 0 when the term is absent. An absent term
    /// and a term with coefficient 0 are algebraically the same thing.
    pub fn term_value(&self, name: &str) -> f64 {
        self.terms
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.coefficient)
            .unwrap_or(0.0)
    }

    /// Multiply every coefficient, the constant included, by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for term in &mut self.terms {
            term.coefficient *= factor;
        }
    }

    /// Negate every term. Shorthand for `scale(-1.0)`.
    pub fn negate(&mut self) {
        self.scale(-1.0);
    }

    /// The constant part of the expression.
    pub fn constant(&self) -> f64 {
        self.term_value(CONSTANT)
    }

    /// Iterate over the variable terms, skipping the constant.
    pub fn variables(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms
            .iter()
            .filter(|t| t.name != CONSTANT)
            .map(|t| (t.name.as_str(), t.coefficient))
    }

    /// All term names present, constant included, in insertion order.
    pub fn term_names(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl PartialEq for Expression {
    /// Algebraic equality: a missing term counts as a zero coefficient.
    fn eq(&self, other: &Self) -> bool {
        self.terms
            .iter()
            .all(|t| t.coefficient == other.term_value(&t.name))
            && other
                .terms
                .iter()
                .all(|t| t.coefficient == self.term_value(&t.name))
    }
}

impl fmt::Display for Expression {
    /// Renders a signed-term string that parses back to an algebraically
    /// equal expression. Zero terms are dropped; an empty expression is "0".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for term in &self.terms {
            if term.coefficient == 0.0 {
                continue;
            }
            if first {
                if term.coefficient < 0.0 {
                    write!(f, "-")?;
                }
                first = false;
            } else if term.coefficient < 0.0 {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            let magnitude = term.coefficient.abs();
            if term.name == CONSTANT {
                write!(f, "{magnitude}")?;
            } else if magnitude == 1.0 {
                write!(f, "{}", term.name)?;
            } else {
                write!(f, "{}{}", magnitude, term.name)?;
            }
        }
        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}
