use linprog_solver::{CONSTANT, Comparison, Constraint, Direction, Expression, Problem};
use thiserror::Error;

use crate::lexer::{Lexer, Span, Token, TokenKind};

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("expression is empty")]
    EmptyExpression,
    #[error("unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("'{operator}' at position {span:?} is missing an operand")]
    DanglingOperator { operator: String, span: Span },
    #[error("constraint contains more than one comparison operator at position {span:?}")]
    MultipleComparisons { span: Span },
}

/// Parser over the token stream.
///
/// Standalone expressions and constraints treat newlines as whitespace;
/// [`Parser::parse_program`] is line-oriented: one objective line, an
/// optional `subject to` separator, then one constraint per line.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Parse a signed sum of terms: `2x + 3y - 4`, `-x`, `42`. A bare
    /// number is a constant term, a bare name has coefficient 1.
    pub fn parse_expression(source: &str) -> Result<Expression, ParseError> {
        expression_from_tokens(&significant_tokens(source))
    }

    /// Parse `<expr> [cmp] <expr>` with at most one comparison operator.
    /// A missing right side defaults to `= 0`.
    pub fn parse_constraint(source: &str) -> Result<Constraint, ParseError> {
        constraint_from_tokens(&significant_tokens(source))
    }

    /// Parse a whole program:
    ///
    /// ```text
    /// maximize 3x + 2y
    /// subject to
    /// x + y <= 4
    /// x + 2y <= 5
    /// ```
    ///
    /// `max`/`min` are accepted for `maximize`/`minimize`; the separator
    /// line is optional. Each constraint is labelled with its source line.
    pub fn parse_program(source: &str) -> Result<Problem, ParseError> {
        let mut parser = Parser {
            source,
            tokens: Lexer::tokenize(source),
            pos: 0,
        };
        parser.program()
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_trivia(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comment) {
            self.advance();
        }
    }

    /// Significant tokens up to the end of the current line; consumes the
    /// trailing newline.
    fn line_tokens(&mut self) -> Vec<Token> {
        let mut line = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Newline | TokenKind::Eof => break,
                TokenKind::Comment => self.advance(),
                _ => {
                    if let Some(token) = self.tokens.get(self.pos) {
                        line.push(token.clone());
                    }
                    self.advance();
                }
            }
        }
        if self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
        line
    }

    fn line_label(&self, line: &[Token]) -> Option<String> {
        let first = line.first()?;
        let last = line.last()?;
        Some(self.source[first.span.start..last.span.end].to_string())
    }

    fn program(&mut self) -> Result<Problem, ParseError> {
        self.skip_trivia();
        let direction = match self.peek_kind() {
            TokenKind::Maximize => {
                self.advance();
                Direction::Maximize
            }
            TokenKind::Minimize => {
                self.advance();
                Direction::Minimize
            }
            TokenKind::Eof => return Err(ParseError::UnexpectedEof),
            kind => {
                let span = self
                    .tokens
                    .get(self.pos)
                    .map(|t| t.span)
                    .unwrap_or(Span::new(0, 0));
                return Err(ParseError::UnexpectedToken {
                    expected: "maximize or minimize".to_string(),
                    found: format!("{kind:?}"),
                    span,
                });
            }
        };
        let objective = expression_from_tokens(&self.line_tokens())?;
        let mut problem = Problem::new(direction, objective);

        self.skip_trivia();
        // optional "subject to" separator
        if self.peek_kind() == TokenKind::Subject {
            self.advance();
            if self.peek_kind() == TokenKind::To {
                self.advance();
            }
        }

        loop {
            self.skip_trivia();
            if self.peek_kind() == TokenKind::Eof {
                break;
            }
            let line = self.line_tokens();
            if line.is_empty() {
                continue;
            }
            let label = self.line_label(&line);
            let mut constraint = constraint_from_tokens(&line)?;
            constraint.label = label;
            problem.add_constraint(constraint);
        }
        Ok(problem)
    }
}

/// Lex `source` and drop trivia, letting standalone expressions and
/// constraints span lines freely.
fn significant_tokens(source: &str) -> Vec<Token> {
    Lexer::tokenize(source)
        .into_iter()
        .filter(|t| {
            !matches!(
                t.kind,
                TokenKind::Newline | TokenKind::Comment | TokenKind::Eof
            )
        })
        .collect()
}

fn comparison_token(kind: TokenKind) -> Option<Comparison> {
    match kind {
        TokenKind::Eq => Some(Comparison::Eq),
        TokenKind::Lt => Some(Comparison::Lt),
        TokenKind::Gt => Some(Comparison::Gt),
        TokenKind::Le => Some(Comparison::Le),
        TokenKind::Ge => Some(Comparison::Ge),
        _ => None,
    }
}

fn expression_from_tokens(tokens: &[Token]) -> Result<Expression, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyExpression);
    }
    let mut expr = Expression::new();
    let mut pos = 0;
    let mut first = true;
    while pos < tokens.len() {
        // a sign: optional before the first term, exactly one between terms
        let mut sign = 1.0;
        let mut operator: Option<&Token> = None;
        match tokens[pos].kind {
            TokenKind::Plus => {
                operator = Some(&tokens[pos]);
                pos += 1;
            }
            TokenKind::Minus => {
                sign = -1.0;
                operator = Some(&tokens[pos]);
                pos += 1;
            }
            _ if first => {}
            kind => {
                return Err(ParseError::UnexpectedToken {
                    expected: "'+' or '-'".to_string(),
                    found: format!("{kind:?}"),
                    span: tokens[pos].span,
                });
            }
        }
        // then the term itself
        match tokens.get(pos) {
            Some(token) if token.kind == TokenKind::Number => {
                let coefficient: f64 = token
                    .text
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber(token.text.clone()))?;
                pos += 1;
                match tokens.get(pos) {
                    Some(name) if name.kind == TokenKind::Ident => {
                        expr.add_term(&name.text, sign * coefficient);
                        pos += 1;
                    }
                    _ => expr.add_term(CONSTANT, sign * coefficient),
                }
            }
            Some(token) if token.kind == TokenKind::Ident => {
                expr.add_term(&token.text, sign);
                pos += 1;
            }
            Some(token) if matches!(token.kind, TokenKind::Plus | TokenKind::Minus) => {
                // adjacent operators: one of them has no operand
                let offending = operator.unwrap_or(token);
                return Err(ParseError::DanglingOperator {
                    operator: offending.text.clone(),
                    span: offending.span,
                });
            }
            Some(token) => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a coefficient or variable name".to_string(),
                    found: format!("{:?}", token.kind),
                    span: token.span,
                });
            }
            None => {
                if let Some(offending) = operator {
                    return Err(ParseError::DanglingOperator {
                        operator: offending.text.clone(),
                        span: offending.span,
                    });
                }
                return Err(ParseError::UnexpectedEof);
            }
        }
        first = false;
    }
    Ok(expr)
}

fn constraint_from_tokens(tokens: &[Token]) -> Result<Constraint, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyExpression);
    }
    let mut split: Option<(usize, Comparison)> = None;
    for (index, token) in tokens.iter().enumerate() {
        if let Some(comparison) = comparison_token(token.kind) {
            if split.is_some() {
                return Err(ParseError::MultipleComparisons { span: token.span });
            }
            split = Some((index, comparison));
        }
    }
    match split {
        Some((index, comparison)) => {
            let left = expression_from_tokens(&tokens[..index])?;
            let right = expression_from_tokens(&tokens[index + 1..])?;
            Ok(Constraint::new(left, right, comparison))
        }
        // no comparison: the expression is constrained to equal zero
        None => Ok(Constraint::new(
            expression_from_tokens(tokens)?,
            Expression::new(),
            Comparison::Eq,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linprog_solver::{SlackKind, Solver, Status};

    #[test]
    fn test_parse_expression_terms() {
        let expr = Parser::parse_expression("2x + 3y - 4").unwrap();
        assert_eq!(expr.term_value("x"), 2.0);
        assert_eq!(expr.term_value("y"), 3.0);
        assert_eq!(expr.constant(), -4.0);
    }

    #[test]
    fn test_parse_bare_name_and_bare_number() {
        let expr = Parser::parse_expression("x").unwrap();
        assert_eq!(expr.term_value("x"), 1.0);

        let expr = Parser::parse_expression("42").unwrap();
        assert_eq!(expr.constant(), 42.0);
        assert_eq!(expr.variables().count(), 0);
    }

    #[test]
    fn test_parse_signed_first_term_and_decimals() {
        let expr = Parser::parse_expression("-x + 2.5y").unwrap();
        assert_eq!(expr.term_value("x"), -1.0);
        assert_eq!(expr.term_value("y"), 2.5);
    }

    #[test]
    fn test_parse_spaced_coefficient() {
        // "2 x" and "2x" read the same
        let spaced = Parser::parse_expression("2 x").unwrap();
        let tight = Parser::parse_expression("2x").unwrap();
        assert_eq!(spaced, tight);
    }

    #[test]
    fn test_repeated_names_accumulate() {
        let expr = Parser::parse_expression("x + 2x - 3").unwrap();
        assert_eq!(expr.term_value("x"), 3.0);
        assert_eq!(expr.constant(), -3.0);
    }

    #[test]
    fn test_display_round_trip() {
        for source in ["2x + 3y - 4", "-x + 2.5y", "x - y + 7", "42", "0"] {
            let parsed = Parser::parse_expression(source).unwrap();
            let reparsed = Parser::parse_expression(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {source:?}");
        }
    }

    #[test]
    fn test_empty_expression_is_an_error() {
        assert!(matches!(
            Parser::parse_expression(""),
            Err(ParseError::EmptyExpression)
        ));
        assert!(matches!(
            Parser::parse_expression("   "),
            Err(ParseError::EmptyExpression)
        ));
    }

    #[test]
    fn test_dangling_operator_errors() {
        assert!(matches!(
            Parser::parse_constraint("a + + b = 3"),
            Err(ParseError::DanglingOperator { .. })
        ));
        assert!(matches!(
            Parser::parse_expression("a +"),
            Err(ParseError::DanglingOperator { .. })
        ));
        assert!(matches!(
            Parser::parse_expression("+"),
            Err(ParseError::DanglingOperator { .. })
        ));
    }

    #[test]
    fn test_invalid_token_is_an_error() {
        assert!(matches!(
            Parser::parse_expression("2 & 3"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_juxtaposed_terms_are_an_error() {
        assert!(matches!(
            Parser::parse_expression("x y"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_parse_constraint_splits_on_comparison() {
        let constraint = Parser::parse_constraint("a + b <= 10").unwrap();
        assert_eq!(constraint.comparison, Comparison::Le);
        assert_eq!(constraint.left.term_value("a"), 1.0);
        assert_eq!(constraint.left.term_value("b"), 1.0);
        assert_eq!(constraint.right.constant(), 10.0);
    }

    #[test]
    fn test_parse_constraint_normalize() {
        let mut constraint = Parser::parse_constraint("a + b <= 10").unwrap();
        constraint.normalize();
        assert_eq!(constraint.left.term_value("a"), 1.0);
        assert_eq!(constraint.left.term_value("b"), 1.0);
        assert_eq!(constraint.left.constant(), 0.0);
        assert_eq!(constraint.right.constant(), 10.0);
        assert_eq!(constraint.right.variables().count(), 0);
    }

    #[test]
    fn test_missing_right_side_defaults_to_zero_equality() {
        let constraint = Parser::parse_constraint("x + y").unwrap();
        assert_eq!(constraint.comparison, Comparison::Eq);
        assert_eq!(constraint.right.constant(), 0.0);
    }

    #[test]
    fn test_multiple_comparisons_are_an_error() {
        assert!(matches!(
            Parser::parse_constraint("a < b < c"),
            Err(ParseError::MultipleComparisons { .. })
        ));
    }

    #[test]
    fn test_standard_max_form_from_text() {
        let mut le = Parser::parse_constraint("x + y <= 4").unwrap();
        le.standard_max_form(0);
        assert_eq!(le.comparison, Comparison::Eq);
        assert_eq!(le.slack_kind(), SlackKind::Slack);
        assert_eq!(le.left.term_value("slack_0"), 1.0);

        let mut ge = Parser::parse_constraint("x + y >= 4").unwrap();
        ge.standard_max_form(0);
        assert_eq!(ge.slack_kind(), SlackKind::Surplus);
        assert_eq!(ge.left.term_value("surplus_0"), -1.0);
    }

    #[test]
    fn test_parse_program() {
        let source = r#"
            // a small production plan
            maximize 3x + 2y
            subject to
            x + y <= 4
            x + 2y <= 5
        "#;
        let problem = Parser::parse_program(source).unwrap();
        assert_eq!(problem.direction, Direction::Maximize);
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(problem.variables(), vec!["x", "y"]);
        assert_eq!(
            problem.constraints[0].label.as_deref(),
            Some("x + y <= 4")
        );
    }

    #[test]
    fn test_parse_program_without_separator() {
        let source = "min 2x + 3y\nx + y >= 4\n";
        let problem = Parser::parse_program(source).unwrap();
        assert_eq!(problem.direction, Direction::Minimize);
        assert_eq!(problem.num_constraints(), 1);
    }

    #[test]
    fn test_parse_program_requires_objective() {
        assert!(matches!(
            Parser::parse_program("x + y <= 4"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Parser::parse_program(""),
            Err(ParseError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_parse_and_solve() {
        let source = r#"
            maximize 3x + 2y
            subject to
            x + y <= 4
            x + 2y <= 5
        "#;
        let problem = Parser::parse_program(source).unwrap();
        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, Status::Optimal);
        assert!((solution.value("x").unwrap() - 4.0).abs() < 1e-6);
        assert!(solution.value("y").unwrap().abs() < 1e-6);
        assert!((solution.objective_value - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_and_solve_unbounded() {
        let problem = Parser::parse_program("maximize x\nx >= 0\n").unwrap();
        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, Status::Unbounded);
    }
}
