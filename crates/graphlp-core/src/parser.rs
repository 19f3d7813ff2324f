//! Line-oriented problem text.
//!
//! ```text
//! // at most one objective line
//! max Z = 3x1 + 2x2
//! x1 + x2 <= 4
//! x1 <= 3; x2 <= 3
//! -x1 + 0.5*x2 >= -2
//! ```

use thiserror::Error;

use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::restriction::{Objective, OptimizationType, RelOp, Restriction};
use crate::store::RestrictionStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unknown variable '{name}' (only x1 and x2 are allowed)")]
    UnknownVariable { name: String, span: Span },
    #[error("Invalid number: {text}")]
    InvalidNumber { text: String, span: Span },
    #[error("Constant terms belong on the right-hand side")]
    ConstantTerm { span: Span },
    #[error("Only one objective is allowed")]
    DuplicateObjective { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnknownVariable { span, .. }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::ConstantTerm { span }
            | ParseError::DuplicateObjective { span } => *span,
        }
    }

    /// 1-based line and column of the error within `source`
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        self.span().line_col(source)
    }
}

/// A parsed problem: optional objective plus restrictions in source order
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProblemText {
    pub objective: Option<Objective>,
    pub restrictions: Vec<Restriction>,
}

impl ProblemText {
    pub fn store(&self) -> RestrictionStore {
        self.restrictions.iter().copied().collect()
    }
}

/// Linear expression `a*x1 + b*x2`
#[derive(Debug, Clone, Copy, Default)]
struct Linear {
    a: f64,
    b: f64,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens.into_iter().filter(|t| t.kind != TokenKind::Comment).collect();
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<ProblemText, ParseError> {
        let mut parser = Parser::new(Lexer::tokenize(source));
        parser.parse_program()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn current_span(&self) -> Span {
        self.current()
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or(Span::new(0, 0))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = match self.current() {
            Some(t) if t.kind == TokenKind::Eof => "end of input".to_string(),
            Some(t) if t.kind == TokenKind::Newline => "end of line".to_string(),
            Some(t) => format!("'{}'", t.text),
            None => "end of input".to_string(),
        };
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found,
            span: self.current_span(),
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
        )
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn parse_program(&mut self) -> Result<ProblemText, ParseError> {
        let mut problem = ProblemText::default();

        loop {
            self.skip_separators();

            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Max | TokenKind::Min => {
                    let span = self.current_span();
                    let objective = self.parse_objective()?;
                    if problem.objective.is_some() {
                        return Err(ParseError::DuplicateObjective { span });
                    }
                    problem.objective = Some(objective);
                }
                _ => problem.restrictions.push(self.parse_restriction()?),
            }

            if !self.at_statement_end() {
                return Err(self.unexpected("end of statement"));
            }
        }

        Ok(problem)
    }

    fn parse_objective(&mut self) -> Result<Objective, ParseError> {
        let optimization_type = match self.advance().map(|t| t.kind) {
            Some(TokenKind::Min) => OptimizationType::Min,
            _ => OptimizationType::Max,
        };

        // Optional `Z =` prefix
        if let Some(token) = self.current() {
            let is_z = token.kind == TokenKind::Ident && token.text.eq_ignore_ascii_case("z");
            if is_z && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::Equals) {
                self.pos += 2;
            }
        }

        let expr = self.parse_expression()?;
        Ok(Objective::new(expr.a, expr.b, optimization_type))
    }

    fn parse_restriction(&mut self) -> Result<Restriction, ParseError> {
        let expr = self.parse_expression()?;

        let op = match self.peek_kind() {
            TokenKind::Le => RelOp::Le,
            TokenKind::Ge => RelOp::Ge,
            _ => return Err(self.unexpected("'<=' or '>='")),
        };
        self.advance();

        let c = self.parse_signed_number()?;
        Ok(Restriction::new(expr.a, expr.b, op, c))
    }

    fn parse_expression(&mut self) -> Result<Linear, ParseError> {
        let mut expr = Linear::default();
        let mut first = true;

        loop {
            let sign = match self.peek_kind() {
                TokenKind::Plus => {
                    self.advance();
                    1.0
                }
                TokenKind::Minus => {
                    self.advance();
                    -1.0
                }
                _ if first => 1.0,
                _ => break,
            };
            first = false;

            let (coefficient, variable) = self.parse_term()?;
            match variable {
                1 => expr.a += sign * coefficient,
                _ => expr.b += sign * coefficient,
            }
        }

        Ok(expr)
    }

    /// `[number [*]] variable`, returning the coefficient and the variable index
    fn parse_term(&mut self) -> Result<(f64, u8), ParseError> {
        let mut coefficient = 1.0;
        let mut start = None;

        if self.peek_kind() == TokenKind::Number {
            let Some(token) = self.advance() else {
                return Err(self.unexpected("number"));
            };
            coefficient = parse_number(&token)?;
            start = Some(token.span);

            if self.peek_kind() == TokenKind::Star {
                self.advance();
            } else if self.peek_kind() != TokenKind::Ident {
                return Err(ParseError::ConstantTerm { span: token.span });
            }
        }

        if self.peek_kind() != TokenKind::Ident {
            return Err(self.unexpected("x1 or x2"));
        }
        let Some(token) = self.advance() else {
            return Err(self.unexpected("x1 or x2"));
        };
        let variable = match token.text.to_ascii_lowercase().as_str() {
            "x1" => 1,
            "x2" => 2,
            _ => {
                return Err(ParseError::UnknownVariable {
                    name: token.text,
                    span: start.map_or(token.span, |s| s.merge(token.span)),
                });
            }
        };

        Ok((coefficient, variable))
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        let sign = match self.peek_kind() {
            TokenKind::Plus => {
                self.advance();
                1.0
            }
            TokenKind::Minus => {
                self.advance();
                -1.0
            }
            _ => 1.0,
        };

        if self.peek_kind() != TokenKind::Number {
            return Err(self.unexpected("number"));
        }
        match self.advance() {
            Some(token) => Ok(sign * parse_number(&token)?),
            None => Err(self.unexpected("number")),
        }
    }
}

fn parse_number(token: &Token) -> Result<f64, ParseError> {
    match token.text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::InvalidNumber {
            text: token.text.clone(),
            span: token.span,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_textbook_problem() {
        let source = r#"
            // classic example
            max Z = 3x1 + 2x2
            x1 + x2 <= 4
            x1 <= 3
            x2 <= 3
        "#;
        let problem = Parser::parse(source).unwrap();
        assert_eq!(problem.objective, Some(Objective::maximize(3.0, 2.0)));
        assert_eq!(
            problem.restrictions,
            vec![
                Restriction::le(1.0, 1.0, 4.0),
                Restriction::le(1.0, 0.0, 3.0),
                Restriction::le(0.0, 1.0, 3.0),
            ]
        );
    }

    #[test]
    fn test_parse_signs_and_stars() {
        let problem = Parser::parse("-x1 + 0.5*x2 >= -2; 2x1 - 3x2 ≤ +6").unwrap();
        assert_eq!(problem.objective, None);
        assert_eq!(
            problem.restrictions,
            vec![Restriction::ge(-1.0, 0.5, -2.0), Restriction::le(2.0, -3.0, 6.0)]
        );
    }

    #[test]
    fn test_repeated_variables_accumulate() {
        let problem = Parser::parse("min x2 + x1 + 2x1\nx1 + x1 - x2 >= 1").unwrap();
        assert_eq!(problem.objective, Some(Objective::minimize(3.0, 1.0)));
        assert_eq!(problem.restrictions, vec![Restriction::ge(2.0, -1.0, 1.0)]);
    }

    #[test]
    fn test_zero_coefficients_are_kept() {
        let problem = Parser::parse("0x1 + 0x2 >= 1").unwrap();
        assert_eq!(problem.restrictions, vec![Restriction::ge(0.0, 0.0, 1.0)]);
    }

    #[test]
    fn test_empty_source() {
        let problem = Parser::parse("\n  # nothing here\n").unwrap();
        assert_eq!(problem, ProblemText::default());
        assert!(problem.store().is_empty());
    }

    #[test]
    fn test_unknown_variable() {
        let source = "x1 <= 4\n2x3 >= 1";
        let err = Parser::parse(source).unwrap_err();
        assert!(matches!(err, ParseError::UnknownVariable { ref name, .. } if name == "x3"));
        assert_eq!(err.line_col(source), (2, 1));
    }

    #[test]
    fn test_constant_on_left_side() {
        let err = Parser::parse("x1 + 3 <= 4").unwrap_err();
        assert!(matches!(err, ParseError::ConstantTerm { .. }));
    }

    #[test]
    fn test_missing_operator() {
        let err = Parser::parse("x1 + x2 4").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected token: expected '<=' or '>=', found '4'"
        );
    }

    #[test]
    fn test_strict_operator_rejected() {
        let err = Parser::parse("x1 < 4").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_missing_rhs() {
        let err = Parser::parse("x1 <=\nx2 <= 1").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token: expected number, found end of line");
    }

    #[test]
    fn test_duplicate_objective() {
        let source = "max x1\nmin x2";
        let err = Parser::parse(source).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateObjective { .. }));
        assert_eq!(err.line_col(source), (2, 1));
    }

    #[test]
    fn test_trailing_garbage() {
        let err = Parser::parse("x1 <= 4 x2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected token: expected end of statement, found 'x2'"
        );
    }

    #[test]
    fn test_overflowing_number() {
        let err = Parser::parse("x1 <= 1e999").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }
}
