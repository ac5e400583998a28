use crate::ast::*;
use crate::lexer::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let tokens = crate::lexer::Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_program()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn current_span(&self) -> Span {
        self.current()
            .map(|t| t.span)
            .unwrap_or_else(|| self.previous_span())
    }

    fn previous_span(&self) -> Span {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or(Span::new(0, 0))
    }

    fn skip_newlines_and_comments(&mut self) {
        while matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Comment
        ) {
            self.advance();
        }
    }

    /// Comments may sit between tokens of a statement, newlines may not.
    fn skip_comments(&mut self) {
        while self.peek_kind() == TokenKind::Comment {
            self.advance();
        }
    }

    fn skip_optional(&mut self, kind: TokenKind) {
        self.skip_comments();
        if self.peek_kind() == kind {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?}", t.kind),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        self.skip_newlines_and_comments();
        let token = self.current().cloned();
        match token {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.unexpected(&format!("{:?}", kind))),
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut items = Vec::new();

        loop {
            self.skip_newlines_and_comments();

            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Maximize => items.push(Item::Objective(self.parse_objective()?)),
                TokenKind::Subject => {
                    self.advance();
                    self.expect(TokenKind::To)?;
                    self.skip_optional(TokenKind::Colon);
                }
                TokenKind::St => {
                    self.advance();
                    self.skip_optional(TokenKind::Colon);
                }
                TokenKind::Ident | TokenKind::Number | TokenKind::Plus | TokenKind::Minus => {
                    items.push(Item::Constraint(self.parse_constraint()?))
                }
                _ => return Err(self.unexpected("objective, constraint, or `subject to`")),
            }
        }

        Ok(Program { items })
    }

    fn parse_objective(&mut self) -> Result<ObjectiveDecl, ParseError> {
        let start = self.expect(TokenKind::Maximize)?.span;
        self.skip_optional(TokenKind::Colon);
        // The expression may start on the next line
        self.skip_newlines_and_comments();

        let terms = self.parse_expr()?;
        let end = self.previous_span();
        self.expect_statement_end()?;

        Ok(ObjectiveDecl {
            span: start.merge(end),
            terms,
        })
    }

    fn parse_constraint(&mut self) -> Result<ConstraintDecl, ParseError> {
        let start = self.current_span();

        let mut name = None;
        if self.peek_kind() == TokenKind::Ident && self.peek_kind_at(1) == TokenKind::Colon {
            name = self.advance().map(|t| t.text.clone());
            self.advance();
        }

        let terms = self.parse_expr()?;

        self.skip_comments();
        let relation = match self.peek_kind() {
            TokenKind::Le => Relation::Le,
            TokenKind::Ge => Relation::Ge,
            TokenKind::Eq => Relation::Eq,
            _ => return Err(self.unexpected("<=")),
        };
        self.advance();

        let rhs = self.parse_signed_number()?;
        let end = self.previous_span();
        self.expect_statement_end()?;

        Ok(ConstraintDecl {
            span: start.merge(end),
            name,
            terms,
            relation,
            rhs,
        })
    }

    /// A sum of terms: `2x - y + 0.5 * z`
    fn parse_expr(&mut self) -> Result<Vec<Term>, ParseError> {
        let mut terms = Vec::new();

        loop {
            self.skip_comments();
            let start = self.current_span();
            let mut sign = 1.0;

            match self.peek_kind() {
                TokenKind::Plus => {
                    self.advance();
                }
                TokenKind::Minus => {
                    self.advance();
                    sign = -1.0;
                }
                _ if !terms.is_empty() => break,
                _ => {}
            }

            self.skip_comments();
            terms.push(self.parse_term(sign, start)?);
        }

        Ok(terms)
    }

    fn parse_term(&mut self, sign: f64, start: Span) -> Result<Term, ParseError> {
        let mut coefficient = sign;

        if self.peek_kind() == TokenKind::Number {
            coefficient *= self.parse_number()?;
            self.skip_optional(TokenKind::Star);
            self.skip_comments();
        }

        match self.current().cloned() {
            Some(t) if t.kind == TokenKind::Ident => {
                self.advance();
                Ok(Term {
                    span: start.merge(t.span),
                    coefficient,
                    variable: t.text,
                })
            }
            _ => Err(self.unexpected("variable")),
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        match self.current().cloned() {
            Some(t) if t.kind == TokenKind::Number => {
                self.advance();
                t.text
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidNumber(t.text.clone()))
            }
            _ => Err(self.unexpected("number")),
        }
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        self.skip_comments();
        let sign = match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                -1.0
            }
            TokenKind::Plus => {
                self.advance();
                1.0
            }
            _ => 1.0,
        };
        self.skip_comments();
        Ok(sign * self.parse_number()?)
    }

    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        self.skip_comments();
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Eof => Ok(()),
            TokenKind::Comma => {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected("end of line")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(program: &Program, i: usize) -> &ConstraintDecl {
        program.constraints().nth(i).expect("constraint")
    }

    #[test]
    fn test_parse_objective() {
        let program = Parser::parse("maximize 2x + 3y").unwrap();
        assert_eq!(program.items.len(), 1);
        match &program.items[0] {
            Item::Objective(o) => {
                assert_eq!(o.terms.len(), 2);
                assert_eq!(o.terms[0].variable, "x");
                assert_eq!(o.terms[0].coefficient, 2.0);
                assert_eq!(o.terms[1].variable, "y");
                assert_eq!(o.terms[1].coefficient, 3.0);
                assert_eq!(o.span, Span::new(0, 16));
            }
            _ => panic!("Expected objective"),
        }
    }

    #[test]
    fn test_parse_full_problem() {
        let source = r#"
            // production planning
            maximize 2x + 3y
            subject to
              a: 2x + y <= 18
              b: 6x + 5y <= 60
              2x + 5y <= 40
        "#;
        let program = Parser::parse(source).unwrap();
        assert_eq!(program.objectives().count(), 1);
        assert_eq!(program.constraints().count(), 3);

        let a = constraint(&program, 0);
        assert_eq!(a.name.as_deref(), Some("a"));
        assert_eq!(a.relation, Relation::Le);
        assert_eq!(a.rhs, 18.0);

        let third = constraint(&program, 2);
        assert_eq!(third.name, None);
        assert_eq!(third.terms[1].coefficient, 5.0);
        assert_eq!(third.rhs, 40.0);
    }

    #[test]
    fn test_signs_and_implicit_coefficients() {
        let program = Parser::parse("max -x - 2.5 * y + z\n-x + y <= -3").unwrap();
        let objective = program.objectives().next().unwrap();
        let coefs: Vec<_> = objective.terms.iter().map(|t| t.coefficient).collect();
        assert_eq!(coefs, vec![-1.0, -2.5, 1.0]);

        let c = constraint(&program, 0);
        assert_eq!(c.terms[0].coefficient, -1.0);
        assert_eq!(c.rhs, -3.0);
    }

    #[test]
    fn test_objective_on_next_line() {
        let program = Parser::parse("maximize:\n  x + y\nst\n x <= 1").unwrap();
        assert_eq!(program.objectives().next().unwrap().terms.len(), 2);
        assert_eq!(program.constraints().count(), 1);
    }

    #[test]
    fn test_comma_separated_constraints() {
        let program = Parser::parse("max x\nx <= 1, y <= 2").unwrap();
        assert_eq!(program.constraints().count(), 2);
    }

    #[test]
    fn test_other_relations_parse() {
        let program = Parser::parse("max x\nx >= 1\nx = 2").unwrap();
        assert_eq!(constraint(&program, 0).relation, Relation::Ge);
        assert_eq!(constraint(&program, 1).relation, Relation::Eq);
    }

    #[test]
    fn test_missing_relation() {
        let err = Parser::parse("max x\n2x + y 18").unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, .. } => assert_eq!(expected, "<="),
            other => panic!("Expected unexpected token, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_variable() {
        let err = Parser::parse("max 2 + x").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "variable"));
    }

    #[test]
    fn test_unexpected_eof() {
        assert_eq!(Parser::parse("max x\nx <=").unwrap_err(), ParseError::UnexpectedEof);
        assert_eq!(Parser::parse("subject").unwrap_err(), ParseError::UnexpectedEof);
    }

    #[test]
    fn test_trailing_garbage() {
        let err = Parser::parse("max x\nx <= 1 y").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "end of line"));
    }

    #[test]
    fn test_inline_comments() {
        let program = Parser::parse("max x /* profit */ + y // total\nx <= 4 // cap").unwrap();
        assert_eq!(program.objectives().next().unwrap().terms.len(), 2);
        assert_eq!(constraint(&program, 0).rhs, 4.0);
    }
}
