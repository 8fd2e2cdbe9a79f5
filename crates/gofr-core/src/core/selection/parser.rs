use super::SelectionError;
use super::expr::Expr;
use super::lexer::{CmpOp, Token};

pub(super) struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(mut self) -> Result<Expr, SelectionError> {
        if self.tokens.is_empty() {
            return Err(SelectionError::Empty);
        }
        let expr = self.parse_or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(SelectionError::UnexpectedToken {
                found: token.to_string(),
                expected: "end of selection",
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w == keyword)
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), SelectionError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(SelectionError::UnexpectedToken {
                found: token.to_string(),
                expected: description,
            }),
            None => Err(SelectionError::UnexpectedEnd {
                expected: description,
            }),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, SelectionError> {
        let mut lhs = self.parse_and()?;
        while self.peek_keyword("or") {
            self.position += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, SelectionError> {
        let mut lhs = self.parse_not()?;
        while self.peek_keyword("and") {
            self.position += 1;
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, SelectionError> {
        if self.peek_keyword("not") {
            self.position += 1;
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, SelectionError> {
        match self.next() {
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Some(Token::Word(word)) => match word.as_str() {
                "all" => Ok(Expr::All),
                "none" => Ok(Expr::None),
                "name" => {
                    let var = self.parse_variable()?;
                    let value = self.parse_value("an atom name")?;
                    Ok(Expr::Name { var, value })
                }
                "index" => {
                    let var = self.parse_variable()?;
                    let op = match self.peek() {
                        Some(Token::Cmp(op)) => {
                            let op = *op;
                            self.position += 1;
                            op
                        }
                        _ => CmpOp::Eq,
                    };
                    let raw = self.parse_value("an atom index")?;
                    let value = raw
                        .parse::<usize>()
                        .map_err(|_| SelectionError::InvalidNumber(raw.clone()))?;
                    Ok(Expr::Index { var, op, value })
                }
                _ => Err(SelectionError::UnexpectedToken {
                    found: word,
                    expected: "a selector",
                }),
            },
            Some(token) => Err(SelectionError::UnexpectedToken {
                found: token.to_string(),
                expected: "a selector",
            }),
            None => Err(SelectionError::UnexpectedEnd {
                expected: "a selector",
            }),
        }
    }

    /// Parses an optional `(#n)` suffix, returning a zero-based variable.
    fn parse_variable(&mut self) -> Result<usize, SelectionError> {
        let var = match (
            self.tokens.get(self.position),
            self.tokens.get(self.position + 1),
        ) {
            (Some(Token::LParen), Some(Token::Variable(var))) => *var,
            _ => return Ok(0),
        };

        self.position += 2;
        self.expect(Token::RParen, "')'")?;
        if var == 0 {
            return Err(SelectionError::InvalidVariable(var));
        }
        Ok(var - 1)
    }

    fn parse_value(&mut self, expected: &'static str) -> Result<String, SelectionError> {
        match self.next() {
            Some(Token::Word(word)) => Ok(word),
            Some(token) => Err(SelectionError::UnexpectedToken {
                found: token.to_string(),
                expected,
            }),
            None => Err(SelectionError::UnexpectedEnd { expected }),
        }
    }
}
