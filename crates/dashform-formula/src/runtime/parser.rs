//! Script parser
//!
//! A recursive descent parser for the translated expression dialect. It
//! accepts both spellings the translator emits: Python-style row
//! expressions (`a if c else b`, `and`, `or`, `not`, `True`) and JavaScript
//! style column expressions (`&&`, `||`, `!`, `c ? a : b`, `null`).

use super::ast::{BinaryOperator, ScriptExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};

/// Parse a script expression into an AST
///
/// # Example
/// ```rust
/// use dashform_formula::runtime::parse_script;
///
/// let ast = parse_script(r#"("adult" if 42 > 18 else "minor")"#).unwrap();
/// let ast = parse_script(r#"arraySum(getColumnData("sales", 2))"#).unwrap();
/// ```
pub fn parse_script(script: &str) -> FormulaResult<ScriptExpr> {
    let mut parser = ScriptParser::new(script.trim());
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if *parser.current_token() != Token::Eof {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),

    // Names, keywords included
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    AndAnd,
    OrOr,
    Bang,
    Question,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    Unknown(char),

    // End of input
    Eof,
}

/// Script parser
struct ScriptParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
}

impl<'a> ScriptParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.skip_whitespace();
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Token::Eof;
        };

        // Two-character operators
        let pair = match (c, self.peek_char_at(1)) {
            ('=', Some('=')) => Some(Token::Equal),
            ('!', Some('=')) => Some(Token::NotEqual),
            ('<', Some('=')) => Some(Token::LessEqual),
            ('<', Some('>')) => Some(Token::NotEqual),
            ('>', Some('=')) => Some(Token::GreaterEqual),
            ('&', Some('&')) => Some(Token::AndAnd),
            ('|', Some('|')) => Some(Token::OrOr),
            _ => None,
        };
        if let Some(token) = pair {
            self.advance();
            self.advance();
            // `===` and `!==`
            if matches!(token, Token::Equal | Token::NotEqual) && self.peek_char() == Some('=') {
                self.advance();
            }
            return token;
        }

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            '=' => Some(Token::Equal),
            '<' => Some(Token::LessThan),
            '>' => Some(Token::GreaterThan),
            '!' => Some(Token::Bang),
            '?' => Some(Token::Question),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        // String literal
        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_alphabetic() || c == '_' {
            return self.scan_identifier();
        }

        self.advance();
        Token::Unknown(c)
    }

    fn scan_string(&mut self, quote: char) -> Token {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == quote {
                // Spreadsheet escape: a doubled quote is one literal quote
                if self.peek_char_at(1) == Some(quote) {
                    s.push(quote);
                    self.advance();
                    self.advance();
                    continue;
                }
                break;
            }
            self.advance();
            if c == '\\' {
                match self.peek_char() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(escaped) => s.push(escaped),
                    None => s.push('\\'),
                }
                self.advance();
            } else {
                s.push(c);
            }
        }

        // Skip closing quote
        if self.peek_char() == Some(quote) {
            self.advance();
        }

        Token::String(s)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E')
            && self
                .peek_char_at(1)
                .map_or(false, |c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        Token::Number(num_str.parse().unwrap_or(f64::NAN))
    }

    /// Identifiers may be dotted (`Math.round`)
    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }
        Token::Identifier(self.input[start..self.pos].to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.current_token(), Token::Identifier(name) if name == keyword)
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Conditional: a if c else b, c ? a : b
    // 2. Logical or: or, ||
    // 3. Logical and: and, &&
    // 4. Logical not: not
    // 5. Comparison: ==, !=, <, <=, >, >= (plus = and <>)
    // 6. Additive: +, -, &
    // 7. Multiplicative: *, /, %
    // 8. Unary: -, +, !
    // 9. Primary: literals, names, calls, arrays, parentheses

    fn parse_expression(&mut self) -> FormulaResult<ScriptExpr> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> FormulaResult<ScriptExpr> {
        let body = self.parse_or()?;

        if self.at_keyword("if") {
            self.consume();
            let condition = self.parse_or()?;
            if !self.at_keyword("else") {
                return Err(FormulaError::Parse(format!(
                    "Expected 'else', got {:?}",
                    self.current_token()
                )));
            }
            self.consume();
            let otherwise = self.parse_conditional()?;
            return Ok(ScriptExpr::Conditional {
                condition: Box::new(condition),
                then: Box::new(body),
                otherwise: Box::new(otherwise),
            });
        }

        if matches!(self.current_token(), Token::Question) {
            self.consume();
            let then = self.parse_conditional()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.parse_conditional()?;
            return Ok(ScriptExpr::Conditional {
                condition: Box::new(body),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }

        Ok(body)
    }

    fn parse_or(&mut self) -> FormulaResult<ScriptExpr> {
        let mut left = self.parse_and()?;

        while self.at_keyword("or") || matches!(self.current_token(), Token::OrOr) {
            self.consume();
            let right = self.parse_and()?;
            left = ScriptExpr::BinaryOp {
                op: BinaryOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> FormulaResult<ScriptExpr> {
        let mut left = self.parse_not()?;

        while self.at_keyword("and") || matches!(self.current_token(), Token::AndAnd) {
            self.consume();
            let right = self.parse_not()?;
            left = ScriptExpr::BinaryOp {
                op: BinaryOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> FormulaResult<ScriptExpr> {
        if self.at_keyword("not") {
            self.consume();
            let operand = self.parse_not()?;
            return Ok(ScriptExpr::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<ScriptExpr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_additive()?;
            left = ScriptExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<ScriptExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                Token::Ampersand => BinaryOperator::Concat,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = ScriptExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<ScriptExpr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            left = ScriptExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<ScriptExpr> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            Token::Bang => UnaryOperator::Not,
            _ => return self.parse_primary(),
        };

        self.consume();
        let operand = self.parse_unary()?;
        Ok(ScriptExpr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> FormulaResult<ScriptExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(ScriptExpr::Number(n))
            }

            Token::String(s) => {
                self.consume();
                Ok(ScriptExpr::String(s))
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::LeftBracket => self.parse_array(),

            Token::Identifier(name) => {
                self.consume();
                // Check if it's a function call
                if matches!(self.current_token(), Token::LeftParen) {
                    return self.parse_function_call(name);
                }
                Ok(match name.as_str() {
                    "True" | "true" | "TRUE" => ScriptExpr::Boolean(true),
                    "False" | "false" | "FALSE" => ScriptExpr::Boolean(false),
                    "None" | "null" | "undefined" => ScriptExpr::Null,
                    _ => ScriptExpr::Identifier(name),
                })
            }

            _ => Err(FormulaError::Parse(format!(
                "Unexpected token: {:?}",
                self.current_token()
            ))),
        }
    }

    fn parse_array(&mut self) -> FormulaResult<ScriptExpr> {
        self.expect(&Token::LeftBracket)?;
        let items = self.parse_list(&Token::RightBracket)?;
        Ok(ScriptExpr::Array(items))
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<ScriptExpr> {
        self.expect(&Token::LeftParen)?;
        let args = self.parse_list(&Token::RightParen)?;
        Ok(ScriptExpr::Call { name, args })
    }

    /// Comma separated expressions up to and including `close`
    fn parse_list(&mut self, close: &Token) -> FormulaResult<Vec<ScriptExpr>> {
        let mut items = Vec::new();

        if self.current_token() != close {
            items.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                items.push(self.parse_expression()?);
            }
        }

        self.expect(close)?;
        Ok(items)
    }
}
