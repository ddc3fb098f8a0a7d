//! Calculator tool: evaluates mathematical expressions.
//!
//! Supports arithmetic: `+`, `-`, `*`, `/`, `%`, `^`, parentheses, unary
//! signs and decimal numbers. Uses a recursive-descent parser for
//! correctness. No dependencies beyond std.

use async_trait::async_trait;
use persanna_core::error::ToolError;
use persanna_core::tool::Tool;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Useful for getting the result of a math expression. The input to this tool should be \
         a valid mathematical expression that could be executed by a simple calculator."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let expr = input.trim().trim_end_matches('=').trim();
        let value = evaluate(expr).map_err(|e| ToolError::invalid("calculator", e))?;
        Ok(format_number(value))
    }
}

/// Render integers without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// ── Recursive-descent expression evaluator ────────────────────────────────

/// Evaluate a mathematical expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens);
    let result = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!(
            "Unexpected token at position {}: {:?}",
            parser.pos, parser.tokens[parser.pos]
        ));
    }
    if !result.is_finite() {
        return Err("Result is not a finite number".into());
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let token = match chars[i] {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' | '×' => Token::Star,
            '/' | '÷' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num_str: String = chars[start..i].iter().collect();
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("Invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
                continue;
            }
            c => return Err(format!("Unexpected character: '{}'", c)),
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut left = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.consume();
                    left += self.parse_term()?;
                }
                Token::Minus => {
                    self.consume();
                    left -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // term = unary (('*' | '/' | '%') unary)*
    fn parse_term(&mut self) -> Result<f64, String> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.consume();
                    left *= self.parse_unary()?;
                }
                Token::Slash => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Division by zero".into());
                    }
                    left /= right;
                }
                Token::Percent => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Modulo by zero".into());
                    }
                    left %= right;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // unary = ('-' | '+') unary | power
    fn parse_unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                Ok(-self.parse_unary()?)
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // power = primary ('^' unary)?   (right-associative)
    fn parse_power(&mut self) -> Result<f64, String> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // primary = NUMBER | '(' expr ')'
    fn parse_primary(&mut self) -> Result<f64, String> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                let val = self.parse_expr()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(val),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("Unexpected token: {:?}", tok)),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_addition() {
        assert_eq!(evaluate("2 + 3").unwrap(), 5.0);
        assert_eq!(evaluate("2+2").unwrap(), 4.0);
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("2 * 3 ^ 2").unwrap(), 18.0);
    }

    #[test]
    fn parentheses() {
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn division_and_modulo() {
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
        assert_eq!(evaluate("10 % 4").unwrap(), 2.0);
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("1 % 0").is_err());
    }

    #[test]
    fn exponent_is_right_associative() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("2 ^ -1").unwrap(), 0.5);
        assert_eq!(evaluate("-2 ^ 2").unwrap(), -4.0);
    }

    #[test]
    fn unary_signs() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("+5 - -3").unwrap(), 8.0);
    }

    #[test]
    fn decimals() {
        assert_eq!(evaluate("3.14 * 2").unwrap(), 6.28);
    }

    #[test]
    fn invalid_expressions() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("two plus two").is_err());
    }

    #[tokio::test]
    async fn tool_invoke() {
        let out = CalculatorTool.invoke("2+2").await.unwrap();
        assert_eq!(out, "4");
    }

    #[tokio::test]
    async fn tool_tolerates_trailing_equals() {
        let out = CalculatorTool.invoke(" 6 * 7 = ").await.unwrap();
        assert_eq!(out, "42");
    }

    #[tokio::test]
    async fn tool_formats_decimals() {
        let out = CalculatorTool.invoke("10 / 3").await.unwrap();
        assert!(out.starts_with("3.333"));
    }

    #[tokio::test]
    async fn tool_reports_bad_input() {
        let err = CalculatorTool.invoke("2 +").await.unwrap_err();
        assert_eq!(err.tool_name(), "calculator");
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[test]
    fn tool_definition() {
        let def = CalculatorTool.to_definition();
        assert_eq!(def.name, "calculator");
    }
}
