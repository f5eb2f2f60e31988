//! A minimal recursive-descent parser for a `Head(arg, arg, ...)` textual
//! expression syntax: integers, floats, quoted strings, bare symbols, and
//! nested complex expressions. Just enough to drive the CLI; not a general
//! BOSS surface syntax.

use boss_core::Expression;

pub fn parse(input: &str) -> Result<Expression, String> {
    let mut parser = Parser {
        chars: input.as_bytes(),
        pos: 0,
    };
    let expr = parser.parse_expression()?;
    parser.skip_whitespace();
    if parser.pos != parser.chars.len() {
        return Err(format!("unexpected trailing input at byte {}", parser.pos));
    }
    Ok(expr)
}

struct Parser<'a> {
    chars: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.chars.get(self.pos).copied()
    }

    fn parse_expression(&mut self) -> Result<Expression, String> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'"') => self.parse_string(),
            Some(b) if b == b'-' || b.is_ascii_digit() => self.parse_number(),
            Some(b) if is_identifier_start(b) => self.parse_symbol_or_complex(),
            Some(b) => Err(format!("unexpected character '{}' at byte {}", b as char, self.pos)),
            None => Err("unexpected end of input".to_owned()),
        }
    }

    fn parse_string(&mut self) -> Result<Expression, String> {
        self.pos += 1; // opening quote
        let start = self.pos;
        while self.peek().is_some_and(|b| b != b'"') {
            self.pos += 1;
        }
        if self.peek() != Some(b'"') {
            return Err("unterminated string literal".to_owned());
        }
        let text = std::str::from_utf8(&self.chars[start..self.pos])
            .map_err(|_| "string literal is not valid UTF-8".to_owned())?
            .to_owned();
        self.pos += 1; // closing quote
        Ok(Expression::String(text))
    }

    fn parse_number(&mut self) -> Result<Expression, String> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.chars[start..self.pos]).expect("ascii digits are valid UTF-8");
        if is_float {
            text.parse::<f64>()
                .map(Expression::F64)
                .map_err(|e| format!("invalid float literal \"{text}\": {e}"))
        } else {
            text.parse::<i64>()
                .map(Expression::I64)
                .map_err(|e| format!("invalid integer literal \"{text}\": {e}"))
        }
    }

    fn parse_symbol_or_complex(&mut self) -> Result<Expression, String> {
        let start = self.pos;
        while self.peek().is_some_and(is_identifier_continue) {
            self.pos += 1;
        }
        let name = std::str::from_utf8(&self.chars[start..self.pos])
            .expect("identifier bytes are valid UTF-8")
            .to_owned();

        if self.peek() != Some(b'(') {
            return Ok(Expression::Symbol(name.into()));
        }
        self.pos += 1; // '('
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() != Some(b')') {
            loop {
                args.push(self.parse_expression()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        self.skip_whitespace();
                    }
                    Some(b')') => break,
                    _ => return Err(format!("expected ',' or ')' at byte {}", self.pos)),
                }
            }
        }
        self.pos += 1; // ')'
        Ok(Expression::complex(name, args))
    }
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_identifier_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_nested_complex_expression() {
        let expr = parse("Plus(1, Minus(5, 2))").unwrap();
        let complex = expr.as_complex().unwrap();
        assert_eq!(complex.head().as_str(), "Plus");
        assert_eq!(complex.arguments().len(), 2);
    }

    #[test]
    fn parses_atoms() {
        assert_eq!(parse("42").unwrap(), Expression::I64(42));
        assert_eq!(parse("-3.5").unwrap(), Expression::F64(-3.5));
        assert_eq!(parse("\"hi\"").unwrap(), Expression::String("hi".to_owned()));
        assert_eq!(parse("Foo").unwrap(), Expression::Symbol("Foo".into()));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("1 2").is_err());
    }
}
