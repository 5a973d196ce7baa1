//! Default [`ScriptEngine`]: a small expression language for style functions.
//!
//! Supported syntax:
//! * literals: numbers (`1.5`), strings (`'line'` or `"line"`), `true`, `false`;
//! * keywords: `$zoom`, `$geometry` (`"point"`, `"line"` or `"polygon"`);
//! * arithmetic `+ - * /`, comparisons `< <= > >= == !=`, logic `! && ||`;
//! * conditional `condition ? a : b` and parentheses.
//!
//! A function may also be written as `function() { return <expression>; }`.

use crate::error::MarkerError;
use crate::scene::SceneFunction;
use crate::style::context::{FunctionId, Globals, ScriptEngine};
use crate::style::StyleValue;

/// Engine compiling style functions written in the expression language.
#[derive(Debug, Default)]
pub struct ExpressionEngine {
    compiled: Vec<Expr>,
}

impl ScriptEngine for ExpressionEngine {
    fn register(&mut self, function: &SceneFunction) -> Result<FunctionId, MarkerError> {
        let expr = compile(&function.source)?;
        self.compiled.push(expr);
        Ok(FunctionId(self.compiled.len() as u32 - 1))
    }

    fn evaluate(&self, id: FunctionId, globals: &Globals) -> Result<StyleValue, MarkerError> {
        let expr = self
            .compiled
            .get(id.0 as usize)
            .ok_or_else(|| MarkerError::Script(format!("unknown function id {}", id.0)))?;
        expr.eval(globals)
    }

    fn clear(&mut self) {
        self.compiled.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Keyword {
    Zoom,
    Geometry,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(StyleValue),
    Keyword(Keyword),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Keyword(Keyword),
    Op(&'static str),
}

fn script_error(message: impl Into<String>) -> MarkerError {
    MarkerError::Script(message.into())
}

fn compile(source: &str) -> Result<Expr, MarkerError> {
    let body = strip_function_wrapper(source);
    let tokens = tokenize(body)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.conditional()?;
    if parser.pos != parser.tokens.len() {
        return Err(script_error(format!(
            "unexpected token {:?} in '{source}'",
            parser.tokens[parser.pos]
        )));
    }

    Ok(expr)
}

fn strip_function_wrapper(source: &str) -> &str {
    let source = source.trim();
    if !source.starts_with("function") {
        return source;
    }

    let (Some(start), Some(end)) = (source.find('{'), source.rfind('}')) else {
        return source;
    };
    if start >= end {
        return source;
    }

    let body = source[start + 1..end].trim();
    let body = body.strip_prefix("return").unwrap_or(body);
    body.trim().trim_end_matches(';').trim_end()
}

const OPERATORS: [&str; 17] = [
    "<=", ">=", "==", "!=", "&&", "||", "+", "-", "*", "/", "<", ">", "!", "?", ":", "(", ")",
];

fn tokenize(source: &str) -> Result<Vec<Token>, MarkerError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    end = i + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let number = source[start..end]
                .parse()
                .map_err(|_| script_error(format!("invalid number '{}'", &source[start..end])))?;
            tokens.push(Token::Number(number));
        } else if c == '\'' || c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            for (_, ch) in chars.by_ref() {
                if ch == c {
                    closed = true;
                    break;
                }
                value.push(ch);
            }
            if !closed {
                return Err(script_error("unterminated string literal"));
            }
            tokens.push(Token::Str(value));
        } else if c == '$' || c.is_alphabetic() || c == '_' {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' || (ch == '$' && i == start) {
                    end = i + ch.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let ident = &source[start..end];
            tokens.push(match ident {
                "$zoom" => Token::Keyword(Keyword::Zoom),
                "$geometry" => Token::Keyword(Keyword::Geometry),
                _ => Token::Ident(ident.to_string()),
            });
        } else {
            let rest = &source[start..];
            let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
                return Err(script_error(format!("unexpected character '{c}'")));
            };
            for _ in 0..op.len() {
                chars.next();
            }
            tokens.push(Token::Op(*op));
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek_op(&self) -> Option<&'static str> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn eat_op(&mut self, expected: &str) -> bool {
        if self.peek_op() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, expected: &str) -> Result<(), MarkerError> {
        if self.eat_op(expected) {
            Ok(())
        } else {
            Err(script_error(format!("expected '{expected}'")))
        }
    }

    fn conditional(&mut self) -> Result<Expr, MarkerError> {
        let condition = self.binary(0)?;
        if !self.eat_op("?") {
            return Ok(condition);
        }

        let then = self.conditional()?;
        self.expect_op(":")?;
        let otherwise = self.conditional()?;
        Ok(Expr::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    // Precedence climbing over the table of binary operators, lowest level first.
    fn binary(&mut self, level: usize) -> Result<Expr, MarkerError> {
        const LEVELS: [&[(&str, BinaryOp)]; 5] = [
            &[("||", BinaryOp::Or)],
            &[("&&", BinaryOp::And)],
            &[
                ("==", BinaryOp::Eq),
                ("!=", BinaryOp::Ne),
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            &[("*", BinaryOp::Mul), ("/", BinaryOp::Div)],
        ];

        if level == LEVELS.len() {
            return self.unary();
        }

        let mut left = self.binary(level + 1)?;
        'outer: loop {
            for (symbol, op) in LEVELS[level] {
                if self.eat_op(symbol) {
                    let right = self.binary(level + 1)?;
                    left = Expr::Binary(*op, Box::new(left), Box::new(right));
                    continue 'outer;
                }
            }

            return Ok(left);
        }
    }

    fn unary(&mut self) -> Result<Expr, MarkerError> {
        if self.eat_op("-") {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        if self.eat_op("!") {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, MarkerError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| script_error("unexpected end of expression"))?;
        self.pos += 1;

        match token {
            Token::Number(v) => Ok(Expr::Literal(StyleValue::Number(v))),
            Token::Str(s) => Ok(Expr::Literal(StyleValue::String(s))),
            Token::Keyword(k) => Ok(Expr::Keyword(k)),
            Token::Ident(ident) => match ident.as_str() {
                "true" => Ok(Expr::Literal(StyleValue::Bool(true))),
                "false" => Ok(Expr::Literal(StyleValue::Bool(false))),
                _ => Err(script_error(format!("unknown identifier '{ident}'"))),
            },
            Token::Op("(") => {
                let inner = self.conditional()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            Token::Op(op) => Err(script_error(format!("unexpected operator '{op}'"))),
        }
    }
}

impl Expr {
    fn eval(&self, globals: &Globals) -> Result<StyleValue, MarkerError> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Keyword(Keyword::Zoom) => Ok(StyleValue::Number(globals.zoom)),
            Expr::Keyword(Keyword::Geometry) => globals
                .geometry
                .map(|kind| StyleValue::String(kind.name().to_string()))
                .ok_or_else(|| script_error("$geometry is not set")),
            Expr::Unary(UnaryOp::Neg, inner) => Ok(StyleValue::Number(-number(inner, globals)?)),
            Expr::Unary(UnaryOp::Not, inner) => Ok(StyleValue::Bool(!truthy(inner, globals)?)),
            Expr::Conditional(condition, then, otherwise) => {
                if truthy(condition, globals)? {
                    then.eval(globals)
                } else {
                    otherwise.eval(globals)
                }
            }
            Expr::Binary(BinaryOp::And, left, right) => Ok(StyleValue::Bool(
                truthy(left, globals)? && truthy(right, globals)?,
            )),
            Expr::Binary(BinaryOp::Or, left, right) => Ok(StyleValue::Bool(
                truthy(left, globals)? || truthy(right, globals)?,
            )),
            Expr::Binary(BinaryOp::Eq, left, right) => {
                Ok(StyleValue::Bool(left.eval(globals)? == right.eval(globals)?))
            }
            Expr::Binary(BinaryOp::Ne, left, right) => {
                Ok(StyleValue::Bool(left.eval(globals)? != right.eval(globals)?))
            }
            Expr::Binary(op, left, right) => {
                numeric(*op, number(left, globals)?, number(right, globals)?)
            }
        }
    }
}

fn numeric(op: BinaryOp, a: f64, b: f64) -> Result<StyleValue, MarkerError> {
    Ok(match op {
        BinaryOp::Add => StyleValue::Number(a + b),
        BinaryOp::Sub => StyleValue::Number(a - b),
        BinaryOp::Mul => StyleValue::Number(a * b),
        BinaryOp::Div if b == 0.0 => return Err(script_error("division by zero")),
        BinaryOp::Div => StyleValue::Number(a / b),
        BinaryOp::Lt => StyleValue::Bool(a < b),
        BinaryOp::Le => StyleValue::Bool(a <= b),
        BinaryOp::Gt => StyleValue::Bool(a > b),
        BinaryOp::Ge => StyleValue::Bool(a >= b),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Eq | BinaryOp::Ne => {
            return Err(script_error(format!("{op:?} is not a numeric operator")))
        }
    })
}

fn number(expr: &Expr, globals: &Globals) -> Result<f64, MarkerError> {
    match expr.eval(globals)? {
        StyleValue::Number(v) => Ok(v),
        other => Err(script_error(format!("expected a number, got {other:?}"))),
    }
}

fn truthy(expr: &Expr, globals: &Globals) -> Result<bool, MarkerError> {
    match expr.eval(globals)? {
        StyleValue::Bool(v) => Ok(v),
        StyleValue::Number(v) => Ok(v != 0.0),
        other => Err(script_error(format!("expected a boolean, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::GeometryKind;
    use assert_matches::assert_matches;

    fn eval(source: &str, zoom: f64) -> Result<StyleValue, MarkerError> {
        let mut engine = ExpressionEngine::default();
        let id = engine.register(&SceneFunction::anonymous(source))?;
        engine.evaluate(
            id,
            &Globals {
                zoom,
                geometry: Some(GeometryKind::Line),
            },
        )
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0).unwrap(), StyleValue::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3", 0.0).unwrap(), StyleValue::Number(9.0));
        assert_eq!(eval("10 - 4 - 3", 0.0).unwrap(), StyleValue::Number(3.0));
        assert_eq!(eval("-$zoom / 2", 8.0).unwrap(), StyleValue::Number(-4.0));
    }

    #[test]
    fn conditionals_and_keywords() {
        let source = "$zoom >= 14 ? 4 : 2";
        assert_eq!(eval(source, 15.0).unwrap(), StyleValue::Number(4.0));
        assert_eq!(eval(source, 10.0).unwrap(), StyleValue::Number(2.0));

        assert_eq!(
            eval("$geometry == 'line' && !($zoom < 3)", 5.0).unwrap(),
            StyleValue::Bool(true)
        );
        assert_eq!(
            eval("$geometry != \"line\" || false", 5.0).unwrap(),
            StyleValue::Bool(false)
        );
    }

    #[test]
    fn function_wrapper_is_accepted() {
        assert_eq!(
            eval("function() { return $zoom * 2; }", 3.0).unwrap(),
            StyleValue::Number(6.0)
        );
    }

    #[test]
    fn invalid_sources_fail_to_compile() {
        let mut engine = ExpressionEngine::default();
        for source in ["1 +", "(1", "foo", "1 # 2", "'open", "1 2"] {
            assert_matches!(
                engine.register(&SceneFunction::anonymous(source)),
                Err(MarkerError::Script(_)),
                "{source}"
            );
        }
    }

    #[test]
    fn evaluation_errors() {
        assert_matches!(eval("1 / 0", 0.0), Err(MarkerError::Script(_)));
        assert_matches!(eval("'a' + 1", 0.0), Err(MarkerError::Script(_)));
    }
}
