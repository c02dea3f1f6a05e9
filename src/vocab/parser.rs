//! Semantic pointer expression parser
//!
//! Parses expressions over vocabulary keys into an [`Expr`] tree and evaluates
//! them against a [`Vocabulary`].
//!
//! ## Supported Syntax
//!
//! ```text
//! A + B - C              superposition
//! A * B                  binding
//! 0.5 * A                scaling
//! -A   ~A                negation, inverse
//! A ** 2   A ** -0.5     binding power (numeric exponent)
//! (A + B).normalized()   projections: normalized(), unitary(), nondegenerate()
//! Identity  Zero  AbsorbingElement
//! ```
//!
//! Precedence, loosest first: `+ -`, `*`, unary `- ~`, `**`, method calls.
//!
//! `populate` declarations:
//!
//! ```text
//! A; B.unitary(); C = A * B
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, not, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::Vocabulary;
use crate::pointer::SemanticPointer;
use crate::{Result, SpaError};

// =============================================================================
// AST
// =============================================================================

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Symbol(String),
    Neg(Box<Expr>),
    Invert(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, f64),
    Method(Box<Expr>, Method),
}

/// Projection invoked with method-call syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Normalized,
    Unitary,
    Nondegenerate,
}

/// One `populate` item
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `NAME` or `NAME.unitary()`: a fresh random pointer
    Fresh { name: String, methods: Vec<Method> },
    /// `NAME = expr`
    Assign { name: String, expr: Expr },
}

/// Value produced while evaluating an expression
#[derive(Debug, Clone)]
pub enum Operand {
    Scalar(f64),
    Pointer(SemanticPointer),
}

// =============================================================================
// TOKEN PARSERS
// =============================================================================

fn ws0(input: &str) -> IResult<&str, ()> {
    value((), multispace0)(input)
}

/// Parse an identifier (letter, then letters, digits or underscores)
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// Parse an unsigned number: `2`, `0.5`, `.5`, `1e-3`
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        str::parse::<f64>,
    )(input)
}

fn signed_number(input: &str) -> IResult<&str, f64> {
    let (input, sign) = opt(terminated(char('-'), ws0))(input)?;
    let (input, x) = number(input)?;
    Ok((input, if sign.is_some() { -x } else { x }))
}

/// Parse a possibly negative, possibly parenthesized exponent
fn exponent(input: &str) -> IResult<&str, f64> {
    alt((
        delimited(pair(char('('), ws0), signed_number, pair(ws0, char(')'))),
        signed_number,
    ))(input)
}

/// Parse `.name()` after an operand
fn method_call(input: &str) -> IResult<&str, Method> {
    delimited(
        tuple((ws0, char('.'), ws0)),
        alt((
            value(Method::Normalized, tag("normalized")),
            value(Method::Unitary, tag("unitary")),
            value(Method::Nondegenerate, tag("nondegenerate")),
        )),
        tuple((ws0, char('('), ws0, char(')'))),
    )(input)
}

// =============================================================================
// EXPRESSION PARSERS
// =============================================================================

fn primary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(number, Expr::Number),
        map(identifier, |s: &str| Expr::Symbol(s.to_string())),
        delimited(pair(char('('), ws0), expression, pair(ws0, char(')'))),
    ))(input)
}

fn postfix(input: &str) -> IResult<&str, Expr> {
    let (input, base) = primary(input)?;
    let (input, methods) = many0(method_call)(input)?;
    let expr = methods
        .into_iter()
        .fold(base, |acc, m| Expr::Method(Box::new(acc), m));
    Ok((input, expr))
}

fn power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = postfix(input)?;
    let (input, exp) = opt(preceded(tuple((ws0, tag("**"), ws0)), exponent))(input)?;
    Ok((
        input,
        match exp {
            Some(p) => Expr::Pow(Box::new(base), p),
            None => base,
        },
    ))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(pair(char('-'), ws0), unary), |e| Expr::Neg(Box::new(e))),
        map(preceded(pair(char('~'), ws0), unary), |e| {
            Expr::Invert(Box::new(e))
        }),
        power,
    ))(input)
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(preceded(
        delimited(ws0, terminated(char('*'), not(char('*'))), ws0),
        unary,
    ))(input)?;
    let expr = rest
        .into_iter()
        .fold(first, |acc, e| Expr::Mul(Box::new(acc), Box::new(e)));
    Ok((input, expr))
}

fn expression(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(delimited(ws0, one_of("+-"), ws0), term))(input)?;
    let expr = rest.into_iter().fold(first, |acc, (op, e)| match op {
        '+' => Expr::Add(Box::new(acc), Box::new(e)),
        _ => Expr::Sub(Box::new(acc), Box::new(e)),
    });
    Ok((input, expr))
}

fn declaration(input: &str) -> IResult<&str, Declaration> {
    let (input, name) = preceded(ws0, identifier)(input)?;
    let name = name.to_string();
    let (input, assigned) = opt(preceded(delimited(ws0, char('='), ws0), expression))(input)?;
    match assigned {
        Some(expr) => Ok((input, Declaration::Assign { name, expr })),
        None => {
            let (input, methods) = many0(method_call)(input)?;
            Ok((input, Declaration::Fresh { name, methods }))
        }
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

fn finish<T>(source: &str, parsed: IResult<&str, T>) -> Result<T> {
    match parsed {
        Ok((remaining, value)) => {
            let remaining = remaining.trim();
            if !remaining.is_empty() {
                return Err(SpaError::Parse(format!(
                    "Unexpected input in '{}': '{}'",
                    source,
                    remaining.chars().take(50).collect::<String>()
                )));
            }
            Ok(value)
        }
        Err(e) => Err(SpaError::Parse(format!("Invalid expression '{}': {:?}", source, e))),
    }
}

/// Parse a complete expression
pub fn parse_expression(source: &str) -> Result<Expr> {
    finish(source, preceded(ws0, expression)(source))
}

/// Parse a single `populate` item
pub fn parse_declaration(source: &str) -> Result<Declaration> {
    finish(source, declaration(source))
}

// =============================================================================
// EVALUATION
// =============================================================================

fn operand_kind(op: &Operand) -> &'static str {
    match op {
        Operand::Scalar(_) => "scalar",
        Operand::Pointer(_) => "semantic pointer",
    }
}

fn unsupported(op: &str, lhs: &Operand, rhs: &Operand) -> SpaError {
    SpaError::Type(format!(
        "Unsupported operand types for {}: {} and {}",
        op,
        operand_kind(lhs),
        operand_kind(rhs)
    ))
}

impl Method {
    pub fn apply(&self, pointer: &SemanticPointer) -> Result<SemanticPointer> {
        match self {
            Method::Normalized => Ok(pointer.normalized()),
            Method::Unitary => pointer.unitary(),
            Method::Nondegenerate => pointer.nondegenerate(),
        }
    }
}

impl Expr {
    /// Evaluate against `vocab`, resolving symbols through [`Vocabulary::get`]
    pub fn evaluate(&self, vocab: &Vocabulary) -> Result<Operand> {
        match self {
            Expr::Number(x) => Ok(Operand::Scalar(*x)),
            Expr::Symbol(name) => vocab.resolve_symbol(name).map(Operand::Pointer),
            Expr::Neg(e) => match e.evaluate(vocab)? {
                Operand::Scalar(x) => Ok(Operand::Scalar(-x)),
                Operand::Pointer(p) => Ok(Operand::Pointer(p.neg())),
            },
            Expr::Invert(e) => match e.evaluate(vocab)? {
                Operand::Pointer(p) => Ok(Operand::Pointer(p.invert()?)),
                Operand::Scalar(_) => Err(SpaError::Type(
                    "Unsupported operand type for ~: scalar".to_string(),
                )),
            },
            Expr::Add(l, r) => match (l.evaluate(vocab)?, r.evaluate(vocab)?) {
                (Operand::Scalar(a), Operand::Scalar(b)) => Ok(Operand::Scalar(a + b)),
                (Operand::Pointer(a), Operand::Pointer(b)) => Ok(Operand::Pointer(a.add(&b)?)),
                (a, b) => Err(unsupported("+", &a, &b)),
            },
            Expr::Sub(l, r) => match (l.evaluate(vocab)?, r.evaluate(vocab)?) {
                (Operand::Scalar(a), Operand::Scalar(b)) => Ok(Operand::Scalar(a - b)),
                (Operand::Pointer(a), Operand::Pointer(b)) => Ok(Operand::Pointer(a.sub(&b)?)),
                (a, b) => Err(unsupported("-", &a, &b)),
            },
            Expr::Mul(l, r) => match (l.evaluate(vocab)?, r.evaluate(vocab)?) {
                (Operand::Scalar(a), Operand::Scalar(b)) => Ok(Operand::Scalar(a * b)),
                (Operand::Scalar(s), Operand::Pointer(p))
                | (Operand::Pointer(p), Operand::Scalar(s)) => Ok(Operand::Pointer(p.scale(s))),
                (Operand::Pointer(a), Operand::Pointer(b)) => Ok(Operand::Pointer(a.bind(&b)?)),
            },
            Expr::Pow(e, p) => match e.evaluate(vocab)? {
                Operand::Scalar(x) => Ok(Operand::Scalar(x.powf(*p))),
                Operand::Pointer(sp) => Ok(Operand::Pointer(sp.pow(*p)?)),
            },
            Expr::Method(e, m) => match e.evaluate(vocab)? {
                Operand::Pointer(p) => Ok(Operand::Pointer(m.apply(&p)?)),
                Operand::Scalar(_) => Err(SpaError::Type(format!(
                    "Method {:?} is not defined for scalars",
                    m
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Box<Expr> {
        Box::new(Expr::Symbol(name.to_string()))
    }

    #[test]
    fn test_parse_symbol_and_number() {
        assert_eq!(parse_expression("A").unwrap(), *sym("A"));
        assert_eq!(parse_expression(" 2.5 ").unwrap(), Expr::Number(2.5));
        assert_eq!(parse_expression(".5").unwrap(), Expr::Number(0.5));
        assert_eq!(parse_expression("1e-3").unwrap(), Expr::Number(1e-3));
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expression("A + B * C").unwrap();
        assert_eq!(
            expr,
            Expr::Add(sym("A"), Box::new(Expr::Mul(sym("B"), sym("C"))))
        );

        let expr = parse_expression("A - B - C").unwrap();
        assert_eq!(
            expr,
            Expr::Sub(Box::new(Expr::Sub(sym("A"), sym("B"))), sym("C"))
        );

        let expr = parse_expression("-A ** 2").unwrap();
        assert_eq!(expr, Expr::Neg(Box::new(Expr::Pow(sym("A"), 2.0))));
    }

    #[test]
    fn test_unary_and_power() {
        assert_eq!(
            parse_expression("~A*B").unwrap(),
            Expr::Mul(Box::new(Expr::Invert(sym("A"))), sym("B"))
        );
        assert_eq!(
            parse_expression("A**-0.5").unwrap(),
            Expr::Pow(sym("A"), -0.5)
        );
        assert_eq!(
            parse_expression("A ** (0.25)").unwrap(),
            Expr::Pow(sym("A"), 0.25)
        );
    }

    #[test]
    fn test_methods_and_parentheses() {
        assert_eq!(
            parse_expression("(A + B).normalized()").unwrap(),
            Expr::Method(Box::new(Expr::Add(sym("A"), sym("B"))), Method::Normalized)
        );
        assert_eq!(
            parse_expression("A.unitary().nondegenerate()").unwrap(),
            Expr::Method(
                Box::new(Expr::Method(sym("A"), Method::Unitary)),
                Method::Nondegenerate
            )
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_expression("A +"), Err(SpaError::Parse(_))));
        assert!(matches!(parse_expression("(A"), Err(SpaError::Parse(_))));
        assert!(matches!(parse_expression("A ** B"), Err(SpaError::Parse(_))));
        assert!(matches!(parse_expression(""), Err(SpaError::Parse(_))));
        assert!(matches!(parse_expression("A $ B"), Err(SpaError::Parse(_))));
    }

    #[test]
    fn test_unexpected_input_truncates_by_chars() {
        let source = format!("A {}é", "#".repeat(49));
        let err = parse_expression(&source).unwrap_err();
        assert!(matches!(err, SpaError::Parse(_)));
        assert!(err.to_string().ends_with(&format!(": '{}é'", "#".repeat(49))));

        let source = format!("A {}", "é".repeat(80));
        let err = parse_expression(&source).unwrap_err();
        assert!(err.to_string().ends_with(&format!(": '{}'", "é".repeat(50))));
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            parse_declaration(" A ").unwrap(),
            Declaration::Fresh {
                name: "A".to_string(),
                methods: vec![]
            }
        );
        assert_eq!(
            parse_declaration("B.unitary()").unwrap(),
            Declaration::Fresh {
                name: "B".to_string(),
                methods: vec![Method::Unitary]
            }
        );
        assert_eq!(
            parse_declaration("C = A * B").unwrap(),
            Declaration::Assign {
                name: "C".to_string(),
                expr: Expr::Mul(sym("A"), sym("B"))
            }
        );
        assert!(parse_declaration("= A").is_err());
    }
}
