//! The ideal / basis text format.
//!
//! A ring descriptor line (characteristic, variable count, ordering tag,
//! optional component direction), a generator count, then one polynomial
//! per line as a `+`/`-` separated sum of `coefficient * monomial` terms.
//! Whitespace is insignificant within a line.

use std::sync::Arc;

use quartus_monoid::{Mono, MonoMonoid, MonoOrder};
use quartus_poly::Poly;
use quartus_rings::{PrimeField, Scalar};

use crate::error::Error;

/// A parsed ring plus its generators.
#[derive(Debug)]
pub struct ParsedIdeal {
    /// The coefficient field.
    pub field: PrimeField,
    /// The monomial monoid.
    pub monoid: Arc<MonoMonoid>,
    /// The generators, in file order.
    pub generators: Vec<Poly>,
}

fn input_err(line: usize, msg: impl Into<String>) -> Error {
    Error::Input {
        line,
        msg: msg.into(),
    }
}

fn tag_to_order(tag: u32, component: Option<&str>, line: usize) -> Result<MonoOrder, Error> {
    let base = match tag {
        1 => MonoOrder::Lex,
        2 => MonoOrder::Grevlex,
        4 => MonoOrder::GrevlexDescComponent,
        other => {
            return Err(input_err(line, format!("unknown ordering tag {other}")));
        }
    };
    match (base, component) {
        (order, None) => Ok(order),
        (MonoOrder::Lex, Some("asc")) => Ok(MonoOrder::LexAscComponent),
        (MonoOrder::Lex, Some("desc")) => Ok(MonoOrder::LexDescComponent),
        (MonoOrder::Grevlex, Some("asc")) => Ok(MonoOrder::GrevlexAscComponent),
        (MonoOrder::Grevlex, Some("desc")) => Ok(MonoOrder::GrevlexDescComponent),
        (MonoOrder::GrevlexDescComponent, Some("desc")) => Ok(MonoOrder::GrevlexDescComponent),
        (_, Some(other)) => Err(input_err(
            line,
            format!("bad component direction '{other}'"),
        )),
    }
}

fn order_to_descriptor(order: MonoOrder) -> &'static str {
    match order {
        MonoOrder::Lex => "1",
        MonoOrder::Grevlex => "2",
        MonoOrder::LexAscComponent => "1 asc",
        MonoOrder::LexDescComponent => "1 desc",
        MonoOrder::GrevlexAscComponent => "2 asc",
        MonoOrder::GrevlexDescComponent => "4",
    }
}

/// Parses an ideal file.
pub fn parse_ideal(text: &str) -> Result<ParsedIdeal, Error> {
    let mut lines = text.lines().enumerate();

    let (ring_no, ring_line) = lines
        .next()
        .ok_or_else(|| input_err(1, "missing ring descriptor"))?;
    let tokens: Vec<&str> = ring_line.split_whitespace().collect();
    if tokens.len() < 3 || tokens.len() > 4 {
        return Err(input_err(ring_no + 1, "ring descriptor needs 3 or 4 fields"));
    }
    let characteristic: u32 = tokens[0]
        .parse()
        .map_err(|_| input_err(ring_no + 1, "bad characteristic"))?;
    let var_count: usize = tokens[1]
        .parse()
        .map_err(|_| input_err(ring_no + 1, "bad variable count"))?;
    let tag: u32 = tokens[2]
        .parse()
        .map_err(|_| input_err(ring_no + 1, "bad ordering tag"))?;
    let order = tag_to_order(tag, tokens.get(3).copied(), ring_no + 1)?;

    let field = PrimeField::new(characteristic)?;
    let monoid = Arc::new(MonoMonoid::new(var_count, order));

    let (count_no, count_line) = lines
        .next()
        .ok_or_else(|| input_err(ring_no + 2, "missing generator count"))?;
    let count: usize = count_line
        .trim()
        .parse()
        .map_err(|_| input_err(count_no + 1, "bad generator count"))?;

    let mut generators = Vec::with_capacity(count);
    for _ in 0..count {
        let (no, line) = lines
            .next()
            .ok_or_else(|| input_err(count_no + 2 + generators.len(), "missing polynomial"))?;
        generators.push(parse_polynomial(line, &monoid, &field, no + 1)?);
    }

    Ok(ParsedIdeal {
        field,
        monoid,
        generators,
    })
}

/// Parses one polynomial line.
pub fn parse_polynomial(
    line: &str,
    monoid: &MonoMonoid,
    field: &PrimeField,
    line_no: usize,
) -> Result<Poly, Error> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(input_err(line_no, "empty polynomial"));
    }
    if compact == "0" {
        return Ok(Poly::zero());
    }

    let mut terms: Vec<(Scalar, Mono)> = Vec::new();
    let mut rest = compact.as_str();
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }
    while !rest.is_empty() {
        let end = rest
            .find(['+', '-'])
            .unwrap_or(rest.len());
        let (term, tail) = rest.split_at(end);
        let (coef, mono) = parse_term(term, monoid, field, line_no)?;
        let coef = if negative { field.negate(coef) } else { coef };
        if coef != 0 {
            terms.push((coef, mono));
        }
        match tail.chars().next() {
            Some('-') => {
                negative = true;
                rest = &tail[1..];
            }
            Some('+') => {
                negative = false;
                rest = &tail[1..];
            }
            _ => rest = tail,
        }
    }
    Ok(Poly::from_terms(monoid, field, terms))
}

fn parse_term(
    term: &str,
    monoid: &MonoMonoid,
    field: &PrimeField,
    line_no: usize,
) -> Result<(Scalar, Mono), Error> {
    if term.is_empty() {
        return Err(input_err(line_no, "empty term"));
    }
    let digits = term.chars().take_while(char::is_ascii_digit).count();
    let (coef, mono_text) = if digits == 0 {
        (1, term)
    } else {
        let value: u64 = term[..digits]
            .parse()
            .map_err(|_| input_err(line_no, format!("bad coefficient in '{term}'")))?;
        (field.from_u64(value), &term[digits..])
    };
    let mono_text = mono_text.strip_prefix('*').unwrap_or(mono_text);
    let mono = if mono_text.is_empty() {
        monoid.identity()
    } else {
        monoid
            .parse_mono(mono_text)
            .map_err(|e| input_err(line_no, e.to_string()))?
    };
    Ok((coef, mono))
}

/// Formats a basis in the same file format.
#[must_use]
pub fn format_basis(field: &PrimeField, monoid: &MonoMonoid, polys: &[Poly]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} {}\n",
        field.characteristic(),
        monoid.var_count(),
        order_to_descriptor(monoid.order()),
    ));
    out.push_str(&format!("{}\n", polys.len()));
    for poly in polys {
        out.push_str(&poly.to_string());
        out.push('\n');
    }
    out
}
