//! Reader for task documents: a sequence of sections, each one a title followed
//! by `key: value1, value2` pairs.
//!
//! ```text
//! pde
//! equation: heat
//! boundary: 0.0, 0.0
//! // comment lines start with //, #, % or ;
//! solver
//! scheme: btcs
//! ```
//! Values are typed on the fly: integer, then float, then boolean, anything
//! else stays a string.
use crate::errors::TaskError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, multispace0, space0},
    combinator::{map, recognize},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;

pub type SectionMap = HashMap<String, Vec<Value>>;
pub type DocumentMap = HashMap<String, SectionMap>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }
    /// floats and integers alike, so that `dx: 1` is a valid step
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Value::Integer(i) => usize::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

/// letters, digits and underscores, not starting with a digit
fn parse_identifier(input: &str) -> IResult<&str, String> {
    let mut parser = map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        String::from,
    );
    parser.parse(input)
}

fn parse_title(input: &str) -> IResult<&str, String> {
    let (input, title) = parse_identifier(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, title))
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    let mut parser = map(
        take_while1(|c: char| !matches!(c, ',' | ' ' | '\t' | '\n' | '\r' | ';')),
        |s: &str| {
            if let Ok(val) = s.parse::<i64>() {
                Value::Integer(val)
            } else if let Ok(val) = s.parse::<f64>() {
                Value::Float(val)
            } else if let Ok(val) = s.parse::<bool>() {
                Value::Boolean(val)
            } else {
                Value::String(s.to_string())
            }
        },
    );
    parser.parse(input)
}

fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    let separator = delimited(space0, tag(","), space0);
    separated_list0(separator, parse_value).parse(input)
}

fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon = delimited(space0, tag(":"), space0);
    let (input, result) = separated_pair(parse_identifier, colon, parse_value_list).parse(input)?;
    Ok((input.trim_start(), result))
}

fn parse_section(input: &str) -> IResult<&str, (String, SectionMap)> {
    let (input, title) = parse_title(input)?;
    let (input, pairs) = many1(terminated(parse_key_value_pair, space0)).parse(input)?;
    Ok((input, (title, pairs.into_iter().collect())))
}

/// drops empty lines and lines starting with //, #, % or ;
pub fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !(trimmed.is_empty()
                || trimmed.starts_with("//")
                || trimmed.starts_with('#')
                || trimmed.starts_with('%')
                || trimmed.starts_with(';'))
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Parses a whole document. A repeated title replaces the earlier section;
/// text left over after the last section is an error.
pub fn parse_document(input: &str) -> Result<DocumentMap, TaskError> {
    let filtered = filter_comments(input);
    let mut parser = many1(delimited(multispace0, parse_section, multispace0));
    let (remaining, sections) = parser
        .parse(filtered.as_str())
        .map_err(|e| TaskError::Parse(format!("{:?}", e)))?;
    if !remaining.trim().is_empty() {
        return Err(TaskError::Parse(format!(
            "failed to parse entire document, remaining: '{}'",
            remaining
        )));
    }
    Ok(sections.into_iter().collect())
}

pub fn parse_document_file(path: &Path) -> Result<DocumentMap, TaskError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TaskError::Parse(format!("cannot read {}: {}", path.display(), e)))?;
    parse_document(&content)
}

/// Typed, error-reporting view of one section.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    title: &'a str,
    entries: &'a SectionMap,
}

impl<'a> Section<'a> {
    pub fn of(document: &'a DocumentMap, title: &'a str) -> Result<Section<'a>, TaskError> {
        document
            .get(title)
            .map(|entries| Section { title, entries })
            .ok_or_else(|| TaskError::MissingSection(title.to_string()))
    }
    /// a section that may be left out of the document entirely
    pub fn optional(document: &'a DocumentMap, title: &'a str) -> Option<Section<'a>> {
        document.get(title).map(|entries| Section { title, entries })
    }
    pub fn title(&self) -> &str {
        self.title
    }
    pub fn contains(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|v| !v.is_empty())
    }
    pub fn values(&self, key: &str) -> Result<&'a [Value], TaskError> {
        match self.entries.get(key) {
            Some(values) if !values.is_empty() => Ok(values.as_slice()),
            _ => Err(TaskError::MissingKey {
                section: self.title.to_string(),
                key: key.to_string(),
            }),
        }
    }
    fn invalid(key: &str, values: &[Value]) -> TaskError {
        TaskError::InvalidValue {
            key: key.to_string(),
            value: values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<String>>()
                .join(", "),
        }
    }
    pub fn f64(&self, key: &str) -> Result<f64, TaskError> {
        let values = self.values(key)?;
        match values {
            [single] => single.as_f64().ok_or_else(|| Self::invalid(key, values)),
            _ => Err(Self::invalid(key, values)),
        }
    }
    pub fn f64_pair(&self, key: &str) -> Result<(f64, f64), TaskError> {
        let values = self.values(key)?;
        match values {
            [a, b] => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => Ok((a, b)),
                _ => Err(Self::invalid(key, values)),
            },
            _ => Err(Self::invalid(key, values)),
        }
    }
    pub fn usize(&self, key: &str) -> Result<usize, TaskError> {
        let values = self.values(key)?;
        match values {
            [single] => single.as_usize().ok_or_else(|| Self::invalid(key, values)),
            _ => Err(Self::invalid(key, values)),
        }
    }
    pub fn str(&self, key: &str) -> Result<&'a str, TaskError> {
        let values = self.values(key)?;
        match values {
            [single] => single.as_str().ok_or_else(|| Self::invalid(key, values)),
            _ => Err(Self::invalid(key, values)),
        }
    }
    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, TaskError> {
        if self.contains(key) { self.f64(key).map(Some) } else { Ok(None) }
    }
    pub fn optional_usize(&self, key: &str) -> Result<Option<usize>, TaskError> {
        if self.contains(key) { self.usize(key).map(Some) } else { Ok(None) }
    }
    pub fn optional_str(&self, key: &str) -> Result<Option<&'a str>, TaskError> {
        if self.contains(key) { self.str(key).map(Some) } else { Ok(None) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title() {
        let (remaining, title) = parse_title("solver\n scheme: btcs").unwrap();
        assert_eq!(title, "solver");
        assert_eq!(remaining, "scheme: btcs");
        assert!(parse_title("1pde").is_err());
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!(parse_value("123, next").unwrap(), (", next", Value::Integer(123)));
        assert_eq!(parse_value("1e-6\n").unwrap(), ("\n", Value::Float(1e-6)));
        assert_eq!(parse_value("-0.5").unwrap(), ("", Value::Float(-0.5)));
        assert_eq!(parse_value("true").unwrap(), ("", Value::Boolean(true)));
        assert_eq!(
            parse_value("sin_pi x").unwrap(),
            (" x", Value::String("sin_pi".to_string()))
        );
    }

    #[test]
    fn test_parse_key_value_pair() {
        let (remaining, (key, values)) =
            parse_key_value_pair("boundary : 0.0 ,10\ninitial: call_payoff").unwrap();
        assert_eq!(key, "boundary");
        assert_eq!(values, vec![Value::Float(0.0), Value::Integer(10)]);
        assert_eq!(remaining, "initial: call_payoff");
    }

    #[test]
    fn test_parse_section_stops_at_next_title() {
        let (remaining, (title, section)) =
            parse_section("pde\nequation: heat\ndx: 0.1\nsolver\nscheme: ftcs").unwrap();
        assert_eq!(title, "pde");
        assert_eq!(section.len(), 2);
        assert_eq!(section["dx"], vec![Value::Float(0.1)]);
        assert_eq!(remaining, "solver\nscheme: ftcs");
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
        assert_eq!(Value::Float(2.5).as_usize(), None);
        assert_eq!(Value::Integer(-1).as_usize(), None);
        assert_eq!(Value::Integer(7).as_usize(), Some(7));
        assert_eq!(Value::String("x".to_string()).as_f64(), None);
        assert_eq!(Value::Boolean(false).to_string(), "false");
    }
}
