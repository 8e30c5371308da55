use nom::{IResult, Parser};
use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while1};
use nom::character::complete::{char, multispace0};
use nom::combinator::{all_consuming, map, opt, value};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::SortKey;
use crate::schema::schema::{CollectionSchema, SortKeyType};

/// A sort key bound to its table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedKey {
    pub column: usize,   // 1-based
    pub sort_type: SortKeyType,
    pub ascending: bool,
}

impl ResolvedKey {
    /// `<column><a|d>`
    pub fn code(&self) -> String {
        format!("{}{}", self.column, if self.ascending { 'a' } else { 'd' })
    }

    /// `sort` key option restricted to this one field
    pub fn sort_arg(&self) -> String {
        let mut arg = format!("-k{},{}", self.column, self.column);
        arg.push(match self.sort_type {
            SortKeyType::Text => 'f',
            SortKeyType::Numeric => 'n',
        });
        if !self.ascending {
            arg.push('r');
        }
        arg
    }
}

/// Requested ordering of one table, resolved against its schema
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortPlan {
    pub keys: Vec<ResolvedKey>,
}

impl SortPlan {
    pub fn resolve(schema: &CollectionSchema, sort_by: &[SortKey]) -> Result<Self> {
        let keys = sort_by
            .iter()
            .map(|key| {
                let (column, sort_type) = schema.column(&key.column)?;
                Ok(ResolvedKey { column, sort_type, ascending: key.ascending })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SortPlan { keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Cache key of the sorted table: key codes in request order
    pub fn code(&self) -> String {
        self.keys.iter().map(ResolvedKey::code).collect()
    }
}

/// Parse `id:desc, type` style sort lists. Direction defaults to ascending
/// and may be written `asc`/`a` or `desc`/`d`.
pub fn parse_sort_list(input: &str) -> Result<Vec<SortKey>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    all_consuming(separated_list1(char(','), sort_key))
        .parse(input)
        .map(|(_, keys)| keys)
        .map_err(|e| Error::new(
            ErrorKind::InvalidArgument,
            format!("Invalid sort list '{}': {}", input, e),
        ))
}

fn sort_key(input: &str) -> IResult<&str, SortKey> {
    map(
        pair(
            delimited(multispace0, column_name, multispace0),
            opt(preceded(char(':'), delimited(multispace0, direction, multispace0))),
        ),
        |(column, ascending)| SortKey::new(column, ascending.unwrap_or(true)),
    ).parse(input)
}

fn column_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

fn direction(input: &str) -> IResult<&str, bool> {
    alt((
        value(true, alt((tag_no_case("asc"), tag_no_case("a")))),
        value(false, alt((tag_no_case("desc"), tag_no_case("d")))),
    )).parse(input)
}
