//! Parser for the OpenVZ/Virtuozzo `/proc/user_beancounters` file.
//!
//! The kernel exposes one row per resource, each carrying five counters:
//!
//! ```text
//! Version: 2.5
//!        uid  resource                     held              maxheld              barrier                limit              failcnt
//!       101:  kmemsize                  2752512              2760704             14372700             14790164                    0
//!             lockedpages                     0                    0                  256                  256                    0
//! ```
//!
//! The first resource row is prefixed with the container identity (`101:`). Rows that
//! do not have this shape are rejected instead of skipped, since a truncated or
//! reshaped file means the counters can no longer be trusted.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::num::ParseIntError;

use crate::container::{self, ContainerID};

use super::{ResourceCounters, Snapshot};

/// First token of the column header line.
const HEADER_TOKEN: &str = "uid";

/// Prefix of the optional format version line.
const VERSION_PREFIX: &str = "Version:";

/// Number of tokens in a resource row: the resource name followed by five counters.
const ROW_TOKENS: usize = 6;

/// Named counter columns of a resource row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    Held,
    MaxHeld,
    Barrier,
    Limit,
    FailCnt,
}

impl std::fmt::Display for CounterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CounterField::Held => "held",
            CounterField::MaxHeld => "maxheld",
            CounterField::Barrier => "barrier",
            CounterField::Limit => "limit",
            CounterField::FailCnt => "failcnt",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur when parsing beancounters text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing `uid` header at line {line}")]
    MissingHeader { line: usize },

    #[error("expected {expected} fields at line {line}, found {found}")]
    InvalidFieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid value for `{field}` at line {line}: '{value}': {source}")]
    InvalidValue {
        field: CounterField,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("duplicate resource '{name}' at line {line}")]
    DuplicateResource { name: String, line: usize },

    #[error("invalid container id at line {line}: {source}")]
    InvalidContainerID {
        line: usize,
        #[source]
        source: container::Error,
    },

    #[error("resource row at line {line} precedes the container id")]
    MissingContainerID { line: usize },

    #[error("second container id '{id}' at line {line}, only one container is supported")]
    MultipleContainers { id: String, line: usize },

    #[error("no resource rows found")]
    NoResources,
}

/// Parses the full content of a beancounters file into a [`Snapshot`].
///
/// Blank lines are ignored. Line numbers in errors are 1-based and refer to the
/// original input.
///
/// # Errors
///
/// Returns a [`ParseError`] if the header is missing, a row has the wrong number of
/// fields or a non-integer counter, a resource name repeats, or the container id is
/// missing, malformed or appears more than once.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, ParseError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (mut lineno, mut line) = lines.next().ok_or(ParseError::MissingHeader { line: 1 })?;

    let mut version = None;
    if let Some(rest) = line.trim_start().strip_prefix(VERSION_PREFIX) {
        version = Some(rest.trim().to_owned());
        (lineno, line) = lines
            .next()
            .ok_or(ParseError::MissingHeader { line: lineno + 1 })?;
    }

    if line.split_whitespace().next() != Some(HEADER_TOKEN) {
        return Err(ParseError::MissingHeader { line: lineno });
    }

    let mut container_id: Option<ContainerID> = None;
    let mut resources = HashMap::new();
    let mut tokens = Vec::with_capacity(ROW_TOKENS + 1);

    for (lineno, line) in lines {
        tokens.clear();
        tokens.extend(line.split_whitespace());

        let mut row = &tokens[..];
        if let Some(id) = row.first().and_then(|first| first.strip_suffix(':')) {
            if container_id.is_some() {
                return Err(ParseError::MultipleContainers {
                    id: id.to_owned(),
                    line: lineno,
                });
            }
            let id = ContainerID::new(id).map_err(|source| ParseError::InvalidContainerID {
                line: lineno,
                source,
            })?;
            container_id = Some(id);
            row = &row[1..];
        } else if container_id.is_none() {
            return Err(ParseError::MissingContainerID { line: lineno });
        }

        let (name, counters) = parse_resource_row(row, lineno)?;
        match resources.entry(name.to_owned()) {
            Entry::Occupied(_) => {
                return Err(ParseError::DuplicateResource {
                    name: name.to_owned(),
                    line: lineno,
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(counters);
            }
        }
    }

    let container_id = container_id.ok_or(ParseError::NoResources)?;
    Ok(Snapshot::new(version, container_id, resources))
}

/// Parses the tokens of one resource row (without the container id prefix).
fn parse_resource_row<'a>(
    tokens: &[&'a str],
    lineno: usize,
) -> Result<(&'a str, ResourceCounters), ParseError> {
    let &[name, held, maxheld, barrier, limit, failcnt] = tokens else {
        return Err(ParseError::InvalidFieldCount {
            line: lineno,
            expected: ROW_TOKENS,
            found: tokens.len(),
        });
    };

    let counters = ResourceCounters {
        held: parse_counter(CounterField::Held, held, lineno)?,
        maxheld: parse_counter(CounterField::MaxHeld, maxheld, lineno)?,
        barrier: parse_counter(CounterField::Barrier, barrier, lineno)?,
        limit: parse_counter(CounterField::Limit, limit, lineno)?,
        failcnt: parse_counter(CounterField::FailCnt, failcnt, lineno)?,
    };
    Ok((name, counters))
}

fn parse_counter(field: CounterField, value: &str, lineno: usize) -> Result<u64, ParseError> {
    value
        .parse::<u64>()
        .map_err(|source| ParseError::InvalidValue {
            field,
            value: value.to_owned(),
            line: lineno,
            source,
        })
}
