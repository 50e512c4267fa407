//! Year-scoped sequential protocol numbers (`YYYY_NNNN`).

use crate::error::{ProtokolError, Result};
use crate::store::CounterStore;
use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

lazy_static! {
    static ref PROTOCOL_RE: Regex = Regex::new(r"^(\d{4})_(\d{4})$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolNumber {
    pub year: i32,
    pub sequence: u32,
}

impl fmt::Display for ProtocolNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:04}", self.year, self.sequence)
    }
}

impl FromStr for ProtocolNumber {
    type Err = ProtokolError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = PROTOCOL_RE
            .captures(s)
            .ok_or_else(|| ProtokolError::InvalidProtocolNumber(s.to_string()))?;

        let year = caps[1]
            .parse()
            .map_err(|_| ProtokolError::InvalidProtocolNumber(s.to_string()))?;
        let sequence = caps[2]
            .parse()
            .map_err(|_| ProtokolError::InvalidProtocolNumber(s.to_string()))?;

        Ok(ProtocolNumber { year, sequence })
    }
}

/// Issue the next protocol number for `today` and persist it immediately.
///
/// The number is reserved even when the report is later abandoned, so the
/// sequence may have gaps. A stored value from a previous year (or one that
/// does not parse) restarts the sequence at 0001.
pub fn allocate(store: &mut CounterStore, dir: &Path, today: NaiveDate) -> Result<ProtocolNumber> {
    let year = today.year();

    let next = match store
        .last_protocol_number
        .as_deref()
        .and_then(|s| s.parse::<ProtocolNumber>().ok())
    {
        Some(last) if last.year == year => ProtocolNumber {
            year,
            sequence: last.sequence + 1,
        },
        _ => ProtocolNumber { year, sequence: 1 },
    };

    store.last_protocol_number = Some(next.to_string());
    store.save(dir)?;

    Ok(next)
}
