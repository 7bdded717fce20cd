use crate::{Error, Result};
use serde::Serialize;

/// Entry of the `/contigs` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContigEntry {
    pub name: String,
    pub length: u64,
}

/// Body of a successful `/subsequence` response.
#[derive(Debug, Serialize)]
pub struct SubsequenceResponse {
    pub contig: String,
    pub sequence: String,
    pub start_index: i64,
}

/// A validated `/subsequence` request over the half-open range `[begin, end)`.
///
/// Only the shape of the query is checked here; whether the range fits the
/// contig is decided by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsequenceRequest {
    pub contig: String,
    pub begin: i64,
    pub end: i64,
}

impl SubsequenceRequest {
    /// Parse `contig`, `start_index` and `length` from a raw query string.
    ///
    /// When a key is repeated the first value wins.
    pub fn from_query(query: Option<&str>) -> Result<Self> {
        let mut contig = None;
        let mut start_index = None;
        let mut length = None;

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
            let slot = match key.as_ref() {
                "contig" => &mut contig,
                "start_index" => &mut start_index,
                "length" => &mut length,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let contig = contig
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Validation("missing contig".to_string()))?;
        let start_index = parse_integer("start_index", start_index)?;
        let length = parse_integer("length", length)?;

        let end = start_index.checked_add(length).ok_or_else(|| Error::OutOfRange {
            contig: contig.clone(),
            begin: start_index,
            end: if length < 0 { i64::MIN } else { i64::MAX },
            length: 0,
        })?;

        Ok(Self {
            contig,
            begin: start_index,
            end,
        })
    }

    pub fn length(&self) -> i64 {
        self.end - self.begin
    }
}

fn parse_integer(name: &str, value: Option<String>) -> Result<i64> {
    let value = value.ok_or_else(|| Error::Validation(format!("missing {}", name)))?;
    value
        .trim()
        .parse()
        .map_err(|e| Error::Validation(format!("invalid {} {:?}: {}", name, value, e)))
}
