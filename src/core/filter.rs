//! Results-page filter criteria and their `sp` token encoding.
//!
//! The token is a base64 protobuf message: field 1 holds the sort order, field 2
//! a nested message with upload date (1), result kind (2) and duration (3).
//! Zero-valued fields are left out.

use base64::Engine;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    Relevance,
    Rating,
    UploadDate,
    #[default]
    ViewCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadDate {
    Any,
    LastHour,
    #[default]
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultKind {
    Any,
    #[default]
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationBound {
    Any,
    /// Under 4 minutes.
    Short,
    /// Between 4 and 20 minutes.
    #[default]
    Medium,
    /// Over 20 minutes.
    Long,
}

impl SortOrder {
    fn wire(self) -> u8 {
        match self {
            Self::Relevance => 0,
            Self::Rating => 1,
            Self::UploadDate => 2,
            Self::ViewCount => 3,
        }
    }
}

impl UploadDate {
    fn wire(self) -> u8 {
        match self {
            Self::Any => 0,
            Self::LastHour => 1,
            Self::Today => 2,
            Self::ThisWeek => 3,
            Self::ThisMonth => 4,
            Self::ThisYear => 5,
        }
    }

    /// Wording used when telling the model how fresh the videos are.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Any => "recently",
            Self::LastHour => "in the last hour",
            Self::Today => "in the last 24 hours",
            Self::ThisWeek => "in the last week",
            Self::ThisMonth => "in the last month",
            Self::ThisYear => "in the last year",
        }
    }
}

impl ResultKind {
    fn wire(self) -> u8 {
        match self {
            Self::Any => 0,
            Self::Video => 1,
        }
    }
}

impl DurationBound {
    fn wire(self) -> u8 {
        match self {
            Self::Any => 0,
            Self::Short => 1,
            Self::Long => 2,
            Self::Medium => 3,
        }
    }
}

/// Typed search criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub sort: SortOrder,
    pub upload_date: UploadDate,
    pub kind: ResultKind,
    pub duration: DurationBound,
}

impl SearchCriteria {
    pub fn encode(&self) -> String {
        let mut nested = Vec::new();
        push_varint_field(&mut nested, 1, self.upload_date.wire());
        push_varint_field(&mut nested, 2, self.kind.wire());
        push_varint_field(&mut nested, 3, self.duration.wire());

        let mut message = Vec::new();
        push_varint_field(&mut message, 1, self.sort.wire());
        if !nested.is_empty() {
            // field 2, wire type 2 (length-delimited)
            message.push(2 << 3 | 2);
            message.push(nested.len() as u8);
            message.extend_from_slice(&nested);
        }

        base64::engine::general_purpose::STANDARD.encode(message)
    }
}

fn push_varint_field(buf: &mut Vec<u8>, field: u8, value: u8) {
    if value == 0 {
        return;
    }
    buf.push(field << 3);
    buf.push(value);
}

/// The filter sent with a search: either typed criteria or a token supplied
/// verbatim by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchFilter {
    Criteria(SearchCriteria),
    Encoded(String),
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::Criteria(SearchCriteria::default())
    }
}

impl SearchFilter {
    /// The `sp` query value, or `None` when nothing narrows the search.
    pub fn token(&self) -> Option<String> {
        match self {
            Self::Criteria(criteria) => {
                let token = criteria.encode();
                (!token.is_empty()).then_some(token)
            }
            Self::Encoded(token) => {
                let token = token.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
        }
    }

    pub fn recency(&self) -> &'static str {
        match self {
            Self::Criteria(criteria) => criteria.upload_date.describe(),
            Self::Encoded(_) => UploadDate::Any.describe(),
        }
    }
}
