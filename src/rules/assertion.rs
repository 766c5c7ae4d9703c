//! Value conditions checked on a rule's matched node

use crate::path::PathMatch;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// A condition the first match of a rule's context path must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Assertion {
    /// Value has at most `max` characters
    MaxLength { max: usize },
    /// Value length lies within `min..=max` characters
    LengthRange { min: usize, max: usize },
    /// `year`/`month`/`day` attributes (or an ISO date value) are not after today
    NotAfterToday,
    /// Value is one of `values`, compared case-insensitively
    OneOf { values: Vec<String> },
}

impl Assertion {
    /// Whether the matched node satisfies the condition
    ///
    /// A match whose attribute step found no attribute satisfies nothing.
    pub fn holds(&self, found: &PathMatch<'_>, today: NaiveDate) -> bool {
        if found.missing_attribute {
            return false;
        }
        match self {
            Assertion::MaxLength { max } => found.value().chars().count() <= *max,
            Assertion::LengthRange { min, max } => {
                let len = found.value().chars().count();
                (*min..=*max).contains(&len)
            }
            Assertion::NotAfterToday => match match_date(found) {
                Some(date) => date <= today,
                // An unreadable date never fires
                None => true,
            },
            Assertion::OneOf { values } => {
                let value = found.value();
                values.iter().any(|v| v.eq_ignore_ascii_case(&value))
            }
        }
    }
}

fn match_date(found: &PathMatch<'_>) -> Option<NaiveDate> {
    let element = found.element;
    if found.attribute_value.is_none() {
        if let (Some(y), Some(m), Some(d)) = (
            element.attr("year"),
            element.attr("month"),
            element.attr("day"),
        ) {
            return NaiveDate::from_ymd_opt(
                y.trim().parse().ok()?,
                m.trim().parse().ok()?,
                d.trim().parse().ok()?,
            );
        }
    }
    NaiveDate::parse_from_str(found.value().trim(), "%Y-%m-%d").ok()
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::MaxLength { max } => write!(f, "length <= {}", max),
            Assertion::LengthRange { min, max } => write!(f, "length in {}..={}", min, max),
            Assertion::NotAfterToday => write!(f, "date not in the future"),
            Assertion::OneOf { values } => write!(f, "one of [{}]", values.join(", ")),
        }
    }
}
