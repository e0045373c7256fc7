//! Parsing of dates sent by clients.

use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

/// A date sent by a client, either with or without a time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateInput {
    /// An RFC 3339 date-time, e.g. "2025-01-31T13:45:00+13:00".
    DateTime(OffsetDateTime),
    /// A calendar date, e.g. "2025-01-31", taken to be in UTC.
    Date(Date),
}

impl DateInput {
    /// Parse an RFC 3339 date-time or a `YYYY-MM-DD` date.
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
            return Some(Self::DateTime(date_time));
        }

        Date::parse(text, format_description!("[year]-[month]-[day]"))
            .ok()
            .map(Self::Date)
    }

    /// The first instant covered by the input.
    pub fn start(self) -> OffsetDateTime {
        match self {
            Self::DateTime(date_time) => date_time,
            Self::Date(date) => date.midnight().assume_utc(),
        }
    }

    /// The last instant covered by the input.
    ///
    /// For a calendar date this is the end of that day.
    pub fn end(self) -> OffsetDateTime {
        match self {
            Self::DateTime(date_time) => date_time,
            Self::Date(date) => date
                .with_hms_nano(23, 59, 59, 999_999_999)
                .map(|date_time| date_time.assume_utc())
                .unwrap_or_else(|_| date.midnight().assume_utc()),
        }
    }
}
