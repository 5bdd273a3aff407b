//! Module containing functionality related to BSON datetimes.

use std::fmt;

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::{Error, Result};

/// Struct representing a BSON datetime: a signed 64-bit count of milliseconds
/// since the Unix epoch.
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct DateTime(i64);

impl DateTime {
    /// The latest possible date that can be represented in BSON.
    pub const MAX: Self = Self::from_millis(i64::MAX);

    /// The earliest possible date that can be represented in BSON.
    pub const MIN: Self = Self::from_millis(i64::MIN);

    /// Makes a new [`DateTime`] from the number of non-leap milliseconds since
    /// January 1, 1970 0:00:00 UTC.
    pub const fn from_millis(date: i64) -> Self {
        Self(date)
    }

    /// Returns the number of non-leap milliseconds since January 1, 1970
    /// 0:00:00 UTC that this [`DateTime`] represents.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    /// Convert this [`DateTime`] to a [`time::OffsetDateTime`].
    ///
    /// Fails if the millisecond count is outside the year range supported by
    /// the `time` crate (+/-9999).
    pub fn to_offset_datetime(self) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(self.0 as i128 * 1_000_000)
            .map_err(|e| Error::datetime(format!("out of range: {}", e)))
    }

    /// Makes a new [`DateTime`] from a [`time::OffsetDateTime`], truncated to
    /// millisecond precision.
    pub fn from_offset_datetime(odt: OffsetDateTime) -> Self {
        Self::from_millis((odt.unix_timestamp_nanos() / 1_000_000) as i64)
    }

    /// Convert this [`DateTime`] to an RFC 3339 formatted string.
    pub fn try_to_rfc3339_string(self) -> Result<String> {
        self.to_offset_datetime()?
            .format(&Rfc3339)
            .map_err(|e| Error::datetime(format!("failed to format: {}", e)))
    }

    /// Convert the given RFC 3339 formatted string to a [`DateTime`],
    /// truncating it to millisecond precision.
    pub fn parse_rfc3339_str(s: impl AsRef<str>) -> Result<Self> {
        let odt = OffsetDateTime::parse(s.as_ref(), &Rfc3339)
            .map_err(|e| Error::datetime(format!("failed to parse: {}", e)))?;
        Ok(Self::from_offset_datetime(odt))
    }

    /// Whether this datetime can be represented in the relaxed Extended JSON
    /// date form: non-negative and no later than the year 9999.
    pub(crate) fn is_rfc3339_representable(self) -> bool {
        self.0 >= 0
            && self
                .to_offset_datetime()
                .map(|odt| odt.year() <= 9999)
                .unwrap_or(false)
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut tup = f.debug_tuple("DateTime");
        match self.try_to_rfc3339_string() {
            Ok(s) => tup.field(&s),
            _ => tup.field(&self.0),
        };
        tup.finish()
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.try_to_rfc3339_string() {
            Ok(s) => f.write_str(&s),
            _ => write!(f, "DateTime({} ms)", self.0),
        }
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(odt: OffsetDateTime) -> Self {
        Self::from_offset_datetime(odt)
    }
}
