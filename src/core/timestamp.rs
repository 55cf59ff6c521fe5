// Timestamp rendering and time zone selection
// Lines are stamped as [DD-MM-YYYY HH:MM:SS:mmm] in the configured zone

use chrono::{DateTime, Local, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    #[error("Unknown time zone: {0}")]
    Unknown(String),
}

/// Identifier accepted for the system time zone
pub const LOCAL_ZONE_ID: &str = "local";

/// Time zone used to render timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The operating system's zone, resolved at render time
    #[default]
    Local,

    /// A fixed IANA zone such as `Europe/Berlin`
    Named(Tz),
}

impl Zone {
    /// Parse a zone identifier. `local` and `system` select the system zone.
    pub fn parse(id: &str) -> Result<Self, ZoneError> {
        let trimmed = id.trim();
        if trimmed.eq_ignore_ascii_case(LOCAL_ZONE_ID) || trimmed.eq_ignore_ascii_case("system") {
            return Ok(Zone::Local);
        }

        trimmed
            .parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| ZoneError::Unknown(trimmed.to_string()))
    }

    /// Identifier that round-trips through [`Zone::parse`]
    pub fn id(&self) -> &str {
        match self {
            Zone::Local => LOCAL_ZONE_ID,
            Zone::Named(tz) => tz.name(),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Render an instant as a bracketed timestamp in the given zone
pub fn render_timestamp(instant: DateTime<Utc>, zone: Zone) -> String {
    match zone {
        Zone::Local => format_in(instant.with_timezone(&Local)),
        Zone::Named(tz) => format_in(instant.with_timezone(&tz)),
    }
}

fn format_in<T: TimeZone>(dt: DateTime<T>) -> String
where
    T::Offset: fmt::Display,
{
    // Leap seconds report 1000+ ms
    let millis = dt.timestamp_subsec_millis().min(999);
    format!("[{}:{:03}]", dt.format("%d-%m-%Y %H:%M:%S"), millis)
}

/// All known IANA zone identifiers, sorted
pub fn available_zones() -> Vec<&'static str> {
    let mut zones: Vec<&'static str> = chrono_tz::TZ_VARIANTS.iter().map(|tz| tz.name()).collect();
    zones.sort_unstable();
    zones
}

/// Zone identifiers containing `filter`, ignoring case
pub fn matching_zones(filter: &str) -> Vec<&'static str> {
    let needle = filter.trim().to_lowercase();
    available_zones()
        .into_iter()
        .filter(|zone| zone.to_lowercase().contains(&needle))
        .collect()
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
