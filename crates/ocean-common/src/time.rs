//! Time handling utilities for archive queries.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};

/// Default full width of a query time window (≈ 9.9 days).
pub const DEFAULT_TIME_WINDOW_SECS: i64 = 856_710;

/// Widest accepted query time window, one century.
pub const MAX_TIME_WINDOW_DAYS: i64 = 36_525;

/// A time window centered on a query time.
///
/// `width` is the full width of the window; observations match when they
/// fall within `center ± width / 2` (edges inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub center: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub width: Duration,
}

impl TimeWindow {
    pub fn new(center: DateTime<Utc>, width: Duration) -> Self {
        Self { center, width }
    }

    /// Window around `center` whose bounds are checked to be representable.
    pub fn try_new(center: DateTime<Utc>, width: Duration) -> OceanResult<Self> {
        check_window_width(width)?;
        let window = Self::new(center, width);
        match window.checked_bounds() {
            Some(_) => Ok(window),
            None => Err(OceanError::invalid_parameter(
                "time_window",
                format!("window of {} days around {} is out of range", width.num_days(), center),
            )),
        }
    }

    pub fn half_width(&self) -> Duration {
        self.width / 2
    }

    /// `(start, end)`, or `None` when either bound overflows.
    pub fn checked_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let half = self.half_width();
        Some((
            self.center.checked_sub_signed(half)?,
            self.center.checked_add_signed(half)?,
        ))
    }

    /// Start of the window, clamped to the earliest representable time.
    pub fn start(&self) -> DateTime<Utc> {
        self.center
            .checked_sub_signed(self.half_width())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// End of the window, clamped to the latest representable time.
    pub fn end(&self) -> DateTime<Utc> {
        self.center
            .checked_add_signed(self.half_width())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start() && dt <= &self.end()
    }
}

/// Reject negative widths and widths beyond [`MAX_TIME_WINDOW_DAYS`].
pub fn check_window_width(width: Duration) -> OceanResult<()> {
    if width < Duration::zero() {
        return Err(OceanError::invalid_parameter(
            "time_window",
            "window width must not be negative",
        ));
    }
    if width > Duration::days(MAX_TIME_WINDOW_DAYS) {
        return Err(OceanError::invalid_parameter(
            "time_window",
            format!(
                "window of {} days exceeds the {} day maximum",
                width.num_days(),
                MAX_TIME_WINDOW_DAYS
            ),
        ));
    }
    Ok(())
}

/// Parse an ISO 8601 timestamp.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` (assumed UTC) or a
/// bare date.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, OceanError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }

    Err(OceanError::invalid_parameter(
        "time",
        format!("unrecognised timestamp '{}'", s),
    ))
}

/// Reference epoch of the archive's CF time axis.
pub fn cf_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1950, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Convert a naive UTC timestamp to fractional "days since 1950-01-01".
pub fn days_since_1950(ts: &NaiveDateTime) -> f64 {
    let delta = *ts - cf_epoch();
    delta.num_milliseconds() as f64 / 86_400_000.0
}

/// Serde helpers storing a [`Duration`] as whole seconds.
pub mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        i64::deserialize(d).map(Duration::seconds)
    }
}
