use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use std::path::{Path, PathBuf};

/// Capture file stem format: year-month-day-hour-minute-second-millisecond
pub const FILENAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

pub const PHOTO_EXTENSION: &str = "jpg";

/// Timezone used to render capture timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampZone {
    Local,
    Named(Tz),
}

impl TimestampZone {
    pub fn format(&self, at: DateTime<Utc>) -> String {
        match self {
            TimestampZone::Local => at.with_timezone(&Local).format(FILENAME_FORMAT).to_string(),
            TimestampZone::Named(tz) => at.with_timezone(tz).format(FILENAME_FORMAT).to_string(),
        }
    }
}

/// Resolve configured timezone, falling back to local time on parse errors
pub fn resolve_timestamp_zone(name: &str) -> TimestampZone {
    if name.eq_ignore_ascii_case("local") {
        return TimestampZone::Local;
    }
    match name.parse::<Tz>() {
        Ok(tz) => TimestampZone::Named(tz),
        Err(_) => {
            tracing::warn!(
                "Invalid capture timezone '{}', falling back to local time",
                name
            );
            TimestampZone::Local
        }
    }
}

/// `<timestamp>.jpg`
pub fn capture_file_name(zone: TimestampZone, at: DateTime<Utc>) -> String {
    format!("{}.{}", zone.format(at), PHOTO_EXTENSION)
}

/// Destination path for a capture taken at `at`.
///
/// Two captures in the same millisecond would share a name; the later one
/// gets a `-1`, `-2`, ... suffix instead of overwriting.
pub fn unique_capture_path(dir: &Path, zone: TimestampZone, at: DateTime<Utc>) -> PathBuf {
    let stem = zone.format(at);
    let first = dir.join(format!("{}.{}", stem, PHOTO_EXTENSION));
    if !first.exists() {
        return first;
    }

    let mut n: u32 = 1;
    loop {
        let candidate = dir.join(format!("{}-{}.{}", stem, n, PHOTO_EXTENSION));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Wall clock seam
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
