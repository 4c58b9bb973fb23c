//! UTC datetime utilities without timezone dependencies.
//!
//! Provides a lightweight `DateTimeUtc` struct used to render file
//! modification times as HTTP dates (`Last-Modified` headers and the
//! `LastWriteTime` field of asset records).
//!
//! # Examples
//!
//! ```ignore
//! let dt = DateTimeUtc::from_unix_secs(1718461845);
//! assert_eq!(dt.to_http_date(), "Sat, 15 Jun 2024 14:30:45 GMT");
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

/// UTC datetime without timezone complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Convert seconds since the unix epoch (UTC) into calendar fields.
    #[allow(clippy::cast_possible_truncation)] // Bounded by the modulo arithmetic
    pub fn from_unix_secs(secs: u64) -> Self {
        let mut days = secs / 86_400;
        let rem = secs % 86_400;

        let mut year: u16 = 1970;
        loop {
            let len = if Self::is_leap_year(year) { 366 } else { 365 };
            if days < len {
                break;
            }
            days -= len;
            year += 1;
        }

        let mut month: u8 = 1;
        loop {
            let len = u64::from(Self::days_in_month(year, month));
            if days < len {
                break;
            }
            days -= len;
            month += 1;
        }

        Self::new(
            year,
            month,
            days as u8 + 1,
            (rem / 3600) as u8,
            (rem / 60 % 60) as u8,
            (rem % 60) as u8,
        )
    }

    /// Convert a file system timestamp. Times before the epoch clamp to it.
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::from_unix_secs(secs)
    }

    #[inline]
    #[allow(clippy::manual_is_multiple_of)] // Manual impl for const fn
    const fn is_leap_year(year: u16) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    #[inline]
    const fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    /// Format as an HTTP date (RFC 7231 IMF-fixdate).
    ///
    /// Returns: `Sat, 01 Jan 2000 00:00:01 GMT`
    pub fn to_http_date(self) -> String {
        const WEEKDAYS: [&str; 7] = ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"];
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];

        // Zeller's congruence for weekday calculation
        let weekday = self.weekday_index();

        format!(
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[weekday],
            self.day,
            MONTHS[(self.month - 1) as usize],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }

    #[inline]
    #[allow(clippy::cast_sign_loss)] // Result of % 7 is always 0-6
    fn weekday_index(self) -> usize {
        let (y, m) = if self.month < 3 {
            (i32::from(self.year) - 1, i32::from(self.month) + 12)
        } else {
            (i32::from(self.year), i32::from(self.month))
        };
        let d = i32::from(self.day);
        ((d + (13 * (m + 1)) / 5 + y + y / 4 - y / 100 + y / 400) % 7) as usize
    }
}

/// Render a file system timestamp as an HTTP date.
pub fn http_date(time: SystemTime) -> String {
    DateTimeUtc::from_system_time(time).to_http_date()
}
