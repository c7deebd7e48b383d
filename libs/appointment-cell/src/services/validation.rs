// libs/appointment-cell/src/services/validation.rs
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::models::AppointmentError;

// H:MM, HH:MM, HH:MM:SS(.fff), HHMM, HHMMSS
static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d{1,2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?|(\d{2})(\d{2})(\d{2})?)$")
        .expect("time pattern is valid")
});

/// Canonical `HH:MM` (24-hour) form of a time-of-day. Seconds are dropped.
pub fn normalize_time(raw: &str) -> Result<NaiveTime, AppointmentError> {
    let trimmed = raw.trim();
    let captures = TIME_PATTERN.captures(trimmed).ok_or_else(|| {
        AppointmentError::validation("time", format!("'{}' is not a time of day (expected HH:MM)", raw))
    })?;

    let (hour, minute, second) = match (captures.get(1), captures.get(2)) {
        (Some(h), Some(m)) => (h.as_str(), m.as_str(), captures.get(3).map(|s| s.as_str())),
        _ => (
            captures.get(4).map_or("", |h| h.as_str()),
            captures.get(5).map_or("", |m| m.as_str()),
            captures.get(6).map(|s| s.as_str()),
        ),
    };

    let hour: u32 = hour.parse().unwrap_or(u32::MAX);
    let minute: u32 = minute.parse().unwrap_or(u32::MAX);
    let second: u32 = second.map_or(0, |s| s.parse().unwrap_or(u32::MAX));

    if second > 59 {
        return Err(AppointmentError::validation("time", format!("'{}' has invalid seconds", raw)));
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| AppointmentError::validation("time", format!("'{}' is out of range", raw)))
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| {
            // Accept a full timestamp and keep its calendar date.
            chrono::DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive())
        })
        .map_err(|_| AppointmentError::validation("date", format!("'{}' is not a date (expected YYYY-MM-DD)", raw)))
}

pub fn ensure_not_past(date: NaiveDate, today: NaiveDate) -> Result<(), AppointmentError> {
    if date < today {
        return Err(AppointmentError::validation(
            "date",
            format!("{} is in the past (today is {})", date, today),
        ));
    }
    Ok(())
}

/// Trimmed, non-empty value of a required text field.
pub fn require_text(field: &str, value: Option<&str>) -> Result<String, AppointmentError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AppointmentError::validation(field, "is required")),
    }
}

pub fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|text| !text.is_empty()).map(str::to_string)
}

pub fn validate_email(field: &str, email: &str) -> Result<(), AppointmentError> {
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(AppointmentError::validation(field, format!("'{}' is not an email address", email)))
    }
}

/// Serde adapter storing times as `HH:MM` and reading any accepted form.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::normalize_time(&raw).map_err(serde::de::Error::custom)
    }
}
