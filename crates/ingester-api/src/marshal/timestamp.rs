//! Wire timestamps: `YYYY-MM-DDTHH:MM:SS.mmmZ`, always UTC.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

use crate::error::MarshalError;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn format(dt: &DateTime<Utc>) -> String {
	dt.format(WIRE_FORMAT).to_string()
}

/// Parses a wire timestamp.
///
/// The trailing `Z` is optional and the fraction may have any number of digits; it is padded or
/// truncated to microseconds.
pub fn parse(s: &str) -> Result<DateTime<Utc>, MarshalError> {
	let invalid = || MarshalError::Timestamp(s.to_string());

	let trimmed = s.strip_suffix('Z').unwrap_or(s);
	let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

	if !fraction.bytes().all(|b| b.is_ascii_digit()) {
		return Err(invalid());
	}
	let mut micros = fraction.chars().take(6).collect::<String>();
	while micros.len() < 6 {
		micros.push('0');
	}
	let micros: u32 = micros.parse().map_err(|_| invalid())?;

	let naive = NaiveDateTime::parse_from_str(whole, "%Y-%m-%dT%H:%M:%S").map_err(|_| invalid())?;
	let naive = naive.with_nanosecond(micros * 1_000).ok_or_else(invalid)?;

	Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
	use chrono::{Duration, TimeZone};

	use super::*;

	#[test]
	fn formats_with_millisecond_precision() {
		let dt = Utc.with_ymd_and_hms(2012, 1, 2, 3, 4, 5).unwrap() + Duration::microseconds(678_901);
		assert_eq!(format(&dt), "2012-01-02T03:04:05.678Z");
	}

	#[test]
	fn parses_variable_fractions() {
		let base = Utc.with_ymd_and_hms(2012, 1, 2, 3, 4, 5).unwrap();

		assert_eq!(parse("2012-01-02T03:04:05Z").unwrap(), base);
		assert_eq!(parse("2012-01-02T03:04:05").unwrap(), base);
		assert_eq!(
			parse("2012-01-02T03:04:05.5Z").unwrap(),
			base + Duration::milliseconds(500)
		);
		assert_eq!(
			parse("2012-01-02T03:04:05.123456789Z").unwrap(),
			base + Duration::microseconds(123_456)
		);
	}

	#[test]
	fn rejects_malformed_input() {
		for s in ["", "2012-01-02", "2012-13-02T03:04:05Z", "2012-01-02T03:04:05.1a2Z"] {
			assert!(matches!(parse(s), Err(MarshalError::Timestamp(_))), "{s}");
		}
	}

	#[test]
	fn round_trip_keeps_milliseconds() {
		let dt = Utc.with_ymd_and_hms(2020, 6, 30, 23, 59, 59).unwrap() + Duration::milliseconds(999);
		assert_eq!(parse(&format(&dt)).unwrap(), dt);
	}
}
