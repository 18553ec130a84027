//! Sampling policies that tell the platform when to pull from a data source.

use chrono::{DateTime, Utc};

use super::{
	domain_object,
	field::{Field, FieldKind, FieldType},
	Validate,
};

domain_object! {
	/// Samples every `rate` milliseconds.
	pub struct PeriodicSampling: "periodic_sampling" {
		pub rate: Option<i64>,
	}
}

domain_object! {
	/// Samples on a cron schedule.
	pub struct CronSampling: "cron_sampling" {
		pub cron: Option<String>,
	}
}

domain_object! {
	/// Samples at a fixed list of instants.
	pub struct RepeatSampling: "repeat_sampling" {
		pub sample_times: Vec<DateTime<Utc>>,
	}
}

domain_object! {
	/// Defers the sampling decision to a platform-side script.
	pub struct CustomSampling: "custom_sampling" {
		pub script: Option<String>,
	}
}

impl Validate for PeriodicSampling {}
impl Validate for CronSampling {}
impl Validate for RepeatSampling {}
impl Validate for CustomSampling {}

#[derive(Debug, Clone, PartialEq)]
pub enum Sampling {
	Periodic(PeriodicSampling),
	Cron(CronSampling),
	Repeat(RepeatSampling),
	Custom(CustomSampling),
}

impl Sampling {
	pub fn periodic(rate_ms: i64) -> Self {
		Self::Periodic(PeriodicSampling {
			rate: Some(rate_ms),
		})
	}

	pub fn cron(expr: impl Into<String>) -> Self {
		Self::Cron(CronSampling {
			cron: Some(expr.into()),
		})
	}

	pub fn repeat(sample_times: Vec<DateTime<Utc>>) -> Self {
		Self::Repeat(RepeatSampling { sample_times })
	}

	pub fn custom(script: impl Into<String>) -> Self {
		Self::Custom(CustomSampling {
			script: Some(script.into()),
		})
	}
}

impl FieldType for Sampling {
	const KIND: FieldKind = FieldKind::Object;

	fn to_field(&self) -> Field {
		match self {
			Self::Periodic(s) => Field::object(s.clone()),
			Self::Cron(s) => Field::object(s.clone()),
			Self::Repeat(s) => Field::object(s.clone()),
			Self::Custom(s) => Field::object(s.clone()),
		}
	}

	fn from_field(field: Field) -> Result<Self, String> {
		let obj = match field {
			Field::Object(obj) => obj,
			other => return Err(format!("expected sampling, found {}", other.describe())),
		};
		let class = obj.class();
		let any = obj.into_any();

		let any = match any.downcast::<PeriodicSampling>() {
			Ok(s) => return Ok(Self::Periodic(*s)),
			Err(any) => any,
		};
		let any = match any.downcast::<CronSampling>() {
			Ok(s) => return Ok(Self::Cron(*s)),
			Err(any) => any,
		};
		let any = match any.downcast::<RepeatSampling>() {
			Ok(s) => return Ok(Self::Repeat(*s)),
			Err(any) => any,
		};
		match any.downcast::<CustomSampling>() {
			Ok(s) => Ok(Self::Custom(*s)),
			Err(_) => Err(format!("'{class}' is not a sampling policy")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::location::LocationOffset;

	#[test]
	fn sampling_dispatches_on_concrete_type() {
		let field = Sampling::cron("0 * * * *").to_field();
		assert_eq!(Sampling::from_field(field), Ok(Sampling::cron("0 * * * *")));

		let err = Sampling::from_field(Field::object(LocationOffset::new(0.0, 0.0, 0.0)))
			.unwrap_err();
		assert!(err.contains("location_offset"), "{err}");
	}
}
