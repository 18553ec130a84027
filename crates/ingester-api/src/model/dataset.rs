use crate::error::ValidationError;

use super::{
	data_source::DataSource, domain_object, location::LocationOffset, Validate,
};

domain_object! {
	/// A stream of data entries collected at one location and shaped by one schema.
	pub struct Dataset: "dataset" {
		pub id: Option<i64>,
		pub version: Option<i64>,
		/// Id of the location the data is collected at.
		pub location: Option<i64>,
		/// Id of the data entry schema.
		pub schema: Option<i64>,
		pub data_source: Option<DataSource>,
		pub location_offset: Option<LocationOffset>,
		pub enabled: bool,
		/// Set by the platform while ingestion is active.
		pub running: bool,
		pub description: Option<String>,
		pub redbox_uri: Option<String>,
	}
}

impl Dataset {
	pub fn new(location: i64, schema: i64) -> Self {
		Self {
			location: Some(location),
			schema: Some(schema),
			..Default::default()
		}
	}

	pub fn with_data_source(mut self, data_source: impl Into<DataSource>) -> Self {
		self.data_source = Some(data_source.into());
		self
	}
}

impl Validate for Dataset {
	fn check(&self) -> Vec<ValidationError> {
		let mut errors = Vec::new();
		if self.location.is_none() {
			errors.push(ValidationError::new("location", "Location must be set"));
		}
		if self.schema.is_none() {
			errors.push(ValidationError::new("schema", "Schema must be set"));
		}
		errors
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{
		data_source::PullDataSource,
		field::{Field, FieldType},
		sampling::Sampling,
		DomainObject,
	};

	#[test]
	fn missing_location_and_schema_are_both_reported() {
		let errors = Dataset::default().validate();
		assert_eq!(errors.len(), 2);
		assert_eq!(errors[0].field, "location");
		assert_eq!(errors[1].field, "schema");

		assert!(Dataset::new(1, 2).validate().is_empty());
	}

	#[test]
	fn data_source_accepts_only_data_sources() {
		let mut dataset = Dataset::new(1, 2);
		dataset
			.set_field(
				"data_source",
				Field::object(PullDataSource::new("http://example.com", "file")),
			)
			.unwrap();
		assert!(matches!(dataset.data_source, Some(DataSource::Pull(_))));

		assert!(dataset
			.set_field("data_source", Sampling::periodic(10).to_field())
			.is_err());
		dataset.set_field("data_source", Field::Null).unwrap();
		assert_eq!(dataset.data_source, None);
	}
}
