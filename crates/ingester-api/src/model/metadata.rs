//! Metadata attached to datasets and data entries, shaped by metadata schemas.

use std::collections::BTreeMap;

use crate::error::ValidationError;

use super::{data_bag, domain_object, field::Field, Validate};

domain_object! {
	pub struct DatasetMetadataEntry: "dataset_metadata_entry" {
		pub id: Option<i64>,
		pub version: Option<i64>,
		/// Id of the dataset described.
		pub object_id: Option<i64>,
		pub metadata_schema: Option<i64>,
		pub data: BTreeMap<String, Field>,
	}
}

domain_object! {
	pub struct DataEntryMetadataEntry: "data_entry_metadata_entry" {
		pub id: Option<i64>,
		pub version: Option<i64>,
		/// Id of the data entry described.
		pub object_id: Option<i64>,
		/// Dataset the data entry belongs to.
		pub dataset: Option<i64>,
		pub metadata_schema: Option<i64>,
		pub data: BTreeMap<String, Field>,
	}
}

data_bag!(DatasetMetadataEntry);
data_bag!(DataEntryMetadataEntry);

impl DatasetMetadataEntry {
	pub fn new(dataset: i64, metadata_schema: i64) -> Self {
		Self {
			object_id: Some(dataset),
			metadata_schema: Some(metadata_schema),
			..Default::default()
		}
	}
}

impl DataEntryMetadataEntry {
	pub fn new(dataset: i64, data_entry: i64, metadata_schema: i64) -> Self {
		Self {
			object_id: Some(data_entry),
			dataset: Some(dataset),
			metadata_schema: Some(metadata_schema),
			..Default::default()
		}
	}
}

fn check_target(object_id: Option<i64>, metadata_schema: Option<i64>) -> Vec<ValidationError> {
	let mut errors = Vec::new();
	if object_id.is_none() {
		errors.push(ValidationError::new("object_id", "Object id must be set"));
	}
	if metadata_schema.is_none() {
		errors.push(ValidationError::new(
			"metadata_schema",
			"Metadata schema must be set",
		));
	}
	errors
}

impl Validate for DatasetMetadataEntry {
	fn check(&self) -> Vec<ValidationError> {
		check_target(self.object_id, self.metadata_schema)
	}
}

impl Validate for DataEntryMetadataEntry {
	fn check(&self) -> Vec<ValidationError> {
		check_target(self.object_id, self.metadata_schema)
	}
}
