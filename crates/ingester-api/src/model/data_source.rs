//! Where a dataset's data comes from.

use super::{
	domain_object,
	field::{Field, FieldKind, FieldType},
	sampling::Sampling,
	Validate,
};

domain_object! {
	/// Polls a remote URL for files matching `pattern`.
	pub struct PullDataSource: "pull_data_source" {
		pub url: Option<String>,
		/// Regular expression files must match to be ingested.
		pub pattern: Option<String>,
		pub mime_type: Option<String>,
		/// Data entry field the downloaded file is stored in.
		pub field: Option<String>,
		pub sampling: Option<Sampling>,
		pub recursive: bool,
		pub processing_script: Option<String>,
	}
}

domain_object! {
	/// Files are pushed to the platform at `path`.
	pub struct PushDataSource: "push_data_source" {
		pub path: Option<String>,
		pub processing_script: Option<String>,
	}
}

domain_object! {
	/// Derives data from another dataset.
	pub struct DatasetDataSource: "dataset_data_source" {
		pub dataset_id: Option<i64>,
		pub processing_script: Option<String>,
	}
}

domain_object! {
	/// Scrapes an OGC Sensor Observation Service endpoint.
	pub struct SosScraperDataSource: "sos_scraper_data_source" {
		pub url: Option<String>,
		pub field: Option<String>,
		pub sampling: Option<Sampling>,
		pub variant: Option<String>,
		pub version: Option<String>,
		pub processing_script: Option<String>,
	}
}

impl PullDataSource {
	pub fn new(url: impl Into<String>, field: impl Into<String>) -> Self {
		Self {
			url: Some(url.into()),
			field: Some(field.into()),
			..Default::default()
		}
	}

	pub fn with_sampling(mut self, sampling: Sampling) -> Self {
		self.sampling = Some(sampling);
		self
	}
}

impl Validate for PullDataSource {}
impl Validate for PushDataSource {}
impl Validate for DatasetDataSource {}
impl Validate for SosScraperDataSource {}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
	Pull(PullDataSource),
	Push(PushDataSource),
	Dataset(DatasetDataSource),
	SosScraper(SosScraperDataSource),
}

impl DataSource {
	pub fn processing_script(&self) -> Option<&str> {
		match self {
			Self::Pull(s) => s.processing_script.as_deref(),
			Self::Push(s) => s.processing_script.as_deref(),
			Self::Dataset(s) => s.processing_script.as_deref(),
			Self::SosScraper(s) => s.processing_script.as_deref(),
		}
	}
}

impl From<PullDataSource> for DataSource {
	fn from(s: PullDataSource) -> Self {
		Self::Pull(s)
	}
}

impl From<PushDataSource> for DataSource {
	fn from(s: PushDataSource) -> Self {
		Self::Push(s)
	}
}

impl From<DatasetDataSource> for DataSource {
	fn from(s: DatasetDataSource) -> Self {
		Self::Dataset(s)
	}
}

impl From<SosScraperDataSource> for DataSource {
	fn from(s: SosScraperDataSource) -> Self {
		Self::SosScraper(s)
	}
}

impl FieldType for DataSource {
	const KIND: FieldKind = FieldKind::Object;

	fn to_field(&self) -> Field {
		match self {
			Self::Pull(s) => Field::object(s.clone()),
			Self::Push(s) => Field::object(s.clone()),
			Self::Dataset(s) => Field::object(s.clone()),
			Self::SosScraper(s) => Field::object(s.clone()),
		}
	}

	fn from_field(field: Field) -> Result<Self, String> {
		let obj = match field {
			Field::Object(obj) => obj,
			other => return Err(format!("expected data source, found {}", other.describe())),
		};
		let class = obj.class();
		let any = obj.into_any();

		let any = match any.downcast::<PullDataSource>() {
			Ok(s) => return Ok(Self::Pull(*s)),
			Err(any) => any,
		};
		let any = match any.downcast::<PushDataSource>() {
			Ok(s) => return Ok(Self::Push(*s)),
			Err(any) => any,
		};
		let any = match any.downcast::<DatasetDataSource>() {
			Ok(s) => return Ok(Self::Dataset(*s)),
			Err(any) => any,
		};
		match any.downcast::<SosScraperDataSource>() {
			Ok(s) => Ok(Self::SosScraper(*s)),
			Err(_) => Err(format!("'{class}' is not a data source")),
		}
	}
}
