//! Search criteria and paged results.

use chrono::{DateTime, Utc};

use super::{domain_object, DomainObject, Validate};

/// Marker for objects accepted by [`IngesterPlatformApi::search`](crate::IngesterPlatformApi::search).
pub trait SearchCriteria: DomainObject {}

domain_object! {
	/// Data entries of one dataset, optionally bounded in time.
	pub struct DataEntrySearch: "data_entry_search" {
		pub dataset: Option<i64>,
		pub start_time: Option<DateTime<Utc>>,
		pub end_time: Option<DateTime<Utc>>,
	}
}

domain_object! {
	pub struct DatasetMetadataSearch: "dataset_metadata_search" {
		pub dataset: Option<i64>,
	}
}

domain_object! {
	pub struct DataEntryMetadataSearch: "data_entry_metadata_search" {
		pub dataset: Option<i64>,
		pub object_id: Option<i64>,
	}
}

domain_object! {
	pub struct LocationSearch: "location_search" {}
}

domain_object! {
	pub struct DatasetSearch: "dataset_search" {
		pub location: Option<i64>,
	}
}

domain_object! {
	pub struct DataEntrySchemaSearch: "data_entry_schema_search" {}
}

impl DataEntrySearch {
	pub fn new(dataset: i64) -> Self {
		Self {
			dataset: Some(dataset),
			..Default::default()
		}
	}

	pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
		self.start_time = Some(start);
		self.end_time = Some(end);
		self
	}
}

macro_rules! criteria {
	($($ty:ty),*) => {
		$(
			impl Validate for $ty {}
			impl SearchCriteria for $ty {}
		)*
	};
}

criteria!(
	DataEntrySearch,
	DatasetMetadataSearch,
	DataEntryMetadataSearch,
	LocationSearch,
	DatasetSearch,
	DataEntrySchemaSearch
);

domain_object! {
	/// One page of search hits.
	pub struct SearchResults: "search_results" {
		/// Total number of hits, across all pages.
		pub count: i64,
		pub offset: i64,
		pub limit: i64,
		pub results: Vec<Box<dyn DomainObject>>,
	}
}

impl Validate for SearchResults {}

impl SearchResults {
	/// Hits of type `T`, skipping anything else.
	pub fn iter_as<T: DomainObject>(&self) -> impl Iterator<Item = &T> {
		self.results.iter().filter_map(|r| r.downcast_ref::<T>())
	}

	pub fn len(&self) -> usize {
		self.results.len()
	}

	pub fn is_empty(&self) -> bool {
		self.results.is_empty()
	}
}
