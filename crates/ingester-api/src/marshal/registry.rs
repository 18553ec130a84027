use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
	error::MarshalError,
	model::{
		data_entry::{DataEntry, FileObject},
		data_source::{DatasetDataSource, PullDataSource, PushDataSource, SosScraperDataSource},
		dataset::Dataset,
		location::{Location, LocationOffset, Region},
		metadata::{DataEntryMetadataEntry, DatasetMetadataEntry},
		sampling::{CronSampling, CustomSampling, PeriodicSampling, RepeatSampling},
		search::{
			DataEntryMetadataSearch, DataEntrySchemaSearch, DataEntrySearch, DatasetMetadataSearch,
			DatasetSearch, LocationSearch, SearchResults,
		},
		system::IngesterLog,
		DomainObject, WireClass,
	},
	schema::{AttributeDef, DataType, Schema, SchemaKind},
	unit_of_work::UnitOfWork,
};

/// Builds a fresh, empty instance of a registered class.
pub type Factory = Box<dyn Fn() -> Box<dyn DomainObject> + Send + Sync>;

/// Maps wire tags to factories for the classes they name.
///
/// The reverse direction needs no table: every object reports its own tag through
/// [`DomainObject::class`].
#[derive(Default)]
pub struct Registry {
	factories: HashMap<&'static str, Factory>,
}

static BUILTIN: Lazy<Registry> = Lazy::new(Registry::with_builtin_classes);

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The shared registry of every class defined by this crate.
	pub fn builtin() -> &'static Registry {
		&BUILTIN
	}

	/// A new registry pre-populated with the builtin classes, open to further registration.
	pub fn with_builtin_classes() -> Self {
		let mut registry = Self::new();

		registry.register::<Region>();
		registry.register::<Location>();
		registry.register::<LocationOffset>();
		registry.register::<Dataset>();

		registry.register::<PullDataSource>();
		registry.register::<PushDataSource>();
		registry.register::<DatasetDataSource>();
		registry.register::<SosScraperDataSource>();

		registry.register::<PeriodicSampling>();
		registry.register::<CronSampling>();
		registry.register::<RepeatSampling>();
		registry.register::<CustomSampling>();

		registry.register::<DataEntry>();
		registry.register::<FileObject>();
		registry.register::<DatasetMetadataEntry>();
		registry.register::<DataEntryMetadataEntry>();
		registry.register::<IngesterLog>();

		registry.register::<DataEntrySearch>();
		registry.register::<DatasetMetadataSearch>();
		registry.register::<DataEntryMetadataSearch>();
		registry.register::<LocationSearch>();
		registry.register::<DatasetSearch>();
		registry.register::<DataEntrySchemaSearch>();
		registry.register::<SearchResults>();

		registry.register::<UnitOfWork>();

		for kind in SchemaKind::ALL {
			registry.register_with(kind.tag(), move || Box::new(Schema::new(kind)));
		}
		for kind in DataType::ALL {
			registry.register_with(kind.tag(), move || {
				Box::new(AttributeDef {
					kind,
					..Default::default()
				})
			});
		}

		registry
	}

	pub fn register<T: WireClass + DomainObject + Default>(&mut self) {
		self.register_with(T::CLASS, || Box::new(T::default()));
	}

	/// Registers a factory under `tag`, replacing any previous registration.
	pub fn register_with<F>(&mut self, tag: &'static str, factory: F)
	where
		F: Fn() -> Box<dyn DomainObject> + Send + Sync + 'static,
	{
		if self.factories.insert(tag, Box::new(factory)).is_some() {
			debug!(tag, "Replaced registered class");
		}
	}

	pub fn contains(&self, tag: &str) -> bool {
		self.factories.contains_key(tag)
	}

	/// Instantiates an empty object of the class registered under `tag`.
	pub fn class_for(&self, tag: &str) -> Result<Box<dyn DomainObject>, MarshalError> {
		self.factories
			.get(tag)
			.map(|factory| factory())
			.ok_or_else(|| MarshalError::UnknownType(tag.to_string()))
	}

	pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.factories.keys().copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_builtin_tag_instantiates_its_class() {
		let registry = Registry::builtin();
		for tag in registry.tags() {
			assert_eq!(registry.class_for(tag).unwrap().class(), tag);
		}
		assert!(registry.contains("data_entry_metadata_schema"));
		assert!(registry.contains("file"));
	}

	#[test]
	fn unknown_tags_are_rejected() {
		assert!(matches!(
			Registry::builtin().class_for("no_such_class"),
			Err(MarshalError::UnknownType(tag)) if tag == "no_such_class"
		));
	}
}
