//! Client library for the ingester platform, which provisions and manages environmental sensor
//! data pipelines.
//!
//! Domain objects ([`Location`], [`Dataset`], [`Schema`], ...) are transcoded to JSON wire trees
//! by a registry driven [`Marshaller`] and sent through a [`Transport`]. Writes are usually
//! batched in a [`UnitOfWork`], committed as one platform transaction:
//!
//! ```no_run
//! use ingester_api::{
//! 	model::shared, AttributeDef, Authentication, Dataset, IngesterPlatformApi, Location, Schema,
//! };
//!
//! # fn main() -> ingester_api::Result<()> {
//! let api = IngesterPlatformApi::new(
//! 	"http://localhost:8080/api",
//! 	Some(Authentication::credentials("casey", "password")),
//! )?;
//!
//! let mut unit = api.create_unit_of_work();
//! let location = shared(Location::new(10.0, 11.0, "Loc 1"));
//! let schema = shared(Schema::data_entry("Temperature").with_attr(AttributeDef::double("temperature"))?);
//!
//! let location_id = unit.insert(&location)?;
//! let schema_id = unit.insert(&schema)?;
//! let dataset = shared(Dataset::new(location_id, schema_id));
//! unit.insert(&dataset)?;
//!
//! api.commit(&mut unit)?;
//! assert!(dataset.borrow().id.is_some_and(|id| id >= 0));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod marshal;
pub mod model;
pub mod schema;
pub mod unit_of_work;

pub use client::{
	auth::Authentication,
	transport::{HttpTransport, Transport},
	IngesterPlatformApi,
};
pub use config::ClientConfig;
pub use error::{Error, MarshalError, PersistenceError, Result, ValidationError};
pub use marshal::{Marshaller, Registry};
pub use model::{
	data_entry::{DataEntry, FileObject},
	data_source::{DataSource, DatasetDataSource, PullDataSource, PushDataSource, SosScraperDataSource},
	dataset::Dataset,
	field::Field,
	location::{Location, LocationOffset, Region},
	metadata::{DataEntryMetadataEntry, DatasetMetadataEntry},
	sampling::{CronSampling, CustomSampling, PeriodicSampling, RepeatSampling, Sampling},
	search::{
		DataEntryMetadataSearch, DataEntrySchemaSearch, DataEntrySearch, DatasetMetadataSearch,
		DatasetSearch, LocationSearch, SearchResults,
	},
	system::IngesterLog,
	DomainObject, ObjectRef,
};
pub use schema::{AttributeDef, DataType, Schema, SchemaKind};
pub use unit_of_work::UnitOfWork;
