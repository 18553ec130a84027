//! The platform client.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::{
	config::ClientConfig,
	error::{Error, MarshalError},
	marshal::{Marshaller, Registry},
	model::{
		data_entry::DataEntry,
		dataset::Dataset,
		location::{Location, Region},
		search::{SearchCriteria, SearchResults},
		system::IngesterLog,
		DomainObject,
	},
	schema::{AttributeDef, Schema},
	unit_of_work::UnitOfWork,
	Result,
};

pub mod auth;
pub mod fault;
pub mod transport;

use auth::Authentication;
use transport::{HttpTransport, Transport};

/// Provisions and inspects datasets on an ingester platform.
///
/// Any call whose arguments do not meet the platform's expectations fails, e.g. inserting an
/// object that already has an id or referencing an object that does not exist.
pub struct IngesterPlatformApi<T: Transport = HttpTransport> {
	transport: T,
	marshaller: Marshaller<'static>,
}

impl IngesterPlatformApi<HttpTransport> {
	/// Connects to the platform at `service_url`, which must be an HTTP or HTTPS URL.
	pub fn new(service_url: impl Into<String>, auth: Option<Authentication>) -> Result<Self> {
		let mut config = ClientConfig::new(service_url);
		config.auth = auth;
		Self::from_config(&config)
	}

	pub fn from_config(config: &ClientConfig) -> Result<Self> {
		Ok(Self::with_transport(HttpTransport::new(config)?))
	}
}

impl<T: Transport> IngesterPlatformApi<T> {
	pub fn with_transport(transport: T) -> Self {
		Self {
			transport,
			marshaller: Marshaller::default(),
		}
	}

	/// Uses a registry with additional classes instead of the builtin one.
	pub fn with_registry(mut self, registry: &'static Registry) -> Self {
		self.marshaller = Marshaller::new(registry);
		self
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub fn marshaller(&self) -> &Marshaller<'static> {
		&self.marshaller
	}

	/// Diagnostic round trip, answered with `"PONG"`.
	pub fn ping(&self) -> Result<String> {
		match self.transport.call("ping", Vec::new())? {
			Value::String(s) => Ok(s),
			other => Err(MarshalError::MalformedWireData(format!(
				"unexpected ping reply {other}"
			))
			.into()),
		}
	}

	/// Stores a new object, returning it as stored, with its id set.
	pub fn insert<O: DomainObject>(&self, obj: &O) -> Result<O> {
		if obj.id().is_some() {
			return Err(Error::invalid("id", "Expected no id to be set"));
		}
		check(obj)?;

		let result = self
			.transport
			.call("insert", vec![self.marshaller.object_to_wire(obj)?])?;
		self.marshaller.decode(&result)
	}

	/// Stores changes to an existing object, returning it as stored.
	pub fn update<O: DomainObject>(&self, obj: &O) -> Result<O> {
		if obj.id().is_none() {
			return Err(Error::invalid("id", "Expected an id to be set"));
		}
		check(obj)?;

		let result = self
			.transport
			.call("update", vec![self.marshaller.object_to_wire(obj)?])?;
		self.marshaller.decode(&result)
	}

	/// Inserts the object if it has no id, updates it otherwise.
	pub fn post<O: DomainObject>(&self, obj: &O) -> Result<O> {
		match obj.id() {
			None => self.insert(obj),
			Some(_) => self.update(obj),
		}
	}

	/// Deletes the stored object with the same class and id. Other fields are ignored.
	pub fn delete(&self, obj: &dyn DomainObject) -> Result<()> {
		if obj.id().is_none() {
			return Err(Error::invalid("id", "Expected an id to be set"));
		}

		self.transport
			.call("delete", vec![self.marshaller.object_to_wire(obj)?])?;
		Ok(())
	}

	/// Returns one page of the objects matching `criteria`.
	pub fn search<C: SearchCriteria>(
		&self,
		criteria: &C,
		offset: i64,
		limit: i64,
	) -> Result<SearchResults> {
		let result = self.transport.call(
			"search",
			vec![
				self.marshaller.object_to_wire(criteria)?,
				Value::from(offset),
				Value::from(limit),
			],
		)?;
		self.marshaller.decode(&result)
	}

	pub fn enable_dataset(&self, dataset_id: i64) -> Result<()> {
		self.transport
			.call("enableDataset", vec![Value::from(dataset_id)])?;
		Ok(())
	}

	pub fn disable_dataset(&self, dataset_id: i64) -> Result<()> {
		self.transport
			.call("disableDataset", vec![Value::from(dataset_id)])?;
		Ok(())
	}

	pub fn get_ingester_logs(&self, dataset_id: i64) -> Result<Vec<IngesterLog>> {
		let result = self
			.transport
			.call("getIngesterLogs", vec![Value::from(dataset_id)])?;
		self.decode_list(&result)
	}

	pub fn get_region(&self, id: i64) -> Result<Option<Region>> {
		self.get("getRegion", vec![Value::from(id)])
	}

	pub fn get_location(&self, id: i64) -> Result<Option<Location>> {
		self.get("getLocation", vec![Value::from(id)])
	}

	pub fn get_schema(&self, id: i64) -> Result<Option<Schema>> {
		self.get("getSchema", vec![Value::from(id)])
	}

	pub fn get_dataset(&self, id: i64) -> Result<Option<Dataset>> {
		self.get("getDataset", vec![Value::from(id)])
	}

	pub fn get_data_entry(&self, dataset_id: i64, data_entry_id: i64) -> Result<Option<DataEntry>> {
		self.get(
			"getDataEntry",
			vec![Value::from(dataset_id), Value::from(data_entry_id)],
		)
	}

	/// Downloads the contents of a file stored in a data entry field.
	pub fn get_data_entry_stream(
		&self,
		dataset_id: i64,
		data_entry_id: i64,
		field: &str,
	) -> Result<Option<Vec<u8>>> {
		self.transport
			.download(&format!("data_entry/{dataset_id}/{data_entry_id}/{field}"))
	}

	/// Datasets matching the given filters, e.g. `[("location", json!(3))]`.
	pub fn find_datasets(&self, filters: &[(&str, Value)]) -> Result<Vec<Dataset>> {
		let filters: serde_json::Map<_, _> = filters
			.iter()
			.map(|(k, v)| ((*k).to_string(), v.clone()))
			.collect();
		let result = self
			.transport
			.call("findDatasets", vec![Value::Object(filters)])?;
		self.decode_list(&result)
	}

	/// Resets the platform to an empty state. Meant for test deployments.
	pub fn reset(&self) -> Result<()> {
		self.transport.call("reset", Vec::new())?;
		Ok(())
	}

	pub fn create_unit_of_work(&self) -> UnitOfWork {
		UnitOfWork::new()
	}

	/// The attributes of a stored schema, including every inherited one.
	pub fn effective_attributes(&self, schema_id: i64) -> Result<BTreeMap<String, AttributeDef>> {
		self.require_schema(schema_id)?
			.compose(|id| self.require_schema(id))
	}

	/// Commits a unit of work as one platform transaction.
	///
	/// The batch is announced with `precommit`, which opens a transaction. Every file held by a
	/// queued object is then uploaded to `{transaction}/{class}:{id}/{field}` before `commit`
	/// completes the transaction. The stored state of every inserted and updated object is
	/// patched back onto the caller's objects.
	#[instrument(
		skip_all,
		fields(inserts = unit.to_insert().len(), updates = unit.to_update().len())
	)]
	pub fn commit(&self, unit: &mut UnitOfWork) -> Result<()> {
		unit.ensure_open()?;

		let mut transaction_id = None;
		let result = self.run_commit(unit, &mut transaction_id);
		if let Err(e) = &result {
			error!(
				transaction_id = transaction_id.as_deref(),
				"Failed to commit unit of work: {e}"
			);
		}
		result
	}

	/// Stores the transaction id in `transaction_id` as soon as the platform assigns one.
	fn run_commit(
		&self,
		unit: &mut UnitOfWork,
		transaction_id: &mut Option<String>,
	) -> Result<()> {
		let batch = unit.to_batch(&self.marshaller)?;
		let files = unit.pending_files();

		let transaction_id: &str = transaction_id.insert(transaction_id_from(
			self.transport.call("precommit", vec![batch])?,
		)?);
		info!(%transaction_id, files = files.len(), "Committing unit of work");

		for pending in files {
			let path = format!("{transaction_id}/{}/{}", pending.entity, pending.field);
			debug!(%path, "Uploading file");
			self.transport
				.upload(&path, pending.file.read_contents()?)?;
		}

		let records = match self
			.transport
			.call("commit", vec![Value::from(transaction_id)])?
		{
			Value::Array(records) => records,
			Value::Null => Vec::new(),
			record => vec![record],
		};

		let patched = unit.apply_results(&records, &self.marshaller)?;
		unit.mark_committed();
		debug!(patched, "Unit of work committed");

		Ok(())
	}

	fn get<O: DomainObject>(&self, method: &str, params: Vec<Value>) -> Result<Option<O>> {
		let result = self.transport.call(method, params)?;
		self.marshaller.decode_optional(&result)
	}

	fn decode_list<O: DomainObject>(&self, value: &Value) -> Result<Vec<O>> {
		match value {
			Value::Null => Ok(Vec::new()),
			Value::Array(items) => items.iter().map(|item| self.marshaller.decode(item)).collect(),
			other => Err(MarshalError::MalformedWireData(format!(
				"expected a list, found {other}"
			))
			.into()),
		}
	}

	fn require_schema(&self, id: i64) -> Result<Schema> {
		self.get_schema(id)?
			.ok_or_else(|| Error::UnknownObject(format!("schema {id}")))
	}
}

fn check(obj: &dyn DomainObject) -> Result<()> {
	let errors = obj.validate();
	if errors.is_empty() {
		Ok(())
	} else {
		Err(Error::InvalidObject(errors))
	}
}

/// The platform hands out transaction ids as strings or integers.
fn transaction_id_from(value: Value) -> Result<String> {
	match value {
		Value::String(s) => Ok(s),
		Value::Number(n) => Ok(n.to_string()),
		other => Err(MarshalError::MalformedWireData(format!(
			"invalid transaction id {other}"
		))
		.into()),
	}
}
