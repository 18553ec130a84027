//! Buffered writes committed to the platform as one transaction.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
	client::{transport::Transport, IngesterPlatformApi},
	error::{Error, ValidationError},
	marshal::Marshaller,
	model::{
		data_entry::FileObject,
		field::{Field, FieldKind, FieldSpec, FieldType},
		field_error, object_plumbing, unknown_field, DomainObject, ObjectRef, WireClass,
	},
	Result,
};

/// Key of the per-object correlation id in a committed batch.
pub const CORRELATION_ID: &str = "correlationid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
	#[default]
	Open,
	Committed,
}

/// A file that has to be uploaded while a unit of work commits.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
	/// `{class}:{id}` of the object holding the file.
	pub entity: String,
	/// Field, or data bag key, the file is stored under.
	pub field: String,
	pub file: FileObject,
}

/// Collects inserts, updates, deletes and dataset state changes for one transaction.
///
/// Inserted objects get negative placeholder ids (`-1`, `-2`, ...) that other queued objects can
/// reference. Once the platform has committed the transaction, every inserted and updated
/// object is patched in place with the stored state, including its real id. There is no
/// rollback: a unit of work that should not be committed is simply dropped.
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
	to_insert: Vec<ObjectRef>,
	to_update: Vec<ObjectRef>,
	to_delete: Vec<i64>,
	to_enable: Vec<i64>,
	to_disable: Vec<i64>,
	last_placeholder: i64,
	state: State,
}

impl UnitOfWork {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> State {
		self.state
	}

	pub fn is_empty(&self) -> bool {
		self.to_insert.is_empty()
			&& self.to_update.is_empty()
			&& self.to_delete.is_empty()
			&& self.to_enable.is_empty()
			&& self.to_disable.is_empty()
	}

	pub fn to_insert(&self) -> &[ObjectRef] {
		&self.to_insert
	}

	pub fn to_update(&self) -> &[ObjectRef] {
		&self.to_update
	}

	pub fn to_delete(&self) -> &[i64] {
		&self.to_delete
	}

	pub fn to_enable(&self) -> &[i64] {
		&self.to_enable
	}

	pub fn to_disable(&self) -> &[i64] {
		&self.to_disable
	}

	/// Queues a new object and assigns it the next placeholder id, which is returned.
	///
	/// Fails with [`Error::InvalidObject`] if the object already has an id or does not validate.
	pub fn insert<T: DomainObject>(&mut self, obj: &Rc<RefCell<T>>) -> Result<i64> {
		let obj: ObjectRef = obj.clone();
		self.insert_object(obj)
	}

	pub fn insert_object(&mut self, obj: ObjectRef) -> Result<i64> {
		self.ensure_open()?;
		{
			let o = obj.borrow();
			if o.id().is_some() {
				return Err(Error::invalid("id", "Expected no id to be set"));
			}
			check(&o.validate())?;
		}

		let id = self.last_placeholder - 1;
		obj.borrow_mut().set_id(Some(id))?;
		self.last_placeholder = id;
		self.to_insert.push(obj);

		Ok(id)
	}

	/// Queues changes to a stored object. Fails if the object has no id or does not validate.
	pub fn update<T: DomainObject>(&mut self, obj: &Rc<RefCell<T>>) -> Result<()> {
		let obj: ObjectRef = obj.clone();
		self.update_object(obj)
	}

	pub fn update_object(&mut self, obj: ObjectRef) -> Result<()> {
		self.ensure_open()?;
		{
			let o = obj.borrow();
			if o.id().is_none() {
				return Err(Error::invalid("id", "Expected an id to be set"));
			}
			check(&o.validate())?;
		}

		if !self.to_update.iter().any(|queued| Rc::ptr_eq(queued, &obj)) {
			self.to_update.push(obj);
		}
		Ok(())
	}

	/// Inserts the object if it has no id yet, updates it otherwise. Returns the id to use in
	/// references from other objects.
	pub fn post<T: DomainObject>(&mut self, obj: &Rc<RefCell<T>>) -> Result<i64> {
		let id = obj.borrow().id();
		match id {
			None => self.insert(obj),
			Some(id) => self.update(obj).map(|()| id),
		}
	}

	pub fn delete(&mut self, id: i64) -> Result<()> {
		self.ensure_open()?;
		push_unique(&mut self.to_delete, id);
		Ok(())
	}

	pub fn enable(&mut self, dataset_id: i64) -> Result<()> {
		self.ensure_open()?;
		push_unique(&mut self.to_enable, dataset_id);
		Ok(())
	}

	pub fn disable(&mut self, dataset_id: i64) -> Result<()> {
		self.ensure_open()?;
		push_unique(&mut self.to_disable, dataset_id);
		Ok(())
	}

	/// Commits through the client this unit of work was created by, or any other.
	pub fn commit<T: Transport>(&mut self, api: &IngesterPlatformApi<T>) -> Result<()> {
		api.commit(self)
	}

	/// Whether any object in `collection` has the given id.
	pub fn find_id(collection: &[ObjectRef], id: i64) -> bool {
		collection.iter().any(|obj| obj.borrow().id() == Some(id))
	}

	/// Every file held by a queued insert or update, either directly in a field or in a data bag.
	pub fn pending_files(&self) -> Vec<PendingFile> {
		let mut files = Vec::new();

		for obj in self.to_insert.iter().chain(&self.to_update) {
			let obj = obj.borrow();
			let entity = format!(
				"{}:{}",
				obj.class(),
				obj.id().map_or_else(|| "None".to_string(), |id| id.to_string())
			);

			for spec in obj.fields() {
				match obj.get_field(spec.name) {
					Some(Field::Object(o)) => {
						if let Some(file) = o.downcast_ref::<FileObject>() {
							files.push(PendingFile {
								entity: entity.clone(),
								field: spec.name.to_string(),
								file: file.clone(),
							});
						}
					}
					Some(Field::Data(data)) => {
						for (key, value) in data {
							if let Some(file) = value.downcast_ref::<FileObject>() {
								files.push(PendingFile {
									entity: entity.clone(),
									field: key,
									file: file.clone(),
								});
							}
						}
					}
					_ => {}
				}
			}
		}

		files
	}

	pub(crate) fn ensure_open(&self) -> Result<()> {
		match self.state {
			State::Open => Ok(()),
			State::Committed => Err(Error::OperationFailed(
				"unit of work has already been committed".to_string(),
			)),
		}
	}

	pub(crate) fn mark_committed(&mut self) {
		self.state = State::Committed;
	}

	/// The batch sent to the platform. Inserted and updated objects carry their current id as a
	/// correlation id.
	pub(crate) fn to_batch(&self, marshaller: &Marshaller<'_>) -> Result<Value> {
		let objects = |objs: &[ObjectRef]| -> Result<Value> {
			objs.iter()
				.map(|obj| {
					let obj = obj.borrow();
					marshaller.object_to_wire_with(&*obj, &[(CORRELATION_ID, Value::from(obj.id()))])
				})
				.collect::<Result<Vec<_>>>()
				.map(Value::Array)
		};

		let mut batch = Map::new();
		batch.insert("class".to_string(), Value::from(Self::CLASS));
		batch.insert("to_insert".to_string(), objects(&self.to_insert)?);
		batch.insert("to_update".to_string(), objects(&self.to_update)?);
		batch.insert("to_delete".to_string(), Value::from(self.to_delete.clone()));
		batch.insert("to_enable".to_string(), Value::from(self.to_enable.clone()));
		batch.insert("to_disable".to_string(), Value::from(self.to_disable.clone()));

		Ok(Value::Object(batch))
	}

	/// Patches the platform's result records onto the queued objects they correlate with.
	///
	/// Records are matched on their class and correlation id against the ids the objects had
	/// when the batch was built, so ids assigned by earlier records never redirect later ones.
	/// Returns the number of objects patched.
	pub(crate) fn apply_results(
		&self,
		records: &[Value],
		marshaller: &Marshaller<'_>,
	) -> Result<usize> {
		let mut queued: HashMap<(String, i64), &ObjectRef> = HashMap::new();
		for obj in self.to_insert.iter().chain(&self.to_update) {
			let (class, id) = {
				let obj = obj.borrow();
				(obj.class(), obj.id())
			};
			if let Some(id) = id {
				queued.entry((class.to_string(), id)).or_insert(obj);
			}
		}

		let mut patched = 0;

		for record in records {
			let Some(correlation_id) = record.get(CORRELATION_ID).and_then(Value::as_i64) else {
				debug!(%record, "Commit result has no correlation id");
				continue;
			};
			let class = record.get("class").and_then(Value::as_str).unwrap_or_default();

			match queued.get(&(class.to_string(), correlation_id)) {
				Some(obj) => {
					marshaller.patch(record, &mut *obj.borrow_mut())?;
					patched += 1;
				}
				None => debug!(class, correlation_id, "No queued object for commit result"),
			}
		}

		Ok(patched)
	}
}

fn check(errors: &[ValidationError]) -> Result<()> {
	if errors.is_empty() {
		Ok(())
	} else {
		Err(Error::InvalidObject(errors.to_vec()))
	}
}

fn push_unique(ids: &mut Vec<i64>, id: i64) {
	if !ids.contains(&id) {
		ids.push(id);
	}
}

fn same_objects(a: &[ObjectRef], b: &[ObjectRef]) -> bool {
	a.len() == b.len()
		&& a.iter()
			.zip(b)
			.all(|(a, b)| Rc::ptr_eq(a, b) || a.borrow().eq_object(&*b.borrow()))
}

impl PartialEq for UnitOfWork {
	fn eq(&self, other: &Self) -> bool {
		same_objects(&self.to_insert, &other.to_insert)
			&& same_objects(&self.to_update, &other.to_update)
			&& self.to_delete == other.to_delete
			&& self.to_enable == other.to_enable
			&& self.to_disable == other.to_disable
	}
}

impl WireClass for UnitOfWork {
	const CLASS: &'static str = "unit_of_work";
}

const OBJECT_LIST: FieldKind = FieldKind::List(&FieldKind::Object);
const ID_LIST: FieldKind = FieldKind::List(&FieldKind::Integer);

fn shared_to_field(objs: &[ObjectRef]) -> Field {
	Field::List(
		objs.iter()
			.map(|obj| Field::Object(obj.borrow().clone_object()))
			.collect(),
	)
}

fn field_to_shared(name: &str, value: Field) -> Result<Vec<ObjectRef>> {
	let objs = Vec::<Box<dyn DomainObject>>::from_field(value)
		.map_err(|reason| field_error(UnitOfWork::CLASS, name, reason))?;
	Ok(objs.into_iter().map(|obj| obj.into_shared()).collect())
}

impl DomainObject for UnitOfWork {
	fn class(&self) -> &'static str {
		Self::CLASS
	}

	fn fields(&self) -> &'static [FieldSpec] {
		const FIELDS: &[FieldSpec] = &[
			FieldSpec {
				name: "to_insert",
				kind: OBJECT_LIST,
			},
			FieldSpec {
				name: "to_update",
				kind: OBJECT_LIST,
			},
			FieldSpec {
				name: "to_delete",
				kind: ID_LIST,
			},
			FieldSpec {
				name: "to_enable",
				kind: ID_LIST,
			},
			FieldSpec {
				name: "to_disable",
				kind: ID_LIST,
			},
		];
		FIELDS
	}

	fn get_field(&self, name: &str) -> Option<Field> {
		match name {
			"to_insert" => Some(shared_to_field(&self.to_insert)),
			"to_update" => Some(shared_to_field(&self.to_update)),
			"to_delete" => Some(self.to_delete.to_field()),
			"to_enable" => Some(self.to_enable.to_field()),
			"to_disable" => Some(self.to_disable.to_field()),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Field) -> Result<()> {
		let ids = |value| {
			Vec::<i64>::from_field(value).map_err(|reason| field_error(Self::CLASS, name, reason))
		};
		match name {
			"to_insert" => self.to_insert = field_to_shared(name, value)?,
			"to_update" => self.to_update = field_to_shared(name, value)?,
			"to_delete" => self.to_delete = ids(value)?,
			"to_enable" => self.to_enable = ids(value)?,
			"to_disable" => self.to_disable = ids(value)?,
			_ => return Err(unknown_field(Self::CLASS, name, &value)),
		}
		Ok(())
	}

	fn validate(&self) -> Vec<ValidationError> {
		Vec::new()
	}

	object_plumbing!();
}
