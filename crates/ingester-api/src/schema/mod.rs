//! Schemas describe the attributes of data entries and metadata entries.
//!
//! A schema owns its attributes, keyed by name, and may extend other schemas by id. The
//! effective attribute set is only computed on demand by [`Schema::compose`], so a schema can
//! be declared before its parents exist on the platform.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::{
	error::{Error, ValidationError},
	marshal::timestamp,
	model::{
		data_entry::FileObject,
		field::{Field, FieldKind, FieldSpec, FieldType},
		field_error, object_plumbing, unknown_field, DomainObject,
	},
	Result,
};

mod attribute;

pub use attribute::{is_valid_attribute_name, AttributeDef, DataType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemaKind {
	#[default]
	DataEntry,
	DatasetMetadata,
	DataEntryMetadata,
}

impl SchemaKind {
	pub const ALL: [SchemaKind; 3] = [
		Self::DataEntry,
		Self::DatasetMetadata,
		Self::DataEntryMetadata,
	];

	pub const fn tag(self) -> &'static str {
		match self {
			Self::DataEntry => "data_entry_schema",
			Self::DatasetMetadata => "dataset_metadata_schema",
			Self::DataEntryMetadata => "data_entry_metadata_schema",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
	pub kind: SchemaKind,
	pub id: Option<i64>,
	pub version: Option<i64>,
	pub name: Option<String>,
	attrs: BTreeMap<String, AttributeDef>,
	/// Ids of the parent schemas.
	pub extends: Vec<i64>,
}

impl Schema {
	pub fn new(kind: SchemaKind) -> Self {
		Self {
			kind,
			..Default::default()
		}
	}

	pub fn data_entry(name: impl Into<String>) -> Self {
		Self::named(SchemaKind::DataEntry, name)
	}

	pub fn dataset_metadata(name: impl Into<String>) -> Self {
		Self::named(SchemaKind::DatasetMetadata, name)
	}

	pub fn data_entry_metadata(name: impl Into<String>) -> Self {
		Self::named(SchemaKind::DataEntryMetadata, name)
	}

	fn named(kind: SchemaKind, name: impl Into<String>) -> Self {
		Self {
			kind,
			name: Some(name.into()),
			..Default::default()
		}
	}

	/// The schema's own attributes, without anything inherited.
	pub fn attrs(&self) -> &BTreeMap<String, AttributeDef> {
		&self.attrs
	}

	pub fn attr(&self, name: &str) -> Option<&AttributeDef> {
		self.attrs.get(name)
	}

	/// Adds an attribute. Malformed and duplicate names are rejected.
	pub fn add_attr(&mut self, attr: AttributeDef) -> Result<()> {
		if !is_valid_attribute_name(&attr.name) {
			return Err(Error::invalid(
				"attrs",
				format!("'{}' is not a valid attribute name", attr.name),
			));
		}
		if self.attrs.contains_key(&attr.name) {
			return Err(Error::invalid(
				"attrs",
				format!("attribute '{}' is already defined", attr.name),
			));
		}

		self.attrs.insert(attr.name.clone(), attr);
		Ok(())
	}

	pub fn with_attr(mut self, attr: AttributeDef) -> Result<Self> {
		self.add_attr(attr)?;
		Ok(self)
	}

	/// Replaces every attribute. Nothing changes if the new set is rejected.
	pub fn set_attrs(&mut self, attrs: impl IntoIterator<Item = AttributeDef>) -> Result<()> {
		let mut replacement = Schema::new(self.kind);
		for attr in attrs {
			replacement.add_attr(attr)?;
		}
		self.attrs = replacement.attrs;
		Ok(())
	}

	pub fn remove_attr(&mut self, name: &str) -> Option<AttributeDef> {
		self.attrs.remove(name)
	}

	pub fn extend(&mut self, parent: i64) {
		self.extends.push(parent);
	}

	/// Computes the effective attribute set: own attributes plus those of every ancestor.
	///
	/// `lookup` resolves a parent id to its schema. Each ancestor is visited once even when it
	/// is reachable along several paths. An inheritance cycle, or an attribute name defined at
	/// more than one level, fails with [`Error::UnsupportedSchema`].
	pub fn compose(
		&self,
		mut lookup: impl FnMut(i64) -> Result<Schema>,
	) -> Result<BTreeMap<String, AttributeDef>> {
		let mut attrs = self.attrs.clone();
		let mut path: Vec<i64> = self.id.into_iter().collect();
		let mut visited = HashSet::new();

		compose_parents(
			&self.extends,
			&mut lookup,
			&mut path,
			&mut visited,
			&mut attrs,
		)?;

		Ok(attrs)
	}
}

fn compose_parents(
	parents: &[i64],
	lookup: &mut dyn FnMut(i64) -> Result<Schema>,
	path: &mut Vec<i64>,
	visited: &mut HashSet<i64>,
	attrs: &mut BTreeMap<String, AttributeDef>,
) -> Result<()> {
	for &id in parents {
		if path.contains(&id) {
			return Err(Error::UnsupportedSchema(format!(
				"schema {id} extends itself through {path:?}"
			)));
		}
		if !visited.insert(id) {
			continue;
		}

		let parent = lookup(id)?;
		debug!(schema_id = id, attrs = parent.attrs.len(), "Composing parent schema");

		for (name, attr) in &parent.attrs {
			if attrs.contains_key(name) {
				return Err(Error::UnsupportedSchema(format!(
					"attribute '{name}' of schema {id} is already defined"
				)));
			}
			attrs.insert(name.clone(), attr.clone());
		}

		path.push(id);
		compose_parents(&parent.extends, lookup, path, visited, attrs)?;
		path.pop();
	}

	Ok(())
}

impl DomainObject for Schema {
	fn class(&self) -> &'static str {
		self.kind.tag()
	}

	fn fields(&self) -> &'static [FieldSpec] {
		const FIELDS: &[FieldSpec] = &[
			FieldSpec {
				name: "id",
				kind: FieldKind::Integer,
			},
			FieldSpec {
				name: "version",
				kind: FieldKind::Integer,
			},
			FieldSpec {
				name: "name",
				kind: FieldKind::String,
			},
			FieldSpec {
				name: "extends",
				kind: FieldKind::List(&FieldKind::Integer),
			},
		];
		FIELDS
	}

	fn get_field(&self, name: &str) -> Option<Field> {
		match name {
			"id" => Some(self.id.to_field()),
			"version" => Some(self.version.to_field()),
			"name" => Some(self.name.to_field()),
			"extends" => Some(self.extends.to_field()),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Field) -> Result<()> {
		let class = self.kind.tag();
		let mismatch = |reason: String| field_error(class, name, reason);
		match name {
			"id" => self.id = FieldType::from_field(value).map_err(mismatch)?,
			"version" => self.version = FieldType::from_field(value).map_err(mismatch)?,
			"name" => self.name = FieldType::from_field(value).map_err(mismatch)?,
			"extends" => self.extends = FieldType::from_field(value).map_err(mismatch)?,
			_ => return Err(unknown_field(class, name, &value)),
		}
		Ok(())
	}

	fn validate(&self) -> Vec<ValidationError> {
		let mut errors: Vec<_> = self
			.attrs
			.values()
			.flat_map(|attr| attr.validate())
			.collect();
		if self.name.as_deref().map_or(true, str::is_empty) {
			errors.insert(0, ValidationError::new("name", "Schema name must be set"));
		}
		errors
	}

	fn as_schema(&self) -> Option<&Schema> {
		Some(self)
	}

	fn as_schema_mut(&mut self) -> Option<&mut Schema> {
		Some(self)
	}

	object_plumbing!();
}

/// Coerces a data bag to the attributes of an effective schema.
///
/// The bag is left untouched unless every value converts.
pub(crate) fn coerce_data(
	data: &mut BTreeMap<String, Field>,
	attrs: &BTreeMap<String, AttributeDef>,
) -> Result<()> {
	let mut coerced = BTreeMap::new();

	for (key, value) in data.iter() {
		let Some(attr) = attrs.get(key) else {
			return Err(Error::UnknownParameter {
				name: key.clone(),
				value: format!("{value:?}"),
			});
		};
		let value = coerce_value(attr.kind, value.clone())
			.ok_or_else(|| Error::invalid(key.clone(), format!("expected {}", attr.kind)))?;
		coerced.insert(key.clone(), value);
	}

	*data = coerced;
	Ok(())
}

fn coerce_value(kind: DataType, value: Field) -> Option<Field> {
	match (kind, value) {
		(_, Field::Null) => Some(Field::Null),
		(DataType::String, v @ Field::String(_)) => Some(v),
		(DataType::Integer, v @ Field::Integer(_)) => Some(v),
		(DataType::Integer, Field::String(s)) => s.trim().parse().ok().map(Field::Integer),
		(DataType::Double, Field::Integer(i)) => Some(Field::Double(i as f64)),
		(DataType::Double, v @ Field::Double(_)) => Some(v),
		(DataType::Double, Field::String(s)) => s.trim().parse().ok().map(Field::Double),
		(DataType::Boolean, v @ Field::Boolean(_)) => Some(v),
		(DataType::DateTime, v @ Field::DateTime(_)) => Some(v),
		(DataType::DateTime, Field::String(s)) => timestamp::parse(&s).ok().map(Field::DateTime),
		(DataType::File, Field::Object(o)) if o.as_any().is::<FileObject>() => {
			Some(Field::Object(o))
		}
		_ => None,
	}
}
