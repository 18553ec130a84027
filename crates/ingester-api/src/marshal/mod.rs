//! Transcoding between domain objects and wire trees.
//!
//! Every object node on the wire is a JSON map carrying a `class` entry that names a registered
//! [`DomainObject`] class, plus one entry per declared field. Data bags are plain maps without a
//! `class`. Schemas also carry their own attributes as an `attributes` list.

use serde_json::{Map, Value};
use tracing::trace;

use crate::{
	error::MarshalError,
	model::{
		field::{Field, FieldKind},
		DomainObject,
	},
	schema::AttributeDef,
	Result,
};

mod registry;
pub mod timestamp;

pub use registry::{Factory, Registry};

const CLASS_KEY: &str = "class";
const ATTRIBUTES_KEY: &str = "attributes";

/// Converts domain objects to and from wire trees, using a [`Registry`] to resolve wire tags.
#[derive(Clone, Copy)]
pub struct Marshaller<'r> {
	registry: &'r Registry,
}

impl Default for Marshaller<'static> {
	fn default() -> Self {
		Self::new(Registry::builtin())
	}
}

impl<'r> Marshaller<'r> {
	pub fn new(registry: &'r Registry) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &'r Registry {
		self.registry
	}

	pub fn to_wire(&self, value: &Field) -> Result<Value> {
		self.to_wire_with(value, &[])
	}

	/// Like [`to_wire`](Self::to_wire), but adds `special_attrs` to the top level object node,
	/// or to every object of a top level list.
	pub fn to_wire_with(&self, value: &Field, special_attrs: &[(&str, Value)]) -> Result<Value> {
		Ok(match value {
			Field::Null => Value::Null,
			Field::Boolean(b) => Value::Bool(*b),
			Field::Integer(i) => Value::from(*i),
			// JSON has no NaN or infinity.
			Field::Double(d) if !d.is_finite() => {
				return Err(MarshalError::UnsupportedType(format!("non-finite double {d}")).into())
			}
			Field::Double(d) => Value::from(*d),
			Field::String(s) => Value::String(s.clone()),
			Field::DateTime(dt) => Value::String(timestamp::format(dt)),
			Field::List(items) => Value::Array(
				items
					.iter()
					.map(|item| self.to_wire_with(item, special_attrs))
					.collect::<Result<_>>()?,
			),
			Field::Data(data) => Value::Object(
				data.iter()
					.map(|(k, v)| self.to_wire(v).map(|v| (k.clone(), v)))
					.collect::<Result<_>>()?,
			),
			Field::Object(obj) => self.object_to_wire_with(obj.as_ref(), special_attrs)?,
		})
	}

	pub fn object_to_wire(&self, obj: &dyn DomainObject) -> Result<Value> {
		self.object_to_wire_with(obj, &[])
	}

	pub fn object_to_wire_with(
		&self,
		obj: &dyn DomainObject,
		special_attrs: &[(&str, Value)],
	) -> Result<Value> {
		let class = obj.class();
		if !self.registry.contains(class) {
			return Err(MarshalError::UnsupportedType(class.to_string()).into());
		}

		let mut node = Map::new();
		for spec in obj.fields() {
			let value = obj.get_field(spec.name).unwrap_or(Field::Null);
			node.insert(spec.name.to_string(), self.to_wire(&value)?);
		}

		if let Some(schema) = obj.as_schema() {
			let attributes = schema
				.attrs()
				.values()
				.map(|attr| self.object_to_wire(attr))
				.collect::<Result<_>>()?;
			node.insert(ATTRIBUTES_KEY.to_string(), Value::Array(attributes));
		}

		node.insert(CLASS_KEY.to_string(), Value::String(class.to_string()));
		for (key, value) in special_attrs {
			node.insert((*key).to_string(), value.clone());
		}

		Ok(Value::Object(node))
	}

	/// Decodes a wire tree without any field type to guide it.
	///
	/// Maps must be object nodes; strings are left as strings, even if they look like
	/// timestamps.
	pub fn to_object(&self, value: &Value) -> Result<Field> {
		Ok(match value {
			Value::Null => Field::Null,
			Value::Bool(b) => Field::Boolean(*b),
			Value::Number(n) => match n.as_i64() {
				Some(i) => Field::Integer(i),
				None => Field::Double(n.as_f64().unwrap_or(f64::NAN)),
			},
			Value::String(s) => Field::String(s.clone()),
			Value::Array(items) => Field::List(
				items
					.iter()
					.map(|item| self.to_object(item))
					.collect::<Result<_>>()?,
			),
			Value::Object(_) => Field::Object(self.object_from_wire(value)?),
		})
	}

	/// Builds a new object from an object node, dispatching on its `class`.
	pub fn object_from_wire(&self, value: &Value) -> Result<Box<dyn DomainObject>> {
		let (class, node) = object_node(value)?;
		let mut obj = self.registry.class_for(class)?;
		self.patch_node(node, obj.as_mut())?;
		Ok(obj)
	}

	/// Builds an object of a known concrete type.
	pub fn decode<T: DomainObject>(&self, value: &Value) -> Result<T> {
		let obj = self.object_from_wire(value)?;
		let class = obj.class();
		obj.into_any().downcast::<T>().map(|obj| *obj).map_err(|_| {
			MarshalError::MalformedWireData(format!(
				"expected {}, found '{class}'",
				std::any::type_name::<T>()
			))
			.into()
		})
	}

	/// Like [`decode`](Self::decode), mapping a null node to `None`.
	pub fn decode_optional<T: DomainObject>(&self, value: &Value) -> Result<Option<T>> {
		match value {
			Value::Null => Ok(None),
			value => self.decode(value).map(Some),
		}
	}

	/// Applies an object node onto an existing object of the same class, in place.
	///
	/// Returns the names of the fields that were assigned.
	pub fn patch(&self, value: &Value, target: &mut dyn DomainObject) -> Result<Vec<&'static str>> {
		let (class, node) = object_node(value)?;
		if class != target.class() {
			return Err(MarshalError::MalformedWireData(format!(
				"cannot apply '{class}' onto '{}'",
				target.class()
			))
			.into());
		}
		self.patch_node(node, target)
	}

	fn patch_node(
		&self,
		node: &Map<String, Value>,
		target: &mut dyn DomainObject,
	) -> Result<Vec<&'static str>> {
		let mut applied = Vec::new();

		for (key, value) in node {
			if key == CLASS_KEY {
				continue;
			}

			if key == ATTRIBUTES_KEY && target.as_schema().is_some() {
				let attrs = self.decode_attributes(value)?;
				if let Some(schema) = target.as_schema_mut() {
					schema.set_attrs(attrs)?;
				}
				applied.push(ATTRIBUTES_KEY);
				continue;
			}

			let Some(spec) = target.fields().iter().find(|spec| spec.name == key) else {
				trace!(class = target.class(), key = %key, "Ignoring unknown wire field");
				continue;
			};

			let field = self.decode_field(spec.kind, value)?;
			target.set_field(spec.name, field)?;
			applied.push(spec.name);
		}

		Ok(applied)
	}

	fn decode_field(&self, kind: FieldKind, value: &Value) -> Result<Field> {
		match (kind, value) {
			(_, Value::Null) => Ok(Field::Null),
			(FieldKind::Data, Value::Object(map)) => Ok(Field::Data(
				map.iter()
					.map(|(k, v)| self.to_object(v).map(|v| (k.clone(), v)))
					.collect::<Result<_>>()?,
			)),
			(_, Value::Object(_)) => Ok(Field::Object(self.object_from_wire(value)?)),
			(FieldKind::DateTime, Value::String(s)) => Ok(Field::DateTime(timestamp::parse(s)?)),
			(FieldKind::List(element), Value::Array(items)) => Ok(Field::List(
				items
					.iter()
					.map(|item| self.decode_field(*element, item))
					.collect::<Result<_>>()?,
			)),
			_ => self.to_object(value),
		}
	}

	fn decode_attributes(&self, value: &Value) -> Result<Vec<AttributeDef>> {
		let Value::Array(items) = value else {
			return Err(MarshalError::MalformedWireData(format!(
				"'{ATTRIBUTES_KEY}' must be a list"
			))
			.into());
		};

		items
			.iter()
			.map(|item| -> Result<AttributeDef> {
				let attr = self.object_from_wire(item)?;
				let class = attr.class();
				attr.into_any()
					.downcast::<AttributeDef>()
					.map(|attr| *attr)
					.map_err(|_| MarshalError::UnsupportedType(class.to_string()).into())
			})
			.collect()
	}
}

fn object_node(value: &Value) -> Result<(&str, &Map<String, Value>)> {
	let Value::Object(node) = value else {
		return Err(MarshalError::MalformedWireData(format!("expected an object, found {value}")).into());
	};

	match node.get(CLASS_KEY) {
		Some(Value::String(class)) => Ok((class.as_str(), node)),
		_ => Err(MarshalError::MalformedWireData(format!(
			"object has no '{CLASS_KEY}' entry: {value}"
		))
		.into()),
	}
}
