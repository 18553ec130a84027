//! Typed field descriptors and the dynamic value used to move field contents in and out of
//! domain objects.
//!
//! Every domain object publishes a static table of [`FieldSpec`]s. The marshaller relies on each
//! spec's [`FieldKind`] to tell datetime strings apart from plain strings, and data bags apart
//! from nested objects, when it rebuilds an object from the wire.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::DomainObject;

/// Accepted value type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	Integer,
	Double,
	String,
	Boolean,
	DateTime,
	/// A nested registered object, dispatched on its wire tag.
	Object,
	/// A dynamically typed `name -> value` bag; each value is decoded on its own.
	Data,
	List(&'static FieldKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
	pub name: &'static str,
	pub kind: FieldKind,
}

/// A field value detached from its owning object.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
	Null,
	Boolean(bool),
	Integer(i64),
	Double(f64),
	String(String),
	DateTime(DateTime<Utc>),
	List(Vec<Field>),
	Data(BTreeMap<String, Field>),
	Object(Box<dyn DomainObject>),
}

impl Field {
	pub fn object(o: impl DomainObject) -> Self {
		Self::Object(Box::new(o))
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Double(d) => Some(*d),
			Self::Integer(i) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&dyn DomainObject> {
		match self {
			Self::Object(o) => Some(o.as_ref()),
			_ => None,
		}
	}

	/// Downcasts a nested object to a concrete domain type.
	pub fn downcast_ref<T: DomainObject>(&self) -> Option<&T> {
		self.as_object().and_then(|o| o.as_any().downcast_ref::<T>())
	}

	pub(crate) fn describe(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Boolean(_) => "boolean",
			Self::Integer(_) => "integer",
			Self::Double(_) => "double",
			Self::String(_) => "string",
			Self::DateTime(_) => "datetime",
			Self::List(_) => "list",
			Self::Data(_) => "data",
			Self::Object(_) => "object",
		}
	}
}

impl From<bool> for Field {
	fn from(v: bool) -> Self {
		Self::Boolean(v)
	}
}

impl From<i64> for Field {
	fn from(v: i64) -> Self {
		Self::Integer(v)
	}
}

impl From<i32> for Field {
	fn from(v: i32) -> Self {
		Self::Integer(v.into())
	}
}

impl From<f64> for Field {
	fn from(v: f64) -> Self {
		Self::Double(v)
	}
}

impl From<&str> for Field {
	fn from(v: &str) -> Self {
		Self::String(v.to_string())
	}
}

impl From<String> for Field {
	fn from(v: String) -> Self {
		Self::String(v)
	}
}

impl From<DateTime<Utc>> for Field {
	fn from(v: DateTime<Utc>) -> Self {
		Self::DateTime(v)
	}
}

/// Conversion between a Rust field type and [`Field`], plus the kind it declares.
///
/// Plain `bool`, `i64` and `f64` fields take their default value from [`Field::Null`], so an
/// object node with a `null` flag or counter still decodes.
pub trait FieldType: Sized {
	const KIND: FieldKind;

	fn to_field(&self) -> Field;

	/// Converts back, returning a description of the mismatch on failure.
	fn from_field(field: Field) -> Result<Self, String>;
}

fn mismatch(expected: &str, found: &Field) -> String {
	format!("expected {expected}, found {}", found.describe())
}

impl FieldType for i64 {
	const KIND: FieldKind = FieldKind::Integer;

	fn to_field(&self) -> Field {
		Field::Integer(*self)
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::Integer(i) => Ok(i),
			Field::Null => Ok(0),
			other => Err(mismatch("integer", &other)),
		}
	}
}

impl FieldType for f64 {
	const KIND: FieldKind = FieldKind::Double;

	fn to_field(&self) -> Field {
		Field::Double(*self)
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::Null => Ok(0.0),
			other => other.as_f64().ok_or_else(|| mismatch("double", &other)),
		}
	}
}

impl FieldType for bool {
	const KIND: FieldKind = FieldKind::Boolean;

	fn to_field(&self) -> Field {
		Field::Boolean(*self)
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::Boolean(b) => Ok(b),
			Field::Null => Ok(false),
			other => Err(mismatch("boolean", &other)),
		}
	}
}

impl FieldType for String {
	const KIND: FieldKind = FieldKind::String;

	fn to_field(&self) -> Field {
		Field::String(self.clone())
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::String(s) => Ok(s),
			other => Err(mismatch("string", &other)),
		}
	}
}

impl FieldType for DateTime<Utc> {
	const KIND: FieldKind = FieldKind::DateTime;

	fn to_field(&self) -> Field {
		Field::DateTime(*self)
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::DateTime(dt) => Ok(dt),
			other => Err(mismatch("datetime", &other)),
		}
	}
}

impl<T: FieldType> FieldType for Option<T> {
	const KIND: FieldKind = T::KIND;

	fn to_field(&self) -> Field {
		self.as_ref().map_or(Field::Null, FieldType::to_field)
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::Null => Ok(None),
			other => T::from_field(other).map(Some),
		}
	}
}

impl<T: FieldType> FieldType for Vec<T> {
	const KIND: FieldKind = FieldKind::List(&T::KIND);

	fn to_field(&self) -> Field {
		Field::List(self.iter().map(FieldType::to_field).collect())
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			// A missing list is an empty list.
			Field::Null => Ok(Vec::new()),
			Field::List(items) => items.into_iter().map(T::from_field).collect(),
			other => Err(mismatch("list", &other)),
		}
	}
}

/// Latitude/longitude pairs travel as two element lists.
impl FieldType for (f64, f64) {
	const KIND: FieldKind = FieldKind::List(&FieldKind::Double);

	fn to_field(&self) -> Field {
		Field::List(vec![Field::Double(self.0), Field::Double(self.1)])
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::List(items) if items.len() == 2 => {
				match (items[0].as_f64(), items[1].as_f64()) {
					(Some(a), Some(b)) => Ok((a, b)),
					_ => Err("expected a pair of numbers".to_string()),
				}
			}
			other => Err(mismatch("pair", &other)),
		}
	}
}

impl FieldType for BTreeMap<String, Field> {
	const KIND: FieldKind = FieldKind::Data;

	fn to_field(&self) -> Field {
		Field::Data(self.clone())
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::Null => Ok(BTreeMap::new()),
			Field::Data(data) => Ok(data),
			other => Err(mismatch("data", &other)),
		}
	}
}

impl FieldType for Box<dyn DomainObject> {
	const KIND: FieldKind = FieldKind::Object;

	fn to_field(&self) -> Field {
		Field::Object(self.clone())
	}

	fn from_field(field: Field) -> Result<Self, String> {
		match field {
			Field::Object(o) => Ok(o),
			other => Err(mismatch("object", &other)),
		}
	}
}

/// Implements [`FieldType`] for a concrete domain object nested inside another object.
macro_rules! object_field {
	($ty:ty) => {
		impl $crate::model::field::FieldType for $ty {
			const KIND: $crate::model::field::FieldKind = $crate::model::field::FieldKind::Object;

			fn to_field(&self) -> $crate::model::field::Field {
				$crate::model::field::Field::Object(Box::new(self.clone()))
			}

			fn from_field(field: $crate::model::field::Field) -> Result<Self, String> {
				match field {
					$crate::model::field::Field::Object(o) => {
						let class = $crate::model::DomainObject::class(&*o);
						$crate::model::DomainObject::into_any(o)
							.downcast::<$ty>()
							.map(|b| *b)
							.map_err(|_| {
								format!(
									"expected {}, found '{}'",
									<$ty as $crate::model::WireClass>::CLASS,
									class
								)
							})
					}
					other => Err(format!("expected object, found {}", other.describe())),
				}
			}
		}
	};
}

pub(crate) use object_field;
