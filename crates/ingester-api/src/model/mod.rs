//! Domain model shared by the marshaller, the unit of work and the client.

use std::{any::Any, cell::RefCell, fmt, rc::Rc};

use crate::{
	error::{Error, ValidationError},
	schema::Schema,
	Result,
};

pub mod data_entry;
pub mod data_source;
pub mod dataset;
pub mod field;
pub mod location;
pub mod metadata;
pub mod sampling;
pub mod search;
pub mod system;

use field::{Field, FieldSpec};

/// A domain object held by the caller and by a unit of work at the same time.
pub type ObjectRef = Rc<RefCell<dyn DomainObject>>;

/// Wire tag of a concrete domain type.
pub trait WireClass {
	const CLASS: &'static str;
}

/// Client-side checks run before an object is queued for insert or update.
pub trait Validate {
	fn check(&self) -> Vec<ValidationError> {
		Vec::new()
	}
}

/// A marshallable domain object.
///
/// Objects expose their declared fields through [`FieldSpec`] tables and dynamic getters and
/// setters. Setters type check their input, so an object can never hold a value of the wrong
/// type, whether it was assigned by hand or rebuilt from the wire.
pub trait DomainObject: Any + fmt::Debug {
	/// Wire tag this object is emitted under.
	fn class(&self) -> &'static str;

	fn fields(&self) -> &'static [FieldSpec];

	fn get_field(&self, name: &str) -> Option<Field>;

	/// Assigns a declared field. Unknown names fail with [`Error::UnknownParameter`].
	fn set_field(&mut self, name: &str, value: Field) -> Result<()>;

	fn validate(&self) -> Vec<ValidationError>;

	fn clone_object(&self) -> Box<dyn DomainObject>;

	fn eq_object(&self, other: &dyn DomainObject) -> bool;

	fn as_any(&self) -> &dyn Any;

	fn as_any_mut(&mut self) -> &mut dyn Any;

	fn into_any(self: Box<Self>) -> Box<dyn Any>;

	fn into_shared(self: Box<Self>) -> ObjectRef;

	fn as_schema(&self) -> Option<&Schema> {
		None
	}

	fn as_schema_mut(&mut self) -> Option<&mut Schema> {
		None
	}

	fn id(&self) -> Option<i64> {
		self.get_field("id").and_then(|f| f.as_i64())
	}

	fn set_id(&mut self, id: Option<i64>) -> Result<()> {
		self.set_field("id", id.map_or(Field::Null, Field::Integer))
	}

	fn has_field(&self, name: &str) -> bool {
		self.fields().iter().any(|f| f.name == name)
	}
}

impl Clone for Box<dyn DomainObject> {
	fn clone(&self) -> Self {
		self.clone_object()
	}
}

impl PartialEq for Box<dyn DomainObject> {
	fn eq(&self, other: &Self) -> bool {
		self.eq_object(other.as_ref())
	}
}

impl dyn DomainObject {
	pub fn downcast_ref<T: DomainObject>(&self) -> Option<&T> {
		self.as_any().downcast_ref::<T>()
	}

	pub fn downcast_mut<T: DomainObject>(&mut self) -> Option<&mut T> {
		self.as_any_mut().downcast_mut::<T>()
	}
}

/// Wraps a domain object so that the caller and a unit of work share it.
pub fn shared<T: DomainObject>(obj: T) -> Rc<RefCell<T>> {
	Rc::new(RefCell::new(obj))
}

pub(crate) fn field_error(class: &str, field: &str, reason: impl Into<String>) -> Error {
	crate::error::MarshalError::Field {
		class: class.to_string(),
		field: field.to_string(),
		reason: reason.into(),
	}
	.into()
}

pub(crate) fn unknown_field(class: &str, name: &str, value: &Field) -> Error {
	Error::UnknownParameter {
		name: format!("{class}.{name}"),
		value: format!("{value:?}"),
	}
}

/// The methods of [`DomainObject`] that only depend on `Self` being a sized, cloneable,
/// comparable type.
macro_rules! object_plumbing {
	() => {
		fn clone_object(&self) -> Box<dyn $crate::model::DomainObject> {
			Box::new(self.clone())
		}

		fn eq_object(&self, other: &dyn $crate::model::DomainObject) -> bool {
			other
				.as_any()
				.downcast_ref::<Self>()
				.map_or(false, |other| self == other)
		}

		fn as_any(&self) -> &dyn ::std::any::Any {
			self
		}

		fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
			self
		}

		fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
			self
		}

		fn into_shared(self: Box<Self>) -> $crate::model::ObjectRef {
			::std::rc::Rc::new(::std::cell::RefCell::new(*self))
		}
	};
}

pub(crate) use object_plumbing;

/// Declares a domain struct together with its wire tag and typed field table.
///
/// ```ignore
/// domain_object! {
///     /// A 3D offset from a location.
///     pub struct LocationOffset: "location_offset" {
///         pub x: f64,
///         pub y: f64,
///         pub z: f64,
///     }
/// }
/// ```
///
/// The struct also needs a [`Validate`] impl, which may be empty.
macro_rules! domain_object {
	(
		$(#[$meta:meta])*
		pub struct $name:ident : $tag:literal {
			$(
				$(#[$fmeta:meta])*
				pub $field:ident : $ty:ty
			),* $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Default)]
		pub struct $name {
			$(
				$(#[$fmeta])*
				pub $field: $ty,
			)*
		}

		impl $crate::model::WireClass for $name {
			const CLASS: &'static str = $tag;
		}

		impl $crate::model::DomainObject for $name {
			fn class(&self) -> &'static str {
				$tag
			}

			fn fields(&self) -> &'static [$crate::model::field::FieldSpec] {
				const FIELDS: &[$crate::model::field::FieldSpec] = &[
					$(
						$crate::model::field::FieldSpec {
							name: stringify!($field),
							kind: <$ty as $crate::model::field::FieldType>::KIND,
						},
					)*
				];
				FIELDS
			}

			fn get_field(&self, name: &str) -> Option<$crate::model::field::Field> {
				match name {
					$(
						stringify!($field) => {
							Some($crate::model::field::FieldType::to_field(&self.$field))
						}
					)*
					_ => None,
				}
			}

			#[allow(unused_variables)]
			fn set_field(
				&mut self,
				name: &str,
				value: $crate::model::field::Field,
			) -> $crate::Result<()> {
				match name {
					$(
						stringify!($field) => {
							self.$field = <$ty as $crate::model::field::FieldType>::from_field(value)
								.map_err(|reason| $crate::model::field_error($tag, name, reason))?;
							Ok(())
						}
					)*
					_ => Err($crate::model::unknown_field($tag, name, &value)),
				}
			}

			fn validate(&self) -> Vec<$crate::error::ValidationError> {
				$crate::model::Validate::check(self)
			}

			$crate::model::object_plumbing!();
		}
	};
}

pub(crate) use domain_object;

/// Adds `name -> value` access to an object carrying a dynamic `data` bag.
macro_rules! data_bag {
	($name:ident) => {
		impl $name {
			/// Sets a value in the dynamic data bag, returning the previous value.
			pub fn set(
				&mut self,
				key: impl Into<String>,
				value: impl Into<$crate::model::field::Field>,
			) -> Option<$crate::model::field::Field> {
				self.data.insert(key.into(), value.into())
			}

			pub fn get(&self, key: &str) -> Option<&$crate::model::field::Field> {
				self.data.get(key)
			}

			/// Coerces the data bag to the attributes of an effective schema.
			pub fn apply_schema(
				&mut self,
				attrs: &::std::collections::BTreeMap<String, $crate::schema::AttributeDef>,
			) -> $crate::Result<()> {
				$crate::schema::coerce_data(&mut self.data, attrs)
			}
		}

		impl ::std::ops::Index<&str> for $name {
			type Output = $crate::model::field::Field;

			fn index(&self, key: &str) -> &Self::Output {
				&self.data[key]
			}
		}
	};
}

pub(crate) use data_bag;
