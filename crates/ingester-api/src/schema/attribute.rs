use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
	error::ValidationError,
	model::{
		field::{Field, FieldKind, FieldSpec, FieldType},
		field_error, object_plumbing, unknown_field, DomainObject,
	},
	Result,
};

static ATTRIBUTE_NAME: Lazy<Regex> =
	Lazy::new(|| Regex::new("^[A-Za-z][A-Za-z0-9]*$").expect("attribute name pattern is valid"));

/// Whether `name` is an acceptable attribute name: a letter followed by letters or digits.
pub fn is_valid_attribute_name(name: &str) -> bool {
	ATTRIBUTE_NAME.is_match(name)
}

/// Value type of a schema attribute. Doubles as the attribute's wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
	#[default]
	String,
	Integer,
	Double,
	DateTime,
	Boolean,
	File,
}

impl DataType {
	pub const ALL: [DataType; 6] = [
		Self::String,
		Self::Integer,
		Self::Double,
		Self::DateTime,
		Self::Boolean,
		Self::File,
	];

	pub const fn tag(self) -> &'static str {
		match self {
			Self::String => "string",
			Self::Integer => "integer",
			Self::Double => "double",
			Self::DateTime => "datetime",
			Self::Boolean => "boolean",
			Self::File => "file",
		}
	}

	pub fn from_tag(tag: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|t| t.tag() == tag)
	}
}

impl fmt::Display for DataType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag())
	}
}

/// A single named, typed attribute of a schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeDef {
	pub kind: DataType,
	pub name: String,
	pub description: Option<String>,
	pub units: Option<String>,
}

impl AttributeDef {
	pub fn new(kind: DataType, name: impl Into<String>) -> Self {
		Self {
			kind,
			name: name.into(),
			description: None,
			units: None,
		}
	}

	pub fn string(name: impl Into<String>) -> Self {
		Self::new(DataType::String, name)
	}

	pub fn integer(name: impl Into<String>) -> Self {
		Self::new(DataType::Integer, name)
	}

	pub fn double(name: impl Into<String>) -> Self {
		Self::new(DataType::Double, name)
	}

	pub fn datetime(name: impl Into<String>) -> Self {
		Self::new(DataType::DateTime, name)
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::new(DataType::Boolean, name)
	}

	pub fn file(name: impl Into<String>) -> Self {
		Self::new(DataType::File, name)
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_units(mut self, units: impl Into<String>) -> Self {
		self.units = Some(units.into());
		self
	}
}

impl DomainObject for AttributeDef {
	fn class(&self) -> &'static str {
		self.kind.tag()
	}

	fn fields(&self) -> &'static [FieldSpec] {
		const FIELDS: &[FieldSpec] = &[
			FieldSpec {
				name: "name",
				kind: FieldKind::String,
			},
			FieldSpec {
				name: "description",
				kind: FieldKind::String,
			},
			FieldSpec {
				name: "units",
				kind: FieldKind::String,
			},
		];
		FIELDS
	}

	fn get_field(&self, name: &str) -> Option<Field> {
		match name {
			"name" => Some(self.name.to_field()),
			"description" => Some(self.description.to_field()),
			"units" => Some(self.units.to_field()),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Field) -> Result<()> {
		let class = self.kind.tag();
		let convert = |value| {
			Option::<String>::from_field(value).map_err(|reason| field_error(class, name, reason))
		};
		match name {
			"name" => self.name = convert(value)?.unwrap_or_default(),
			"description" => self.description = convert(value)?,
			"units" => self.units = convert(value)?,
			_ => return Err(unknown_field(class, name, &value)),
		}
		Ok(())
	}

	fn validate(&self) -> Vec<ValidationError> {
		if is_valid_attribute_name(&self.name) {
			Vec::new()
		} else {
			vec![ValidationError::new(
				"name",
				format!("'{}' is not a valid attribute name", self.name),
			)]
		}
	}

	object_plumbing!();
}
