//! Data entries and the file values they can carry.

use std::{
	cell::RefCell,
	collections::BTreeMap,
	fmt, fs,
	io::Read,
	path::{Path, PathBuf},
	rc::Rc,
};

use chrono::{DateTime, Utc};

use crate::{error::ValidationError, Result};

use super::{
	data_bag, domain_object,
	field::{Field, FieldKind, FieldSpec, FieldType},
	field_error,
	location::LocationOffset,
	object_plumbing, unknown_field, DomainObject, Validate, WireClass,
};

domain_object! {
	/// One timestamped sample of a dataset. Values live in the dynamic `data` bag and are
	/// shaped by the dataset's schema.
	pub struct DataEntry: "data_entry" {
		pub id: Option<i64>,
		pub version: Option<i64>,
		pub dataset: Option<i64>,
		pub timestamp: Option<DateTime<Utc>>,
		pub location_offset: Option<LocationOffset>,
		pub data: BTreeMap<String, Field>,
	}
}

data_bag!(DataEntry);

impl DataEntry {
	pub fn new(dataset: i64, timestamp: DateTime<Utc>) -> Self {
		Self {
			dataset: Some(dataset),
			timestamp: Some(timestamp),
			..Default::default()
		}
	}
}

impl Validate for DataEntry {
	fn check(&self) -> Vec<ValidationError> {
		if self.dataset.is_none() {
			vec![ValidationError::new("dataset", "Dataset must be set")]
		} else {
			Vec::new()
		}
	}
}

/// An in-memory byte source attached to a [`FileObject`].
#[derive(Clone)]
pub struct FileStream(Rc<RefCell<Box<dyn Read>>>);

impl FileStream {
	pub fn new(reader: impl Read + 'static) -> Self {
		Self(Rc::new(RefCell::new(Box::new(reader))))
	}

	fn read_to_end(&self) -> Result<Vec<u8>> {
		let mut buf = Vec::new();
		self.0.borrow_mut().read_to_end(&mut buf)?;
		Ok(buf)
	}
}

impl fmt::Debug for FileStream {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("FileStream(..)")
	}
}

impl PartialEq for FileStream {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

/// A file value stored in a data entry or metadata field.
///
/// The contents are uploaded out of band while a unit of work commits. They come either from
/// `f_path` on the local filesystem or from an in-memory stream, never both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileObject {
	pub mime_type: Option<String>,
	pub f_path: Option<String>,
	stream: Option<FileStream>,
}

impl FileObject {
	pub fn from_path(path: impl AsRef<Path>, mime_type: impl Into<String>) -> Self {
		Self {
			mime_type: Some(mime_type.into()),
			f_path: Some(path.as_ref().to_string_lossy().into_owned()),
			stream: None,
		}
	}

	pub fn from_reader(reader: impl Read + 'static, mime_type: impl Into<String>) -> Self {
		Self {
			mime_type: Some(mime_type.into()),
			f_path: None,
			stream: Some(FileStream::new(reader)),
		}
	}

	pub fn path(&self) -> Option<PathBuf> {
		self.f_path.as_ref().map(PathBuf::from)
	}

	pub fn has_stream(&self) -> bool {
		self.stream.is_some()
	}

	/// Reads the whole file, draining the stream if there is one.
	///
	/// Path backed files are opened for the duration of the call only.
	pub fn read_contents(&self) -> Result<Vec<u8>> {
		if let Some(stream) = &self.stream {
			return stream.read_to_end();
		}

		match &self.f_path {
			Some(path) => Ok(fs::read(path)?),
			None => Err(crate::Error::invalid("f_path", "File has neither a path nor a stream")),
		}
	}
}

impl WireClass for FileObject {
	const CLASS: &'static str = "file_object";
}

impl Validate for FileObject {
	fn check(&self) -> Vec<ValidationError> {
		if self.f_path.is_none() && self.stream.is_none() {
			vec![ValidationError::new("f_path", "File has neither a path nor a stream")]
		} else {
			Vec::new()
		}
	}
}

impl DomainObject for FileObject {
	fn class(&self) -> &'static str {
		Self::CLASS
	}

	fn fields(&self) -> &'static [FieldSpec] {
		const FIELDS: &[FieldSpec] = &[
			FieldSpec {
				name: "mime_type",
				kind: FieldKind::String,
			},
			FieldSpec {
				name: "f_path",
				kind: FieldKind::String,
			},
		];
		FIELDS
	}

	fn get_field(&self, name: &str) -> Option<Field> {
		match name {
			"mime_type" => Some(self.mime_type.to_field()),
			"f_path" => Some(self.f_path.to_field()),
			_ => None,
		}
	}

	fn set_field(&mut self, name: &str, value: Field) -> Result<()> {
		let slot = match name {
			"mime_type" => &mut self.mime_type,
			"f_path" => &mut self.f_path,
			_ => return Err(unknown_field(Self::CLASS, name, &value)),
		};
		*slot = Option::<String>::from_field(value)
			.map_err(|reason| field_error(Self::CLASS, name, reason))?;

		// A path supplied later, typically by the platform, replaces the local stream.
		if name == "f_path" && self.f_path.is_some() {
			self.stream = None;
		}
		Ok(())
	}

	fn validate(&self) -> Vec<ValidationError> {
		self.check()
	}

	object_plumbing!();
}

#[cfg(test)]
mod tests {
	use std::io::{Cursor, Write};

	use super::*;

	#[test]
	fn data_bag_access() {
		let mut entry = DataEntry::new(1, Utc::now());
		entry.set("a", 1.5);
		entry.set("b", "text");

		assert_eq!(entry["a"], Field::Double(1.5));
		assert_eq!(entry.get("b").and_then(Field::as_str), Some("text"));
		assert_eq!(entry.get("c"), None);
	}

	#[test]
	fn streams_are_read_once() {
		let file = FileObject::from_reader(Cursor::new(b"1,2,3".to_vec()), "text/csv");
		assert!(file.has_stream());
		assert_eq!(file.get_field("f_path"), Some(Field::Null));

		assert_eq!(file.read_contents().unwrap(), b"1,2,3");
		assert!(file.read_contents().unwrap().is_empty());
	}

	#[test]
	fn path_backed_files_are_read_from_disk() {
		let mut tmp = tempfile::NamedTempFile::new().unwrap();
		tmp.write_all(b"payload").unwrap();

		let file = FileObject::from_path(tmp.path(), "application/octet-stream");
		assert!(!file.has_stream());
		assert_eq!(file.read_contents().unwrap(), b"payload");
	}

	#[test]
	fn cloned_files_share_their_stream() {
		let file = FileObject::from_reader(Cursor::new(Vec::new()), "text/plain");
		assert_eq!(file.clone(), file);
		assert_ne!(
			FileObject::from_reader(Cursor::new(Vec::new()), "text/plain"),
			file
		);
	}

	#[test]
	fn assigning_a_path_drops_the_stream() {
		let mut file = FileObject::from_reader(Cursor::new(Vec::new()), "text/plain");
		file.set_field("f_path", Field::String("/srv/data/1".into()))
			.unwrap();
		assert!(!file.has_stream());
	}
}
