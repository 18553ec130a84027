use crate::error::ValidationError;

use super::{domain_object, field::object_field, Validate};

domain_object! {
	/// A named geographic area bounded by a polygon of `(latitude, longitude)` points.
	pub struct Region: "region" {
		pub id: Option<i64>,
		pub version: Option<i64>,
		pub name: Option<String>,
		pub region_points: Vec<(f64, f64)>,
		/// Id of the enclosing region, if any.
		pub parent_region: Option<i64>,
	}
}

impl Region {
	pub fn new(name: impl Into<String>, region_points: Vec<(f64, f64)>) -> Self {
		Self {
			name: Some(name.into()),
			region_points,
			..Default::default()
		}
	}
}

impl Validate for Region {
	fn check(&self) -> Vec<ValidationError> {
		match self.name.as_deref() {
			Some(name) if !name.is_empty() => Vec::new(),
			_ => vec![ValidationError::new("name", "Region name must be set")],
		}
	}
}

domain_object! {
	/// A sensor site.
	pub struct Location: "location" {
		pub id: Option<i64>,
		pub version: Option<i64>,
		pub latitude: Option<f64>,
		pub longitude: Option<f64>,
		pub name: Option<String>,
		pub elevation: Option<f64>,
		pub region: Option<i64>,
	}
}

impl Location {
	pub fn new(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
		Self {
			latitude: Some(latitude),
			longitude: Some(longitude),
			name: Some(name.into()),
			..Default::default()
		}
	}

	pub fn with_elevation(mut self, elevation: f64) -> Self {
		self.elevation = Some(elevation);
		self
	}
}

impl Validate for Location {
	fn check(&self) -> Vec<ValidationError> {
		match self.name.as_deref() {
			Some(name) if !name.is_empty() => Vec::new(),
			_ => vec![ValidationError::new("name", "Location name must be set")],
		}
	}
}

domain_object! {
	/// Offset of a sensor from its location, in metres.
	pub struct LocationOffset: "location_offset" {
		pub x: Option<f64>,
		pub y: Option<f64>,
		pub z: Option<f64>,
	}
}

impl LocationOffset {
	pub fn new(x: f64, y: f64, z: f64) -> Self {
		Self {
			x: Some(x),
			y: Some(y),
			z: Some(z),
		}
	}
}

impl Validate for LocationOffset {}

object_field!(LocationOffset);
