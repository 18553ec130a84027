use chrono::{DateTime, Utc};

use super::{domain_object, Validate};

domain_object! {
	/// A log line emitted by the platform while ingesting a dataset.
	pub struct IngesterLog: "ingester_log" {
		pub id: Option<i64>,
		pub dataset_id: Option<i64>,
		pub timestamp: Option<DateTime<Utc>>,
		pub level: Option<String>,
		pub message: Option<String>,
	}
}

impl Validate for IngesterLog {}
