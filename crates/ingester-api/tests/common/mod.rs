#![allow(dead_code)]

use std::{
	cell::{Cell, RefCell},
	collections::{BTreeMap, HashMap},
};

use ingester_api::{client::fault, Error, Result, Transport};
use serde_json::{json, Value};

/// Fields that may hold a placeholder id the platform has to resolve on commit.
const REFERENCES: [&str; 5] = ["location", "schema", "dataset", "object_id", "metadata_schema"];

/// An in-memory platform that records every call and stores committed objects.
#[derive(Default)]
pub struct FakePlatform {
	pub calls: RefCell<Vec<(String, Vec<Value>)>>,
	pub uploads: RefCell<Vec<(String, Vec<u8>)>>,
	pub files: RefCell<HashMap<String, Vec<u8>>>,
	pub store: RefCell<BTreeMap<i64, Value>>,
	/// Status returned by every upload, success when unset.
	pub upload_status: Cell<Option<u16>>,
	/// Faults returned by method name.
	pub faults: RefCell<HashMap<String, (i64, String)>>,
	/// Transaction ids are handed out as integers when set.
	pub numeric_transactions: Cell<bool>,
	staged: RefCell<Option<Value>>,
	next_id: Cell<i64>,
}

impl FakePlatform {
	pub fn new() -> Self {
		let platform = Self::default();
		platform.next_id.set(100);
		platform
	}

	pub fn fail(&self, method: &str, code: i64, message: &str) {
		self.faults
			.borrow_mut()
			.insert(method.to_string(), (code, message.to_string()));
	}

	pub fn methods(&self) -> Vec<String> {
		self.calls.borrow().iter().map(|(m, _)| m.clone()).collect()
	}

	pub fn last_params(&self, method: &str) -> Option<Vec<Value>> {
		self.calls
			.borrow()
			.iter()
			.rev()
			.find(|(m, _)| m == method)
			.map(|(_, params)| params.clone())
	}

	pub fn stored(&self, id: i64) -> Option<Value> {
		self.store.borrow().get(&id).cloned()
	}

	/// Stores a node under a fresh id and returns the stored version.
	pub fn persist(&self, mut node: Value) -> Value {
		let id = self.next_id.get();
		self.next_id.set(id + 1);

		node["id"] = json!(id);
		node["version"] = json!(1);
		let mut stored = node.clone();
		if let Some(map) = stored.as_object_mut() {
			map.remove("correlationid");
		}
		self.store.borrow_mut().insert(id, stored);
		node
	}

	fn commit_staged(&self) -> Value {
		let Some(batch) = self.staged.borrow_mut().take() else {
			return Value::Null;
		};

		let mut placeholders = HashMap::new();
		let mut records = Vec::new();

		for node in batch["to_insert"].as_array().cloned().unwrap_or_default() {
			let placeholder = node["id"].as_i64();
			let mut node = resolve(node, &placeholders);
			node["id"] = Value::Null;
			let record = self.persist(node);
			if let (Some(placeholder), Some(id)) = (placeholder, record["id"].as_i64()) {
				placeholders.insert(placeholder, id);
			}
			records.push(record);
		}

		for node in batch["to_update"].as_array().cloned().unwrap_or_default() {
			let mut node = resolve(node, &placeholders);
			if let Some(id) = node["id"].as_i64() {
				let version = node["version"].as_i64().unwrap_or(0);
				node["version"] = json!(version + 1);
				self.store.borrow_mut().insert(id, node.clone());
			}
			records.push(node);
		}

		for id in batch["to_delete"].as_array().cloned().unwrap_or_default() {
			if let Some(id) = id.as_i64() {
				self.store.borrow_mut().remove(&id);
			}
		}

		Value::Array(records)
	}

	fn get(&self, params: &[Value], classes: &[&str]) -> Value {
		let id = params.first().and_then(Value::as_i64).unwrap_or_default();
		match self.stored(id) {
			Some(node) if classes.contains(&node["class"].as_str().unwrap_or_default()) => node,
			_ => Value::Null,
		}
	}
}

fn resolve(mut node: Value, placeholders: &HashMap<i64, i64>) -> Value {
	for field in REFERENCES {
		if let Some(id) = node.get(field).and_then(Value::as_i64) {
			if let Some(real) = placeholders.get(&id) {
				node[field] = json!(real);
			}
		}
	}
	node
}

impl Transport for FakePlatform {
	fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
		self.calls
			.borrow_mut()
			.push((method.to_string(), params.clone()));

		if let Some((code, message)) = self.faults.borrow().get(method) {
			return Err(fault::translate(*code, message.clone()));
		}

		Ok(match method {
			"ping" => json!("PONG"),
			"precommit" => {
				*self.staged.borrow_mut() = params.into_iter().next();
				if self.numeric_transactions.get() {
					json!(7)
				} else {
					json!("tx-1")
				}
			}
			"commit" => self.commit_staged(),
			"insert" => self.persist(params.into_iter().next().unwrap_or_default()),
			"getRegion" => self.get(&params, &["region"]),
			"getLocation" => self.get(&params, &["location"]),
			"getDataset" => self.get(&params, &["dataset"]),
			"getSchema" => self.get(
				&params,
				&[
					"data_entry_schema",
					"dataset_metadata_schema",
					"data_entry_metadata_schema",
				],
			),
			_ => Value::Null,
		})
	}

	fn upload(&self, path: &str, contents: Vec<u8>) -> Result<()> {
		if let Some(status) = self.upload_status.get() {
			return Err(Error::Upload {
				path: path.to_string(),
				status,
			});
		}
		self.uploads
			.borrow_mut()
			.push((path.to_string(), contents));
		Ok(())
	}

	fn download(&self, path: &str) -> Result<Option<Vec<u8>>> {
		Ok(self.files.borrow().get(path).cloned())
	}
}
