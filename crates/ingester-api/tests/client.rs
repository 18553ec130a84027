mod common;

use std::io::{Cursor, Write};

use chrono::{TimeZone, Utc};
use common::FakePlatform;
use ingester_api::{
	client::fault, model::shared, AttributeDef, DataEntry, DataEntrySearch, Dataset, DomainObject,
	Error, Field, FileObject, IngesterPlatformApi, Location, PullDataSource, Sampling, Schema,
	SearchResults,
};
use serde_json::json;
use tracing_test::traced_test;

fn api() -> IngesterPlatformApi<FakePlatform> {
	IngesterPlatformApi::with_transport(FakePlatform::new())
}

#[test]
fn ping() {
	assert_eq!(api().ping().unwrap(), "PONG");
}

#[test]
fn temperature_dataset_is_provisioned_in_one_transaction() {
	let api = api();
	let mut unit = api.create_unit_of_work();

	let location = shared(Location::new(10.0, 11.0, "Loc 1"));
	let schema = shared(
		Schema::data_entry("Temperature")
			.with_attr(AttributeDef::double("temperature"))
			.unwrap(),
	);
	let location_id = unit.insert(&location).unwrap();
	let schema_id = unit.insert(&schema).unwrap();
	assert_eq!((location_id, schema_id), (-1, -2));

	let dataset = shared(Dataset::new(location_id, schema_id).with_data_source(
		PullDataSource::new("http://www.bom.gov.au/radar/IDR733.gif", "file")
			.with_sampling(Sampling::periodic(10_000)),
	));
	assert_eq!(unit.insert(&dataset).unwrap(), -3);

	unit.commit(&api).unwrap();

	let platform = api.transport();
	assert_eq!(platform.methods(), ["precommit", "commit"]);

	let batch = &platform.last_params("precommit").unwrap()[0];
	assert_eq!(batch["class"], "unit_of_work");
	assert_eq!(batch["to_insert"][2]["correlationid"], -3);
	assert_eq!(batch["to_insert"][2]["location"], -1);

	let location = location.borrow();
	let schema = schema.borrow();
	let dataset = dataset.borrow();
	assert_eq!(location.id, Some(100));
	assert_eq!(schema.id, Some(101));
	assert_eq!(dataset.id, Some(102));
	assert_eq!(dataset.location, location.id);
	assert_eq!(dataset.schema, schema.id);
	assert_eq!(dataset.version, Some(1));
	assert!(matches!(dataset.data_source, Some(ingester_api::DataSource::Pull(_))));
	assert_eq!(schema.attr("temperature"), Some(&AttributeDef::double("temperature")));

	let stored: Dataset = api.get_dataset(102).unwrap().unwrap();
	assert_eq!(stored, *dataset);
}

#[test]
fn committed_units_cannot_be_reused() {
	let api = api();
	let mut unit = api.create_unit_of_work();
	unit.insert(&shared(Location::new(1.0, 2.0, "a"))).unwrap();
	unit.commit(&api).unwrap();

	assert!(matches!(unit.commit(&api), Err(Error::OperationFailed(_))));
	assert!(unit.insert(&shared(Location::new(1.0, 2.0, "b"))).is_err());
}

#[test]
fn files_are_uploaded_before_commit() {
	let mut tmp = tempfile::NamedTempFile::new().unwrap();
	tmp.write_all(b"<xml/>").unwrap();

	let api = api();
	api.transport().numeric_transactions.set(true);
	let mut unit = api.create_unit_of_work();

	let mut entry = DataEntry::new(5, Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap());
	entry.set("temp", Field::object(FileObject::from_path(tmp.path(), "text/xml")));
	entry.set(
		"image",
		Field::object(FileObject::from_reader(Cursor::new(b"GIF89a".to_vec()), "image/gif")),
	);
	entry.set("temperature", 21.5);
	let entry = shared(entry);
	unit.insert(&entry).unwrap();

	let pending = unit.pending_files();
	assert_eq!(pending.len(), 2);
	assert!(pending.iter().all(|p| p.entity == "data_entry:-1"));

	unit.commit(&api).unwrap();

	let platform = api.transport();
	assert_eq!(platform.methods(), ["precommit", "commit"]);
	assert_eq!(
		*platform.uploads.borrow(),
		[
			("7/data_entry:-1/image".to_string(), b"GIF89a".to_vec()),
			("7/data_entry:-1/temp".to_string(), b"<xml/>".to_vec()),
		]
	);
	assert_eq!(platform.last_params("commit").unwrap(), [json!("7")]);
	assert_eq!(entry.borrow().id, Some(100));
}

#[test]
#[traced_test]
fn failed_uploads_abort_the_commit() {
	let api = api();
	api.transport().upload_status.set(Some(500));
	let mut unit = api.create_unit_of_work();

	let mut entry = DataEntry::new(5, Utc::now());
	entry.set(
		"image",
		Field::object(FileObject::from_reader(Cursor::new(vec![1, 2, 3]), "image/png")),
	);
	let entry = shared(entry);
	unit.insert(&entry).unwrap();

	let err = unit.commit(&api).unwrap_err();
	assert!(
		matches!(&err, Error::Upload { path, status: 500 } if path == "tx-1/data_entry:-1/image"),
		"{err}"
	);
	assert_eq!(api.transport().methods(), ["precommit"]);
	assert_eq!(entry.borrow().id, Some(-1));
	assert!(logs_contain("Failed to commit unit of work"));
	assert!(logs_contain("tx-1"));
}

#[test]
#[traced_test]
fn platform_faults_are_translated() {
	let api = api();
	api.transport()
		.fail("precommit", fault::STALE_OBJECT, "location 100 is stale");

	let mut location = Location::new(1.0, 2.0, "a");
	location.id = Some(100);
	location.version = Some(1);
	let mut unit = api.create_unit_of_work();
	unit.update(&shared(location)).unwrap();

	let err = api.commit(&mut unit).unwrap_err();
	assert!(err.is_stale(), "{err}");
	assert!(err.to_string().contains("location 100 is stale"));
	assert!(logs_contain("Failed to commit unit of work"));
	assert!(logs_contain("location 100 is stale"));
}

#[test]
fn results_are_matched_by_class_and_id() {
	let api = api();
	let mut unit = api.create_unit_of_work();

	let mut location = Location::new(1.0, 2.0, "a");
	location.id = Some(5);
	location.version = Some(1);
	let mut dataset = Dataset::new(1, 2);
	dataset.id = Some(5);
	dataset.version = Some(3);
	let location = shared(location);
	let dataset = shared(dataset);
	unit.update(&location).unwrap();
	unit.update(&dataset).unwrap();

	unit.commit(&api).unwrap();

	assert_eq!(location.borrow().version, Some(2));
	assert_eq!(location.borrow().name.as_deref(), Some("a"));
	assert_eq!(dataset.borrow().version, Some(4));
	assert_eq!(dataset.borrow().location, Some(1));
}

#[test]
fn assigned_ids_do_not_capture_later_results() {
	let api = api();
	let mut unit = api.create_unit_of_work();

	let location = shared(Location::new(1.0, 2.0, "a"));
	let mut dataset = Dataset::new(1, 2);
	dataset.id = Some(100);
	dataset.version = Some(1);
	let dataset = shared(dataset);
	unit.insert(&location).unwrap();
	unit.update(&dataset).unwrap();

	unit.commit(&api).unwrap();

	assert_eq!(location.borrow().id, Some(100));
	assert_eq!(location.borrow().version, Some(1));
	assert_eq!(dataset.borrow().id, Some(100));
	assert_eq!(dataset.borrow().version, Some(2));
	assert!(matches!(unit.commit(&api), Err(Error::OperationFailed(_))));
}

#[test]
fn direct_inserts_check_their_arguments() {
	let api = api();

	let stored = api.insert(&Location::new(1.0, 2.0, "a")).unwrap();
	assert_eq!(stored.id, Some(100));
	assert_eq!(stored.name.as_deref(), Some("a"));

	assert!(matches!(api.insert(&stored), Err(Error::InvalidObject(_))));
	assert!(matches!(
		api.update(&Location::new(1.0, 2.0, "b")),
		Err(Error::InvalidObject(_))
	));
	let err = api.insert(&Dataset::default()).unwrap_err();
	assert_eq!(err.validation_errors().len(), 2);
	assert_eq!(api.transport().methods(), ["insert"]);
}

#[test]
fn missing_objects_are_none() {
	let api = api();
	assert_eq!(api.get_location(42).unwrap(), None);
	assert_eq!(api.get_schema(42).unwrap(), None);
	assert_eq!(
		api.transport().last_params("getLocation").unwrap(),
		[json!(42)]
	);
}

#[test]
fn effective_attributes_follow_extends() {
	let api = api();
	let mut unit = api.create_unit_of_work();
	let base = shared(
		Schema::data_entry("base")
			.with_attr(AttributeDef::double("temperature"))
			.unwrap(),
	);
	unit.insert(&base).unwrap();
	unit.commit(&api).unwrap();

	let mut unit = api.create_unit_of_work();
	let mut child = Schema::data_entry("child")
		.with_attr(AttributeDef::file("image"))
		.unwrap();
	child.extend(base.borrow().id.unwrap());
	let child = shared(child);
	unit.insert(&child).unwrap();
	unit.commit(&api).unwrap();

	let attrs = api
		.effective_attributes(child.borrow().id.unwrap())
		.unwrap();
	assert_eq!(
		attrs.keys().map(String::as_str).collect::<Vec<_>>(),
		["image", "temperature"]
	);

	assert!(matches!(
		api.effective_attributes(999),
		Err(Error::UnknownObject(_))
	));
}

#[test]
fn search_results_are_typed() {
	let api = api();
	let mut entry = DataEntry::new(5, Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap());
	entry.id = Some(8);

	let results = SearchResults {
		count: 1,
		offset: 0,
		limit: 10,
		results: vec![Box::new(entry.clone()) as Box<dyn DomainObject>],
	};
	let wire = api.marshaller().object_to_wire(&results).unwrap();
	let page: SearchResults = api.marshaller().decode(&wire).unwrap();

	assert_eq!(page.len(), 1);
	assert_eq!(page.iter_as::<DataEntry>().next(), Some(&entry));

	// The fake platform answers searches with null, which is not a result page.
	assert!(api.search(&DataEntrySearch::new(5), 0, 10).is_err());
	let params = api.transport().last_params("search").unwrap();
	assert_eq!(params[0]["class"], "data_entry_search");
	assert_eq!(params[0]["dataset"], 5);
	assert_eq!(params[1..], [json!(0), json!(10)]);
}

#[test]
fn data_entry_streams_are_downloaded() {
	let api = api();
	api.transport()
		.files
		.borrow_mut()
		.insert("data_entry/5/8/image".into(), b"GIF89a".to_vec());

	assert_eq!(
		api.get_data_entry_stream(5, 8, "image").unwrap(),
		Some(b"GIF89a".to_vec())
	);
	assert_eq!(api.get_data_entry_stream(5, 8, "other").unwrap(), None);
}

#[test]
fn datasets_can_be_toggled() {
	let api = api();
	api.enable_dataset(3).unwrap();
	api.disable_dataset(3).unwrap();

	let mut unit = api.create_unit_of_work();
	unit.enable(4).unwrap();
	unit.disable(5).unwrap();
	unit.commit(&api).unwrap();

	let batch = &api.transport().last_params("precommit").unwrap()[0];
	assert_eq!(batch["to_enable"], json!([4]));
	assert_eq!(batch["to_disable"], json!([5]));
	assert_eq!(
		api.transport().methods(),
		["enableDataset", "disableDataset", "precommit", "commit"]
	);
}

#[test]
fn deletes_send_class_and_id() {
	let api = api();
	let stored = api.insert(&Location::new(1.0, 2.0, "a")).unwrap();
	api.delete(&stored).unwrap();

	let params = api.transport().last_params("delete").unwrap();
	assert_eq!(params[0]["class"], "location");
	assert_eq!(params[0]["id"], 100);
	assert!(api.delete(&Location::new(1.0, 2.0, "b")).is_err());

	let mut unit = api.create_unit_of_work();
	unit.delete(100).unwrap();
	unit.commit(&api).unwrap();
	assert_eq!(api.get_location(100).unwrap(), None);
}
