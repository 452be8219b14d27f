use farm_tests::{init_logging, Scratch, SERIAL_CAPTURE};
use farmdb::{
    NewReading, NutrientFormat, ReadingPatch, ReadingStore, DEFAULT_CSV_PATH, DEFAULT_DATABASE_PATH,
};
use farmp_sensor::simulate_lines;
use rand::{rngs::SmallRng, SeedableRng};

#[test]
fn serial_capture_to_csv() {
    init_logging();
    let scratch = Scratch::new("capture");
    let mut store = ReadingStore::open(scratch.join(DEFAULT_DATABASE_PATH)).unwrap();

    let ids = store.import_lines(SERIAL_CAPTURE).unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids[0] < ids[1]);

    let first = store.get_by_id(ids[0]).unwrap().unwrap();
    assert!(first.phosphorus_present());
    assert!(!first.potassium_present());
    assert!(!first.pump_status());

    let second = store.get_by_id(ids[1]).unwrap().unwrap();
    assert!(!second.phosphorus_present());
    assert!(second.potassium_present());
    assert!(second.pump_status());
    assert_eq!(second.notes(), "manual note");

    let csv = store
        .export_csv(scratch.join(DEFAULT_CSV_PATH))
        .unwrap()
        .expect("readings to export");
    let contents = std::fs::read_to_string(csv).unwrap();
    assert_eq!(contents.lines().count(), 3);
    assert!(contents.contains(",35.5,7.1,0,1,1,,,manual note"));
}

#[test]
fn model_prediction_survives_reopen() {
    init_logging();
    let scratch = Scratch::new("prediction");
    let db = scratch.join("readings.db");

    let inserted = NewReading::new(38.5, 6.8, true, false, true).with_prediction(true, 0.88);
    let id = {
        let mut store = ReadingStore::open(&db).unwrap();
        store.insert(&inserted).unwrap()
    };

    let mut store = ReadingStore::open(&db).unwrap();
    let stored = store.get_by_id(id).unwrap().expect("reading after reopen");
    assert_eq!(stored.as_new_reading(), inserted);
    assert_eq!(stored.prediction_confidence(), Some(0.88));
    assert!(!stored.timestamp().to_string().is_empty());
}

#[test]
fn simulated_batch_history() {
    init_logging();
    let mut store = ReadingStore::open_in_memory().unwrap();
    let mut rng = SmallRng::seed_from_u64(2024);

    let lines = simulate_lines(25, &mut rng);
    let report = store
        .import_lines_report(lines, NutrientFormat::Presence)
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(report.inserted.len(), 25);

    let history = store.get_all().unwrap();
    assert_eq!(history.len(), 25);
    for pair in history.windows(2) {
        assert!(pair[0].timestamp() >= pair[1].timestamp());
    }
    for reading in &history {
        assert_eq!(reading.pump_status(), reading.humidity() < 40.0);
    }
}

#[test]
fn operator_corrections() {
    init_logging();
    let mut store = ReadingStore::open_in_memory().unwrap();
    let ids = store.import_lines(SERIAL_CAPTURE).unwrap();

    // Attach a model prediction to an imported reading, then drop it again
    let predicted = ReadingPatch {
        predicted_irrigation: Some(Some(false)),
        prediction_confidence: Some(Some(0.95)),
        notes: Some("model advised no irrigation".to_string()),
        ..Default::default()
    };
    assert!(store.update(ids[0], &predicted).unwrap());
    let reading = store.get_by_id(ids[0]).unwrap().unwrap();
    assert_eq!(reading.predicted_irrigation(), Some(false));
    assert_eq!(reading.prediction_confidence(), Some(0.95));
    assert!(!reading.pump_status());

    let cleared = ReadingPatch {
        predicted_irrigation: Some(None),
        prediction_confidence: Some(None),
        ..Default::default()
    };
    assert!(store.update(ids[0], &cleared).unwrap());
    let reading = store.get_by_id(ids[0]).unwrap().unwrap();
    assert_eq!(reading.predicted_irrigation(), None);
    assert_eq!(reading.prediction_confidence(), None);
    assert_eq!(reading.notes(), "model advised no irrigation");

    assert!(store.delete(ids[1]).unwrap());
    assert_eq!(store.get_all().unwrap().len(), 1);
    assert!(store.get_by_id(ids[1]).unwrap().is_none());
}

#[test]
fn empty_store_exports_nothing() {
    init_logging();
    let scratch = Scratch::new("empty");
    let mut store = ReadingStore::open_in_memory().unwrap();

    assert_eq!(store.export_csv(scratch.join("a.csv")).unwrap(), None);
    assert_eq!(store.export_json(scratch.join("a.json")).unwrap(), None);
    assert_eq!(store.export_report(scratch.join("a.txt")).unwrap(), None);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
