use ef_project::{CalculationOption, ConfigMatrixRow, ConfigSnapshot, VariationMode};
use ef_store::{ArtifactStore, ConfigData, ResultRecord, StatusRecord, VariationOutcome};

fn snapshot() -> ConfigSnapshot {
    ConfigSnapshot {
        plant_lifetime: 20,
        construction_years: 2,
        bare_erected_cost: 1_000_000.0,
        epc_contingency: 0.1,
        process_contingency: 0.05,
        project_contingency: 0.15,
        number_of_units: 10_000.0,
        initial_selling_price: 50.0,
        operating_cost_pct: 0.3,
        general_inflation_rate: 0.02,
        internal_rate_of_return: 0.08,
        state_tax_rate: 0.06,
        federal_tax_rate: 0.21,
        calculation_option: CalculationOption::Direct,
        variable_costs: vec![],
        variable_quantities: vec![],
        fixed_costs: vec![],
        selected_v: vec![],
        selected_f: vec![],
    }
}

#[test]
fn status_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path()).unwrap();
    let status = StatusRecord::new(true, "run-9", "1", "digest");
    store.save_status("1", &status).unwrap();

    let first = std::fs::read(store.layout().status_file("1")).unwrap();
    let second = std::fs::read(store.layout().status_file("1")).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.load_status("1").unwrap(), status);
}

#[test]
fn config_data_binary_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path()).unwrap();
    let data = ConfigData {
        versions: vec!["1".to_string(), "2".to_string()],
        selected_v: vec![true, false],
        selected_f: vec![true],
        calculation_option: CalculationOption::Indirect,
        target_row: 20,
        sen_parameters: vec![],
    };
    store.save_config_data("1", &data).unwrap();
    assert_eq!(store.load_config_data("1").unwrap(), data);
}

#[test]
fn matrix_and_modules_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path()).unwrap();
    let rows = vec![ConfigMatrixRow::span(1, 10), ConfigMatrixRow::span(11, 20)];
    store.save_matrix("1", &rows).unwrap();
    assert_eq!(store.load_matrix("1").unwrap(), rows);

    let cfg = snapshot();
    store.save_baseline_module("1", 1, &cfg).unwrap();
    store
        .save_variation_module("1", "S13", VariationMode::Symmetric, "+10.00", 1, &cfg)
        .unwrap();
    assert_eq!(store.load_baseline_module("1", 1).unwrap(), cfg);
    assert_eq!(
        store
            .load_variation_module("1", "S13", VariationMode::Symmetric, "+10.00", 1)
            .unwrap(),
        cfg
    );
}

#[test]
fn concurrent_writers_on_different_paths_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path()).unwrap();

    let writer = {
        let store = store.clone();
        std::thread::spawn(move || {
            for i in 0..50 {
                let status = StatusRecord::new(false, &format!("run-{i}"), "2", "d");
                store.save_status("2", &status).unwrap();
            }
        })
    };

    let status = StatusRecord::new(true, "run-a", "1", "d");
    store.save_status("1", &status).unwrap();
    for _ in 0..50 {
        assert_eq!(store.load_status("1").unwrap(), status);
    }
    writer.join().unwrap();
}

#[test]
fn reader_never_observes_partial_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path()).unwrap();
    store
        .save_status("1", &StatusRecord::new(false, "seed", "1", "d"))
        .unwrap();

    let writer = {
        let store = store.clone();
        std::thread::spawn(move || {
            for i in 0..200 {
                let status = StatusRecord::new(i % 2 == 0, &format!("run-{i}"), "1", "d");
                store.save_status("1", &status).unwrap();
            }
        })
    };

    // Every read parses: an atomic replace never exposes a torn file.
    for _ in 0..200 {
        let status = store.load_status("1").unwrap();
        assert_eq!(status.version, "1");
    }
    writer.join().unwrap();
}

#[test]
fn results_are_listed_per_version() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path()).unwrap();
    let outcome = VariationOutcome {
        signed_label: "+10.00".to_string(),
        magnitude: 10.0,
        price: 21.4,
        npv: 120.0,
        iterations: 14,
    };
    store
        .save_result(&ResultRecord::new(
            "1",
            "S13",
            "S80",
            VariationMode::Symmetric,
            vec![outcome.clone()],
        ))
        .unwrap();
    store
        .save_result(&ResultRecord::new(
            "1",
            "S11",
            "S80",
            VariationMode::Multipoint,
            vec![outcome],
        ))
        .unwrap();

    assert_eq!(store.list_results("1").unwrap().len(), 2);
    assert!(store.list_results("2").unwrap().is_empty());

    let back = store
        .load_result("1", "S13", "S80", VariationMode::Symmetric)
        .unwrap();
    assert_eq!(back.metadata.param_id, "S13");
    assert_eq!(back.results.len(), 1);
}
