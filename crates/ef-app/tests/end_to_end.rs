use ef_app::{AnalysisPayload, AnalysisService};
use ef_engine::PriceSearchConfig;
use ef_project::{
    CalculationOption, ConfigMatrixRow, ConfigSnapshot, SensitivityParameter, VariationMode,
};

fn payload() -> AnalysisPayload {
    AnalysisPayload {
        version: "1".to_string(),
        target_row: 20,
        snapshot: ConfigSnapshot {
            plant_lifetime: 20,
            construction_years: 2,
            bare_erected_cost: 2_000_000.0,
            epc_contingency: 0.1,
            process_contingency: 0.05,
            project_contingency: 0.15,
            number_of_units: 20_000.0,
            initial_selling_price: 50.0,
            operating_cost_pct: 0.3,
            general_inflation_rate: 0.0,
            internal_rate_of_return: 0.08,
            state_tax_rate: 0.06,
            federal_tax_rate: 0.21,
            calculation_option: CalculationOption::Direct,
            variable_costs: vec![],
            variable_quantities: vec![],
            fixed_costs: vec![],
            selected_v: vec![],
            selected_f: vec![],
        },
        matrix: vec![ConfigMatrixRow::span(1, 20)],
        sen_parameters: vec![SensitivityParameter {
            param_id: "S13".to_string(),
            mode: VariationMode::Symmetric,
            values: vec![10.0],
            compare_to_key: "S80".to_string(),
            enabled: true,
            plot_bar: true,
            plot_point: false,
            plot_waterfall: false,
        }],
    }
}

fn search() -> PriceSearchConfig {
    PriceSearchConfig {
        lower: -100_000.0,
        upper: 100_000.0,
        increase_rate: 1.01,
        decrease_rate: 0.99,
        max_iterations: 5_000,
    }
}

#[test]
fn symmetric_selling_price_sweep_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let service = AnalysisService::with_search_config(dir.path(), search()).unwrap();
    let payload = payload();

    let run_id = service.register(&payload).unwrap();
    let baseline = service.run_baseline(&run_id, "1").unwrap();
    assert!(baseline.npv >= -100_000.0 && baseline.npv <= 100_000.0);
    let (name, calculated_price) = baseline.summary.metric(1).unwrap();
    assert_eq!(name, "Calculated Selling Price");
    assert_eq!(calculated_price, baseline.price);

    let variation_count = service.configure(&run_id, "1").unwrap();
    assert_eq!(variation_count, 2);

    let report = service.run_variations(&run_id, "1", None).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].outcomes, 2);

    // Both variation artifacts exist and each search converged on its own.
    let store = service.store();
    for label in ["+10.00", "-10.00"] {
        let outcome = store
            .load_variation_cash_flow("1", "S13", VariationMode::Symmetric, label)
            .unwrap();
        assert!(outcome.npv >= -100_000.0 && outcome.npv <= 100_000.0);
        assert!(store
            .layout()
            .variation_config_module("1", "S13", VariationMode::Symmetric, label, 1)
            .exists());
    }

    let record = store
        .load_result("1", "S13", "S80", VariationMode::Symmetric)
        .unwrap();
    assert_eq!(record.results.len(), 2);
    let labels: Vec<&str> = record
        .results
        .iter()
        .map(|r| r.signed_label.as_str())
        .collect();
    assert!(labels.contains(&"+10.00") && labels.contains(&"-10.00"));

    // The status record reflects the configured pipeline.
    let status = store.load_status("1").unwrap();
    assert!(status.configured);
    assert_eq!(status.run_id, run_id);
}

#[test]
fn varied_configurations_scale_the_selling_price() {
    let dir = tempfile::tempdir().unwrap();
    let service = AnalysisService::with_search_config(dir.path(), search()).unwrap();
    let payload = payload();

    let run_id = service.register(&payload).unwrap();
    service.run_baseline(&run_id, "1").unwrap();
    service.configure(&run_id, "1").unwrap();

    let store = service.store();
    let up = store
        .load_variation_module("1", "S13", VariationMode::Symmetric, "+10.00", 1)
        .unwrap();
    let down = store
        .load_variation_module("1", "S13", VariationMode::Symmetric, "-10.00", 1)
        .unwrap();
    assert!((up.initial_selling_price - 55.0).abs() < 1e-9);
    assert!((down.initial_selling_price - 45.0).abs() < 1e-9);
}

#[test]
fn missing_variation_module_is_an_explicit_failure() {
    let dir = tempfile::tempdir().unwrap();
    let service = AnalysisService::with_search_config(dir.path(), search()).unwrap();
    let payload = payload();

    let run_id = service.register(&payload).unwrap();
    service.run_baseline(&run_id, "1").unwrap();
    service.configure(&run_id, "1").unwrap();

    let doomed = service.store().layout().variation_config_module(
        "1",
        "S13",
        VariationMode::Symmetric,
        "-10.00",
        1,
    );
    std::fs::remove_file(&doomed).unwrap();

    let report = service.run_variations(&run_id, "1", None).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].signed_label, "-10.00");
    // The surviving variation still produces a result record.
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].outcomes, 1);
}

#[test]
fn variation_runs_keep_stored_prices_in_future_intervals() {
    let dir = tempfile::tempdir().unwrap();
    let service = AnalysisService::with_search_config(dir.path(), search()).unwrap();

    let mut payload = payload();
    payload.target_row = 10;
    payload.matrix = vec![ConfigMatrixRow::span(1, 10), ConfigMatrixRow::span(11, 20)];
    payload.sen_parameters[0].param_id = "S11".to_string();

    // Full pipeline, so the baseline price cache is warm when variations run.
    let report = service.analyze(&payload, None).unwrap();
    assert!(report.failures.is_empty());

    let outcome = service
        .store()
        .load_variation_cash_flow("1", "S11", VariationMode::Symmetric, "+10.00")
        .unwrap();
    // Operational year 15 lies past the target row: revenue must use the
    // interval's stored selling price, not the cached baseline price.
    let year_15 = &outcome.rows[2 + 15 - 1];
    assert!(
        (year_15.revenue - 20_000.0 * 50.0).abs() < 1e-6,
        "year-15 revenue {} is not priced at the stored 50.00",
        year_15.revenue
    );
}

#[test]
fn analyze_runs_the_full_pipeline_with_progress() {
    let dir = tempfile::tempdir().unwrap();
    let service = AnalysisService::with_search_config(dir.path(), search()).unwrap();

    let mut stages = Vec::new();
    let mut on_progress = |event: ef_app::AnalysisProgressEvent| {
        stages.push(event.stage);
    };
    let report = service
        .analyze(&payload(), Some(&mut on_progress))
        .unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.results.len(), 1);
    assert!(stages.contains(&ef_app::AnalysisStage::Registering));
    assert!(stages.contains(&ef_app::AnalysisStage::RunningVariations));
    assert!(stages.contains(&ef_app::AnalysisStage::SavingResults));
    assert!(stages.contains(&ef_app::AnalysisStage::Completed));
}
