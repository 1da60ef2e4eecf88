//! Sensitivity analysis orchestration.
//!
//! Glue for the four pipeline stages: payload registration, baseline price
//! search, variation configuration, and the fanned-out per-variation runs.
//! All inter-stage data moves through the artifact store.

use crate::error::{AppError, AppResult};
use crate::pipeline::{PipelineCoordinator, Stage};
use crate::price_cache::PriceCache;
use crate::progress::{AnalysisProgressEvent, AnalysisStage};
use ef_engine::{find_price, summarize, EconomicSummary, PriceSearchConfig};
use ef_project::{validate_matrix, ConfigMatrixRow, ConfigSnapshot, SensitivityParameter};
use ef_sensitivity::{variations_for, Variation};
use ef_store::{payload_digest, ArtifactStore, ConfigData, ResultRecord, StatusRecord, VariationOutcome};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Registered analysis payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisPayload {
    pub version: String,
    pub target_row: u32,
    pub snapshot: ConfigSnapshot,
    pub matrix: Vec<ConfigMatrixRow>,
    pub sen_parameters: Vec<SensitivityParameter>,
}

/// Baseline stage outcome.
#[derive(Debug, Clone)]
pub struct BaselineOutcome {
    pub price: f64,
    pub npv: f64,
    pub iterations: usize,
    /// Metric table at the converged price.
    pub summary: EconomicSummary,
}

/// One written result record.
#[derive(Debug, Clone)]
pub struct ParamResult {
    pub param_id: String,
    pub result_path: PathBuf,
    pub outcomes: usize,
}

/// One variation that failed; reported distinctly, never silently folded
/// into a plausible-looking aggregate.
#[derive(Debug, Clone)]
pub struct VariationFailure {
    pub param_id: String,
    pub signed_label: String,
    pub error: String,
}

/// Aggregate outcome of the Run stage.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub run_id: String,
    pub version: String,
    pub results: Vec<ParamResult>,
    pub failures: Vec<VariationFailure>,
}

pub struct AnalysisService {
    store: ArtifactStore,
    coordinator: PipelineCoordinator,
    cache: PriceCache,
    search: PriceSearchConfig,
}

fn emit(
    progress_cb: &mut Option<&mut dyn FnMut(AnalysisProgressEvent)>,
    stage: AnalysisStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(AnalysisProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

impl AnalysisService {
    pub fn new(root: &Path) -> AppResult<Self> {
        Self::with_search_config(root, PriceSearchConfig::default())
    }

    pub fn with_search_config(root: &Path, search: PriceSearchConfig) -> AppResult<Self> {
        let store = ArtifactStore::new(root)?;
        let coordinator = PipelineCoordinator::new(&store.layout().locks_dir());
        Ok(Self {
            store,
            coordinator,
            cache: PriceCache::default(),
            search,
        })
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn coordinator(&self) -> &PipelineCoordinator {
        &self.coordinator
    }

    /// Stage 1: validate and persist the payload; returns the new `run_id`.
    pub fn register(&self, payload: &AnalysisPayload) -> AppResult<String> {
        validate_matrix(&payload.matrix, payload.snapshot.plant_lifetime)?;

        let (run_id, ()) = self.coordinator.register(|run_id| {
            let version = &payload.version;
            self.store.save_matrix(version, &payload.matrix)?;
            for row in &payload.matrix {
                self.store
                    .save_baseline_module(version, row.start_year, &payload.snapshot)?;
            }
            let data = ConfigData {
                versions: vec![version.clone()],
                selected_v: payload.snapshot.selected_v.clone(),
                selected_f: payload.snapshot.selected_f.clone(),
                calculation_option: payload.snapshot.calculation_option,
                target_row: payload.target_row,
                sen_parameters: payload.sen_parameters.clone(),
            };
            self.store.save_config_data(version, &data)?;

            let digest = payload_digest(&serde_json::to_vec(payload).map_err(|e| {
                AppError::Store(format!("payload serialization failed: {e}"))
            })?);
            self.store
                .save_status(version, &StatusRecord::new(false, run_id, version, &digest))?;
            Ok(())
        })?;
        Ok(run_id)
    }

    /// Stage 2: price search on the baseline configuration. Each iteration
    /// overwrites the baseline cash-flow artifact.
    pub fn run_baseline(&self, run_id: &str, version: &str) -> AppResult<BaselineOutcome> {
        self.coordinator.advance(run_id, Stage::Baseline, || {
            let matrix = self.store.load_matrix(version)?;
            let base = self.load_baseline(version, &matrix)?;
            let data = self.store.load_config_data(version)?;

            let result = find_price(&base, &matrix, data.target_row, None, &self.search, |outcome| {
                self.store
                    .save_baseline_cash_flow(version, outcome)
                    .map_err(|e| {
                        ef_engine::EngineError::Project(ef_project::ProjectError::Io(
                            std::io::Error::other(e.to_string()),
                        ))
                    })
            })?;

            self.cache.insert(version, result.price);
            info!(
                run_id,
                version,
                price = result.price,
                npv = result.npv,
                iterations = result.iterations,
                "baseline converged"
            );
            let summary = summarize(&base, &result.outcome, result.price);
            Ok(BaselineOutcome {
                price: result.price,
                npv: result.npv,
                iterations: result.iterations,
                summary,
            })
        })
    }

    /// Stage 3: expand enabled parameters into variations and write one
    /// configuration module per variation per interval, then flip the
    /// status record to configured.
    pub fn configure(&self, run_id: &str, version: &str) -> AppResult<usize> {
        self.coordinator.advance(run_id, Stage::Configure, || {
            let matrix = self.store.load_matrix(version)?;
            let base = self.load_baseline(version, &matrix)?;
            let data = self.store.load_config_data(version)?;

            let mut written = 0usize;
            for param in &data.sen_parameters {
                for variation in variations_for(param)? {
                    let varied = ef_sensitivity::apply_variation(&base, &variation)?;
                    for row in &matrix {
                        self.store.save_variation_module(
                            version,
                            &variation.param_id,
                            variation.mode,
                            &variation.signed_label,
                            row.start_year,
                            &varied,
                        )?;
                    }
                    written += 1;
                }
            }

            let status = self.store.load_status(version)?;
            self.store.save_status(
                version,
                &StatusRecord::new(true, run_id, version, &status.payload_digest),
            )?;
            info!(run_id, version, variations = written, "configured");
            Ok(written)
        })
    }

    /// Stage 4: fan the price search out across all configured variations
    /// and write one result record per parameter. Per-variation failures
    /// are aggregated explicitly.
    pub fn run_variations(
        &self,
        run_id: &str,
        version: &str,
        mut progress_cb: Option<&mut dyn FnMut(AnalysisProgressEvent)>,
    ) -> AppResult<AnalysisReport> {
        let started = Instant::now();
        self.coordinator.advance(run_id, Stage::Run, || {
            let matrix = self.store.load_matrix(version)?;
            let data = self.store.load_config_data(version)?;

            let expanded: Vec<(&SensitivityParameter, Vec<Variation>)> = data
                .sen_parameters
                .iter()
                .map(|param| variations_for(param).map(|v| (param, v)))
                .collect::<Result<_, _>>()?;
            let total: usize = expanded.iter().map(|(_, v)| v.len()).sum();

            emit(
                &mut progress_cb,
                AnalysisStage::RunningVariations,
                started,
                Some("Running variations".to_string()),
            );

            let mut results = Vec::new();
            let mut failures = Vec::new();
            let mut completed = 0usize;
            for (param, variations) in &expanded {
                if variations.is_empty() {
                    continue;
                }

                let runs: Vec<Result<VariationOutcome, VariationFailure>> = variations
                    .par_iter()
                    .map(|variation| self.run_one_variation(version, &matrix, data.target_row, variation))
                    .collect();
                completed += runs.len();
                if let Some(cb) = progress_cb.as_deref_mut() {
                    cb(AnalysisProgressEvent {
                        stage: AnalysisStage::RunningVariations,
                        elapsed_wall_s: started.elapsed().as_secs_f64(),
                        message: None,
                        completed_variations: Some(completed),
                        total_variations: Some(total),
                    });
                }

                let mut outcomes = Vec::new();
                for run in runs {
                    match run {
                        Ok(outcome) => outcomes.push(outcome),
                        Err(failure) => {
                            warn!(
                                param = failure.param_id,
                                label = failure.signed_label,
                                error = failure.error,
                                "variation failed"
                            );
                            failures.push(failure);
                        }
                    }
                }

                if !outcomes.is_empty() {
                    emit(
                        &mut progress_cb,
                        AnalysisStage::SavingResults,
                        started,
                        Some(param.param_id.clone()),
                    );
                    let record = ResultRecord::new(
                        version,
                        &param.param_id,
                        &param.compare_to_key,
                        param.mode,
                        outcomes,
                    );
                    self.store.save_result(&record)?;
                    results.push(ParamResult {
                        param_id: param.param_id.clone(),
                        result_path: self.store.layout().result_file(
                            version,
                            &param.param_id,
                            &param.compare_to_key,
                            param.mode,
                        ),
                        outcomes: record.results.len(),
                    });
                }
            }

            emit(
                &mut progress_cb,
                AnalysisStage::Completed,
                started,
                Some(format!(
                    "{} result record(s), {} failure(s)",
                    results.len(),
                    failures.len()
                )),
            );
            info!(
                run_id,
                version,
                results = results.len(),
                failures = failures.len(),
                "runs completed"
            );
            Ok(AnalysisReport {
                run_id: run_id.to_string(),
                version: version.to_string(),
                results,
                failures,
            })
        })
    }

    /// Full pipeline in one call.
    pub fn analyze(
        &self,
        payload: &AnalysisPayload,
        mut progress_cb: Option<&mut dyn FnMut(AnalysisProgressEvent)>,
    ) -> AppResult<AnalysisReport> {
        let started = Instant::now();
        emit(&mut progress_cb, AnalysisStage::Registering, started, None);
        let run_id = self.register(payload)?;

        emit(
            &mut progress_cb,
            AnalysisStage::BaselinePriceSearch,
            started,
            None,
        );
        self.run_baseline(&run_id, &payload.version)?;

        emit(
            &mut progress_cb,
            AnalysisStage::GeneratingVariations,
            started,
            None,
        );
        self.configure(&run_id, &payload.version)?;

        self.run_variations(&run_id, &payload.version, progress_cb)
    }

    fn load_baseline(
        &self,
        version: &str,
        matrix: &[ConfigMatrixRow],
    ) -> AppResult<ConfigSnapshot> {
        // Every interval's module must be present; a gap fails the whole
        // stage rather than silently shrinking the aggregate.
        let mut base = None;
        for row in matrix {
            let module = self.store.load_baseline_module(version, row.start_year)?;
            base.get_or_insert(module);
        }
        base.ok_or_else(|| AppError::Validation(ef_project::ValidationError::EmptyMatrix))
    }

    fn run_one_variation(
        &self,
        version: &str,
        matrix: &[ConfigMatrixRow],
        target_row: u32,
        variation: &Variation,
    ) -> Result<VariationOutcome, VariationFailure> {
        let fail = |error: String| VariationFailure {
            param_id: variation.param_id.clone(),
            signed_label: variation.signed_label.clone(),
            error,
        };

        let mut varied = None;
        for row in matrix {
            let module = self
                .store
                .load_variation_module(
                    version,
                    &variation.param_id,
                    variation.mode,
                    &variation.signed_label,
                    row.start_year,
                )
                .map_err(|e| fail(e.to_string()))?;
            varied.get_or_insert(module);
        }
        let varied = varied.ok_or_else(|| fail("empty matrix".to_string()))?;

        // The cached baseline price seeds the first candidate only; the
        // snapshot's stored pricing stays intact for intervals past the
        // target row.
        let start = self.cache.get(version);

        let result = find_price(&varied, matrix, target_row, start, &self.search, |outcome| {
            self.store
                .save_variation_cash_flow(
                    version,
                    &variation.param_id,
                    variation.mode,
                    &variation.signed_label,
                    outcome,
                )
                .map_err(|e| {
                    ef_engine::EngineError::Project(ef_project::ProjectError::Io(
                        std::io::Error::other(e.to_string()),
                    ))
                })
        })
        .map_err(|e| fail(e.to_string()))?;

        Ok(VariationOutcome {
            signed_label: variation.signed_label.clone(),
            magnitude: variation.magnitude,
            price: result.price,
            npv: result.npv,
            iterations: result.iterations,
        })
    }
}
