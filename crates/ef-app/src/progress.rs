//! Progress events for long-running analyses.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStage {
    Registering,
    BaselinePriceSearch,
    GeneratingVariations,
    RunningVariations,
    SavingResults,
    Completed,
}

#[derive(Debug, Clone)]
pub struct AnalysisProgressEvent {
    pub stage: AnalysisStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub completed_variations: Option<usize>,
    pub total_variations: Option<usize>,
}

impl AnalysisProgressEvent {
    pub fn stage(stage: AnalysisStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            completed_variations: None,
            total_variations: None,
        }
    }
}
