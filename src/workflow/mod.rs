mod pipeline;
mod session;
mod state;

pub use pipeline::{
    analysis_pipeline, run_sequence, AnalysisPipeline, Chain, DescriptionStage, Detected,
    LabelStage, Stage,
};
pub use session::Session;
pub use state::{
    AnalysisOutput, AnalysisRequest, AnalysisWorkflow, Effect, Event, PairTag, WorkflowState,
    FALLBACK_ERROR, READ_FAILURE,
};
