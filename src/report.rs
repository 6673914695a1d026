use crate::workflow::{AnalysisWorkflow, WorkflowState};
use product_lens_common::Label;
use serde::Serialize;

/// 解析結果のJSON出力
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub model: String,
    pub labels: Vec<Label>,
    pub description: String,
    /// ラベル検出の生レスポンス
    pub detection: serde_json::Value,
}

impl AnalysisReport {
    /// Processed状態のときのみ作成できる
    pub fn from_workflow(workflow: &AnalysisWorkflow) -> Option<Self> {
        if workflow.state() != WorkflowState::Processed {
            return None;
        }
        let detection = workflow.detection()?;
        let description = workflow.description()?;

        Some(Self {
            model: workflow.active_pair()?.model.clone(),
            labels: detection.labels().to_vec(),
            description: description.text.clone(),
            detection: detection.raw().clone(),
        })
    }
}
