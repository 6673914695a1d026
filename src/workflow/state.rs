//! 解析ワークフローの状態機械
//!
//! 状態遷移は `AnalysisWorkflow::handle` のみで行い、副作用（リモート呼び出し）は
//! `Effect` として呼び出し側に返す。解析シーケンスは開始時の (画像, モデル) ペアで
//! タグ付けされ、現在のペアと一致しない結果は破棄される。

use product_lens_common::validator;
use product_lens_common::{
    empty_catalog_message, DescriptionResult, DetectionResult, ModelCatalog, UploadedImage,
};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// エラーメッセージが空の場合の代替
pub const FALLBACK_ERROR: &str = "An unexpected error occurred";

pub const READ_FAILURE: &str = "Failed to read image.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Initial,
    Ready,
    Loading,
    Processed,
    Error,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Initial => "initial",
            WorkflowState::Ready => "ready",
            WorkflowState::Loading => "loading",
            WorkflowState::Processed => "processed",
            WorkflowState::Error => "error",
        }
    }
}

/// 解析ペア（アップロード番号 + モデルID）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairTag {
    pub upload: u64,
    pub model: String,
}

/// 解析シーケンスの入力
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub tag: PairTag,
    pub image: Rc<UploadedImage>,
}

impl AnalysisRequest {
    pub fn model(&self) -> &str {
        &self.tag.model
    }
}

/// 解析シーケンスの成功結果
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub detection: DetectionResult,
    pub description: DescriptionResult,
}

#[derive(Debug)]
pub enum Event {
    /// カタログ取得完了（未フィルタ）
    CatalogLoaded(ModelCatalog),
    CatalogFailed(String),
    ImageUploaded { data_url: String, byte_size: u64 },
    ImageReadFailed,
    ModelSelected(String),
    AnalysisFinished {
        tag: PairTag,
        outcome: std::result::Result<AnalysisOutput, String>,
    },
}

#[derive(Debug)]
pub enum Effect {
    StartAnalysis(AnalysisRequest),
}

#[derive(Debug)]
pub struct AnalysisWorkflow {
    state: WorkflowState,
    image: Option<Rc<UploadedImage>>,
    upload_seq: u64,
    model: Option<String>,
    catalog: Option<ModelCatalog>,
    /// カタログ起因でReadyへ進めない理由
    blocked: Option<String>,
    detection: Option<DetectionResult>,
    description: Option<DescriptionResult>,
    error: Option<String>,
    /// 直近に開始したシーケンスのペア
    active: Option<PairTag>,
    /// 完了イベント未着のペア（1ペアにつき1シーケンスまで）
    in_flight: HashSet<PairTag>,
}

impl AnalysisWorkflow {
    /// `preferred_model` はカタログ到着前の初期選択
    pub fn new(preferred_model: Option<String>) -> Self {
        Self {
            state: WorkflowState::Initial,
            image: None,
            upload_seq: 0,
            model: preferred_model,
            catalog: None,
            blocked: None,
            detection: None,
            description: None,
            error: None,
            active: None,
            in_flight: HashSet::new(),
        }
    }

    pub fn handle(&mut self, event: Event) -> Option<Effect> {
        match event {
            Event::CatalogLoaded(catalog) => self.on_catalog_loaded(catalog),
            Event::CatalogFailed(message) => {
                warn!(%message, "model catalog unavailable");
                self.block(normalize_message(message));
                None
            }
            Event::ImageUploaded { data_url, byte_size } => {
                self.on_image_uploaded(&data_url, byte_size)
            }
            Event::ImageReadFailed => {
                self.reset_summary();
                self.active = None;
                self.enter_error(READ_FAILURE.to_string());
                None
            }
            Event::ModelSelected(model) => self.on_model_selected(model),
            Event::AnalysisFinished { tag, outcome } => {
                self.on_analysis_finished(tag, outcome);
                None
            }
        }
    }

    fn on_catalog_loaded(&mut self, catalog: ModelCatalog) -> Option<Effect> {
        let usable = catalog.usable();

        if usable.is_empty() {
            self.catalog = Some(usable);
            self.block(empty_catalog_message());
            return None;
        }

        let selected = usable.preselect(self.model.as_deref()).map(|m| m.id.clone());
        self.catalog = Some(usable);

        if self.blocked.take().is_some() {
            self.error = None;
            let next = if self.image.is_some() {
                WorkflowState::Ready
            } else {
                WorkflowState::Initial
            };
            self.set_state(next);
        }

        match selected {
            Some(model) if self.model.as_deref() != Some(model.as_str()) => {
                if let Some(previous) = &self.model {
                    warn!(%previous, %model, "preferred model is not running, falling back");
                }
                self.apply_model(model)
            }
            _ => self.try_start(),
        }
    }

    fn on_image_uploaded(&mut self, data_url: &str, byte_size: u64) -> Option<Effect> {
        self.reset_summary();
        self.active = None;

        match validator::accept(data_url, byte_size) {
            Ok(image) => {
                self.upload_seq += 1;
                info!(
                    upload = self.upload_seq,
                    mime = image.mime_type(),
                    bytes = byte_size,
                    "image accepted"
                );
                self.image = Some(Rc::new(image));

                if let Some(reason) = self.blocked.clone() {
                    self.enter_error(reason);
                    return None;
                }

                self.set_state(WorkflowState::Ready);
                self.try_start()
            }
            Err(err) => {
                let reason = match err {
                    product_lens_common::Error::Validation(reason) => reason,
                    other => other.to_string(),
                };
                info!(%reason, bytes = byte_size, "image rejected");
                self.image = None;
                self.enter_error(reason);
                None
            }
        }
    }

    fn on_model_selected(&mut self, model: String) -> Option<Effect> {
        if self.model.as_deref() == Some(model.as_str()) {
            return None;
        }
        if let Some(catalog) = &self.catalog {
            if !catalog.contains(&model) {
                warn!(%model, "ignoring selection outside the usable catalog");
                return None;
            }
        }
        self.apply_model(model)
    }

    fn apply_model(&mut self, model: String) -> Option<Effect> {
        debug!(%model, "model selected");
        self.model = Some(model);

        match self.state {
            WorkflowState::Initial => None,
            WorkflowState::Ready => self.try_start(),
            WorkflowState::Loading | WorkflowState::Processed | WorkflowState::Error => {
                if self.image.is_some() && self.blocked.is_none() {
                    self.start_sequence()
                } else {
                    None
                }
            }
        }
    }

    fn on_analysis_finished(
        &mut self,
        tag: PairTag,
        outcome: std::result::Result<AnalysisOutput, String>,
    ) {
        self.in_flight.remove(&tag);
        if self.state != WorkflowState::Loading || self.active.as_ref() != Some(&tag) {
            debug!(upload = tag.upload, model = %tag.model, "discarding result of superseded pair");
            return;
        }

        match outcome {
            Ok(output) => {
                info!(labels = output.detection.len(), "analysis processed");
                self.detection = Some(output.detection);
                self.description = Some(output.description);
                self.set_state(WorkflowState::Processed);
            }
            Err(message) => {
                warn!(%message, "analysis failed");
                self.enter_error(normalize_message(message));
            }
        }
    }

    /// Ready かつ画像とモデルが揃っていれば自動でLoadingへ
    fn try_start(&mut self) -> Option<Effect> {
        if self.state == WorkflowState::Ready
            && self.image.is_some()
            && self.model.is_some()
            && self.blocked.is_none()
        {
            self.start_sequence()
        } else {
            None
        }
    }

    fn start_sequence(&mut self) -> Option<Effect> {
        let image = self.image.clone()?;
        let model = self.model.clone()?;
        let tag = PairTag {
            upload: self.upload_seq,
            model,
        };

        if self.active.as_ref() == Some(&tag)
            && matches!(self.state, WorkflowState::Loading | WorkflowState::Processed)
        {
            return None;
        }

        self.active = Some(tag.clone());
        self.reset_summary();
        self.set_state(WorkflowState::Loading);

        // 同じペアが進行中なら結果の到着を待つだけにする
        if !self.in_flight.insert(tag.clone()) {
            debug!(upload = tag.upload, model = %tag.model, "pair already in flight, reattached");
            return None;
        }
        Some(Effect::StartAnalysis(AnalysisRequest { tag, image }))
    }

    fn block(&mut self, reason: String) {
        self.blocked = Some(reason.clone());
        self.active = None;
        self.enter_error(reason);
    }

    fn reset_summary(&mut self) {
        self.detection = None;
        self.description = None;
        self.error = None;
    }

    fn enter_error(&mut self, message: String) {
        self.error = Some(message);
        self.set_state(WorkflowState::Error);
    }

    fn set_state(&mut self, next: WorkflowState) {
        if self.state != next {
            debug!(from = self.state.as_str(), to = next.as_str(), "workflow transition");
        }
        self.state = next;
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// 利用可能なモデル（カタログ未取得ならNone）
    pub fn catalog(&self) -> Option<&ModelCatalog> {
        self.catalog.as_ref()
    }

    pub fn detection(&self) -> Option<&DetectionResult> {
        self.detection.as_ref()
    }

    pub fn description(&self) -> Option<&DescriptionResult> {
        self.description.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn active_pair(&self) -> Option<&PairTag> {
        self.active.as_ref()
    }

    /// 完了イベント未着のシーケンス数
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// エラーバナーの文言（Error状態のときのみ）
    pub fn banner(&self) -> Option<String> {
        if self.state != WorkflowState::Error {
            return None;
        }
        Some(match self.error.as_deref() {
            Some(message) if !message.is_empty() => format!("An error happened: {}.", message),
            _ => "An error happened.".to_string(),
        })
    }
}

fn normalize_message(message: String) -> String {
    if message.trim().is_empty() {
        FALLBACK_ERROR.to_string()
    } else {
        message
    }
}
