//! 解析パイプライン
//!
//! ステージNの出力がステージN+1の必須入力になる逐次チェーン。
//! ラベル検出 → 商品説明生成 の順序はチェーンの型で保証される。

use super::state::{AnalysisOutput, AnalysisRequest, Event};
use crate::error::{ProductLensError, Result};
use crate::services::{DescriptionService, LabelService};
use async_trait::async_trait;
use product_lens_common::{parse_description_envelope, DetectionResult};
use std::rc::Rc;
use tracing::debug;

#[async_trait(?Send)]
pub trait Stage {
    type Input: 'static;
    type Output: 'static;

    fn name(&self) -> &'static str;
    async fn run(&self, input: Self::Input) -> Result<Self::Output>;
}

/// 2つのステージを順に実行する
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chain<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

#[async_trait(?Send)]
impl<A, B> Stage for Chain<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn name(&self) -> &'static str {
        "chain"
    }

    async fn run(&self, input: A::Input) -> Result<B::Output> {
        debug!(stage = self.first.name(), "stage started");
        let intermediate = self.first.run(input).await?;
        debug!(stage = self.first.name(), "stage finished");

        debug!(stage = self.second.name(), "stage started");
        let output = self.second.run(intermediate).await?;
        debug!(stage = self.second.name(), "stage finished");
        Ok(output)
    }
}

/// ラベル検出済みの中間結果
#[derive(Debug, Clone)]
pub struct Detected {
    pub request: AnalysisRequest,
    pub detection: DetectionResult,
}

pub struct LabelStage {
    service: Rc<dyn LabelService>,
}

impl LabelStage {
    pub fn new(service: Rc<dyn LabelService>) -> Self {
        Self { service }
    }
}

#[async_trait(?Send)]
impl Stage for LabelStage {
    type Input = AnalysisRequest;
    type Output = Detected;

    fn name(&self) -> &'static str {
        "label-detection"
    }

    async fn run(&self, request: AnalysisRequest) -> Result<Detected> {
        let detection = self.service.detect(&request.image, request.model()).await?;
        Ok(Detected { request, detection })
    }
}

pub struct DescriptionStage {
    service: Rc<dyn DescriptionService>,
}

impl DescriptionStage {
    pub fn new(service: Rc<dyn DescriptionService>) -> Self {
        Self { service }
    }
}

#[async_trait(?Send)]
impl Stage for DescriptionStage {
    type Input = Detected;
    type Output = AnalysisOutput;

    fn name(&self) -> &'static str {
        "description-generation"
    }

    async fn run(&self, input: Detected) -> Result<AnalysisOutput> {
        let envelope = self
            .service
            .generate(&input.request.image, &input.detection.summary())
            .await?;
        // 本文の不正はリモート呼び出しの失敗として扱う
        let description = parse_description_envelope(&envelope)
            .map_err(|e| ProductLensError::RemoteCall(e.to_string()))?;

        Ok(AnalysisOutput {
            detection: input.detection,
            description,
        })
    }
}

pub type AnalysisPipeline = Chain<LabelStage, DescriptionStage>;

pub fn analysis_pipeline(
    labels: Rc<dyn LabelService>,
    descriptions: Rc<dyn DescriptionService>,
) -> AnalysisPipeline {
    Chain::new(LabelStage::new(labels), DescriptionStage::new(descriptions))
}

/// シーケンスを実行し、開始時のペアでタグ付けした完了イベントを返す
pub async fn run_sequence<P>(pipeline: &P, request: AnalysisRequest) -> Event
where
    P: Stage<Input = AnalysisRequest, Output = AnalysisOutput> + ?Sized,
{
    let tag = request.tag.clone();
    let outcome = pipeline.run(request).await.map_err(|e| e.to_string());
    Event::AnalysisFinished { tag, outcome }
}
