//! リモートサービスの境界
//!
//! ワークフローはこのトレイト越しにのみ外部と通信する。
//! 実行は単一スレッドの協調モデルなので `Send` は要求しない。

use crate::error::Result;
use async_trait::async_trait;
use product_lens_common::catalog::{ProjectList, ProjectVersionList, VersionStatus};
use product_lens_common::{DescriptionEnvelope, DetectionResult, UploadedImage};

/// ラベル検出サービス
#[async_trait(?Send)]
pub trait LabelService {
    async fn detect(&self, image: &UploadedImage, model: &str) -> Result<DetectionResult>;
}

/// 商品説明生成サービス
#[async_trait(?Send)]
pub trait DescriptionService {
    /// `prompt_context` はラベル検出結果の要約
    async fn generate(
        &self,
        image: &UploadedImage,
        prompt_context: &str,
    ) -> Result<DescriptionEnvelope>;
}

/// モデルカタログの取得元
#[async_trait(?Send)]
pub trait CatalogGateway {
    async fn describe_projects(&self) -> Result<ProjectList>;
    async fn describe_project_versions(&self, project_arn: &str) -> Result<ProjectVersionList>;
}

/// モデルバージョンの起動・停止
///
/// 稼働中バージョンがないカタログから抜け出すための操作。応答は要求受付時の状態。
#[async_trait(?Send)]
pub trait ModelLifecycle {
    async fn start_version(
        &self,
        version_arn: &str,
        min_inference_units: u32,
    ) -> Result<VersionStatus>;
    async fn stop_version(&self, version_arn: &str) -> Result<VersionStatus>;
}
