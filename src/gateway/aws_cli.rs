//! AWS CLI連携モジュール
//!
//! カタログ取得・バージョン起動停止・ラベル検出・商品説明生成を
//! 外部の `aws` コマンドで実行する。
//! リクエストは一時JSONファイル経由で渡す（画像ペイロードが引数長制限を超えるため）。
//! `cli_binary_format` がbase64（CLI v2の既定）であることを前提とする。

use crate::config::Config;
use crate::error::{ProductLensError, Result};
use crate::services::{CatalogGateway, DescriptionService, LabelService, ModelLifecycle};
use async_trait::async_trait;
use product_lens_common::catalog::{ProjectList, ProjectVersionList, VersionStatus};
use product_lens_common::prompts::{build_description_request, build_detection_request};
use product_lens_common::{
    parse_detection_response, DescriptionEnvelope, DetectionResult, UploadedImage,
};
use serde::Serialize;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

pub struct AwsCliGateway {
    command: String,
    description_model: String,
    max_tokens: u32,
}

impl AwsCliGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.aws_command.clone(),
            description_model: config.description_model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!(
            command = %self.command,
            operation = args.get(1).copied().unwrap_or(""),
            "running external command"
        );

        let output = Command::new(&self.command)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                ProductLensError::CliExecution(format!("{} の実行に失敗: {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProductLensError::RemoteCall(format!(
                "{} failed (code {:?}): {}",
                args.get(1).copied().unwrap_or(&self.command),
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn start_version_args(version_arn: &str, min_inference_units: u32) -> Vec<String> {
    vec![
        "rekognition".into(),
        "start-project-version".into(),
        "--project-version-arn".into(),
        version_arn.into(),
        "--min-inference-units".into(),
        min_inference_units.to_string(),
        "--output".into(),
        "json".into(),
    ]
}

fn stop_version_args(version_arn: &str) -> Vec<String> {
    vec![
        "rekognition".into(),
        "stop-project-version".into(),
        "--project-version-arn".into(),
        version_arn.into(),
        "--output".into(),
        "json".into(),
    ]
}

/// リクエストを一時ファイルに書き出す（戻り値の破棄でファイル削除）
fn write_request<T: Serialize>(request: &T) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("product-lens-")
        .suffix(".json")
        .tempfile()?;
    serde_json::to_writer(&mut file, request)?;
    file.flush()?;
    Ok(file)
}

#[async_trait(?Send)]
impl CatalogGateway for AwsCliGateway {
    async fn describe_projects(&self) -> Result<ProjectList> {
        let stdout = self
            .run(&["rekognition", "describe-projects", "--output", "json"])
            .await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    async fn describe_project_versions(&self, project_arn: &str) -> Result<ProjectVersionList> {
        let stdout = self
            .run(&[
                "rekognition",
                "describe-project-versions",
                "--project-arn",
                project_arn,
                "--output",
                "json",
            ])
            .await?;
        Ok(serde_json::from_str(&stdout)?)
    }
}

#[async_trait(?Send)]
impl ModelLifecycle for AwsCliGateway {
    async fn start_version(
        &self,
        version_arn: &str,
        min_inference_units: u32,
    ) -> Result<VersionStatus> {
        let args = start_version_args(version_arn, min_inference_units);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.run(&args).await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    async fn stop_version(&self, version_arn: &str) -> Result<VersionStatus> {
        let args = stop_version_args(version_arn);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.run(&args).await?;
        Ok(serde_json::from_str(&stdout)?)
    }
}

#[async_trait(?Send)]
impl LabelService for AwsCliGateway {
    async fn detect(&self, image: &UploadedImage, model: &str) -> Result<DetectionResult> {
        let request = write_request(&build_detection_request(image, model))?;
        let input = format!("file://{}", request.path().display());

        let stdout = self
            .run(&[
                "rekognition",
                "detect-custom-labels",
                "--cli-input-json",
                &input,
                "--output",
                "json",
            ])
            .await?;
        Ok(parse_detection_response(&stdout)?)
    }
}

#[async_trait(?Send)]
impl DescriptionService for AwsCliGateway {
    async fn generate(
        &self,
        image: &UploadedImage,
        prompt_context: &str,
    ) -> Result<DescriptionEnvelope> {
        let request = build_description_request(image, prompt_context, self.max_tokens);
        let body = write_request(&request)?;
        let body_arg = format!("fileb://{}", body.path().display());
        let outfile = NamedTempFile::new()?;
        let outfile_arg = outfile.path().display().to_string();

        self.run(&[
            "bedrock-runtime",
            "invoke-model",
            "--model-id",
            &self.description_model,
            "--content-type",
            "application/json",
            "--accept",
            "application/json",
            "--body",
            &body_arg,
            &outfile_arg,
        ])
        .await?;

        let response = tokio::fs::read_to_string(outfile.path()).await?;
        Ok(DescriptionEnvelope::new(response))
    }
}
