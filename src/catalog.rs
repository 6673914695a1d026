//! モデルカタログの読み込み
//!
//! プロジェクト一覧を取得し、各プロジェクトのバージョン一覧をまとめて取得する。
//! 状態での絞り込みはワークフロー側（`ModelCatalog::usable`）で行う。
//! バージョンの起動・停止もここから要求する。

use crate::error::{ProductLensError, Result};
use crate::services::{CatalogGateway, ModelLifecycle};
use futures::future::try_join_all;
use product_lens_common::{ModelCatalog, VersionStatus, MIN_INFERENCE_UNITS};
use tracing::{debug, info};

pub async fn load_catalog(gateway: &dyn CatalogGateway) -> Result<ModelCatalog> {
    let projects = gateway.describe_projects().await?;
    debug!(count = projects.project_descriptions.len(), "projects described");

    let versions = try_join_all(projects.project_descriptions.iter().map(|project| async move {
        let list = gateway
            .describe_project_versions(&project.project_arn)
            .await?;
        Ok::<_, ProductLensError>((project.project_arn.clone(), list))
    }))
    .await?;

    let catalog = ModelCatalog::from_versions(&versions);
    info!(
        total = catalog.len(),
        usable = catalog.usable().len(),
        "model catalog loaded"
    );
    Ok(catalog)
}

/// バージョンの起動を要求する（起動完了までは待たない）
pub async fn start_version(
    lifecycle: &dyn ModelLifecycle,
    version_arn: &str,
    min_inference_units: u32,
) -> Result<VersionStatus> {
    let version_arn = checked_arn(version_arn)?;
    if min_inference_units < MIN_INFERENCE_UNITS {
        return Err(ProductLensError::Validation(format!(
            "min inference units must be at least {}",
            MIN_INFERENCE_UNITS
        )));
    }

    let status = lifecycle.start_version(version_arn, min_inference_units).await?;
    info!(
        version = version_arn,
        units = min_inference_units,
        status = %status.status,
        "version start requested"
    );
    Ok(status)
}

pub async fn stop_version(
    lifecycle: &dyn ModelLifecycle,
    version_arn: &str,
) -> Result<VersionStatus> {
    let version_arn = checked_arn(version_arn)?;
    let status = lifecycle.stop_version(version_arn).await?;
    info!(version = version_arn, status = %status.status, "version stop requested");
    Ok(status)
}

fn checked_arn(version_arn: &str) -> Result<&str> {
    let trimmed = version_arn.trim();
    if trimmed.is_empty() {
        return Err(ProductLensError::Validation("model version id is empty".into()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use product_lens_common::catalog::{
        ProjectDescription, ProjectList, ProjectVersionDescription, ProjectVersionList,
    };

    struct FixedGateway;

    #[async_trait(?Send)]
    impl CatalogGateway for FixedGateway {
        async fn describe_projects(&self) -> Result<ProjectList> {
            Ok(ProjectList {
                project_descriptions: vec![
                    ProjectDescription { project_arn: "p1".into(), status: "CREATED".into() },
                    ProjectDescription { project_arn: "p2".into(), status: "CREATED".into() },
                ],
            })
        }

        async fn describe_project_versions(&self, project_arn: &str) -> Result<ProjectVersionList> {
            let status = if project_arn == "p1" { "RUNNING" } else { "STOPPED" };
            Ok(ProjectVersionList {
                project_version_descriptions: vec![ProjectVersionDescription {
                    project_version_arn: format!("{}-v1", project_arn),
                    status: status.into(),
                    status_message: None,
                }],
            })
        }
    }

    struct BrokenGateway;

    #[async_trait(?Send)]
    impl CatalogGateway for BrokenGateway {
        async fn describe_projects(&self) -> Result<ProjectList> {
            Err(ProductLensError::RemoteCall("access denied".into()))
        }

        async fn describe_project_versions(
            &self,
            _project_arn: &str,
        ) -> Result<ProjectVersionList> {
            unreachable!("versions must not be requested when listing fails")
        }
    }

    #[tokio::test]
    async fn test_load_catalog_keeps_order_and_states() {
        let catalog = load_catalog(&FixedGateway).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].id, "p1-v1");
        assert_eq!(catalog.entries()[0].project, "p1");
        assert_eq!(catalog.entries()[1].state, "STOPPED");
        assert_eq!(catalog.usable().len(), 1);
    }

    #[tokio::test]
    async fn test_load_catalog_propagates_failure() {
        let err = load_catalog(&BrokenGateway).await.unwrap_err();
        assert_eq!(err.to_string(), "access denied");
    }

    #[derive(Default)]
    struct RecordingLifecycle {
        requests: std::cell::RefCell<Vec<(String, Option<u32>)>>,
    }

    #[async_trait(?Send)]
    impl ModelLifecycle for RecordingLifecycle {
        async fn start_version(&self, version_arn: &str, units: u32) -> Result<VersionStatus> {
            self.requests.borrow_mut().push((version_arn.to_string(), Some(units)));
            Ok(VersionStatus { status: "STARTING".into() })
        }

        async fn stop_version(&self, version_arn: &str) -> Result<VersionStatus> {
            self.requests.borrow_mut().push((version_arn.to_string(), None));
            Ok(VersionStatus { status: "STOPPING".into() })
        }
    }

    #[tokio::test]
    async fn test_start_and_stop_version() {
        let lifecycle = RecordingLifecycle::default();
        let started = start_version(&lifecycle, " arn:v1 ", 2).await.unwrap();
        assert_eq!(started.status, "STARTING");
        let stopped = stop_version(&lifecycle, "arn:v1").await.unwrap();
        assert_eq!(stopped.status, "STOPPING");

        assert_eq!(
            lifecycle.requests.borrow().as_slice(),
            [("arn:v1".to_string(), Some(2)), ("arn:v1".to_string(), None)]
        );
    }

    #[tokio::test]
    async fn test_start_version_rejects_zero_units_and_empty_id() {
        let lifecycle = RecordingLifecycle::default();
        assert!(matches!(
            start_version(&lifecycle, "arn:v1", 0).await,
            Err(ProductLensError::Validation(_))
        ));
        assert!(matches!(
            stop_version(&lifecycle, "  ").await,
            Err(ProductLensError::Validation(_))
        ));
        assert!(lifecycle.requests.borrow().is_empty());
    }
}
