//! モデルカタログ
//!
//! プロジェクト一覧 → プロジェクトごとのバージョン一覧 の2段階で取得した結果を、
//! 状態が `RUNNING` のバージョンだけに絞り込む。

use serde::{Deserialize, Serialize};

/// 利用可能とみなすバージョン状態
pub const RUNNING: &str = "RUNNING";

/// 利用可能なバージョンが1件もない場合のメッセージ
pub fn empty_catalog_message() -> String {
    format!(
        "There are no project versions with State={} in the current account. \
         This is mandatory in order to use this demo",
        RUNNING
    )
}

/// 起動時に確保する推論ユニット数の下限
pub const MIN_INFERENCE_UNITS: u32 = 1;

/// プロジェクト一覧レスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProjectList {
    pub project_descriptions: Vec<ProjectDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProjectDescription {
    pub project_arn: String,
    pub status: String,
}

/// バージョン一覧レスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProjectVersionList {
    pub project_version_descriptions: Vec<ProjectVersionDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProjectVersionDescription {
    pub project_version_arn: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// バージョン起動/停止レスポンス
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VersionStatus {
    pub status: String,
}

/// 選択可能なモデルバージョン
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelVersion {
    pub id: String,
    pub project: String,
    pub state: String,
}

impl ModelVersion {
    pub fn is_usable(&self) -> bool {
        self.state == RUNNING
    }

    /// 識別子から「プロジェクト名 / バージョン名」を組み立てる
    ///
    /// `arn:aws:rekognition:region:account:project/shoes/version/shoes.v1/1700000000000`
    /// → `shoes / shoes.v1`。形式が異なる場合は識別子をそのまま返す。
    pub fn display_name(&self) -> String {
        let resource = match self.id.split_once("project/") {
            Some((_, rest)) => rest,
            None => return self.id.clone(),
        };
        let mut parts = resource.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(project), Some("version"), Some(version)) => format!("{} / {}", project, version),
            _ => self.id.clone(),
        }
    }
}

/// モデルカタログ（取得順を保持）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    entries: Vec<ModelVersion>,
}

impl ModelCatalog {
    pub fn new(entries: Vec<ModelVersion>) -> Self {
        Self { entries }
    }

    /// プロジェクトごとのバージョン一覧からカタログを作る（重複IDは先勝ち）
    pub fn from_versions(versions: &[(String, ProjectVersionList)]) -> Self {
        let mut entries: Vec<ModelVersion> = Vec::new();
        for (project, list) in versions {
            for version in &list.project_version_descriptions {
                if entries.iter().any(|e| e.id == version.project_version_arn) {
                    continue;
                }
                entries.push(ModelVersion {
                    id: version.project_version_arn.clone(),
                    project: project.clone(),
                    state: version.status.clone(),
                });
            }
        }
        Self { entries }
    }

    /// 指定状態のエントリだけに絞り込む
    pub fn filter_state(&self, state: &str) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|e| e.state == state)
                .cloned()
                .collect(),
        }
    }

    /// 利用可能（RUNNING）なエントリのみ
    pub fn usable(&self) -> Self {
        self.filter_state(RUNNING)
    }

    pub fn entries(&self) -> &[ModelVersion] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&ModelVersion> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 初期選択: 希望IDがカタログにあればそれ、なければ先頭
    pub fn preselect(&self, preferred: Option<&str>) -> Option<&ModelVersion> {
        preferred
            .and_then(|id| self.get(id))
            .or_else(|| self.entries.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN_A: &str = "arn:aws:rekognition:us-east-1:123456789012:project/shoes/version/shoes.v1/1700000000000";
    const ARN_B: &str = "arn:aws:rekognition:us-east-1:123456789012:project/shoes/version/shoes.v2/1700000000001";
    const ARN_C: &str = "arn:aws:rekognition:us-east-1:123456789012:project/bags/version/bags.v1/1700000000002";

    fn version(arn: &str, status: &str) -> ProjectVersionDescription {
        ProjectVersionDescription {
            project_version_arn: arn.to_string(),
            status: status.to_string(),
            status_message: None,
        }
    }

    fn sample() -> ModelCatalog {
        ModelCatalog::from_versions(&[
            (
                "shoes".to_string(),
                ProjectVersionList {
                    project_version_descriptions: vec![
                        version(ARN_A, "RUNNING"),
                        version(ARN_B, "STOPPED"),
                    ],
                },
            ),
            (
                "bags".to_string(),
                ProjectVersionList {
                    project_version_descriptions: vec![version(ARN_C, "RUNNING")],
                },
            ),
        ])
    }

    #[test]
    fn test_usable_keeps_only_running() {
        let usable = sample().usable();
        assert_eq!(usable.len(), 2);
        assert!(usable.contains(ARN_A));
        assert!(!usable.contains(ARN_B));
        assert_eq!(usable.entries()[1].id, ARN_C);
    }

    #[test]
    fn test_usable_empty_when_nothing_running() {
        let catalog = ModelCatalog::from_versions(&[(
            "shoes".to_string(),
            ProjectVersionList {
                project_version_descriptions: vec![
                    version(ARN_A, "STOPPED"),
                    version(ARN_B, "TRAINING_COMPLETED"),
                ],
            },
        )]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.usable().is_empty());
    }

    #[test]
    fn test_preselect() {
        let usable = sample().usable();
        assert_eq!(usable.preselect(Some(ARN_C)).unwrap().id, ARN_C);
        assert_eq!(usable.preselect(Some(ARN_B)).unwrap().id, ARN_A);
        assert_eq!(usable.preselect(None).unwrap().id, ARN_A);
        assert!(ModelCatalog::default().preselect(None).is_none());
    }

    #[test]
    fn test_display_name() {
        let catalog = sample();
        assert_eq!(catalog.entries()[0].display_name(), "shoes / shoes.v1");

        let plain = ModelVersion {
            id: "m1".to_string(),
            project: String::new(),
            state: RUNNING.to_string(),
        };
        assert_eq!(plain.display_name(), "m1");
    }

    #[test]
    fn test_empty_message_names_marker() {
        assert!(empty_catalog_message().contains("State=RUNNING"));
    }

    #[test]
    fn test_deserialize_version_list() {
        let json = r#"{"ProjectVersionDescriptions": [{"ProjectVersionArn": "arn:x", "Status": "RUNNING", "BillableTrainingTimeInSeconds": 10}]}"#;
        let list: ProjectVersionList = serde_json::from_str(json).unwrap();
        assert_eq!(list.project_version_descriptions.len(), 1);
        assert_eq!(list.project_version_descriptions[0].status, "RUNNING");
    }

    #[test]
    fn test_version_status_parse() {
        let status: VersionStatus = serde_json::from_str(r#"{"Status": "STARTING"}"#).unwrap();
        assert_eq!(status.status, "STARTING");

        let empty: VersionStatus = serde_json::from_str("{}").unwrap();
        assert!(empty.status.is_empty());
    }

    #[test]
    fn test_empty_catalog_message_names_running_state() {
        let message = empty_catalog_message();
        assert!(message.starts_with("There are no project versions with State=RUNNING"));
        assert!(message.ends_with("This is mandatory in order to use this demo"));
    }
}
