use crate::error::{ProductLensError, Result};
use product_lens_common::prompts::DEFAULT_MAX_TOKENS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 初期選択するモデルバージョン
    pub model_version: Option<String>,
    /// 商品説明生成モデル
    pub description_model: String,
    pub max_tokens: u32,
    /// 外部CLIのコマンド名
    pub aws_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_version: None,
            description_model: "anthropic.claude-3-sonnet-20240229-v1:0".into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            aws_command: "aws".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ProductLensError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("product-lens").join("config.json"))
    }

    pub fn set_model_version(&mut self, model: String) -> Result<()> {
        if model.trim().is_empty() {
            return Err(ProductLensError::Config("モデルバージョンが空です".into()));
        }
        self.model_version = Some(model);
        self.save()
    }

    pub fn set_description_model(&mut self, model: String) -> Result<()> {
        if model.trim().is_empty() {
            return Err(ProductLensError::Config("説明生成モデルが空です".into()));
        }
        self.description_model = model;
        self.save()
    }
}
