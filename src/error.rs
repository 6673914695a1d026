use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProductLensError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    EmptyCatalog(String),

    #[error("{0}")]
    RemoteCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<product_lens_common::Error> for ProductLensError {
    fn from(err: product_lens_common::Error) -> Self {
        match err {
            product_lens_common::Error::Validation(reason) => ProductLensError::Validation(reason),
            other => ProductLensError::ApiParse(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProductLensError>;
