//! アップロード画像の検証
//!
//! 形式（JPEG/PNGのBase64 Data URL）とサイズ（4,000,000バイト未満）を独立に判定する。
//! 両方失敗した場合は両方の理由を " and " で連結して返す。

use crate::error::{Error, Result};
use crate::types::{DataUrl, UploadedImage};

/// 受理するData URL宣言部
pub const ACCEPTED_DECLARATIONS: &[&str] = &["data:image/jpeg;base64", "data:image/png;base64"];

/// 受理する最大サイズ（このバイト数以上は不可）
pub const MAX_IMAGE_BYTES: u64 = 4_000_000;

pub const INVALID_FORMAT: &str = "the image format is not valid";
pub const INVALID_SIZE: &str = "the image size is not valid";

/// 検証結果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validation {
    pub accepted: bool,
    pub reasons: Vec<String>,
}

impl Validation {
    /// 失敗理由の連結（受理時はNone）
    pub fn reason(&self) -> Option<String> {
        if self.reasons.is_empty() {
            None
        } else {
            Some(self.reasons.join(" and "))
        }
    }
}

/// 宣言部とバイト数を検証する（副作用なし）
pub fn validate(declaration: &str, byte_size: u64) -> Validation {
    let valid_type = ACCEPTED_DECLARATIONS.contains(&declaration);
    let valid_size = byte_size < MAX_IMAGE_BYTES;

    let mut reasons = Vec::new();
    if !valid_type {
        reasons.push(INVALID_FORMAT.to_string());
    }
    if !valid_size {
        reasons.push(INVALID_SIZE.to_string());
    }

    Validation {
        accepted: valid_type && valid_size,
        reasons,
    }
}

/// Data URLを検証し、受理できれば UploadedImage を生成する
///
/// # Arguments
/// * `data_url` - "data:image/png;base64,..." 形式の文字列
/// * `byte_size` - 元ファイルのバイト数
pub fn accept(data_url: &str, byte_size: u64) -> Result<UploadedImage> {
    let url = DataUrl::split(data_url);
    let validation = validate(url.declaration, byte_size);

    match validation.reason() {
        Some(reason) => Err(Error::Validation(reason)),
        None => {
            let mime_type = url.mime_type().unwrap_or("image/jpeg");
            Ok(UploadedImage::new(mime_type, url.payload, byte_size))
        }
    }
}
