//! 画像ファイルの読み込み
//!
//! ファイル内容からMIMEタイプを判定し、Base64のData URLとして返す。
//! 形式・サイズの判定はワークフロー側の検証で行う。

use crate::error::{ProductLensError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

const UNKNOWN_MIME: &str = "application/octet-stream";

/// 読み込んだ画像（Data URLとバイト数）
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub data_url: String,
    pub byte_size: u64,
}

pub fn read_image_file(path: &Path) -> Result<ImageFile> {
    if !path.is_file() {
        return Err(ProductLensError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    Ok(encode_data_url(&bytes))
}

pub fn encode_data_url(bytes: &[u8]) -> ImageFile {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(UNKNOWN_MIME);

    ImageFile {
        data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        byte_size: bytes.len() as u64,
    }
}
