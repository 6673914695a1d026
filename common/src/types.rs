//! 解析データの型定義
//!
//! CLIとワークフローで共有される型:
//! - UploadedImage: 検証済みのアップロード画像
//! - DetectionResult: ラベル検出サービスの出力
//! - DescriptionResult: 商品説明生成サービスの出力
//! - ViewportRect: オーバーレイ描画用の画像矩形

use serde::{Deserialize, Serialize};

/// 検証済みのアップロード画像
///
/// 受理後は不変。新しいアップロードのたびに丸ごと置き換えられる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    mime_type: String,
    data: String,
    byte_size: u64,
}

impl UploadedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>, byte_size: u64) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
            byte_size,
        }
    }

    /// Base64ペイロード（Data URLの宣言部を除く）
    pub fn base64(&self) -> &str {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Data URLの宣言部とペイロード
///
/// `"data:image/png;base64,iVBOR..."` → 宣言部 `"data:image/png;base64"` とペイロード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub declaration: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// 最初の `,` で分割する。`,` がなければペイロードは空
    pub fn split(data_url: &'a str) -> Self {
        match data_url.split_once(',') {
            Some((declaration, payload)) => Self { declaration, payload },
            None => Self { declaration: data_url, payload: "" },
        }
    }

    /// 宣言部からMIMEタイプを取り出す（`data:` がなければNone）
    pub fn mime_type(&self) -> Option<&'a str> {
        self.declaration
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .filter(|mime| !mime.is_empty())
    }
}

/// 検出ラベルの外接矩形（画像サイズに対する比率 0.0〜1.0）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

impl BoundingBox {
    /// 画面上の画像矩形に投影する
    pub fn project(&self, image: &ViewportRect) -> ViewportRect {
        ViewportRect {
            x: image.x + self.left * image.width,
            y: image.y + self.top * image.height,
            width: self.width * image.width,
            height: self.height * image.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Geometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub polygon: Vec<Point>,
}

/// 検出ラベル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

impl Label {
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.geometry.as_ref().and_then(|g| g.bounding_box.as_ref())
    }
}

/// ラベル検出結果
///
/// ラベル列に加えて、後段（説明生成・描画）用に生レスポンスを保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    labels: Vec<Label>,
    raw: serde_json::Value,
}

impl DetectionResult {
    pub fn new(labels: Vec<Label>, raw: serde_json::Value) -> Self {
        Self { labels, raw }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 説明生成に渡すラベル要約（生レスポンスを2スペースインデントで整形）
    pub fn summary(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_else(|_| self.raw.to_string())
    }
}

/// 商品説明の生成結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionResult {
    pub text: String,
}

/// 表示中の画像要素の画面上の矩形
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}
