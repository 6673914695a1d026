//! リモートサービスへのリクエスト生成
//!
//! - build_detection_request: ラベル検出リクエスト
//! - build_description_prompt: 商品説明生成用プロンプト
//! - build_description_request: 商品説明生成リクエスト（messages形式）

use crate::types::UploadedImage;
use serde::Serialize;

pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// ラベル検出リクエスト
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetectionRequest<'a> {
    pub image: ImageBytes<'a>,
    pub project_version_arn: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageBytes<'a> {
    pub bytes: &'a str,
}

pub fn build_detection_request<'a>(
    image: &'a UploadedImage,
    model: &'a str,
) -> DetectionRequest<'a> {
    DetectionRequest {
        image: ImageBytes { bytes: image.base64() },
        project_version_arn: model,
    }
}

/// 商品説明生成リクエスト
#[derive(Debug, Serialize)]
pub struct DescriptionRequest<'a> {
    pub anthropic_version: &'static str,
    pub max_tokens: u32,
    pub messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: String },
}

#[derive(Debug, Serialize)]
pub struct ImageSource<'a> {
    #[serde(rename = "type")]
    pub source_type: &'static str,
    pub media_type: &'a str,
    pub data: &'a str,
}

/// 商品説明プロンプト
///
/// # Arguments
/// * `labels` - 検出結果の要約（整形済みJSON）
pub fn build_description_prompt(labels: &str) -> String {
    format!(
        "Generate a new product description for this image including the slight wear and tear based on these detected labels: {}",
        labels
    )
}

pub fn build_description_request<'a>(
    image: &'a UploadedImage,
    labels: &str,
    max_tokens: u32,
) -> DescriptionRequest<'a> {
    DescriptionRequest {
        anthropic_version: ANTHROPIC_VERSION,
        max_tokens,
        messages: vec![Message {
            role: "user",
            content: vec![
                ContentBlock::Image {
                    source: ImageSource {
                        source_type: "base64",
                        media_type: image.mime_type(),
                        data: image.base64(),
                    },
                },
                ContentBlock::Text {
                    text: build_description_prompt(labels),
                },
            ],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_request_shape() {
        let image = UploadedImage::new("image/png", "iVBOR", 5);
        let request = build_detection_request(&image, "arn:model");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["Image"]["Bytes"], "iVBOR");
        assert_eq!(json["ProjectVersionArn"], "arn:model");
    }

    #[test]
    fn test_description_request_shape() {
        let image = UploadedImage::new("image/jpeg", "/9j/", 4);
        let request =
            build_description_request(&image, "{\"CustomLabels\": []}", DEFAULT_MAX_TOKENS);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(json["max_tokens"], 1000);
        let content = &json["messages"][0]["content"];
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/jpeg");
        assert_eq!(content[0]["source"]["data"], "/9j/");
        assert_eq!(content[1]["type"], "text");
        assert!(content[1]["text"].as_str().unwrap().ends_with("{\"CustomLabels\": []}"));
    }

    #[test]
    fn test_description_prompt_mentions_wear() {
        let prompt = build_description_prompt("[]");
        assert!(prompt.contains("wear and tear"));
    }
}
