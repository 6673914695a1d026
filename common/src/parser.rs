//! リモートサービスのレスポンスパーサー
//!
//! - ラベル検出レスポンス（`CustomLabels` 配列）→ DetectionResult
//! - 商品説明エンベロープ（`body` にJSON文字列）→ DescriptionResult

use crate::error::{Error, Result};
use crate::types::{DescriptionResult, DetectionResult, Label};
use serde::{Deserialize, Serialize};

/// 商品説明サービスのレスポンスエンベロープ
///
/// `body` はJSONエンコードされた文字列で、利用側がパースしてから本文を取り出す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionEnvelope {
    pub body: String,
}

impl DescriptionEnvelope {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// ラベル検出レスポンス文字列をパース
pub fn parse_detection_response(response: &str) -> Result<DetectionResult> {
    let raw: serde_json::Value = serde_json::from_str(response.trim())?;
    detection_from_value(raw)
}

/// パース済みJSONから DetectionResult を作る（生レスポンスは保持）
pub fn detection_from_value(raw: serde_json::Value) -> Result<DetectionResult> {
    let labels = raw
        .get("CustomLabels")
        .ok_or_else(|| Error::Parse("CustomLabels が見つかりません".into()))?;
    let labels: Vec<Label> = serde_json::from_value(labels.clone())
        .map_err(|e| Error::Parse(format!("ラベル JSONパースエラー: {}", e)))?;
    Ok(DetectionResult::new(labels, raw))
}

/// 商品説明エンベロープの本文をパース
///
/// 受理する形式:
/// 1. `{"Answer": "..."}`（ゲートウェイ形式）
/// 2. `{"content": [{"type": "text", "text": "..."}]}`（messages形式）
pub fn parse_description_envelope(envelope: &DescriptionEnvelope) -> Result<DescriptionResult> {
    let body: serde_json::Value = serde_json::from_str(envelope.body.trim())
        .map_err(|e| Error::Parse(format!("説明レスポンス JSONパースエラー: {}", e)))?;

    let text = if let Some(answer) = body.get("Answer").and_then(|a| a.as_str()) {
        answer.to_string()
    } else if let Some(blocks) = body.get("content").and_then(|c| c.as_array()) {
        blocks
            .iter()
            .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("")
    } else {
        return Err(Error::Parse("説明レスポンスに本文がありません".into()));
    };

    if text.trim().is_empty() {
        return Err(Error::Parse("説明レスポンスの本文が空です".into()));
    }

    Ok(DescriptionResult { text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detection_response() {
        let response = r#"{
  "CustomLabels": [
    {"Name": "sneaker", "Confidence": 98.2, "Geometry": {"BoundingBox": {"Width": 0.5, "Height": 0.4, "Left": 0.1, "Top": 0.2}}},
    {"Name": "scuff", "Confidence": 71.0}
  ]
}"#;
        let result = parse_detection_response(response).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.labels()[0].name, "sneaker");
        assert_eq!(result.labels()[1].name, "scuff");
        assert!(result.raw().get("CustomLabels").is_some());
    }

    #[test]
    fn test_parse_detection_empty_labels() {
        let result = parse_detection_response(r#"{"CustomLabels": []}"#).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_detection_missing_labels() {
        let err = parse_detection_response(r#"{"Labels": []}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_parse_detection_invalid_json() {
        let err = parse_detection_response("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_summary_is_pretty_printed() {
        let response = r#"{"CustomLabels":[{"Name":"a","Confidence":1.0}]}"#;
        let result = parse_detection_response(response).unwrap();
        let summary = result.summary();
        assert!(summary.contains("\n  \"CustomLabels\""));
    }

    #[test]
    fn test_parse_gateway_answer() {
        let envelope = DescriptionEnvelope::new(r#"{"Answer": "Lightly worn white sneakers."}"#);
        let result = parse_description_envelope(&envelope).unwrap();
        assert_eq!(result.text, "Lightly worn white sneakers.");
    }

    #[test]
    fn test_parse_messages_content() {
        let envelope = DescriptionEnvelope::new(
            r#"{"id": "msg_1", "content": [{"type": "text", "text": "Part one. "}, {"type": "text", "text": "Part two."}], "stop_reason": "end_turn"}"#,
        );
        let result = parse_description_envelope(&envelope).unwrap();
        assert_eq!(result.text, "Part one. Part two.");
    }

    #[test]
    fn test_parse_malformed_envelope() {
        let envelope = DescriptionEnvelope::new("{\"Answer\": ");
        assert!(matches!(parse_description_envelope(&envelope), Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_envelope_without_text() {
        let envelope = DescriptionEnvelope::new(r#"{"Other": 1}"#);
        assert!(parse_description_envelope(&envelope).is_err());

        let blank = DescriptionEnvelope::new(r#"{"Answer": "  "}"#);
        assert!(parse_description_envelope(&blank).is_err());
    }
}
