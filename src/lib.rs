//! Product Lens
//!
//! 画像のアップロード検証 → ラベル検出 → 商品説明生成 を状態機械で順序付けし、
//! オーバーレイ描画用の画像矩形を追跡する。

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod picker;
pub mod report;
pub mod services;
pub mod upload;
pub mod viewport;
pub mod workflow;
