//! 対話式モデルバージョン選択

use crate::error::{ProductLensError, Result};
use dialoguer::Select;
use product_lens_common::ModelCatalog;

/// 現在の選択がカタログ内にあればその位置、なければ先頭
pub fn default_index(catalog: &ModelCatalog, current: Option<&str>) -> usize {
    current
        .and_then(|id| catalog.entries().iter().position(|e| e.id == id))
        .unwrap_or(0)
}

/// カタログから1件選ばせ、そのIDを返す
pub fn pick_model(catalog: &ModelCatalog, current: Option<&str>) -> Result<String> {
    let items: Vec<String> = catalog.entries().iter().map(|e| e.display_name()).collect();
    if items.is_empty() {
        return Err(ProductLensError::EmptyCatalog(product_lens_common::empty_catalog_message()));
    }

    let index = Select::new()
        .with_prompt("モデルバージョンを選択")
        .items(&items[..])
        .default(default_index(catalog, current))
        .interact()
        .map_err(|e| ProductLensError::CliExecution(format!("選択に失敗: {}", e)))?;

    Ok(catalog.entries()[index].id.clone())
}
