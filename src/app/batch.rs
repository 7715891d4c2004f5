use crate::core::processor::ShortNameProcessor;
use crate::domain::model::{BatchItem, BatchReport};
use crate::utils::error::{Result, ShortNameError};
use crate::utils::validation::validate_positive_number;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const DESCRIPTION_HEADERS: &[&str] = &["description", "full description", "product description"];

/// 讀取描述清單：`.csv` 取 description 欄（無此欄則取第一欄），其餘每行一筆
pub fn read_descriptions<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if !is_csv {
        let content = std::fs::read_to_string(path)?;
        return Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let column = reader
        .headers()?
        .iter()
        .position(|h| DESCRIPTION_HEADERS.contains(&h.to_lowercase().as_str()))
        .unwrap_or(0);

    let mut descriptions = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(description) = record.get(column).filter(|d| !d.is_empty()) {
            descriptions.push(description.to_string());
        }
    }
    Ok(descriptions)
}

/// 以有限並發處理批次；所有項目共用同一份詞典快照，結果維持輸入順序
pub async fn run_concurrent(
    processor: Arc<ShortNameProcessor>,
    descriptions: Vec<String>,
    concurrency: usize,
) -> Result<BatchReport> {
    validate_positive_number("batch.concurrency", concurrency, 1)?;

    let snapshot = processor.snapshot();
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    tracing::info!(
        "🚀 Processing {} descriptions (concurrency {})",
        descriptions.len(),
        concurrency
    );

    for (index, description) in descriptions.into_iter().enumerate() {
        let processor = Arc::clone(&processor);
        let snapshot = Arc::clone(&snapshot);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let item = tokio::task::spawn_blocking(move || {
                match processor.process_with(&snapshot, &description) {
                    Ok(result) => BatchItem::from_result(&result),
                    Err(e) => {
                        tracing::warn!("Batch item {} failed: {}", index + 1, e);
                        BatchItem::failed(&description, e)
                    }
                }
            })
            .await;
            (index, item)
        });
    }

    let mut results: Vec<(usize, BatchItem)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, item) = joined.map_err(|e| ShortNameError::ProcessingError {
            message: format!("batch task failed: {}", e),
        })?;
        let item = item.map_err(|e| ShortNameError::ProcessingError {
            message: format!("batch worker failed: {}", e),
        })?;
        results.push((index, item));
    }
    results.sort_by_key(|(index, _)| *index);

    let report = BatchReport::new(results.into_iter().map(|(_, item)| item).collect());
    tracing::info!(
        "✅ Batch complete: {}/{} succeeded",
        report.succeeded,
        report.count
    );
    Ok(report)
}

pub fn write_report_csv<P: AsRef<Path>>(report: &BatchReport, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["original", "short_name", "success", "character_count", "error"])?;
    for item in &report.results {
        writer.write_record([
            item.original.as_str(),
            item.short_name.as_str(),
            if item.success { "true" } else { "false" },
            &item.character_count.to_string(),
            item.error.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    tracing::info!("📁 Batch results saved to: {}", path.display());
    Ok(())
}
