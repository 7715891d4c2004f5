use crate::core::processor::ShortNameProcessor;
use crate::domain::model::{BatchItem, Component, ProcessingResult};
use crate::utils::error::{Result, ShortNameError};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub description: String,
    #[serde(default)]
    pub dictionary_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentView {
    pub position_number: u32,
    pub position: String,
    pub value: String,
    pub original: String,
    pub mandatory: bool,
}

impl From<&Component> for ComponentView {
    fn from(component: &Component) -> Self {
        Self {
            position_number: component.position_number,
            position: component.position_name.clone(),
            value: component.value.clone(),
            original: component.original.clone(),
            mandatory: component.mandatory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub original: String,
    pub short_name: String,
    pub character_count: usize,
    pub components: Vec<ComponentView>,
    pub messages: Vec<String>,
}

impl From<&ProcessingResult> for GenerateResponse {
    fn from(result: &ProcessingResult) -> Self {
        Self {
            success: result.success(),
            original: result.original().to_string(),
            short_name: result.short_name().to_string(),
            character_count: result.character_count(),
            components: result.components().iter().map(ComponentView::from).collect(),
            messages: result.message_texts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadDictionaryRequest {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadDictionaryResponse {
    pub success: bool,
    pub message: String,
    pub abbreviation_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub dictionary_loaded: bool,
    pub dictionary_path: Option<String>,
    pub abbreviation_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub dictionary_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub count: usize,
    pub results: Vec<BatchItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ApiRequest {
    Generate(GenerateRequest),
    LoadDictionary(LoadDictionaryRequest),
    Status,
    Batch(BatchRequest),
}

/// 請求附帶詞典路徑且檔案存在時，先替換詞典
fn load_requested_dictionary(processor: &ShortNameProcessor, path: Option<&str>) -> Result<()> {
    if let Some(path) = path.filter(|p| !p.trim().is_empty()) {
        if Path::new(path).exists() {
            processor.load_dictionary(path)?;
        } else {
            tracing::warn!("Requested dictionary '{}' does not exist, keeping current one", path);
        }
    }
    Ok(())
}

pub fn handle_generate(
    processor: &ShortNameProcessor,
    request: &GenerateRequest,
) -> Result<GenerateResponse> {
    let description = request.description.trim();
    if description.is_empty() {
        return Err(ShortNameError::validation("please provide a product description"));
    }

    load_requested_dictionary(processor, request.dictionary_path.as_deref())?;
    let result = processor.process_full_description(description)?;
    Ok(GenerateResponse::from(&result))
}

pub fn handle_load_dictionary(
    processor: &ShortNameProcessor,
    request: &LoadDictionaryRequest,
) -> Result<LoadDictionaryResponse> {
    if request.path.trim().is_empty() {
        return Err(ShortNameError::validation("please provide a dictionary file path"));
    }

    let status = processor.load_dictionary(&request.path)?;
    Ok(LoadDictionaryResponse {
        success: true,
        message: format!(
            "Dictionary loaded with {} abbreviations",
            status.abbreviation_count
        ),
        abbreviation_count: status.abbreviation_count,
    })
}

pub fn handle_status(processor: &ShortNameProcessor) -> StatusResponse {
    let status = processor.status();
    StatusResponse {
        status: "running",
        dictionary_loaded: status.dictionary_loaded,
        dictionary_path: status.dictionary_path,
        abbreviation_count: status.abbreviation_count,
    }
}

pub fn handle_batch(
    processor: &ShortNameProcessor,
    request: &BatchRequest,
) -> Result<BatchResponse> {
    if request.descriptions.is_empty() {
        return Err(ShortNameError::validation("please provide a list of descriptions"));
    }

    load_requested_dictionary(processor, request.dictionary_path.as_deref())?;
    let report = processor.process_batch(&request.descriptions);
    Ok(BatchResponse {
        success: true,
        count: report.count,
        results: report.results,
    })
}

/// 分派請求；錯誤轉成 `{"success": false, "error": ...}`
pub fn dispatch(processor: &ShortNameProcessor, request: &ApiRequest) -> serde_json::Value {
    let outcome = match request {
        ApiRequest::Generate(req) => to_json(handle_generate(processor, req)),
        ApiRequest::LoadDictionary(req) => to_json(handle_load_dictionary(processor, req)),
        ApiRequest::Status => to_json(Ok(handle_status(processor))),
        ApiRequest::Batch(req) => to_json(handle_batch(processor, req)),
    };

    match outcome {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Request failed: {}", e);
            error_json(e.user_friendly_message())
        }
    }
}

fn to_json<T: Serialize>(response: Result<T>) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(response?)?)
}

fn error_json(error: String) -> serde_json::Value {
    serde_json::json!({ "success": false, "error": error })
}

/// 每行一個 JSON 請求，每行回覆一個 JSON 結果
pub fn serve<R: BufRead, W: Write>(
    processor: &ShortNameProcessor,
    reader: R,
    mut writer: W,
) -> Result<usize> {
    let mut handled = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ApiRequest>(&line) {
            Ok(request) => dispatch(processor, &request),
            Err(e) => error_json(format!("invalid request: {}", e)),
        };

        serde_json::to_writer(&mut writer, &response)?;
        writeln!(writer)?;
        writer.flush()?;
        handled += 1;
    }

    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_generate_response_shape() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        let response = handle_generate(
            &processor,
            &GenerateRequest {
                description: "Tablet Ibuprofen 200 mg".to_string(),
                dictionary_path: None,
            },
        )
        .unwrap();

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["short_name"], "Tablet Ibuprofen 200mg");
        assert_eq!(value["character_count"], 22);
        assert_eq!(value["components"][0]["position"], "dosage_form");
        assert_eq!(value["components"][0]["position_number"], 1);
        assert_eq!(value["components"][2]["original"], "200 mg");
        assert_eq!(value["components"][2]["mandatory"], true);
        assert!(value["messages"].is_array());
    }

    #[test]
    fn test_generate_rejects_blank_description() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        let request: ApiRequest =
            serde_json::from_str(r#"{"op": "generate", "description": "   "}"#).unwrap();
        let value = dispatch(&processor, &request);
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("description"));
    }

    #[test]
    fn test_status_without_dictionary() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        let value = dispatch(&processor, &ApiRequest::Status);
        assert_eq!(value["status"], "running");
        assert_eq!(value["dictionary_loaded"], false);
        assert_eq!(value["abbreviation_count"], 0);
    }

    #[test]
    fn test_load_missing_dictionary_reports_error() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        let value = dispatch(
            &processor,
            &ApiRequest::LoadDictionary(LoadDictionaryRequest {
                path: "/nonexistent/dict.csv".to_string(),
            }),
        );
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("file not found"));
    }

    #[test]
    fn test_serve_answers_each_line() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        let input = concat!(
            r#"{"op": "status"}"#,
            "\n\n",
            r#"{"op": "batch", "descriptions": ["Tablet Ibuprofen 200 mg", ""]}"#,
            "\n",
            "not json\n",
        );
        let mut output = Vec::new();

        let handled = serve(&processor, Cursor::new(input), &mut output).unwrap();
        assert_eq!(handled, 3);

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["status"], "running");
        assert_eq!(lines[1]["count"], 2);
        assert_eq!(lines[1]["results"][1]["success"], false);
        assert_eq!(lines[2]["success"], false);
    }
}
