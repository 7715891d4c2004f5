use crate::core::processor::ProcessorStatus;
use crate::domain::model::ProcessingResult;
use std::fmt::Write;

/// 終端機顯示：短名稱、字數、各位置拆解與訊息
pub fn render_result(result: &ProcessingResult, budget: usize) -> String {
    let mut out = String::new();
    let icon = if result.success() { "✅" } else { "⚠️" };

    let _ = writeln!(
        out,
        "{} {} ({}/{})",
        icon,
        result.short_name(),
        result.character_count(),
        budget
    );

    for component in result.components() {
        if component.original.is_empty() {
            if component.mandatory {
                let _ = writeln!(
                    out,
                    "  {}. {:<18} (missing)",
                    component.position_number, component.position_name
                );
            }
            continue;
        }

        let _ = if component.value == component.original {
            writeln!(
                out,
                "  {}. {:<18} {}",
                component.position_number, component.position_name, component.value
            )
        } else {
            writeln!(
                out,
                "  {}. {:<18} {} -> {}",
                component.position_number,
                component.position_name,
                component.original,
                component.value
            )
        };
    }

    for message in result.messages() {
        let _ = writeln!(out, "  • {}", message);
    }

    out
}

pub fn render_status(status: &ProcessorStatus) -> String {
    match &status.dictionary_path {
        Some(path) if status.dictionary_loaded => format!(
            "📚 Dictionary: {} ({} abbreviations)",
            path, status.abbreviation_count
        ),
        _ if status.dictionary_loaded => format!(
            "📚 Dictionary loaded ({} abbreviations)",
            status.abbreviation_count
        ),
        _ => "📚 No dictionary loaded, words are kept as written".to_string(),
    }
}
