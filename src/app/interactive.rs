use crate::app::display::{render_result, render_status};
use crate::core::processor::ShortNameProcessor;
use crate::utils::error::Result;
use std::io::{BufRead, Write};

const PROMPT: &str = "description> ";

/// 逐行讀取描述並顯示結果，直到 quit/exit/q 或輸入結束
///
/// `:load <path>` 替換詞典，`:status` 顯示詞典狀態。處理錯誤只顯示、不中斷。
pub fn run_interactive<R: BufRead, W: Write>(
    processor: &ShortNameProcessor,
    reader: R,
    mut writer: W,
) -> Result<usize> {
    let mut processed = 0;

    writeln!(writer, "{}", render_status(&processor.status()))?;
    writeln!(
        writer,
        "Enter a product description (':load <path>', ':status', 'quit' to exit)"
    )?;
    write!(writer, "{}", PROMPT)?;
    writer.flush()?;

    for line in reader.lines() {
        let line = line?;
        let input = line.trim();

        match input {
            "" => {}
            "quit" | "exit" | "q" => break,
            ":status" => writeln!(writer, "{}", render_status(&processor.status()))?,
            _ if input.starts_with(":load") => {
                let path = input.trim_start_matches(":load").trim();
                if path.is_empty() {
                    writeln!(writer, "❌ Usage: :load <path>")?;
                } else {
                    match processor.load_dictionary(path) {
                        Ok(status) => writeln!(writer, "{}", render_status(&status))?,
                        Err(e) => writeln!(writer, "❌ {}", e.user_friendly_message())?,
                    }
                }
            }
            _ => match processor.process_full_description(input) {
                Ok(result) => {
                    write!(writer, "{}", render_result(&result, processor.budget()))?;
                    processed += 1;
                }
                Err(e) => writeln!(writer, "❌ {}", e.user_friendly_message())?,
            },
        }

        write!(writer, "{}", PROMPT)?;
        writer.flush()?;
    }

    writeln!(writer)?;
    tracing::info!("Interactive session ended after {} descriptions", processed);
    Ok(processed)
}
