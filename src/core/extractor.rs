use crate::core::dictionary::AbbreviationDictionary;
use crate::core::units::MEASURE_SPAN;
use crate::domain::model::{
    normalize_term, Component, MatcherKind, Message, PositionDefinition, PositionSchema,
};
use crate::utils::error::{Result, ShortNameError};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

const MASK: char = '\0';

struct CompiledPosition {
    definition: PositionDefinition,
    matchers: Vec<Regex>,
}

/// 擷取結果：依位置順序排列的元件與待回報訊息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub components: Vec<Component>,
    pub messages: Vec<Message>,
}

/// 依位置表順序貪婪比對；已認領的片段會被遮蔽，`remainder` 位置取最後剩下的文字
pub struct ComponentExtractor {
    positions: Vec<CompiledPosition>,
}

impl ComponentExtractor {
    /// 編譯位置表；詞典中類別相符的詞彙會加入對應位置的關鍵字
    pub fn new(schema: &PositionSchema, dictionary: Option<&AbbreviationDictionary>) -> Result<Self> {
        let positions = schema
            .positions()
            .iter()
            .map(|definition| compile_position(definition, dictionary))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { positions })
    }

    pub fn extract(&self, description: &str) -> Extraction {
        let mut masked = description.to_string();
        let mut found: Vec<Option<String>> = vec![None; self.positions.len()];

        for (index, position) in self.positions.iter().enumerate() {
            if position.definition.matcher == MatcherKind::Remainder {
                continue;
            }
            if let Some((start, end)) = best_span(&position.matchers, &masked) {
                let original = description[start..end].trim();
                tracing::debug!(
                    "Position {} '{}' matched '{}'",
                    position.definition.position_number,
                    position.definition.name,
                    original
                );
                found[index] = Some(original.to_string());
                masked.replace_range(start..end, &MASK.to_string().repeat(end - start));
            }
        }

        if let Some(index) = self
            .positions
            .iter()
            .position(|p| p.definition.matcher == MatcherKind::Remainder)
        {
            let leftover = remainder_text(&masked);
            if !leftover.is_empty() {
                tracing::debug!(
                    "Position {} '{}' took remainder '{}'",
                    self.positions[index].definition.position_number,
                    self.positions[index].definition.name,
                    leftover
                );
                found[index] = Some(leftover);
            }
        }

        let mut extraction = Extraction::default();
        for (position, original) in self.positions.iter().zip(found) {
            match original {
                Some(original) => extraction
                    .components
                    .push(Component::new(&position.definition, original)),
                None if position.definition.mandatory => {
                    extraction
                        .components
                        .push(Component::new(&position.definition, ""));
                    extraction
                        .messages
                        .push(Message::missing_mandatory(&position.definition.name));
                }
                None => {}
            }
        }

        extraction
    }
}

/// 不預先編譯的便利版本
pub fn extract(
    description: &str,
    schema: &PositionSchema,
    dictionary: Option<&AbbreviationDictionary>,
) -> Result<Extraction> {
    Ok(ComponentExtractor::new(schema, dictionary)?.extract(description))
}

fn compile_position(
    definition: &PositionDefinition,
    dictionary: Option<&AbbreviationDictionary>,
) -> Result<CompiledPosition> {
    let mut matchers = Vec::new();

    if definition.matcher != MatcherKind::Remainder {
        for pattern in &definition.patterns {
            matchers.push(build_regex(&definition.name, pattern)?);
        }

        let mut keywords: Vec<&str> = definition.keywords.iter().map(String::as_str).collect();
        if let (Some(category), Some(dictionary)) = (&definition.hint_category, dictionary) {
            keywords.extend(dictionary.terms_in_category(category));
        }
        if let Some(pattern) = keyword_pattern(&keywords) {
            matchers.push(build_regex(&definition.name, &pattern)?);
        }
    }

    Ok(CompiledPosition {
        definition: definition.clone(),
        matchers,
    })
}

fn build_regex(position_name: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ShortNameError::InvalidConfigValueError {
            field: format!("positions.{}.patterns", position_name),
            value: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// 關鍵字依長度由長到短排列，讓同一起點時較長者勝出
pub(crate) fn keyword_pattern(keywords: &[&str]) -> Option<String> {
    let mut seen = HashSet::new();
    let mut unique: Vec<&str> = keywords
        .iter()
        .copied()
        .filter(|k| !k.trim().is_empty())
        .filter(|k| seen.insert(normalize_term(k)))
        .collect();
    if unique.is_empty() {
        return None;
    }
    unique.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });

    let alternatives: Vec<String> = unique
        .iter()
        .map(|keyword| {
            let body = keyword
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            let starts_word = keyword.trim().chars().next().is_some_and(is_word_char);
            let ends_word = keyword.trim().chars().last().is_some_and(is_word_char);
            format!(
                "{}{}{}",
                if starts_word { r"\b" } else { "" },
                body,
                if ends_word { r"\b" } else { "" }
            )
        })
        .collect();

    Some(format!("(?:{})", alternatives.join("|")))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 所有比對器中最左邊的候選，起點相同時取最長
///
/// 長度只在不同比對器之間比較；單一 pattern 內的分支依 regex 的 leftmost-first
/// 語意取第一個成立者，因此自訂 pattern 應把較長的分支寫在前面。
fn best_span(matchers: &[Regex], haystack: &str) -> Option<(usize, usize)> {
    matchers
        .iter()
        .filter_map(|re| re.find_iter(haystack).find(|m| !m.as_str().trim().is_empty()))
        .map(|m| (m.start(), m.end()))
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| (b.1 - b.0).cmp(&(a.1 - a.0))))
}

/// 尚未被認領的文字，略過未被任何位置認領的「數值 單位」與只含標點的片段
fn remainder_text(masked: &str) -> String {
    for skipped in MEASURE_SPAN.find_iter(masked) {
        tracing::debug!("Skipping unclaimed measure '{}' in remainder", skipped.as_str());
    }
    let unclaimed = MEASURE_SPAN.replace_all(masked, " ");

    unclaimed
        .split(|c: char| c == MASK || c.is_whitespace())
        .map(|token| {
            token.trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '(' | ')' | '[' | ']'))
        })
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .collect::<Vec<_>>()
        .join(" ")
}
