use crate::domain::model::{Component, Message, PositionSchema};
use std::cmp::Reverse;
use std::collections::HashMap;

/// 短名稱的字元上限
pub const MAX_SHORT_NAME_LENGTH: usize = 35;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub short_name: String,
    pub character_count: usize,
    pub messages: Vec<Message>,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct ShortNameAssembler {
    budget: usize,
    separator: String,
    importance: HashMap<u32, u32>,
}

impl ShortNameAssembler {
    /// 上限不會超過 `MAX_SHORT_NAME_LENGTH`
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.min(MAX_SHORT_NAME_LENGTH),
            separator: " ".to_string(),
            importance: HashMap::new(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// 套用位置表中的保留權重
    pub fn with_schema(mut self, schema: &PositionSchema) -> Self {
        self.importance = schema
            .positions()
            .iter()
            .map(|p| (p.position_number, p.importance))
            .collect();
        self
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn assemble(&self, components: &[Component]) -> Assembly {
        let separator_len = self.separator.chars().count();
        let mut messages = Vec::new();

        let mut included: Vec<&Component> = components.iter().filter(|c| !c.is_empty()).collect();
        included.sort_by_key(|c| c.position_number);

        // 先依權重（低者優先）再依位置倒序捨棄選填欄位
        if self.joined_length(&included, separator_len) > self.budget {
            let mut droppable: Vec<&Component> =
                included.iter().copied().filter(|c| !c.mandatory).collect();
            droppable.sort_by_key(|c| {
                (
                    self.importance.get(&c.position_number).copied().unwrap_or(0),
                    Reverse(c.position_number),
                )
            });

            for candidate in droppable {
                if self.joined_length(&included, separator_len) <= self.budget {
                    break;
                }
                included.retain(|c| c.position_number != candidate.position_number);
                tracing::debug!("Dropped optional field '{}'", candidate.position_name);
                messages.push(Message::dropped_optional(&candidate.position_name));
            }
        }

        let mut parts: Vec<String> = Vec::with_capacity(included.len());
        let mut used = 0;
        let mut success = true;

        for (index, component) in included.iter().enumerate() {
            let separator_cost = if parts.is_empty() { 0 } else { separator_len };
            let length = component.value.chars().count();
            let reserve = if component.mandatory {
                self.mandatory_reserve(&included[index + 1..], separator_len)
            } else {
                0
            };

            if used + separator_cost + length + reserve <= self.budget {
                used += separator_cost + length;
                parts.push(component.value.clone());
                continue;
            }

            if !component.mandatory {
                messages.push(Message::dropped_optional(&component.position_name));
                continue;
            }

            // 先為後面的必填欄位保留空間；保留後已無空間時才退回整段剩餘額度
            let remaining = self.budget.saturating_sub(used + separator_cost);
            let reserved = truncate_chars(&component.value, remaining.saturating_sub(reserve));
            let kept = if reserved.is_empty() {
                if length <= remaining {
                    component.value.as_str()
                } else {
                    truncate_chars(&component.value, remaining)
                }
            } else {
                reserved
            };

            if kept.len() == component.value.len() {
                used += separator_cost + length;
                parts.push(component.value.clone());
                continue;
            }

            if kept.is_empty() {
                tracing::debug!("No room left for mandatory field '{}'", component.position_name);
                messages.push(Message::cannot_fit_mandatory(&component.position_name));
                success = false;
            } else {
                tracing::debug!(
                    "Truncated '{}' to '{}'",
                    component.position_name,
                    kept
                );
                used += separator_cost + kept.chars().count();
                messages.push(Message::truncated(&component.position_name, kept));
                parts.push(kept.to_string());
            }
        }

        // 擷取階段缺少的必填欄位同樣視為失敗
        if components.iter().any(|c| c.mandatory && c.is_empty()) {
            success = false;
        }

        let short_name = parts.join(&self.separator);
        Assembly {
            character_count: short_name.chars().count(),
            short_name,
            messages,
            success,
        }
    }

    /// 之後仍需放入的必填欄位（含分隔符）所需字元數
    fn mandatory_reserve(&self, later: &[&Component], separator_len: usize) -> usize {
        later
            .iter()
            .filter(|c| c.mandatory)
            .map(|c| separator_len + c.value.chars().count())
            .sum()
    }

    fn joined_length(&self, components: &[&Component], separator_len: usize) -> usize {
        let values: usize = components.iter().map(|c| c.value.chars().count()).sum();
        values + separator_len * components.len().saturating_sub(1)
    }
}

/// 依字元數硬切，並去掉切口的尾端空白
fn truncate_chars(value: &str, max_chars: usize) -> &str {
    let end = value
        .char_indices()
        .nth(max_chars)
        .map_or(value.len(), |(index, _)| index);
    value[..end].trim_end()
}

impl Default for ShortNameAssembler {
    fn default() -> Self {
        Self::new(MAX_SHORT_NAME_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MessageKind;

    fn component(number: u32, name: &str, value: &str, mandatory: bool) -> Component {
        Component {
            position_number: number,
            position_name: name.to_string(),
            original: value.to_string(),
            value: value.to_string(),
            mandatory,
        }
    }

    #[test]
    fn test_fits_without_changes() {
        let components = vec![
            component(1, "dosage_form", "Sol", true),
            component(2, "active_ingredient", "Dex", true),
            component(3, "strength", "5%", true),
            component(4, "volume", "500mL", false),
        ];
        let assembly = ShortNameAssembler::default().assemble(&components);

        assert_eq!(assembly.short_name, "Sol Dex 5% 500mL");
        assert_eq!(assembly.character_count, 16);
        assert!(assembly.success);
        assert!(assembly.messages.is_empty());
    }

    #[test]
    fn test_drops_optional_in_reverse_position_order() {
        let components = vec![
            component(1, "dosage_form", "Sol", true),
            component(2, "active_ingredient", "Dex", true),
            component(3, "strength", "5%", true),
            component(4, "volume", "500mL", false),
            component(5, "container", "Btl", false),
            component(6, "material", "Viaflex", false),
            component(8, "special_attribute", "Non-Latex", false),
        ];
        let assembly = ShortNameAssembler::default().assemble(&components);

        assert_eq!(assembly.short_name, "Sol Dex 5% 500mL Btl Viaflex");
        assert!(assembly.success);
        assert_eq!(
            assembly.messages,
            vec![Message::dropped_optional("special_attribute")]
        );
    }

    #[test]
    fn test_importance_changes_drop_order() {
        let schema = crate::config::schema::default_schema().unwrap();
        let mut positions = schema.positions().to_vec();
        for p in positions.iter_mut() {
            if p.name == "special_attribute" {
                p.importance = 10;
            }
        }
        let schema = PositionSchema::from_positions(positions);

        let components = vec![
            component(1, "dosage_form", "Sol", true),
            component(2, "active_ingredient", "Dex", true),
            component(3, "strength", "5%", true),
            component(4, "volume", "500mL", false),
            component(5, "container", "Btl", false),
            component(6, "material", "Viaflex", false),
            component(8, "special_attribute", "Non-Latex", false),
        ];
        let assembly = ShortNameAssembler::default()
            .with_schema(&schema)
            .assemble(&components);

        assert_eq!(assembly.short_name, "Sol Dex 5% 500mL Btl Non-Latex");
        assert_eq!(assembly.messages, vec![Message::dropped_optional("material")]);
    }

    #[test]
    fn test_truncates_mandatory_when_optionals_exhausted() {
        let components = vec![
            component(1, "dosage_form", "Sol", true),
            component(2, "active_ingredient", "Polyethylene Glycol Electrolytes Powder", true),
            component(4, "volume", "4L", false),
        ];
        let assembly = ShortNameAssembler::default().assemble(&components);

        assert_eq!(assembly.short_name, "Sol Polyethylene Glycol Electrolyte");
        assert!(assembly.character_count <= MAX_SHORT_NAME_LENGTH);
        assert!(assembly.success);
        assert_eq!(
            assembly.messages.iter().map(|m| m.kind).collect::<Vec<_>>(),
            vec![MessageKind::DroppedOptional, MessageKind::Truncated]
        );
    }

    #[test]
    fn test_truncation_leaves_room_for_later_mandatory() {
        let components = vec![
            component(1, "dosage_form", "Solution For Intravenous Infusion Use", true),
            component(3, "strength", "5%", true),
        ];
        let assembly = ShortNameAssembler::default().assemble(&components);

        assert_eq!(assembly.short_name, "Solution For Intravenous Infusio 5%");
        assert_eq!(assembly.character_count, 35);
        assert!(assembly.success);
        assert_eq!(
            assembly.messages,
            vec![Message::truncated("dosage_form", "Solution For Intravenous Infusio")]
        );
    }

    #[test]
    fn test_short_field_is_not_cut_for_later_reserve() {
        let components = vec![
            component(1, "dosage_form", "Tablet", true),
            component(2, "active_ingredient", "Acetylsalicylic Acid Extended Release Buffered", true),
            component(3, "strength", "325mg", true),
        ];
        let assembly = ShortNameAssembler::default().assemble(&components);

        assert_eq!(assembly.short_name, "Tablet Acetylsalicylic Acid E 325mg");
        assert!(assembly.success);
        assert_eq!(
            assembly.messages,
            vec![Message::truncated("active_ingredient", "Acetylsalicylic Acid E")]
        );
    }

    #[test]
    fn test_cannot_fit_mandatory_fails() {
        let components = vec![
            component(1, "dosage_form", "Solution For Intravenous Infusion Use", true),
            component(2, "active_ingredient", "Polyethylene Glycol Electrolytes", true),
            component(3, "strength", "5%", true),
        ];
        let assembly = ShortNameAssembler::default().assemble(&components);

        assert_eq!(assembly.short_name, "Solution For Intravenous Infusion U");
        assert_eq!(assembly.character_count, 35);
        assert!(!assembly.success);
        assert_eq!(
            assembly.messages,
            vec![
                Message::truncated("dosage_form", "Solution For Intravenous Infusion U"),
                Message::cannot_fit_mandatory("active_ingredient"),
                Message::cannot_fit_mandatory("strength"),
            ]
        );
    }

    #[test]
    fn test_missing_mandatory_is_not_success() {
        let components = vec![
            component(1, "dosage_form", "", true),
            component(2, "active_ingredient", "Dex", true),
        ];
        let assembly = ShortNameAssembler::default().assemble(&components);

        assert_eq!(assembly.short_name, "Dex");
        assert!(!assembly.success);
    }

    #[test]
    fn test_budget_is_capped() {
        let assembler = ShortNameAssembler::new(80);
        assert_eq!(assembler.budget(), MAX_SHORT_NAME_LENGTH);
    }
}
