use crate::core::units::compact_measure;
use crate::domain::model::{Component, Message, PositionSchema};
use crate::domain::ports::AbbreviationLookup;
use std::collections::HashSet;

/// 將元件原文替換為核准縮寫
pub struct AbbreviationResolver<'a> {
    dictionary: Option<&'a dyn AbbreviationLookup>,
    units: &'a dyn AbbreviationLookup,
    measure_positions: HashSet<u32>,
}

impl<'a> AbbreviationResolver<'a> {
    pub fn new(
        schema: &PositionSchema,
        dictionary: Option<&'a dyn AbbreviationLookup>,
        units: &'a dyn AbbreviationLookup,
    ) -> Self {
        let measure_positions = schema
            .positions()
            .iter()
            .filter(|p| p.measure)
            .map(|p| p.position_number)
            .collect();

        Self {
            dictionary,
            units,
            measure_positions,
        }
    }

    pub fn resolve(&self, components: &mut [Component], messages: &mut Vec<Message>) {
        for component in components.iter_mut() {
            self.resolve_one(component, messages);
        }
    }

    fn resolve_one(&self, component: &mut Component, messages: &mut Vec<Message>) {
        let original = component.original.trim();
        if original.is_empty() {
            component.value.clear();
            return;
        }

        // 數值欄位不依賴詞典
        if self.measure_positions.contains(&component.position_number) {
            if let Some(compact) = compact_measure(original, self.units) {
                tracing::debug!("Measure '{}' -> '{}'", original, compact);
                component.value = compact;
                return;
            }
        }

        let key = original.trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '.' | '(' | ')'));
        match self.dictionary.and_then(|d| d.lookup(key)) {
            Some(abbreviation) => {
                tracing::debug!("'{}' -> '{}'", original, abbreviation);
                component.value = abbreviation.to_string();
            }
            None => {
                component.value = original.split_whitespace().collect::<Vec<_>>().join(" ");
                messages.push(Message::no_abbreviation(&component.position_name, original));
            }
        }
    }
}
