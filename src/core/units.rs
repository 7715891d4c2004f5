use crate::core::dictionary::{AbbreviationDictionary, DuplicatePolicy};
use crate::domain::ports::AbbreviationLookup;
use crate::utils::error::Result;
use regex::Regex;
use std::sync::LazyLock;

const UNIT_ENTRIES: &[(&str, &str)] = &[
    ("milliliters", "mL"),
    ("millilitres", "mL"),
    ("milliliter", "mL"),
    ("millilitre", "mL"),
    ("mls", "mL"),
    ("ml", "mL"),
    ("liters", "L"),
    ("litres", "L"),
    ("liter", "L"),
    ("litre", "L"),
    ("l", "L"),
    ("milligrams", "mg"),
    ("milligram", "mg"),
    ("mg", "mg"),
    ("micrograms", "mcg"),
    ("microgram", "mcg"),
    ("mcg", "mcg"),
    ("µg", "mcg"),
    ("ug", "mcg"),
    ("grams", "g"),
    ("gram", "g"),
    ("gm", "g"),
    ("g", "g"),
    ("kilograms", "kg"),
    ("kilogram", "kg"),
    ("kg", "kg"),
    ("milliequivalents", "mEq"),
    ("milliequivalent", "mEq"),
    ("meq", "mEq"),
    ("millimoles", "mmol"),
    ("millimole", "mmol"),
    ("mmol", "mmol"),
    ("international units", "IU"),
    ("iu", "IU"),
    ("units", "unit"),
    ("unit", "unit"),
    ("percent", "%"),
    ("%", "%"),
];

// 數值 單位 [/ [數值] 單位]
static MEASURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(\d+(?:[.,]\d+)?)\s*([^\d/]+?)\s*(?:/\s*(\d+(?:[.,]\d+)?)?\s*([^\d/]+?))?\s*$",
    )
    .expect("measure pattern is valid")
});

// 描述中任一「數值 單位」片段（單位取自上表），剩餘文字擷取時略過
pub(crate) static MEASURE_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    let mut units: Vec<&str> = UNIT_ENTRIES.iter().map(|(term, _)| *term).collect();
    units.sort_by_key(|unit| std::cmp::Reverse(unit.chars().count()));

    let alternatives = units
        .iter()
        .map(|unit| {
            let body = unit
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            if unit.ends_with(|c: char| c.is_alphanumeric()) {
                format!(r"{}\b", body)
            } else {
                body
            }
        })
        .collect::<Vec<_>>()
        .join("|");

    let number = r"\d+(?:[.,]\d+)?";
    Regex::new(&format!(
        r"(?i)\b{n}\s*(?:{u})(?:\s*/\s*(?:{n}\s*)?(?:{u}))?",
        n = number,
        u = alternatives
    ))
    .expect("measure span pattern is valid")
});

/// 固定單位縮寫表，與詞典共用同一套查詢機制
pub fn unit_table() -> Result<AbbreviationDictionary> {
    AbbreviationDictionary::from_entries(UNIT_ENTRIES.iter().copied(), DuplicatePolicy::Reject)
}

/// 將數值加單位壓縮成緊湊寫法；無法解析時回傳 `None`
pub fn compact_measure(raw: &str, units: &dyn AbbreviationLookup) -> Option<String> {
    let caps = MEASURE.captures(raw)?;

    let amount = &caps[1];
    let unit = units.lookup(&caps[2])?;
    let mut compact = format!("{}{}", amount, unit);

    if let Some(per_unit) = caps.get(4) {
        let per_unit = units.lookup(per_unit.as_str())?;
        let per_amount = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        compact.push('/');
        compact.push_str(per_amount);
        compact.push_str(per_unit);
    }

    Some(compact)
}
