use crate::domain::model::normalize_term;
use std::collections::HashMap;

/// 縮寫查詢介面；詞典與單位表皆實作此介面
pub trait AbbreviationLookup: Send + Sync {
    /// 以正規化後的詞彙查詢縮寫
    fn lookup(&self, term: &str) -> Option<&str>;
    fn size(&self) -> usize;
}

/// 測試與臨時對照用；鍵需已正規化
impl AbbreviationLookup for HashMap<String, String> {
    fn lookup(&self, term: &str) -> Option<&str> {
        self.get(&normalize_term(term))
            .map(String::as_str)
    }

    fn size(&self) -> usize {
        self.len()
    }
}
