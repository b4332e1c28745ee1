//! # Localization
//!
//! User-facing strings are looked up by dotted key through the `Translator`
//! trait. `Catalog` is a small static implementation covering the strings
//! the retrieval view shows. Lookups never fail: a key missing from the
//! selected locale falls back to English, and a key missing there is
//! returned as-is.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Environment variable selecting the UI language
pub const LANG_ENV: &str = "KBVIEW_LANG";

/// Message keys used by the retrieval view
pub mod keys {
    pub const QUERY_PLACEHOLDER: &str = "knowledge.queryPlaceholder";
    pub const QUERY: &str = "knowledge.query";
    pub const NO_RESULTS: &str = "knowledge.noResults";
    pub const DISTANCE: &str = "knowledge.distance";
    pub const RETRIEVE_ERROR: &str = "knowledge.retrieveError";
    pub const RESULTS: &str = "knowledge.results";
    pub const LOADING: &str = "common.loading";
    pub const KEY_HINTS: &str = "common.keyHints";
    pub const KNOWLEDGE_BASE: &str = "knowledge.knowledgeBase";
    pub const SWITCH_HINTS: &str = "knowledge.switchHints";
}

/// Key → string lookup
pub trait Translator {
    /// Localized text for `key`; never fails
    fn translate(&self, key: &str) -> String;
}

/// Supported UI languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    EnUs,
    ZhHans,
    JaJp,
}

impl Locale {
    /// Canonical tag
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::ZhHans => "zh-Hans",
            Locale::JaJp => "ja-JP",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-").to_ascii_lowercase();
        // Accept POSIX-style values such as `zh_CN.UTF-8`
        let normalized = normalized.split('.').next().unwrap_or_default();
        match normalized {
            "en" | "en-us" | "en-gb" | "c" | "posix" => Ok(Locale::EnUs),
            "zh" | "zh-hans" | "zh-cn" | "zh-sg" => Ok(Locale::ZhHans),
            "ja" | "ja-jp" => Ok(Locale::JaJp),
            other => Err(Error::Config(format!("Unsupported language '{}'", other))),
        }
    }
}

const EN_US: &[(&str, &str)] = &[
    (keys::QUERY_PLACEHOLDER, "Enter a query to search the knowledge base"),
    (keys::QUERY, "Query"),
    (keys::NO_RESULTS, "No results"),
    (keys::DISTANCE, "Distance"),
    (keys::RETRIEVE_ERROR, "Failed to retrieve from the knowledge base"),
    (keys::RESULTS, "Results"),
    (keys::LOADING, "Loading..."),
    (keys::KEY_HINTS, "Enter: query  ↑/↓: scroll  Ctrl-K: switch base  Esc: quit"),
    (keys::KNOWLEDGE_BASE, "Knowledge base"),
    (keys::SWITCH_HINTS, "Enter: open  Esc: cancel"),
];

const ZH_HANS: &[(&str, &str)] = &[
    (keys::QUERY_PLACEHOLDER, "输入查询内容以检索知识库"),
    (keys::QUERY, "查询"),
    (keys::NO_RESULTS, "暂无结果"),
    (keys::DISTANCE, "距离"),
    (keys::RETRIEVE_ERROR, "知识库检索失败"),
    (keys::RESULTS, "结果"),
    (keys::LOADING, "加载中..."),
    (keys::KEY_HINTS, "Enter: 查询  ↑/↓: 滚动  Ctrl-K: 切换知识库  Esc: 退出"),
    (keys::KNOWLEDGE_BASE, "知识库"),
    (keys::SWITCH_HINTS, "Enter: 打开  Esc: 取消"),
];

const JA_JP: &[(&str, &str)] = &[
    (keys::QUERY_PLACEHOLDER, "ナレッジベースを検索するクエリを入力してください"),
    (keys::QUERY, "検索"),
    (keys::NO_RESULTS, "結果がありません"),
    (keys::DISTANCE, "距離"),
    (keys::RETRIEVE_ERROR, "ナレッジベースの検索に失敗しました"),
    (keys::RESULTS, "結果"),
    (keys::LOADING, "読み込み中..."),
    (keys::KNOWLEDGE_BASE, "ナレッジベース"),
];

/// Built-in message catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Catalog for `KBVIEW_LANG`, then `LANG`, defaulting to English
    pub fn from_env() -> Self {
        let locale = [LANG_ENV, "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| value.parse().ok())
            .unwrap_or_default();
        Self::new(locale)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn table(locale: Locale) -> &'static [(&'static str, &'static str)] {
        match locale {
            Locale::EnUs => EN_US,
            Locale::ZhHans => ZH_HANS,
            Locale::JaJp => JA_JP,
        }
    }

    fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
        Self::table(locale)
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str) -> String {
        Self::lookup(self.locale, key)
            .or_else(|| Self::lookup(Locale::EnUs, key))
            .unwrap_or(key)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parsing() {
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::EnUs);
        assert_eq!("zh_CN.UTF-8".parse::<Locale>().unwrap(), Locale::ZhHans);
        assert_eq!("zh-Hans".parse::<Locale>().unwrap(), Locale::ZhHans);
        assert_eq!("ja".parse::<Locale>().unwrap(), Locale::JaJp);
        assert!("xx-YY".parse::<Locale>().is_err());
    }

    #[test]
    fn test_translate_selected_locale() {
        let catalog = Catalog::new(Locale::ZhHans);
        assert_eq!(catalog.translate(keys::DISTANCE), "距离");
    }

    #[test]
    fn test_falls_back_to_english_then_key() {
        let catalog = Catalog::new(Locale::JaJp);
        assert_eq!(
            catalog.translate(keys::KEY_HINTS),
            "Enter: query  ↑/↓: scroll  Ctrl-K: switch base  Esc: quit"
        );
        assert_eq!(catalog.translate("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_every_locale_covers_the_error_message() {
        for locale in [Locale::EnUs, Locale::ZhHans, Locale::JaJp] {
            assert!(Catalog::lookup(locale, keys::RETRIEVE_ERROR).is_some());
        }
    }
}
