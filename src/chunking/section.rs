// src/chunking/section.rs

use crate::config::ChunkingConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Numbered heading at line start: `1`, `1.`, `2.3.`, `2.3.4` followed by text.
static HEADING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*\.?)\s+(.+)$").expect("heading pattern must compile")
});

pub const PATH_SEPARATOR: &str = " > ";

/// A numbered subdivision of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub level: usize,
    pub number: String,
    pub title: String,
    pub content: String,
    /// Ancestor titles joined with `" > "`, empty for top-level sections.
    pub parent_path: String,
}

impl Section {
    /// The composite `"<number> <title>"` label.
    pub fn heading(&self) -> String {
        format!("{} {}", self.number, self.title)
    }

    /// Breadcrumb from the document root down to and including this section.
    pub fn full_path(&self) -> String {
        if self.parent_path.is_empty() {
            self.heading()
        } else {
            format!("{}{}{}", self.parent_path, PATH_SEPARATOR, self.heading())
        }
    }
}

/// Decides whether a numbered line is a heading or a numbered sentence.
pub trait HeadingRule: Send + Sync {
    fn accepts(&self, number: &str, title: &str) -> bool;
}

/// Accepts short titles with at most a few periods.
#[derive(Debug, Clone, Copy)]
pub struct LengthPunctuationRule {
    pub max_title_chars: usize,
    pub max_periods: usize,
}

impl Default for LengthPunctuationRule {
    fn default() -> Self {
        Self {
            max_title_chars: crate::config::DEFAULT_MAX_TITLE_CHARS,
            max_periods: crate::config::DEFAULT_MAX_TITLE_PERIODS,
        }
    }
}

impl From<&ChunkingConfig> for LengthPunctuationRule {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            max_title_chars: config.max_title_chars,
            max_periods: config.max_title_periods,
        }
    }
}

impl HeadingRule for LengthPunctuationRule {
    fn accepts(&self, _number: &str, title: &str) -> bool {
        title.chars().count() < self.max_title_chars
            && title.matches('.').count() <= self.max_periods
    }
}

impl<F> HeadingRule for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn accepts(&self, number: &str, title: &str) -> bool {
        self(number, title)
    }
}

/// Numeric components of a dotted label; `"2.3."` gives `["2", "3"]`.
pub fn number_components(number: &str) -> Vec<&str> {
    number.split('.').filter(|part| !part.is_empty()).collect()
}

/// Nesting depth of a dotted label, never below 1.
pub fn level_of(number: &str) -> usize {
    number_components(number).len().max(1)
}

#[derive(Debug)]
struct OpenAncestor {
    components: Vec<String>,
    breadcrumb: String,
}

/// Line scanner that recovers the numbered outline of a document.
pub struct SectionParser<R: HeadingRule = LengthPunctuationRule> {
    rule: R,
}

impl SectionParser<LengthPunctuationRule> {
    pub fn with_default() -> Self {
        Self::new(LengthPunctuationRule::default())
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(LengthPunctuationRule::from(config))
    }
}

impl<R: HeadingRule> SectionParser<R> {
    pub fn new(rule: R) -> Self {
        Self { rule }
    }

    /// Splits `text` into sections in document order.
    ///
    /// Lines are trimmed and blank lines dropped. Text before the first
    /// heading is discarded; a document without headings yields no sections.
    pub fn parse(&self, text: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut current: Option<Section> = None;
        let mut content_lines: Vec<&str> = Vec::new();
        // Slot `i` holds the most recent open section at level `i + 1`.
        let mut ancestors: Vec<Option<OpenAncestor>> = Vec::new();

        for raw_line in text.split('\n') {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((number, title)) = self.match_heading(line) {
                if let Some(mut done) = current.take() {
                    done.content = content_lines.join("\n").trim().to_string();
                    sections.push(done);
                }
                content_lines.clear();

                let components: Vec<String> = number_components(number)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let level = components.len().max(1);
                let parent_path = resolve_parent(&ancestors, &components);

                let breadcrumb = if parent_path.is_empty() {
                    title.to_string()
                } else {
                    format!("{}{}{}", parent_path, PATH_SEPARATOR, title)
                };
                ancestors.truncate(level - 1);
                ancestors.resize_with(level - 1, || None);
                ancestors.push(Some(OpenAncestor {
                    components,
                    breadcrumb,
                }));

                current = Some(Section {
                    level,
                    number: number.to_string(),
                    title: title.to_string(),
                    content: String::new(),
                    parent_path,
                });
            } else if current.is_some() {
                content_lines.push(line);
            }
        }

        if let Some(mut done) = current.take() {
            done.content = content_lines.join("\n").trim().to_string();
            sections.push(done);
        }

        debug!(sections = sections.len(), "Parsed document outline");
        sections
    }

    fn match_heading<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = HEADING_PATTERN.captures(line)?;
        let number = caps.get(1)?.as_str();
        let title = caps.get(2)?.as_str().trim();
        if self.rule.accepts(number, title) {
            Some((number, title))
        } else {
            None
        }
    }
}

fn resolve_parent(ancestors: &[Option<OpenAncestor>], components: &[String]) -> String {
    if components.len() < 2 {
        return String::new();
    }
    let parent_components = &components[..components.len() - 1];
    ancestors
        .get(parent_components.len() - 1)
        .and_then(|slot| slot.as_ref())
        .filter(|ancestor| ancestor.components.as_slice() == parent_components)
        .map(|ancestor| ancestor.breadcrumb.clone())
        .unwrap_or_default()
}

/// Parses with the default length/punctuation heading rule.
pub fn parse_sections(text: &str) -> Vec<Section> {
    SectionParser::with_default().parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_follow_number_components() {
        assert_eq!(level_of("2."), 1);
        assert_eq!(level_of("2"), 1);
        assert_eq!(level_of("2.3."), 2);
        assert_eq!(level_of("2.3"), 2);
        assert_eq!(level_of("2.3.4."), 3);
    }

    #[test]
    fn test_basic_outline() {
        let text = "Преамбула без номера\n\n1. Общие положения\nПервый абзац.\nВторой абзац.\n2. Права сторон\nТекст прав.\n";
        let sections = parse_sections(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].number, "1.");
        assert_eq!(sections[0].title, "Общие положения");
        assert_eq!(sections[0].content, "Первый абзац.\nВторой абзац.");
        assert_eq!(sections[0].parent_path, "");
        assert_eq!(sections[1].content, "Текст прав.");
    }

    #[test]
    fn test_nested_parent_path() {
        let text = "1. Введение\nтекст\n2. Порядок работы\nтекст\n2.1. Подготовка\nтекст\n2.1.1. Документы\nтекст\n2.2. Проверка\nтекст";
        let sections = parse_sections(text);

        assert_eq!(sections.len(), 5);
        assert_eq!(sections[2].level, 2);
        assert_eq!(sections[2].parent_path, "Порядок работы");
        assert_eq!(sections[3].level, 3);
        assert_eq!(sections[3].parent_path, "Порядок работы > Подготовка");
        assert_eq!(sections[4].parent_path, "Порядок работы");
    }

    #[test]
    fn test_reopened_numbering_has_no_parent() {
        // "2." is closed once "3." opens, so a later "2.2." finds no open parent.
        let text = "2. Порядок\nтекст\n2.1. Подготовка\nтекст\n3. Контроль\nтекст\n2.2. Проверка\nтекст";
        let sections = parse_sections(text);

        assert_eq!(sections.len(), 4);
        assert_eq!(sections[1].parent_path, "Порядок");
        assert_eq!(sections[3].number, "2.2.");
        assert_eq!(sections[3].level, 2);
        assert_eq!(sections[3].parent_path, "");
        assert_eq!(sections[3].full_path(), "2.2. Проверка");
    }

    #[test]
    fn test_numbered_sentence_is_content() {
        let text = "1. Требования\n1. Файл должен быть сохранен в формате PDF. Размер не более 10 Мб.\n";
        let sections = parse_sections(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].content,
            "1. Файл должен быть сохранен в формате PDF. Размер не более 10 Мб."
        );
    }

    #[test]
    fn test_long_title_is_content() {
        let long_title = "а".repeat(200);
        let text = format!("1. Раздел\n2. {}\n", long_title);
        let sections = parse_sections(&text);

        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.starts_with("2. "));
    }

    #[test]
    fn test_no_headings_yields_nothing() {
        assert!(parse_sections("Просто текст.\nЕще строка.").is_empty());
        assert!(parse_sections("").is_empty());
    }

    #[test]
    fn test_missing_parent_is_not_fatal() {
        let text = "3.1. Сирота\nтекст\n1. Раздел\n1.1.1. Глубоко\nтекст";
        let sections = parse_sections(text);

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].parent_path, "");
        assert_eq!(sections[2].parent_path, "");
        assert_eq!(sections[2].level, 3);
    }

    #[test]
    fn test_custom_rule_can_reject_everything() {
        let parser = SectionParser::new(|_: &str, _: &str| false);
        assert!(parser.parse("1. Раздел\nтекст").is_empty());
    }

    #[test]
    fn test_full_path_joins_parent() {
        let sections = parse_sections("2. Порядок\nx\n2.3. Сроки\ny");
        assert_eq!(sections[1].full_path(), "Порядок > 2.3. Сроки");
        assert_eq!(sections[0].full_path(), "2. Порядок");
    }
}
