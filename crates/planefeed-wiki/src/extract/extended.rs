use tracing::warn;

use crate::config::ExtractionTables;
use crate::error::Result;
use crate::extract::{AircraftPipeline, SearchMode};
use crate::markup::{TemplateResolver, blocks_in_order, collapse_whitespace, extract_field, normalize};
use crate::source::PageParts;
use crate::types::{ExtendedInfo, SpecField, Specifications};

const MIN_HISTORY_CHARS: usize = 100;
const MAX_HISTORY: usize = 5;
const MIN_VARIANT_CHARS: usize = 10;
const MAX_VARIANTS: usize = 8;

impl AircraftPipeline {
    /// Specification table, history excerpts and variants for `name`.
    /// Empty when the article cannot be fetched.
    pub async fn extended_info(&self, name: &str) -> ExtendedInfo {
        match self.fetch_extended(name).await {
            Ok(info) => info,
            Err(err) => {
                warn!(aircraft = name, error = %err, "extended info lookup failed");
                ExtendedInfo::default()
            }
        }
    }

    async fn fetch_extended(&self, name: &str) -> Result<ExtendedInfo> {
        let title = self.resolve_title(name, SearchMode::General).await?;
        let page = self.source().page(&title, PageParts::EVERYTHING).await?;
        let markup = page.wikitext.unwrap_or_default();
        let text = page.extract.unwrap_or_default();
        let tables = self.tables();

        Ok(ExtendedInfo {
            specifications: specifications(&markup, tables),
            history: history_sections(&text, tables),
            variants: variants(&markup, &self.templates()),
        })
    }
}

/// Every spec field that resolves from some infobox block. Aliases are tried
/// in order, each across all blocks, before moving on to the next alias.
pub fn specifications(markup: &str, tables: &ExtractionTables) -> Specifications {
    let resolver = TemplateResolver::new(tables);
    let blocks = blocks_in_order(markup, &tables.infobox_shapes);
    let mut specs = Specifications::new();
    if blocks.is_empty() {
        return specs;
    }

    for field in SpecField::ALL {
        let value = tables.aliases(field).iter().find_map(|key| {
            blocks
                .iter()
                .find_map(|block| extract_field(block, key, &resolver))
        });
        if let Some(value) = value {
            specs.insert(field, value);
        }
    }
    specs
}

/// `== Title ==` heading as (level, title).
fn heading(line: &str) -> Option<(usize, &str)> {
    let line = line.trim();
    let level = line.chars().take_while(|c| *c == '=').count();
    if level < 2 || !line.ends_with('=') || line.len() <= level * 2 {
        return None;
    }
    let title = line.trim_matches('=').trim();
    (!title.is_empty()).then_some((level, title))
}

/// Narrative sections of the plain-text article named in
/// `tables.history_sections`, in order of appearance.
pub fn history_sections(text: &str, tables: &ExtractionTables) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let is_history = |title: &str| {
        tables
            .history_sections
            .iter()
            .any(|section| section.eq_ignore_ascii_case(title))
    };

    let mut found: Vec<String> = Vec::new();
    let mut i = 0;
    while i < lines.len() && found.len() < MAX_HISTORY {
        let title = match heading(lines[i]) {
            Some((_, title)) => Some(title),
            // Plain-text extracts sometimes keep headings as bare lines.
            None if is_history(lines[i].trim()) => Some(lines[i].trim()),
            None => None,
        };
        i += 1;
        let Some(title) = title else { continue };
        if !is_history(title) {
            continue;
        }

        let start = i;
        while i < lines.len() && heading(lines[i]).is_none() && !is_history(lines[i].trim()) {
            i += 1;
        }
        let body = lines[start..i]
            .iter()
            .map(|line| collapse_whitespace(line))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        if body.chars().count() > MIN_HISTORY_CHARS && !found.contains(&body) {
            found.push(body);
        }
    }
    found
}

/// Entries of the `== Variants ==` section of the markup.
pub fn variants(markup: &str, resolver: &TemplateResolver<'_>) -> Vec<String> {
    let lines: Vec<&str> = markup.lines().collect();
    let Some((start, level)) = lines.iter().enumerate().find_map(|(idx, line)| {
        heading(line)
            .filter(|(_, title)| title.eq_ignore_ascii_case("variants"))
            .map(|(level, _)| (idx + 1, level))
    }) else {
        return Vec::new();
    };

    let section = lines[start..]
        .iter()
        .take_while(|line| heading(line).is_none_or(|(l, _)| l > level));

    let mut entries: Vec<String> = Vec::new();
    for line in section {
        let line = line.trim();
        if let Some(term) = line.strip_prefix(';') {
            entries.push(term.trim().to_string());
        } else if let Some(detail) = line.strip_prefix(':') {
            // `;term` followed by `:description`
            match entries.last_mut() {
                Some(last) => {
                    last.push_str(": ");
                    last.push_str(detail.trim());
                }
                None => entries.push(detail.trim().to_string()),
            }
        } else if line.starts_with('*') || line.starts_with('#') {
            entries.push(line.trim_start_matches(['*', '#']).trim().to_string());
        }
    }

    entries
        .iter()
        .map(|entry| normalize(&resolver.resolve(entry)))
        .filter(|entry| entry.chars().count() >= MIN_VARIANT_CHARS)
        .take(MAX_VARIANTS)
        .collect()
}
