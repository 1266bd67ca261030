use crate::config::ExtractionTables;
use crate::dates;
use crate::markup::normalize::{normalize, unwrap_links};

/// Collapses `{{...}}` template expressions into plain values.
///
/// The scanner only counts brace depth; a depth-0 template is expanded once
/// it closes, after its own inner templates have been expanded.
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver<'a> {
    tables: &'a ExtractionTables,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(tables: &'a ExtractionTables) -> Self {
        Self { tables }
    }

    pub fn resolve(&self, value: &str) -> String {
        let bytes = value.as_bytes();
        let mut out = String::with_capacity(value.len());
        let mut depth = 0usize;
        let mut open_at = 0usize;
        let mut literal_from = 0usize;
        let mut i = 0usize;

        while i < bytes.len() {
            if bytes[i..].starts_with(b"{{") {
                if depth == 0 {
                    out.push_str(&value[literal_from..i]);
                    open_at = i;
                }
                depth += 1;
                i += 2;
            } else if bytes[i..].starts_with(b"}}") {
                i += 2;
                // Unmatched closers stay in the literal run.
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    out.push_str(&self.expand(&value[open_at + 2..i - 2]));
                    literal_from = i;
                }
            } else {
                i += 1;
            }
        }

        if depth > 0 {
            out.push_str(&value[open_at..]);
        } else {
            out.push_str(&value[literal_from..]);
        }
        out
    }

    fn expand(&self, inner: &str) -> String {
        let inner = self.resolve(inner);
        let (name, body) = match inner.split_once('|') {
            Some((name, body)) => (name, body),
            None => (inner.as_str(), ""),
        };
        let name = name.trim().replace('_', " ").to_lowercase();
        let args = positional_args(body);

        match name.as_str() {
            "ubl" | "unbulleted list" | "bulleted list" | "hlist" | "ublist" => {
                self.pick_from_list(args.iter().map(String::as_str))
            }
            "plainlist" | "plain list" | "flatlist" => {
                let items: Vec<&str> = body
                    .lines()
                    .map(str::trim)
                    .filter(|line| line.starts_with('*'))
                    .map(|line| line.trim_start_matches('*'))
                    .collect();
                if items.is_empty() {
                    normalize(body)
                } else {
                    self.pick_from_list(items.into_iter())
                }
            }
            "convert" | "cvt" => convert(&args).unwrap_or(inner),
            "start date" | "start date and age" | "end date" | "date" | "birth date"
            | "film date" => date_template(&args).unwrap_or(inner),
            "us$" | "usd" | "us dollar" => args
                .first()
                .map(|amount| format!("${}", amount.trim_start_matches('$')))
                .unwrap_or_default(),
            "nowrap" | "nobr" | "small" | "big" | "abbr" | "flag" | "flagcountry" => {
                args.first().cloned().unwrap_or_default()
            }
            "lang" => args.last().cloned().unwrap_or_default(),
            "flagicon" | "efn" | "refn" | "sfn" | "citation needed" | "cn" | "r" | "rp" => {
                String::new()
            }
            other if other.starts_with("cite ") || other == "citation" => String::new(),
            _ => inner,
        }
    }

    /// First item on the known-manufacturer list, else the first non-empty
    /// item.
    fn pick_from_list<'s>(&self, items: impl Iterator<Item = &'s str>) -> String {
        let items: Vec<String> = items
            .map(normalize)
            .filter(|item| !item.is_empty())
            .collect();
        items
            .iter()
            .find(|item| {
                self.tables.known_manufacturer(item).is_some()
                    || self.tables.manufacturer_word_prefix(item).is_some()
            })
            .or_else(|| items.first())
            .cloned()
            .unwrap_or_default()
    }
}

/// Template arguments with named (`key=value`) parameters dropped.
fn positional_args(body: &str) -> Vec<String> {
    if body.is_empty() {
        return Vec::new();
    }
    split_top_level(body)
        .into_iter()
        .filter(|arg| !is_named_arg(arg))
        .map(|arg| unwrap_links(arg).trim().to_string())
        .collect()
}

/// Splits on `|` outside of `[[...]]` links.
fn split_top_level(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"[[") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"]]") {
            depth = depth.saturating_sub(1);
            i += 2;
        } else {
            if bytes[i] == b'|' && depth == 0 {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            i += 1;
        }
    }
    parts.push(&body[start..]);
    parts
}

fn is_named_arg(arg: &str) -> bool {
    match arg.split_once('=') {
        Some((key, _)) => {
            let key = key.trim();
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ' || c == '-')
        }
        None => false,
    }
}

fn convert(args: &[String]) -> Option<String> {
    let value = args.first()?;
    let unit = args.get(1)?;
    match unit.as_str() {
        "-" | "–" | "to" | "and" => {
            let upper = args.get(2)?;
            let unit = args.get(3)?;
            Some(format!("{value}–{upper} {unit}"))
        }
        _ => Some(format!("{value} {unit}")),
    }
}

fn date_template(args: &[String]) -> Option<String> {
    let first = args.first()?;
    let Ok(year) = first.parse::<i32>() else {
        // {{start date|2 March 1969}}
        return Some(first.clone());
    };
    let month = args.get(1).and_then(|m| m.parse::<u32>().ok());
    let day = args.get(2).and_then(|d| d.parse::<u32>().ok());
    dates::format_parts(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(value: &str) -> String {
        let tables = ExtractionTables::default();
        TemplateResolver::new(&tables).resolve(value)
    }

    #[test]
    fn unbulleted_list_prefers_known_manufacturer() {
        assert_eq!(resolve("{{ubl|Boeing|McDonnell Douglas}}"), "Boeing");
        assert_eq!(resolve("{{ubl|Sud Aviation|BAC}}"), "BAC");
        assert_eq!(resolve("{{ubl|Sud Aviation|Other}}"), "Sud Aviation");
        assert_eq!(resolve("{{Unbulleted list|[[Lockheed Corporation]]|Skunk Works}}"), "Lockheed Corporation");
    }

    #[test]
    fn plainlist_recurses_into_bullets() {
        let value = "{{plainlist|\n* [[Sukhoi]]\n* [[Komsomolsk-on-Amur Aircraft Plant|KnAAPO]]\n}}";
        assert_eq!(resolve(value), "Sukhoi");
        let nested = "{{plainlist|\n* {{nowrap|[[Sud Aviation]]}}\n* {{nowrap|[[British Aircraft Corporation|BAC]]}}\n}}";
        assert_eq!(resolve(nested), "BAC");
    }

    #[test]
    fn convert_and_date_templates() {
        assert_eq!(resolve("{{convert|70.66|m|ft|abbr=on}}"), "70.66 m");
        assert_eq!(resolve("{{cvt|2|-|3|km}}"), "2–3 km");
        assert_eq!(resolve("{{start date|1969|3|2}}"), "March 2, 1969");
        assert_eq!(resolve("{{Start date|df=yes|1969|2|9}}"), "February 9, 1969");
        assert_eq!(resolve("{{start date|1976}}"), "1976");
    }

    #[test]
    fn formatting_and_citation_templates() {
        assert_eq!(resolve("{{US$|400 million}}"), "$400 million");
        assert_eq!(resolve("{{nowrap|1,574}} built"), "1,574 built");
        assert_eq!(resolve("{{flagicon|France}}Air France"), "Air France");
        assert_eq!(resolve("Airbus{{cite web|title=x}}"), "Airbus");
    }

    #[test]
    fn unknown_template_returns_inner_content() {
        assert_eq!(resolve("{{mystery|a}}"), "mystery|a");
        assert_eq!(resolve("a {{b {{c}} d}} e"), "a b c d e");
    }

    #[test]
    fn malformed_input_terminates() {
        assert_eq!(resolve("stray }} closer"), "stray }} closer");
        assert_eq!(resolve("open {{ubl|x"), "open {{ubl|x");
        assert_eq!(resolve("}}}}{{{{"), "}}}}{{{{");
        assert_eq!(resolve(""), "");
    }
}
