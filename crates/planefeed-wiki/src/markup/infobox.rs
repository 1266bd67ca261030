use once_cell::sync::Lazy;
use regex::Regex;

use crate::markup::normalize::{is_residue, normalize, strip_noise, unwrap_links};
use crate::markup::templates::TemplateResolver;

/// `{{name|` or `{{name}}`; the name is compared after canonicalising.
static TEMPLATE_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([^{}|]+?)\s*(?:\||\}\})").expect("valid regex"));
/// `| key =`; the key is compared after canonicalising.
static PARAM_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*([^|=\n{}\[\]]+?)\s*=").expect("valid regex"));
static PARAM_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[\w][\w \-()/]*\s*=").expect("valid regex"));
static YEAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{4})(?:\s*([-–—]|to)\s*(\d{4}|present|current|ongoing|today)?)?")
        .expect("valid regex")
});
static COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").expect("valid regex"));
static DOLLAR_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$\s*(\d[\d.,]*)\s*(million|billion|mil\b|bn\b|m\b|b\b)?")
        .expect("valid regex")
});
static QUALIFIED_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d[\d.,]*)\s*(million|billion)").expect("valid regex"));
static PASSENGER_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s*(?:[-–—]|to)\s*(\d[\d,]*)\s*(?:passengers|pax|seats)")
        .expect("valid regex")
});
static PASSENGERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s*(?:passengers|pax|seats)").expect("valid regex")
});
static CARGO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(kg|lb|tonnes|tons|t)\b").expect("valid regex")
});
static MEASUREMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*(km/h|mph|nmi|kn|km|mi|kg|lb|ft|in|m)\b")
        .expect("valid regex")
});

const MEASUREMENT_KEYS: [&str; 8] = [
    "length", "span", "height", "speed", "range", "ceiling", "weight", "climb",
];

/// How a value is interpreted, derived from the infobox key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Produced,
    NumberBuilt,
    UnitCost,
    Capacity,
    Measurement,
    Text,
}

impl FieldKind {
    pub fn for_key(key: &str) -> Self {
        let key = key.trim().to_lowercase();
        if matches!(key.as_str(), "produced" | "production" | "manufactured") {
            Self::Produced
        } else if key.contains("number built") || key == "numberbuilt" || key == "built" {
            Self::NumberBuilt
        } else if key.contains("cost") {
            Self::UnitCost
        } else if key == "capacity" {
            Self::Capacity
        } else if MEASUREMENT_KEYS.iter().any(|m| key.contains(m)) {
            Self::Measurement
        } else {
            Self::Text
        }
    }
}

/// Every block in `markup` opened by the template `shape`
/// (e.g. `Infobox aircraft type`), in document order.
pub fn find_blocks<'a>(markup: &'a str, shape: &str) -> Vec<&'a str> {
    let shape = canonical_name(shape);
    if shape.is_empty() {
        return Vec::new();
    }

    TEMPLATE_OPENER
        .captures_iter(markup)
        .filter(|caps| canonical_name(&caps[1]) == shape)
        .filter_map(|caps| caps.get(0))
        .map(|m| {
            let end = closing_braces(markup, m.start()).unwrap_or(markup.len());
            &markup[m.start()..end]
        })
        .collect()
}

/// Blocks for every shape, shapes taken in the given order.
pub fn blocks_in_order<'a>(markup: &'a str, shapes: &[String]) -> Vec<&'a str> {
    shapes
        .iter()
        .flat_map(|shape| find_blocks(markup, shape))
        .collect()
}

/// Lowercased words joined by single spaces; `Infobox_aircraft  type` and
/// `infobox aircraft type` compare equal.
fn canonical_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// End offset (exclusive) of the template opened at `start`.
fn closing_braces(markup: &str, start: usize) -> Option<usize> {
    let bytes = markup.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"}}") {
            depth = depth.saturating_sub(1);
            i += 2;
            if depth == 0 {
                return Some(i);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Raw text of `| key = value` at the top level of `block`.
///
/// The value runs until the next top-level `|` that starts another
/// `name =` parameter, or the block's closing braces. Pipes inside nested
/// templates and links do not end it.
pub fn raw_field<'a>(block: &'a str, key: &str) -> Option<&'a str> {
    let key = canonical_name(key);
    if key.is_empty() {
        return None;
    }

    let value_start = PARAM_KEY
        .captures_iter(block)
        .filter(|caps| canonical_name(&caps[1]) == key)
        .filter_map(|caps| caps.get(0))
        .find(|m| nesting_at(block, m.start()) == 1)?
        .end();

    let bytes = block.as_bytes();
    let mut depth = 0usize;
    let mut i = value_start;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") || bytes[i..].starts_with(b"[[") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"}}") || bytes[i..].starts_with(b"]]") {
            if depth == 0 && bytes[i] == b'}' {
                break;
            }
            depth = depth.saturating_sub(1);
            i += 2;
        } else if bytes[i] == b'|' && depth == 0 && PARAM_START.is_match(&block[i + 1..]) {
            break;
        } else {
            i += 1;
        }
    }
    Some(block[value_start..i].trim())
}

/// Template nesting depth at byte offset `pos` (1 = directly inside the block).
fn nesting_at(block: &str, pos: usize) -> usize {
    let bytes = &block.as_bytes()[..pos];
    let mut depth = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") || bytes[i..].starts_with(b"[[") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"}}") || bytes[i..].starts_with(b"]]") {
            depth = depth.saturating_sub(1);
            i += 2;
        } else {
            i += 1;
        }
    }
    depth
}

/// Parsed value of `key` in `block`; `None` when missing or when nothing but
/// markup residue survives cleaning.
pub fn extract_field(block: &str, key: &str, resolver: &TemplateResolver<'_>) -> Option<String> {
    let raw = raw_field(block, key)?;
    let resolved = unwrap_links(&resolver.resolve(&strip_noise(raw)));

    let typed = match FieldKind::for_key(key) {
        FieldKind::Produced => parse_produced(&resolved),
        FieldKind::NumberBuilt => parse_number_built(&resolved),
        FieldKind::UnitCost => parse_unit_cost(&resolved),
        FieldKind::Capacity => parse_capacity(&resolved),
        FieldKind::Measurement => parse_measurement(&resolved),
        FieldKind::Text => None,
    };

    let value = typed.unwrap_or_else(|| normalize(&resolved));
    (!is_residue(&value)).then_some(value)
}

fn parse_produced(value: &str) -> Option<String> {
    let caps = YEAR_RANGE.captures(value)?;
    let start = caps.get(1)?.as_str();
    match (caps.get(2), caps.get(3)) {
        (Some(_), Some(end)) if end.as_str().chars().all(|c| c.is_ascii_digit()) => {
            Some(format!("{start}–{}", end.as_str()))
        }
        (Some(_), _) => Some(format!("{start}–present")),
        (None, _) => Some(start.to_string()),
    }
}

fn parse_number_built(value: &str) -> Option<String> {
    COUNT
        .find(value)
        .map(|m| format!("{} units", m.as_str()))
}

fn parse_unit_cost(value: &str) -> Option<String> {
    let (amount, qualifier) = match DOLLAR_AMOUNT.captures(value) {
        Some(caps) => (caps.get(1)?.as_str(), caps.get(2).map(|q| q.as_str())),
        None => {
            let caps = QUALIFIED_AMOUNT.captures(value)?;
            (caps.get(1)?.as_str(), caps.get(2).map(|q| q.as_str()))
        }
    };
    let amount = amount.trim_end_matches(['.', ',']);
    if amount.is_empty() {
        return None;
    }
    let suffix = match qualifier.map(str::to_lowercase).as_deref() {
        Some("million" | "mil" | "m") => "M",
        Some("billion" | "bn" | "b") => "B",
        _ => "",
    };
    Some(format!("${amount}{suffix}"))
}

fn parse_capacity(value: &str) -> Option<String> {
    if let Some(caps) = PASSENGER_RANGE.captures(value) {
        return Some(format!("{}–{} passengers", &caps[1], &caps[2]));
    }
    if let Some(caps) = PASSENGERS.captures(value) {
        return Some(format!("{} passengers", &caps[1]));
    }
    CARGO
        .captures(value)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]))
}

fn parse_measurement(value: &str) -> Option<String> {
    MEASUREMENT
        .captures(value)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]))
}
