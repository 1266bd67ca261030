use once_cell::sync::Lazy;
use regex::Regex;

static REF_SELF_CLOSING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<ref\b[^<>]*/\s*>").expect("valid regex"));
static REF_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<ref\b[^<>]*>.*?</ref\s*>").expect("valid regex"));
static CITATION_TEMPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\{\{\s*(?:cite[^{}|]*|citation needed|citation|cn|fact|sfn[a-z]*|efn|refn|rp|r)\s*(?:\|[^{}]*)?\}\}",
    )
    .expect("valid regex")
});
static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static OPEN_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*$").expect("valid regex"));
static WIKI_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(?:[^\[\]|]*\|)*([^\[\]|]*)\]\]").expect("valid regex"));
static EXTERNAL_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:https?:)?//[^\s\]]+\s+([^\]]*)\]").expect("valid regex"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid regex"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"'{2,}").expect("valid regex"));
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^()]*\)").expect("valid regex"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\[\]]*\]").expect("valid regex"));
static BRACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"));
static HYPHEN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\s+-(?:\s+[^\d\s].*|\s*)$").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

const TRUNCATE_MARKERS: [&str; 4] = ["—", "→", "Field is", "|"];

/// Reduces a raw markup value to a display string.
///
/// Applied until the output stops changing, so `normalize(normalize(s))`
/// always equals `normalize(s)`.
pub fn normalize(raw: &str) -> String {
    let mut current = normalize_once(raw);
    for _ in 0..16 {
        let next = normalize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Removes refs, citation templates and comments only, leaving other
/// templates in place for the template resolver.
pub fn strip_noise(raw: &str) -> String {
    let s = REF_SELF_CLOSING.replace_all(raw, "");
    let s = REF_BLOCK.replace_all(&s, "");
    let s = CITATION_TEMPLATE.replace_all(&s, "");
    let s = HTML_COMMENT.replace_all(&s, "");
    OPEN_COMMENT.replace_all(&s, "").into_owned()
}

/// Unwraps `[[target|label]]` to `label` and strips bold/italic quotes.
pub fn unwrap_links(raw: &str) -> String {
    let s = WIKI_LINK.replace_all(raw, "$1");
    let s = EXTERNAL_LINK.replace_all(&s, "$1");
    EMPHASIS.replace_all(&s, "").into_owned()
}

pub fn collapse_whitespace(raw: &str) -> String {
    WHITESPACE.replace_all(raw, " ").trim().to_string()
}

/// True for values that carry no information: empty, or only `|`, `=`, `*`.
pub fn is_residue(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, '|' | '=' | '*'))
}

fn normalize_once(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let s = strip_noise(raw);
    let s = s
        .replace("&nbsp;", " ")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—")
        .replace("&amp;", "&");
    let s = unwrap_links(&s);
    let s = HTML_TAG.replace_all(&s, " ").into_owned();
    let mut s = remove_asides(s);

    if let Some(cut) = TRUNCATE_MARKERS.iter().filter_map(|m| s.find(m)).min() {
        s.truncate(cut);
    }

    let s = HYPHEN_SUFFIX.replace(&s, "");
    let s = s.replace('*', "");
    let s = collapse_whitespace(&s);
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'))
        .to_string()
}

fn remove_asides(mut s: String) -> String {
    loop {
        let next = PARENTHETICAL.replace_all(&s, "");
        let next = BRACKETED.replace_all(&next, "");
        let next = BRACED.replace_all(&next, "").into_owned();
        if next == s {
            return s;
        }
        s = next;
    }
}
