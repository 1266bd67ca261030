use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::ExtractionTables;
use crate::error::Result;
use crate::extract::strategy::{Strategy, first_success};
use crate::extract::{AircraftPipeline, SearchMode};
use crate::markup::{TemplateResolver, blocks_in_order, extract_field, normalize};
use crate::source::PageParts;
use crate::types::UNKNOWN;

/// A capitalised organisation name of up to five words, `de Havilland` style
/// particles allowed.
const NAME: &str = r"(?:de\s+)?\p{Lu}[\w&.'\-]*(?:\s+(?:de\s+)?\p{Lu}[\w&.'\-]*){0,4}";
const VERB: &str = r"(?:developed|designed|built|manufactured|produced)";
/// Verbs that name a maker rather than a designer.
const BUILD_VERB: &str = r"(?:developed|built|manufactured|produced)";

static JOINT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let party = format!(r"((?:[Tt]he\s+)?{NAME}(?:\s*\([^()]*\))?)");
    [
        format!(r"(?i:jointly\s+{VERB}(?:\s+and\s+{VERB})?\s+by)\s+{party}\s+(?:and|&)\s+{party}"),
        format!(r"(?i:{VERB}(?:\s+and\s+{VERB})?\s+jointly\s+by)\s+{party}\s+(?:and|&)\s+{party}"),
        format!(
            r"(?i:joint\s+(?:venture|project|development|programme|program)\s+(?:between|of|by))\s+{party}\s+(?:and|&)\s+{party}"
        ),
        format!(r"(?i:{BUILD_VERB}(?:\s+and\s+{VERB})?\s+by)\s+{party}\s+(?:and|&)\s+{party}"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});
static BUILT_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i:(?:developed|manufactured|produced|built)(?:\s+and\s+{VERB})?\s+by)\s+((?:[Tt]he\s+)?{NAME}(?:\s*\([^()]*\))?)"
    ))
    .expect("valid regex")
});
static DESIGNED_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i:designed\s+by)\s+((?:[Tt]he\s+)?{NAME}(?:\s*\([^()]*\))?)"
    ))
    .expect("valid regex")
});
static MAKING_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b{VERB}\b")).expect("valid regex")
});
static LEADING_SUBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*(?:The\s+)?({NAME}(?:\s+[\w\-]+){{0,3}}?)\s+(?i:is|was|are|were)\b"
    ))
    .expect("valid regex")
});
static LEADING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:the)\s+").expect("valid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?](?:\s+|$)").expect("valid regex"));
static TRAILING_MAKING_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:developed|manufactured|produced)\b").expect("valid regex")
});

/// Intro extract of the resolved article and the manufacturer values of
/// its infoboxes, in block order.
#[derive(Debug, Clone, Default)]
pub struct ArticleText {
    pub extract: String,
    pub infobox: Vec<String>,
}

impl ArticleText {
    pub fn new(extract: String, wikitext: &str, tables: &ExtractionTables) -> Self {
        Self {
            extract,
            infobox: infobox_values(wikitext, tables),
        }
    }
}

const NAME_CHAIN: &[Strategy<str>] = &[Strategy::new("name prefix", name_prefix)];

const ARTICLE_CHAIN: &[Strategy<ArticleText>] = &[
    Strategy::new("joint development", joint_development),
    Strategy::new("built by", built_by),
    Strategy::new("designed by", designed_by),
    Strategy::new("known mention", known_mention),
    Strategy::new("leading subject", leading_subject),
    Strategy::new("infobox known", infobox_known),
    Strategy::new("infobox first clean", infobox_first_clean),
];

const FULL_TEXT_CHAIN: &[Strategy<str>] = &[Strategy::new("known maker verb", known_maker_verb)];

const FALLBACK_CHAIN: &[Strategy<str>] = &[Strategy::new("name mention", name_mention)];

impl AircraftPipeline {
    /// Manufacturer of `name`, or `"Unknown"`. Never fails.
    pub async fn manufacturer(&self, name: &str) -> String {
        let tables = self.tables();
        if let Some(found) = first_success(NAME_CHAIN, name, tables) {
            return found.value;
        }

        let title = match self.resolve_title(name, SearchMode::General).await {
            Ok(title) => title,
            Err(err) => {
                warn!(aircraft = name, stage = "resolve", error = %err, "manufacturer lookup failed");
                name.trim().to_string()
            }
        };

        match self.article_text(&title).await {
            Ok(article) => {
                if let Some(found) = first_success(ARTICLE_CHAIN, &article, tables) {
                    return found.value;
                }
            }
            Err(err) => {
                warn!(aircraft = name, stage = "article", error = %err, "manufacturer lookup failed");
            }
        }

        match self.source().page(&title, PageParts::FULL_TEXT).await {
            Ok(page) => {
                let text = page.extract.unwrap_or_default();
                if let Some(found) = first_success(FULL_TEXT_CHAIN, text.as_str(), tables) {
                    return found.value;
                }
            }
            Err(err) => {
                warn!(aircraft = name, stage = "full text", error = %err, "manufacturer lookup failed");
            }
        }

        first_success(FALLBACK_CHAIN, name, tables)
            .map(|found| found.value)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    async fn article_text(&self, title: &str) -> Result<ArticleText> {
        let page = self.source().page(title, PageParts::ARTICLE).await?;
        Ok(ArticleText::new(
            page.extract.unwrap_or_default(),
            page.wikitext.as_deref().unwrap_or_default(),
            self.tables(),
        ))
    }
}

fn name_prefix(name: &str, tables: &ExtractionTables) -> Option<String> {
    tables.manufacturer_prefix(name).map(ToOwned::to_owned)
}

fn name_mention(name: &str, tables: &ExtractionTables) -> Option<String> {
    tables.manufacturer_mention(name).map(ToOwned::to_owned)
}

/// Display form of a captured party: asides dropped, leading "the" removed.
fn party_name(raw: &str) -> String {
    let cleaned = normalize(raw);
    LEADING_ARTICLE
        .replace(&cleaned, "")
        .trim_end_matches(['.', ','])
        .trim()
        .to_string()
}

/// The party as it should be reported when it is a known manufacturer:
/// the list entry for an exact hit, the full name when it starts with an
/// entry, or the entry named in its parenthetical (`... Corporation (BAC)`).
fn known_party(raw: &str, tables: &ExtractionTables) -> Option<String> {
    let name = party_name(raw);
    if let Some(entry) = tables.known_manufacturer(&name) {
        return Some(entry.to_string());
    }
    if tables.manufacturer_word_prefix(&name).is_some() {
        return Some(name);
    }
    let aside = raw.find('(').map(|at| &raw[at..])?;
    tables.manufacturer_mention(aside).map(ToOwned::to_owned)
}

/// Joins the listed sides of a two-party match with `" / "`. `None` when
/// neither side is a known manufacturer.
pub fn join_parties(first: &str, second: &str, tables: &ExtractionTables) -> Option<String> {
    let mut known: Vec<String> = Vec::new();
    for side in [first, second] {
        if let Some(party) = known_party(side, tables) {
            if !known.contains(&party) {
                known.push(party);
            }
        }
    }
    (!known.is_empty()).then(|| known.join(" / "))
}

fn joint_development(article: &ArticleText, tables: &ExtractionTables) -> Option<String> {
    JOINT_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(&article.extract)?;
        join_parties(caps.get(1)?.as_str(), caps.get(2)?.as_str(), tables)
    })
}

fn built_by(article: &ArticleText, tables: &ExtractionTables) -> Option<String> {
    let raw = BUILT_BY.captures(&article.extract)?.get(1)?.as_str();
    known_party(raw, tables).or_else(|| Some(party_name(raw)).filter(|n| !n.is_empty()))
}

/// Designers are often people, so only listed manufacturers count here.
fn designed_by(article: &ArticleText, tables: &ExtractionTables) -> Option<String> {
    DESIGNED_BY
        .captures_iter(&article.extract)
        .filter_map(|caps| caps.get(1))
        .find_map(|raw| known_party(raw.as_str(), tables))
}

/// A listed manufacturer named in a sentence that talks about building the
/// aircraft.
fn known_mention(article: &ArticleText, tables: &ExtractionTables) -> Option<String> {
    SENTENCE_END
        .split(&article.extract)
        .filter(|sentence| MAKING_VERB.is_match(sentence))
        .find_map(|sentence| tables.manufacturer_mention(sentence))
        .map(ToOwned::to_owned)
}

fn leading_subject(article: &ArticleText, tables: &ExtractionTables) -> Option<String> {
    let subject = LEADING_SUBJECT.captures(&article.extract)?.get(1)?.as_str();
    tables.manufacturer_word_prefix(subject).map(ToOwned::to_owned)
}

fn infobox_values(wikitext: &str, tables: &ExtractionTables) -> Vec<String> {
    let resolver = TemplateResolver::new(tables);
    blocks_in_order(wikitext, &tables.infobox_shapes)
        .into_iter()
        .flat_map(|block| {
            tables
                .manufacturer_fields
                .iter()
                .filter_map(|key| extract_field(block, key, &resolver))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn infobox_known(article: &ArticleText, tables: &ExtractionTables) -> Option<String> {
    article
        .infobox
        .iter()
        .find_map(|value| known_party(value, tables))
}

fn infobox_first_clean(article: &ArticleText, _: &ExtractionTables) -> Option<String> {
    article
        .infobox
        .iter()
        .find(|value| !value.contains("{{") && !value.contains("}}") && !value.contains('='))
        .cloned()
}

/// A listed manufacturer directly followed by "developed", "manufactured"
/// or "produced". The earliest such verb wins, and the longest entry ending
/// right before it.
fn known_maker_verb(text: &str, tables: &ExtractionTables) -> Option<String> {
    TRAILING_MAKING_VERB.find_iter(text).find_map(|verb| {
        let before = &text[..verb.start()];
        tables
            .known_manufacturers
            .iter()
            .filter(|maker| ends_with_word(before, maker))
            .max_by_key(|maker| maker.len())
            .cloned()
    })
}

/// `text` ends with `word` (ASCII case-insensitive) on a word boundary.
fn ends_with_word(text: &str, word: &str) -> bool {
    let Some(start) = text.len().checked_sub(word.len()) else {
        return false;
    };
    if word.is_empty() || !text.is_char_boundary(start) {
        return false;
    }
    text[start..].eq_ignore_ascii_case(word)
        && text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::source::fake::FakeEncyclopedia;

    const CONCORDE_MARKUP: &str = "{{Infobox aircraft begin\n |name = Concorde\n}}{{Infobox aircraft type\n |type = Supersonic airliner\n |manufacturer = {{ubl|BAC|Aérospatiale}}\n |first flight = 2 March 1969\n}}";

    fn pipeline(source: FakeEncyclopedia) -> (AircraftPipeline, Arc<FakeEncyclopedia>) {
        let source = Arc::new(source);
        let pipeline = AircraftPipeline::new(source.clone(), ExtractionTables::default());
        (pipeline, source)
    }

    fn article(extract: &str) -> ArticleText {
        ArticleText::new(extract.to_string(), "", &ExtractionTables::default())
    }

    #[tokio::test]
    async fn known_prefix_needs_no_lookup() {
        let (pipeline, source) = pipeline(FakeEncyclopedia::new());
        for maker in ExtractionTables::default().known_manufacturers {
            assert_eq!(pipeline.manufacturer(&format!("{maker} X-1")).await, maker);
        }
        assert_eq!(pipeline.manufacturer("Boeing 747").await, "Boeing");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn concorde_resolves_from_infobox_list() {
        let (pipeline, _) = pipeline(FakeEncyclopedia::new().with_page(
            "Concorde",
            "The Concorde is a supersonic airliner.",
            CONCORDE_MARKUP,
        ));
        assert_eq!(pipeline.manufacturer("Concorde").await, "BAC");
    }

    #[tokio::test]
    async fn missing_article_is_unknown() {
        let (pipeline, _) = pipeline(FakeEncyclopedia::new());
        assert_eq!(pipeline.manufacturer("Zzyzx 9000").await, UNKNOWN);
    }

    #[tokio::test]
    async fn transport_failure_is_unknown() {
        let (pipeline, source) = pipeline(FakeEncyclopedia::failing());
        assert_eq!(pipeline.manufacturer("Concorde").await, UNKNOWN);
        assert!(source.calls() >= 1);
    }

    #[tokio::test]
    async fn full_text_pass_runs_last() {
        let (pipeline, _) = pipeline(FakeEncyclopedia::new().with_page(
            "Harrier",
            "The Harrier is a jump jet.\n\n== Development ==\nHawker developed the P.1127 as a demonstrator.",
            "",
        ));
        assert_eq!(pipeline.manufacturer("Harrier").await, "Hawker");
    }

    #[test]
    fn joint_development_keeps_listed_party() {
        let text = article(
            "Concorde is a retired Anglo-French supersonic airliner jointly developed and manufactured by Sud Aviation (later Aérospatiale) and the British Aircraft Corporation (BAC).",
        );
        let tables = ExtractionTables::default();
        assert_eq!(joint_development(&text, &tables).as_deref(), Some("BAC"));
    }

    #[test]
    fn join_rule() {
        let tables = ExtractionTables::default();
        assert_eq!(join_parties("Boeing", "Airbus", &tables).as_deref(), Some("Boeing / Airbus"));
        assert_eq!(join_parties("Boeing", "Acme Works", &tables).as_deref(), Some("Boeing"));
        assert_eq!(join_parties("Acme Works", "the Widget Company", &tables), None);
        assert_eq!(join_parties("Howard Hughes", "Glenn Odekirk", &tables), None);
    }

    #[test]
    fn designers_in_a_pair_are_not_manufacturers() {
        let tables = ExtractionTables::default();
        let text = article("The H-4 Hercules was designed by Howard Hughes and Glenn Odekirk.");
        assert_eq!(joint_development(&text, &tables), None);
    }

    #[tokio::test]
    async fn designer_pair_falls_through_to_infobox() {
        let (pipeline, _) = pipeline(FakeEncyclopedia::new().with_page(
            "H-4 Hercules",
            "The H-4 Hercules was designed by Howard Hughes and Glenn Odekirk.",
            "{{Infobox aircraft type\n |manufacturer = [[Hughes Aircraft]]\n}}",
        ));
        assert_eq!(pipeline.manufacturer("H-4 Hercules").await, "Hughes Aircraft");
    }

    #[test]
    fn maker_verb_prefers_the_longest_entry() {
        let tables = ExtractionTables::default();
        let text = "In 1997 McDonnell Douglas developed a stretched variant.";
        assert_eq!(known_maker_verb(text, &tables).as_deref(), Some("McDonnell Douglas"));
        assert_eq!(known_maker_verb("The BoeingX developed it.", &tables), None);
    }

    #[test]
    fn built_by_accepts_unlisted_maker() {
        let tables = ExtractionTables::default();
        let text = article("The Aerocar is a roadable aircraft built by Aerocar International.");
        assert_eq!(built_by(&text, &tables).as_deref(), Some("Aerocar International"));
        let text = article("The F-22 is a fighter developed by Lockheed Martin for the USAF.");
        assert_eq!(built_by(&text, &tables).as_deref(), Some("Lockheed Martin"));
    }

    #[test]
    fn designed_by_ignores_people() {
        let tables = ExtractionTables::default();
        let text = article("The Spitfire was designed by R. J. Mitchell.");
        assert_eq!(designed_by(&text, &tables), None);
    }

    #[test]
    fn known_mention_needs_a_making_verb() {
        let tables = ExtractionTables::default();
        let text = article("It served alongside Boeing tankers. It was produced in Toulouse by Airbus.");
        assert_eq!(known_mention(&text, &tables).as_deref(), Some("Airbus"));
    }

    #[test]
    fn infobox_falls_back_to_unlisted_value() {
        let tables = ExtractionTables::default();
        let text = ArticleText::new(
            String::new(),
            "{{Infobox aircraft type\n |manufacturer = [[Pilatus Aircraft]]\n}}",
            &tables,
        );
        assert_eq!(infobox_known(&text, &tables), None);
        assert_eq!(infobox_first_clean(&text, &tables).as_deref(), Some("Pilatus Aircraft"));
    }
}
