use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::ExtractionTables;
use crate::dates::{DAY_MONTH_YEAR, MONTH_DAY_YEAR, MONTH_YEAR, label_bare_year, reformat_or_verbatim};
use crate::extract::strategy::{Strategy, first_success};
use crate::extract::{AircraftPipeline, SearchMode};
use crate::markup::{TemplateResolver, blocks_in_order, collapse_whitespace, extract_field};
use crate::source::PageParts;
use crate::types::UNKNOWN;

const RELATED_RESULTS: usize = 5;

/// Full date, month first or day first.
static DATE: Lazy<String> = Lazy::new(|| format!("(?:{}|{})", *MONTH_DAY_YEAR, *DAY_MONTH_YEAR));

static DATE_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    let date = DATE.as_str();
    let month_year = MONTH_YEAR.as_str();
    [
        format!(r"(?i)first\s+flight\s+(?:was\s+)?(?:on|took\s+place\s+on)\s+(?:the\s+)?({date})"),
        format!(r"(?i)first\s+flew\s+on\s+(?:the\s+)?({date})"),
        format!(r"(?i)maiden\s+flight\s+(?:was\s+)?(?:on\s+)?(?:the\s+)?({date})"),
        format!(r"(?i)flew\s+for\s+the\s+first\s+time\s+on\s+(?:the\s+)?({date})"),
        format!(
            r"(?i)\bon\s+(?:the\s+)?({date}),?\s+[^.]{{0,80}}?(?:made|took|performed|completed)\s+(?:its|her|his|the)\s+(?:first|maiden)\s+flight"
        ),
        format!(r"(?i)(?:first|maiden)\s+flight[^.]{{0,60}}?({date})"),
        format!(r"(?i)({date})[^.]{{0,40}}?(?:first|maiden)\s+flight"),
        format!(r"(?i)first\s+fl(?:ew|ight)\s+(?:in|on)\s+({month_year})"),
        format!(r"(?i)maiden\s+flight\s+in\s+({month_year})"),
        format!(r"(?i)first\s+flew[^.]{{0,60}}?({date})"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static YEAR_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)first\s+flew\s+in\s+(\d{4})",
        r"(?i)(?:first|maiden)\s+flight\s+in\s+(\d{4})",
        r"(?i)entered\s+service\s+in\s+(\d{4})",
        r"(?i)introduced\s+in\s+(\d{4})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Patterns built around one aircraft name. Compiled once per lookup and
/// reused for every related page.
pub struct NameAnchored {
    dates: Vec<Regex>,
    year: Option<Regex>,
}

impl NameAnchored {
    pub fn new(name: &str) -> Self {
        let Some(name) = name_pattern(name) else {
            return Self {
                dates: Vec::new(),
                year: None,
            };
        };
        let date = DATE.as_str();
        let month_year = MONTH_YEAR.as_str();
        let dates = [
            format!(r"(?i){name}[^.]{{0,80}}?first\s+fl(?:ew|ight)[^.]{{0,40}}?({date})"),
            format!(r"(?i){name}[^.]{{0,80}}?maiden\s+flight[^.]{{0,40}}?({date})"),
            format!(r"(?i)({date})[^.]{{0,80}}?{name}[^.]{{0,40}}?(?:first|maiden)\s+fl(?:ew|ight)"),
            format!(r"(?i){name}[^.]{{0,80}}?first\s+fl(?:ew|ight)[^.]{{0,40}}?({month_year})"),
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();
        let year = Regex::new(&format!(
            r"(?i){name}[^.]{{0,80}}?(?:first\s+flew|entered\s+service|was\s+introduced|introduced)\s+in\s+(\d{{4}})"
        ))
        .ok();
        Self { dates, year }
    }
}

/// Article text being searched, with the name-anchored patterns for it.
pub struct FlightText<'a> {
    pub text: &'a str,
    pub anchored: &'a NameAnchored,
}

const INFOBOX_CHAIN: &[Strategy<str>] = &[Strategy::new("infobox date", infobox_date)];

fn text_chain<'a>() -> [Strategy<FlightText<'a>>; 2] {
    [
        Strategy::new("date phrase", date_phrase),
        Strategy::new("name-anchored date", name_anchored_date),
    ]
}

fn year_chain<'a>() -> [Strategy<FlightText<'a>>; 2] {
    [
        Strategy::new("year phrase", year_phrase),
        Strategy::new("name-anchored year", name_anchored_year),
    ]
}

impl AircraftPipeline {
    /// First-flight date of `name` as `Month D, YYYY` where possible, or
    /// `"Unknown"`. Never fails.
    pub async fn first_flight(&self, name: &str) -> String {
        let found = self.find_first_flight(name).await;
        let collapsed = collapse_whitespace(&found);
        if collapsed.is_empty() {
            return UNKNOWN.to_string();
        }
        label_bare_year(&collapsed)
    }

    async fn find_first_flight(&self, name: &str) -> String {
        let tables = self.tables();

        match self.infobox_markup(name).await {
            Ok(markup) => {
                if let Some(found) = first_success(INFOBOX_CHAIN, markup.as_str(), tables) {
                    return found.value;
                }
            }
            Err(err) => {
                warn!(aircraft = name, stage = "infobox", error = %err, "first flight lookup failed");
            }
        }

        let query = format!("{} first flight", name.trim());
        let titles = match self.source().search(&query, RELATED_RESULTS).await {
            Ok(titles) => titles,
            Err(err) => {
                warn!(aircraft = name, stage = "search", error = %err, "first flight lookup failed");
                Vec::new()
            }
        };

        let anchored = NameAnchored::new(name);
        let mut last_text = String::new();
        for title in titles.iter().take(RELATED_RESULTS) {
            let text = match self.source().page(title, PageParts::FULL_TEXT).await {
                Ok(page) => page.extract.unwrap_or_default(),
                Err(err) => {
                    warn!(aircraft = name, title = %title, error = %err, "skipping related page");
                    continue;
                }
            };
            let ctx = FlightText {
                text: &text,
                anchored: &anchored,
            };
            if let Some(found) = first_success(&text_chain(), &ctx, tables) {
                debug!(aircraft = name, title = %title, "first flight found in related page");
                return found.value;
            }
            last_text = text;
        }

        let ctx = FlightText {
            text: &last_text,
            anchored: &anchored,
        };
        first_success(&year_chain(), &ctx, tables)
            .map(|found| found.value)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    async fn infobox_markup(&self, name: &str) -> crate::error::Result<String> {
        let title = self.resolve_title(name, SearchMode::FirstFlight).await?;
        let page = self.source().page(&title, PageParts::MARKUP).await?;
        Ok(page.wikitext.unwrap_or_default())
    }
}

fn infobox_date(markup: &str, tables: &ExtractionTables) -> Option<String> {
    let resolver = TemplateResolver::new(tables);
    blocks_in_order(markup, &tables.infobox_shapes)
        .into_iter()
        .find_map(|block| {
            tables
                .first_flight_fields
                .iter()
                .find_map(|key| extract_field(block, key, &resolver))
        })
        .map(|value| reformat_or_verbatim(&value))
}

/// `Concorde` -> `Concorde`, `Boeing 747` -> `Boeing\s+747`.
fn name_pattern(name: &str) -> Option<String> {
    let words: Vec<String> = name.split_whitespace().map(regex::escape).collect();
    (!words.is_empty()).then(|| words.join(r"\s+"))
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().to_string())
}

fn date_phrase(ctx: &FlightText<'_>, _: &ExtractionTables) -> Option<String> {
    first_capture(&DATE_PHRASES, ctx.text).map(|date| reformat_or_verbatim(&date))
}

fn name_anchored_date(ctx: &FlightText<'_>, _: &ExtractionTables) -> Option<String> {
    first_capture(&ctx.anchored.dates, ctx.text).map(|date| reformat_or_verbatim(&date))
}

fn year_phrase(ctx: &FlightText<'_>, _: &ExtractionTables) -> Option<String> {
    first_capture(&YEAR_PHRASES, ctx.text).map(|year| format!("Year {year}"))
}

fn name_anchored_year(ctx: &FlightText<'_>, _: &ExtractionTables) -> Option<String> {
    let pattern = ctx.anchored.year.as_ref()?;
    first_capture(std::slice::from_ref(pattern), ctx.text).map(|year| format!("Year {year}"))
}
