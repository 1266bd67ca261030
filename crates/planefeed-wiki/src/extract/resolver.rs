use crate::error::Result;
use crate::source::Encyclopedia;

/// How the title search is phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    General,
    /// Biased towards pages that talk about the maiden flight.
    FirstFlight,
}

impl SearchMode {
    pub fn query(self, name: &str) -> String {
        match self {
            Self::General => name.trim().to_string(),
            Self::FirstFlight => format!("{} \"first flight\"", name.trim()),
        }
    }
}

/// Canonical article title for `name`: the best search hit, or `name` itself
/// when the search comes back empty. Transport errors propagate.
pub async fn resolve_title(
    source: &dyn Encyclopedia,
    name: &str,
    mode: SearchMode,
) -> Result<String> {
    let hits = source.search(&mode.query(name), 1).await?;
    Ok(hits
        .into_iter()
        .next()
        .unwrap_or_else(|| name.trim().to_string()))
}
