use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{Result, WikiError};
use crate::http::RateLimitedClient;
use crate::source::{Encyclopedia, ExtractScope, Page, PageParts};

/// MediaWiki `api.php` client.
pub struct WikiClient {
    client: RateLimitedClient,
    base_url: String,
    thumbnail_size: u32,
}

impl WikiClient {
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = RateLimitedClient::new(
            Duration::from_millis(config.min_interval_ms),
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
            &config.user_agent,
        )?;
        parse_base_url(&config.base_url)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            thumbnail_size: config.thumbnail_size,
        })
    }

    fn query_url(&self, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = parse_base_url(&self.base_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", "query").append_pair("format", "json");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.query_url(params)?;
        let json: Value = self.client.get_json(url.as_str()).await?;
        if let Some(err) = json.get("error") {
            let info = err
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(WikiError::ApiError(self.base_url.clone(), info.to_string()));
        }
        Ok(json)
    }
}

#[async_trait]
impl Encyclopedia for WikiClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let limit = limit.max(1).to_string();
        let json = self
            .query(&[
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("srprop", ""),
            ])
            .await?;
        Ok(parse_search(&json))
    }

    async fn page(&self, title: &str, parts: PageParts) -> Result<Page> {
        let thumb_size = self.thumbnail_size.to_string();
        let mut props = Vec::new();
        if parts.extract.is_some() {
            props.push("extracts");
        }
        if parts.wikitext {
            props.push("revisions");
        }
        if parts.thumbnail {
            props.push("pageimages");
        }
        let prop = props.join("|");

        let mut params: Vec<(&str, &str)> = vec![("titles", title), ("redirects", "1")];
        if !prop.is_empty() {
            params.push(("prop", &prop));
        }
        if let Some(scope) = parts.extract {
            params.push(("explaintext", "1"));
            params.push(("exsectionformat", "wiki"));
            if scope == ExtractScope::Intro {
                params.push(("exintro", "1"));
            }
        }
        if parts.wikitext {
            params.push(("rvprop", "content"));
            params.push(("rvslots", "main"));
        }
        if parts.thumbnail {
            params.push(("piprop", "thumbnail"));
            params.push(("pithumbsize", &thumb_size));
        }

        let json = self.query(&params).await?;
        parse_page(&json, title)
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).map_err(|e| WikiError::InvalidUrl(base_url.to_string(), e.to_string()))
}

fn parse_search(json: &Value) -> Vec<String> {
    json.pointer("/query/search")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("title").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Reads the single page out of `query.pages`, which is an object keyed by
/// page id (or an array under `formatversion=2`).
fn parse_page(json: &Value, requested: &str) -> Result<Page> {
    let pages = json
        .pointer("/query/pages")
        .ok_or_else(|| WikiError::PageNotFound(requested.to_string()))?;
    let page = match pages {
        Value::Object(map) => map.values().next(),
        Value::Array(items) => items.first(),
        _ => None,
    }
    .ok_or_else(|| WikiError::PageNotFound(requested.to_string()))?;

    if page.get("missing").is_some() || page.get("invalid").is_some() {
        return Err(WikiError::PageNotFound(requested.to_string()));
    }

    let revision = page
        .get("revisions")
        .and_then(Value::as_array)
        .and_then(|revs| revs.first());
    let wikitext = revision
        .and_then(|rev| rev.pointer("/slots/main"))
        .and_then(|main| main.get("*").or_else(|| main.get("content")))
        .or_else(|| revision.and_then(|rev| rev.get("*")))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    Ok(Page {
        title: page
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(requested)
            .to_string(),
        extract: page
            .get("extract")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        wikitext,
        thumbnail: page
            .pointer("/thumbnail/source")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
    })
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;

    fn client_for(server: &Server) -> WikiClient {
        WikiClient::from_config(&ApiConfig {
            base_url: format!("{}/w/api.php", server.url()),
            min_interval_ms: 0,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn search_returns_titles_in_order() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "query".into()),
                Matcher::UrlEncoded("list".into(), "search".into()),
                Matcher::UrlEncoded("srsearch".into(), "Concorde \"first flight\"".into()),
                Matcher::UrlEncoded("srlimit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"query": {"search": [{"title": "Concorde"}, {"title": "Concorde 001"}]}})
                    .to_string(),
            )
            .create_async()
            .await;

        let titles = client_for(&server)
            .search("Concorde \"first flight\"", 5)
            .await
            .unwrap();
        assert_eq!(titles, vec!["Concorde", "Concorde 001"]);
    }

    #[tokio::test]
    async fn page_reads_extract_markup_and_thumbnail() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("titles".into(), "Boeing 747".into()),
                Matcher::UrlEncoded("redirects".into(), "1".into()),
                Matcher::UrlEncoded("prop".into(), "extracts|revisions|pageimages".into()),
                Matcher::UrlEncoded("exintro".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "query": {"pages": {"50478": {
                        "pageid": 50478,
                        "title": "Boeing 747",
                        "extract": "The Boeing 747 is a long-range wide-body airliner.",
                        "revisions": [{"slots": {"main": {"contentmodel": "wikitext", "*": "{{Infobox aircraft type|manufacturer=[[Boeing Commercial Airplanes]]}}"}}}],
                        "thumbnail": {"source": "https://upload.wikimedia.org/747.jpg", "width": 1000}
                    }}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let parts = PageParts {
            thumbnail: true,
            ..PageParts::ARTICLE
        };
        let page = client_for(&server).page("Boeing 747", parts).await.unwrap();
        assert_eq!(page.title, "Boeing 747");
        assert!(page.extract.unwrap().starts_with("The Boeing 747"));
        assert!(page.wikitext.unwrap().contains("Boeing Commercial Airplanes"));
        assert_eq!(page.thumbnail.as_deref(), Some("https://upload.wikimedia.org/747.jpg"));
    }

    #[tokio::test]
    async fn missing_page_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"query": {"pages": {"-1": {"ns": 0, "title": "Zzyzx 9000", "missing": ""}}}}).to_string())
            .create_async()
            .await;

        let err = client_for(&server)
            .page("Zzyzx 9000", PageParts::SUMMARY)
            .await
            .unwrap_err();
        assert!(matches!(err, WikiError::PageNotFound(ref t) if t == "Zzyzx 9000"));
    }

    #[tokio::test]
    async fn api_error_payload_is_reported() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"error": {"code": "badvalue", "info": "Unrecognized value"}}).to_string())
            .create_async()
            .await;

        let err = client_for(&server).search("x", 1).await.unwrap_err();
        assert!(matches!(err, WikiError::ApiError(_, ref info) if info == "Unrecognized value"));
    }

    #[test]
    fn parses_formatversion_two_pages() {
        let json = json!({"query": {"pages": [{
            "title": "MiG-21",
            "revisions": [{"slots": {"main": {"content": "{{Infobox aircraft type}}"}}}]
        }]}});
        let page = parse_page(&json, "MiG-21").unwrap();
        assert_eq!(page.wikitext.as_deref(), Some("{{Infobox aircraft type}}"));
        assert_eq!(page.extract, None);
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = WikiClient::from_config(&ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        });
        assert!(matches!(err, Err(WikiError::InvalidUrl(_, _))));
    }
}
