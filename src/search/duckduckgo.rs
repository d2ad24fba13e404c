//! DuckDuckGo HTML search (no API key needed).

use super::{SearchHit, SearchProvider};
use crate::config::SearchSettings;
use crate::error::{CurioError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Search provider backed by the DuckDuckGo HTML endpoint.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
    parser: ResultParser,
}

impl DuckDuckGoSearch {
    /// Create a provider from search settings.
    pub fn new(settings: &SearchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            parser: ResultParser::new(),
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = Url::parse_with_params(&self.endpoint, &[("q", query)])
            .map_err(|e| CurioError::Search(format!("invalid search endpoint: {}", e)))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CurioError::Search(format!(
                "search endpoint answered {}",
                status
            )));
        }

        let html = response.text().await?;
        let hits = self.parser.parse(&html, max_results);
        debug!("DuckDuckGo returned {} hits", hits.len());
        Ok(hits)
    }
}

/// Extracts result blocks from DuckDuckGo's HTML page.
struct ResultParser {
    link_regex: Regex,
    snippet_regex: Regex,
    tag_regex: Regex,
    entity_regex: Regex,
}

impl ResultParser {
    fn new() -> Self {
        Self {
            link_regex: Regex::new(
                r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#,
            )
            .expect("Invalid regex"),
            snippet_regex: Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
                .expect("Invalid regex"),
            tag_regex: Regex::new(r"<[^>]+>").expect("Invalid regex"),
            entity_regex: Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);")
                .expect("Invalid regex"),
        }
    }

    fn parse(&self, html: &str, max_results: usize) -> Vec<SearchHit> {
        html.split("result__body")
            .skip(1)
            .filter_map(|block| {
                let link = self.link_regex.captures(block)?;
                let title = self.clean_text(link.get(2)?.as_str());
                if title.is_empty() {
                    return None;
                }
                let href = resolve_redirect(&self.decode(link.get(1)?.as_str()));
                let body = self
                    .snippet_regex
                    .captures(block)
                    .and_then(|c| c.get(1))
                    .map(|m| self.clean_text(m.as_str()))
                    .unwrap_or_default();

                Some(SearchHit { title, href, body })
            })
            .take(max_results)
            .collect()
    }

    fn clean_text(&self, fragment: &str) -> String {
        let stripped = self.tag_regex.replace_all(fragment, "");
        self.decode(stripped.trim())
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Decode HTML entities in a single pass, so `&amp;lt;` stays `&lt;`.
    fn decode(&self, s: &str) -> String {
        self.entity_regex
            .replace_all(s, |caps: &regex::Captures| match entity_char(&caps[1]) {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// DuckDuckGo wraps result links in `/l/?uddg=<target>` redirects.
fn resolve_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

/// Character for one entity body (the text between `&` and `;`).
fn entity_char(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(decimal) = entity.strip_prefix('#') {
        decimal.parse().ok()?
    } else {
        return match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => None,
        };
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
<div class="results">
  <div class="result results_links results_links_deep web-result ">
    <div class="links_main links_deep result__body">
      <h2 class="result__title">
        <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Ffr.wikipedia.org%2Fwiki%2FSoleil&amp;rut=abc">Le <b>Soleil</b> - Wikipédia</a>
      </h2>
      <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Le <b>Soleil</b> est l&#x27;étoile du Système solaire.</a>
    </div>
  </div>
  <div class="result results_links web-result ">
    <div class="links_main links_deep result__body">
      <h2 class="result__title">
        <a rel="nofollow" class="result__a" href="https://example.org/sun">Sun facts &amp; figures</a>
      </h2>
    </div>
  </div>
  <div class="result results_links web-result ">
    <div class="links_main links_deep result__body">
      <h2 class="result__title">
        <a rel="nofollow" class="result__a" href="https://example.org/third">Third</a>
      </h2>
    </div>
  </div>
</div>
"#;

    #[test]
    fn test_parse_results() {
        let hits = ResultParser::new().parse(FIXTURE, 5);
        assert_eq!(hits.len(), 3);

        assert_eq!(hits[0].title, "Le Soleil - Wikipédia");
        assert_eq!(hits[0].href, "https://fr.wikipedia.org/wiki/Soleil");
        assert_eq!(hits[0].body, "Le Soleil est l'étoile du Système solaire.");

        assert_eq!(hits[1].title, "Sun facts & figures");
        assert_eq!(hits[1].href, "https://example.org/sun");
        assert_eq!(hits[1].body, "");
    }

    #[test]
    fn test_parse_respects_limit() {
        let hits = ResultParser::new().parse(FIXTURE, 2);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(ResultParser::new().parse("<html></html>", 5).is_empty());
    }

    #[test]
    fn test_decode_entities() {
        let parser = ResultParser::new();
        assert_eq!(parser.decode("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(
            parser.decode("write &amp;lt;b&amp;gt; and caf&#233;"),
            "write &lt;b&gt; and café"
        );
        assert_eq!(parser.decode("l&#x27;étoile &#X2605;"), "l'étoile ★");
        assert_eq!(parser.decode("&copy; &#xFFFFFF; &bogus"), "&copy; &#xFFFFFF; &bogus");
    }
}
