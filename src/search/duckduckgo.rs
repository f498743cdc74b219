//! DuckDuckGo search lookup.
//!
//! Uses DuckDuckGo HTML search (no API key required).

use scraper::{Html, Selector};

use crate::search::error::SearchError;
use crate::search::types::{SearchQuery, SearchResult};

/// Base URL for DuckDuckGo HTML search.
const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// Moderate safe-search setting.
const SAFE_SEARCH_MODERATE: &str = "-1";

/// Perform a search on DuckDuckGo.
///
/// # Errors
/// Returns an error if the request fails or the response cannot be parsed.
pub async fn search(
    client: &reqwest::Client,
    query: &SearchQuery,
) -> Result<Vec<SearchResult>, SearchError> {
    let params = build_params(query);

    let response = client.post(DDG_HTML_URL).form(&params).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Status(status.as_u16()));
    }

    let html = response.text().await?;
    parse_results(&html, query.max_results)
}

/// Build form parameters for DuckDuckGo search.
fn build_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.query.clone()),
        ("b", String::new()),
        ("kp", SAFE_SEARCH_MODERATE.to_string()),
    ]
}

/// Parse DuckDuckGo HTML results.
fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let document = Html::parse_document(html);

    let result_selector = Selector::parse(".result")
        .map_err(|e| SearchError::HtmlParse(format!("Invalid selector: {e:?}")))?;
    let title_selector = Selector::parse(".result__a")
        .map_err(|e| SearchError::HtmlParse(format!("Invalid selector: {e:?}")))?;
    let snippet_selector = Selector::parse(".result__snippet")
        .map_err(|e| SearchError::HtmlParse(format!("Invalid selector: {e:?}")))?;

    let mut results = Vec::new();

    for element in document.select(&result_selector) {
        if results.len() >= max_results {
            break;
        }

        let title = element
            .select(&title_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        if title.is_empty() {
            continue;
        }

        let url = element
            .select(&title_selector)
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(extract_url_from_ddg_redirect)
            .unwrap_or_default();
        if url.is_empty() {
            continue;
        }

        let snippet = element
            .select(&snippet_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            url,
            snippet,
        });
    }

    if results.is_empty() {
        tracing::debug!("no results parsed from DuckDuckGo HTML response");
    }

    Ok(results)
}

/// Extract the actual URL from DuckDuckGo's redirect URL.
fn extract_url_from_ddg_redirect(href: &str) -> String {
    // DuckDuckGo uses redirect URLs like:
    // //duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...
    if let Some(uddg_start) = href.find("uddg=") {
        let start = uddg_start + 5;
        let end = href[start..].find('&').map_or(href.len(), |i| start + i);
        let encoded = &href[start..end];
        urlencoding::decode(encoded)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| encoded.to_string())
    } else if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
        <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa&rut=1">First result</a>
            <div class="result__snippet">First snippet text.</div>
        </div>
        <div class="result">
            <a class="result__a" href="https://example.org/b">Second result</a>
            <div class="result__snippet">Second snippet text.</div>
        </div>
        <div class="result">
            <a class="result__a" href="https://example.net/c">Third result</a>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_build_params() {
        let query = SearchQuery::new("rust async runtime").with_max_results(3);
        let params = build_params(&query);

        assert!(params.iter().any(|(k, v)| *k == "q" && v == "rust async runtime"));
        assert!(params.iter().any(|(k, v)| *k == "kp" && v == "-1"));
    }

    #[test]
    fn test_parse_results_fixture() -> Result<(), SearchError> {
        let results = parse_results(FIXTURE, 10)?;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "First result");
        assert_eq!(results[0].url, "https://example.com/a");
        assert_eq!(results[0].snippet, "First snippet text.");
        assert_eq!(results[1].url, "https://example.org/b");
        // Missing snippet decodes to an empty string, not an error.
        assert!(results[2].snippet.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_respects_max_results() {
        let results = parse_results(FIXTURE, 1);
        assert!(results.is_ok_and(|r| r.len() == 1));
    }

    #[test]
    fn test_parse_empty_document() {
        let results = parse_results("<html><body></body></html>", 5);
        assert!(results.is_ok_and(|r| r.is_empty()));
    }

    #[test]
    fn test_extract_url_from_ddg_redirect() {
        let redirect = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=123";
        assert_eq!(
            extract_url_from_ddg_redirect(redirect),
            "https://example.com/page"
        );
        assert_eq!(
            extract_url_from_ddg_redirect("https://direct.example.com"),
            "https://direct.example.com"
        );
        assert_eq!(
            extract_url_from_ddg_redirect("//cdn.example.com/x"),
            "https://cdn.example.com/x"
        );
    }
}
