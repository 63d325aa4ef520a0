//! Image URL extraction from MediaWiki `File:` pages

use log::debug;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};

use crate::core::error::{Error, Result};

/// Fetch a tile page and return the `src` of the first element matching
/// `selector`
pub async fn fetch_image_url(client: &Client, page_url: &str, selector: &str) -> Result<String> {
    let response = client.get(page_url).send().await.map_err(Error::page_fetch)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::UnexpectedStatus {
            url: page_url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(Error::page_fetch)?;
    debug!("Fetched {} ({} bytes)", page_url, body.len());

    extract_image_src(&body, selector)
}

/// Apply `selector` to an HTML document and read the first match's `src`
pub fn extract_image_src(html: &str, selector: &str) -> Result<String> {
    let compiled = Selector::parse(selector)
        .map_err(|e| Error::Parse(format!("invalid selector '{selector}': {e}")))?;

    let document = Html::parse_document(html);
    document
        .select(&compiled)
        .next()
        .and_then(|element| element.value().attr("src"))
        .map(str::to_string)
        .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FetchStep;
    use crate::core::task::{FULL_IMAGE_SELECTOR, HISTORY_THUMBNAIL_SELECTOR};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FILE_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div id="file"><a href="/mediawiki/images/1/1a/5m.png"><img src="/mediawiki/images/1/1a/5m.png" width="80"></a></div>
<div id="mw-imagepage-section-filehistory">
  <table class="filehistory">
    <tr><th>Date</th><th>Time</th><th>Thumbnail</th></tr>
    <tr>
      <td>current</td>
      <td>12:00</td>
      <td><a href="/mediawiki/images/1/1a/5m.png"><img src="/mediawiki/images/thumb/1/1a/5m.png/90px-5m.png"></a></td>
    </tr>
  </table>
</div>
</body></html>"#;

    #[test]
    fn test_extract_full_image() {
        let src = extract_image_src(FILE_PAGE, FULL_IMAGE_SELECTOR).unwrap();
        assert_eq!(src, "/mediawiki/images/1/1a/5m.png");
    }

    #[test]
    fn test_extract_history_thumbnail() {
        let src = extract_image_src(FILE_PAGE, HISTORY_THUMBNAIL_SELECTOR).unwrap();
        assert_eq!(src, "/mediawiki/images/thumb/1/1a/5m.png/90px-5m.png");
    }

    #[test]
    fn test_extract_takes_first_match() {
        let html = r#"<div id="file"><a><img src="/first.png"></a><a><img src="/second.png"></a></div>"#;
        assert_eq!(extract_image_src(html, FULL_IMAGE_SELECTOR).unwrap(), "/first.png");
    }

    #[test]
    fn test_extract_missing_element() {
        let result = extract_image_src("<html><body><p>No file</p></body></html>", FULL_IMAGE_SELECTOR);
        assert!(matches!(result, Err(Error::SelectorNotFound(s)) if s == FULL_IMAGE_SELECTOR));
    }

    #[test]
    fn test_extract_missing_src_attribute() {
        let html = r#"<div id="file"><a><img alt="no source"></a></div>"#;
        let result = extract_image_src(html, FULL_IMAGE_SELECTOR);
        assert!(matches!(result, Err(Error::SelectorNotFound(_))));
    }

    #[test]
    fn test_extract_invalid_selector() {
        let result = extract_image_src(FILE_PAGE, "#file >>> [");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_image_url_ok() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mediawiki/index.php/File:5m.png"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FILE_PAGE))
            .mount(&mock_server)
            .await;

        let url = format!("{}/mediawiki/index.php/File:5m.png", mock_server.uri());
        let src = fetch_image_url(&Client::new(), &url, FULL_IMAGE_SELECTOR).await.unwrap();
        assert_eq!(src, "/mediawiki/images/1/1a/5m.png");
    }

    #[tokio::test]
    async fn test_fetch_image_url_rejects_non_ok_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(FILE_PAGE))
            .mount(&mock_server)
            .await;

        let url = format!("{}/mediawiki/index.php/File:9z.png", mock_server.uri());
        let result = fetch_image_url(&Client::new(), &url, FULL_IMAGE_SELECTOR).await;
        assert!(matches!(result, Err(Error::UnexpectedStatus { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_fetch_image_url_transport_error() {
        // Nothing listens on port 9 of localhost
        let result = fetch_image_url(
            &Client::new(),
            "http://127.0.0.1:9/mediawiki/index.php/File:1m.png",
            FULL_IMAGE_SELECTOR,
        )
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Upstream { step: FetchStep::Page, .. }));

        let message = err.with_causes().to_lowercase();
        assert!(message.starts_with("upstream error during page fetch"), "{message}");
        assert!(message.contains("connection refused"), "{message}");
    }
}
