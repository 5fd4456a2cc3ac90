use async_trait::async_trait;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use reqwest::Client;

use super::{SearchProvider, SearchResult, http_client, request_error};
use crate::errors::ProviderError;

/// Identifier reported in search results
pub const SOURCE: &str = "arxiv";

/// arXiv query API client
#[derive(Debug)]
pub struct Arxiv {
    /// Query endpoint (e.g. `http://export.arxiv.org/api/query`)
    endpoint: String,
    client: Client,
}

impl Arxiv {
    /// Create a new client
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: http_client(timeout_secs),
        }
    }

    /// Interpret an Atom feed returned by the query API.
    ///
    /// Only the first `<entry>` is considered, and it counts as found only when
    /// it links a PDF.
    pub fn result_from_feed(feed: &str, queried_title: &str) -> SearchResult {
        let Some(entry) = first_entry(feed) else {
            return SearchResult::not_found(SOURCE);
        };
        let Some(pdf_url) = entry.pdf_url else {
            return SearchResult::not_found(SOURCE);
        };

        let title = if entry.title.is_empty() {
            queried_title.to_string()
        } else {
            entry.title
        };

        SearchResult {
            found: true,
            pdf_url: Some(pdf_url),
            title: Some(title),
            authors: entry.authors,
            source: SOURCE.to_string(),
            error: None,
        }
    }
}

/// Fields of an Atom `<entry>` the resolver cares about
#[derive(Debug, Default)]
struct AtomEntry {
    title: String,
    authors: Vec<String>,
    pdf_url: Option<String>,
}

/// Read the first complete `<entry>` of a feed.
///
/// Element names are compared without namespace prefix. Text is unescaped
/// (named and numeric references) and CDATA is taken verbatim.
fn first_entry(feed: &str) -> Option<AtomEntry> {
    let mut reader = Reader::from_str(feed);
    reader.config_mut().trim_text(true);

    let mut entry: Option<AtomEntry> = None;
    // Open elements below <entry>
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if let Some(current) = entry.as_mut() {
                    if name == "link" && current.pdf_url.is_none() {
                        current.pdf_url = pdf_href(&e);
                    }
                    path.push(name);
                    text.clear();
                } else if name == "entry" {
                    entry = Some(AtomEntry::default());
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(current) = entry.as_mut() {
                    if local_name(&e) == "link" && current.pdf_url.is_none() {
                        current.pdf_url = pdf_href(&e);
                    }
                }
            }
            Ok(Event::Text(t)) if entry.is_some() => match t.unescape() {
                Ok(unescaped) => text.push_str(&unescaped),
                Err(e) => {
                    debug!("Undecodable text in arXiv feed: {}", e);
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            },
            Ok(Event::CData(c)) if entry.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::End(e)) if entry.is_some() => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "entry" && path.is_empty() {
                    return entry;
                }
                path.pop();
                if let Some(current) = entry.as_mut() {
                    match (name.as_str(), path.last().map(String::as_str)) {
                        ("title", None) => current.title = collapse_whitespace(&text),
                        ("name", Some("author")) => {
                            let author = collapse_whitespace(&text);
                            if !author.is_empty() {
                                current.authors.push(author);
                            }
                        }
                        _ => {}
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => return None,
            Err(e) => {
                debug!("Malformed arXiv feed at {}: {}", reader.buffer_position(), e);
                return None;
            }
            _ => {}
        }
    }
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// `href` of a `<link title="pdf" ...>` element
fn pdf_href(element: &BytesStart<'_>) -> Option<String> {
    let mut is_pdf = false;
    let mut href = None;
    for attr in element.attributes().flatten() {
        let value = attr.unescape_value().map(|v| v.into_owned()).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"title" => is_pdf = value == "pdf",
            b"href" => href = Some(value),
            _ => {}
        }
    }
    href.filter(|h| is_pdf && !h.is_empty())
}

#[async_trait]
impl SearchProvider for Arxiv {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn search(&self, title: &str) -> Result<SearchResult, ProviderError> {
        let query = format!("ti:\"{}\"", title);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("search_query", query.as_str()),
                ("start", "0"),
                ("max_results", "1"),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!("arXiv returned {} for '{}'", status, title);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let feed = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(Self::result_from_feed(&feed, title))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
