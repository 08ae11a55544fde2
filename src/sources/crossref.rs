//! CrossRef bibliography source.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CrossRefConfig;
use crate::models::{CitationRecord, Doi};
use crate::sources::{BibliographySource, SourceError};
use crate::utils::HttpClient;

pub const CROSSREF_API_BASE: &str = "https://api.crossref.org";

const BIBTEX_MEDIA_TYPE: &str = "application/x-bibtex";

/// CrossRef research source
///
/// Uses the CrossRef REST API for fulltext bibliographic search and for the
/// DOI-to-BibTeX transform. Requests are made once; failures are returned to
/// the caller without retrying.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
    mailto: Option<String>,
    rows: u32,
}

impl CrossRefSource {
    pub fn new(config: &CrossRefConfig) -> Result<Self, SourceError> {
        let user_agent = match &config.mailto {
            Some(mailto) => format!(
                "{}/{} (mailto:{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                mailto
            ),
            None => crate::utils::default_user_agent(),
        };

        let client =
            HttpClient::with_timeouts(&user_agent, config.timeout(), config.connect_timeout())?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mailto: config.mailto.clone(),
            rows: config.search_rows.max(1),
        })
    }

    /// Point the source at another API root (mirrors, mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self, words: &[&str]) -> String {
        let query = words
            .iter()
            .map(|w| urlencoding::encode(w).into_owned())
            .collect::<Vec<_>>()
            .join("+");

        let mut url = format!(
            "{}/works?query.bibliographic={}&rows={}",
            self.base_url, query, self.rows
        );
        self.append_mailto(&mut url);
        url
    }

    fn transform_url(&self, doi: &Doi) -> String {
        let mut url = format!(
            "{}/works/{}/transform/{}",
            self.base_url,
            urlencoding::encode(doi.as_str()),
            BIBTEX_MEDIA_TYPE
        );
        self.append_mailto(&mut url);
        url
    }

    fn append_mailto(&self, url: &mut String) {
        if let Some(mailto) = &self.mailto {
            let sep = if url.contains('?') { '&' } else { '?' };
            url.push(sep);
            url.push_str("mailto=");
            url.push_str(&urlencoding::encode(mailto));
        }
    }
}

#[async_trait]
impl BibliographySource for CrossRefSource {
    fn name(&self) -> &str {
        "CrossRef"
    }

    async fn search_first_doi(&self, words: &[&str]) -> Result<Doi, SourceError> {
        let url = self.search_url(words);
        tracing::debug!(url = %url, "CrossRef bibliographic search");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search CrossRef: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "CrossRef API returned status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let data: CRSearchResponse = serde_json::from_str(&body)?;

        let first = data
            .message
            .items
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound("search returned no items".to_string()))?;

        let doi = first
            .doi
            .ok_or_else(|| SourceError::Parse("first search item has no DOI".to_string()))?;

        Doi::parse(&doi).map_err(|e| SourceError::Parse(e.to_string()))
    }

    async fn fetch_bibtex(&self, doi: &Doi) -> Result<CitationRecord, SourceError> {
        let url = self.transform_url(doi);
        tracing::debug!(url = %url, "CrossRef BibTeX transform");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch DOI {}: {}", doi, e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "CrossRef transform for {} returned status: {}",
                doi,
                response.status()
            )));
        }

        Ok(CitationRecord::new(response.text().await?))
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRSearchResponse {
    message: CRMessage,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRItem>,
}

#[derive(Debug, Deserialize)]
struct CRItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}
