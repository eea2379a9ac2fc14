use std::{collections::HashSet, fmt};

use scraper::{Html, Selector};

use crate::{
    error::{PipelineError, PipelineResult},
    requests::RequestClient,
    text_manipulators::{extract_href, file_name_from_link},
};

/// A URL naming one remote dataset file, as found in the catalog page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileLink(String);

impl FileLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self(href.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> Option<&str> {
        file_name_from_link(&self.0)
    }
}

impl fmt::Display for FileLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub page_url: String,
    pub start_year: i32,
    pub end_year: i32,
    pub file_suffix: String,
    pub category_filter: Option<String>,
}

impl ScrapeRequest {
    fn matches(&self, href: &str) -> bool {
        if !href.contains(&self.file_suffix) {
            return false;
        }
        if let Some(category) = &self.category_filter {
            if !href.contains(category.as_str()) {
                return false;
            }
        }
        (self.start_year..=self.end_year).any(|year| href.contains(&year.to_string()))
    }
}

/// Keeps every anchor href that names a year in range, ends up with the right
/// suffix and carries the category token. Document order is preserved and each
/// href appears once, at its first occurrence.
pub fn filter_links(html: &str, request: &ScrapeRequest) -> PipelineResult<Vec<FileLink>> {
    let anchor_selector =
        Selector::parse("a[href]").map_err(|e| PipelineError::Parse(format!("{e:?}")))?;
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = vec![];
    for anchor in document.select(&anchor_selector) {
        let Some(href) = extract_href(anchor) else {
            continue;
        };
        if request.matches(href) && seen.insert(href.to_string()) {
            log::debug!("Found: {href}");
            links.push(FileLink::new(href));
        }
    }
    Ok(links)
}

pub struct LinkScraper {
    request_client: RequestClient,
}

impl LinkScraper {
    pub fn new(request_client: RequestClient) -> Self {
        Self { request_client }
    }

    pub async fn scrape(&self, request: &ScrapeRequest) -> PipelineResult<Vec<FileLink>> {
        log::info!("Getting file links from {}", request.page_url);
        let html = self.request_client.fetch_url_body(&request.page_url).await?;
        let links = filter_links(&html, request)?;
        log::info!("Found {} files", links.len());
        Ok(links)
    }
}
