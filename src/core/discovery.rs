use crate::core::filter::SearchFilter;
use crate::core::item::ItemId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{Client, Url, header};
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const RESULTS_URL: &str = "https://www.youtube.com/results";

const DATA_MARKER: &str = "ytInitialData";
const SECTIONS_POINTER: &str =
    "/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents";

/// Desktop Chrome on Windows and Linux.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 11.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36",
];

/// Finds items matching a topic.
#[async_trait(?Send)]
pub trait Discovery {
    /// Returns at most `limit` identifiers in the order the source ranked them.
    async fn search(&self, topic: &str, filter: &SearchFilter, limit: usize) -> Result<Vec<ItemId>>;
}

/// Scrapes the public search results page.
pub struct SearchService {
    client: Client,
    results_url: Url,
}

impl SearchService {
    pub fn new() -> Result<Self> {
        Self::with_results_url(RESULTS_URL)
    }

    pub fn with_results_url(results_url: &str) -> Result<Self> {
        let results_url = Url::parse(results_url)
            .map_err(|e| Error::config(format!("invalid results url {results_url}: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            results_url,
        })
    }

    fn search_url(&self, topic: &str, filter: &SearchFilter) -> Url {
        let mut url = self.results_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("search_query", topic);
            if let Some(token) = filter.token() {
                query.append_pair("sp", &token);
            }
        }
        url
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

#[async_trait(?Send)]
impl Discovery for SearchService {
    async fn search(&self, topic: &str, filter: &SearchFilter, limit: usize) -> Result<Vec<ItemId>> {
        let url = self.search_url(topic, filter);
        let user_agent = random_user_agent();
        debug!(%url, user_agent, "requesting results page");

        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, user_agent)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::discovery(format!("results page returned {status}")));
        }

        let body = response.text().await?;
        let ids = parse_results_page(&body, limit)?;
        info!(topic, found = ids.len(), limit, "discovered items");
        Ok(ids)
    }
}

/// Pulls video ids out of a results page, in page order.
///
/// A page without a parseable data blob is an error; a blob without video
/// entries yields an empty list.
pub fn parse_results_page(html: &str, limit: usize) -> Result<Vec<ItemId>> {
    let data = extract_initial_data(html)?;
    Ok(collect_video_ids(&data, limit))
}

fn extract_initial_data(html: &str) -> Result<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script")
        .map_err(|e| Error::custom(format!("invalid selector: {e}")))?;

    let script = document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .find(|text| text.contains(DATA_MARKER))
        .ok_or_else(|| Error::discovery("results page has no ytInitialData script"))?;

    let start = script
        .find(DATA_MARKER)
        .and_then(|marker| script[marker..].find('{').map(|offset| marker + offset));
    let end = script.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if end > start => serde_json::from_str(&script[start..=end])
            .map_err(|e| Error::discovery(format!("ytInitialData is not valid JSON: {e}"))),
        _ => Err(Error::discovery("ytInitialData script holds no JSON object")),
    }
}

fn collect_video_ids(data: &Value, limit: usize) -> Vec<ItemId> {
    let Some(sections) = data.pointer(SECTIONS_POINTER).and_then(Value::as_array) else {
        warn!("results data has no search section list");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    let renderers = sections
        .iter()
        .filter_map(|section| section.pointer("/itemSectionRenderer/contents"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|entry| entry.pointer("/videoRenderer/videoId"))
        .filter_map(Value::as_str);

    for raw in renderers {
        if ids.len() >= limit {
            break;
        }
        match ItemId::parse(raw) {
            Ok(id) if seen.insert(id.clone()) => ids.push(id),
            Ok(id) => debug!(item = %id, "duplicate result skipped"),
            Err(e) => warn!(raw, error = %e, "ignoring malformed video id"),
        }
    }

    ids
}
