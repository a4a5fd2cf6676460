//! Evidence gathering for the issue report pipeline.
//!
//! [`SearchClient`] runs up to four source queries in parallel — the news
//! search API (required) plus best-effort scrapers for the company's
//! official site, the corporate-filing portal, and the exchange disclosure
//! portal — under a per-query timeout and an overall deadline. Partial
//! results are always acceptable; only the news bucket is ever logged as a
//! failure.

pub mod clean;
pub mod query;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, instrument, warn};
use url::Url;

use issuebrief_shared::{
    BriefError, EvidenceItem, EvidenceSet, NewsSearchConfig, PipelineConfig, Result, SourceKind,
};

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("issuebrief/", env!("CARGO_PKG_VERSION"));

/// Default best-effort portal locations. Any of them may be absent or
/// unreachable; their buckets are then simply empty.
const OFFICIAL_SITE_URL: &str = "https://www.poscointl.com/kor/mediaList.do";
const FILING_PORTAL_URL: &str = "https://dart.fss.or.kr/dsab007/main.do";
const EXCHANGE_PORTAL_URL: &str = "https://kind.krx.co.kr/disclosure/todaydisclosure.do";

// ---------------------------------------------------------------------------
// EvidenceSource trait
// ---------------------------------------------------------------------------

/// Seam between the orchestrator and evidence gathering; test runs
/// substitute a deterministic stub.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Gather evidence for the issue text, bounded by the configured
    /// deadlines. Never fails: total source failure yields an empty set.
    async fn search(&self, issue_text: &str, limit: usize) -> EvidenceSet;
}

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// HTTP evidence client over the news API and the optional portals.
#[derive(Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    news_endpoint: String,
    credentials: Option<(String, String)>,
    official_site_url: Option<String>,
    filing_portal_url: Option<String>,
    exchange_portal_url: Option<String>,
    query_timeout: Duration,
    overall_deadline: Duration,
}

impl SearchClient {
    /// Build a client from config. Credentials are resolved from the
    /// configured environment variables; when absent the news bucket will
    /// fail upstream and be absorbed.
    pub fn new(news: &NewsSearchConfig, pipeline: &PipelineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(pipeline.query_timeout_secs))
            .build()
            .map_err(|e| BriefError::config(format!("failed to build HTTP client: {e}")))?;

        let credentials = match (
            std::env::var(&news.client_id_env),
            std::env::var(&news.client_secret_env),
        ) {
            (Ok(id), Ok(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => {
                warn!("news-search credentials not set; news bucket will be empty");
                None
            }
        };

        Ok(Self {
            client,
            news_endpoint: news.endpoint.clone(),
            credentials,
            official_site_url: Some(OFFICIAL_SITE_URL.to_string()),
            filing_portal_url: Some(FILING_PORTAL_URL.to_string()),
            exchange_portal_url: Some(EXCHANGE_PORTAL_URL.to_string()),
            query_timeout: Duration::from_secs(pipeline.query_timeout_secs),
            overall_deadline: Duration::from_secs(pipeline.search_deadline_secs),
        })
    }

    /// Override the portal locations. `None` disables a bucket entirely.
    pub fn with_portal_urls(
        mut self,
        official_site: Option<String>,
        filing_portal: Option<String>,
        exchange_portal: Option<String>,
    ) -> Self {
        self.official_site_url = official_site;
        self.filing_portal_url = filing_portal;
        self.exchange_portal_url = exchange_portal;
        self
    }

    /// Override credentials directly (tests).
    pub fn with_credentials(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.credentials = Some((id.into(), secret.into()));
        self
    }

    async fn fetch_news(&self, prepared: &str, limit: usize, terms: &[String]) -> Result<Vec<EvidenceItem>> {
        let (id, secret) = self
            .credentials
            .as_ref()
            .ok_or_else(|| BriefError::Upstream("news-search credentials missing".into()))?;

        let response = self
            .client
            .get(&self.news_endpoint)
            .query(&[
                ("query", prepared),
                ("display", &limit.to_string()),
                ("sort", "date"),
            ])
            .header("X-Naver-Client-Id", id)
            .header("X-Naver-Client-Secret", secret)
            .send()
            .await
            .map_err(|e| BriefError::Upstream(format!("news search: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let message = response
                .json::<NewsErrorBody>()
                .await
                .map(|b| b.error_message)
                .unwrap_or_else(|_| "news search quota exhausted".into());
            return Err(BriefError::QuotaExceeded(message));
        }
        if !status.is_success() {
            return Err(BriefError::Upstream(format!("news search: HTTP {status}")));
        }

        let body: NewsResponse = response
            .json()
            .await
            .map_err(|e| BriefError::Upstream(format!("news search body: {e}")))?;

        let mut items: Vec<EvidenceItem> = body
            .items
            .into_iter()
            .map(|item| {
                let title = clean::clean_text(&item.title);
                let description = clean::clean_text(&item.description);
                let relevance_score = relevance(&title, &description, terms);
                let url = if item.originallink.is_empty() {
                    item.link
                } else {
                    item.originallink
                };
                EvidenceItem {
                    source_kind: SourceKind::News,
                    title,
                    url,
                    description,
                    published_at: parse_pub_date(&item.pub_date),
                    relevance_score,
                }
            })
            .collect();

        sort_by_relevance(&mut items);
        Ok(items)
    }

    /// Scrape one portal page for links whose text shares a scoring term.
    async fn fetch_portal(
        &self,
        portal_url: &str,
        kind: SourceKind,
        terms: &[String],
    ) -> Result<Vec<EvidenceItem>> {
        let response = self
            .client
            .get(portal_url)
            .send()
            .await
            .map_err(|e| BriefError::Upstream(format!("{portal_url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BriefError::Upstream(format!("{portal_url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BriefError::Upstream(format!("{portal_url}: {e}")))?;

        let base = Url::parse(portal_url)
            .map_err(|e| BriefError::Upstream(format!("{portal_url}: {e}")))?;

        let mut items = extract_portal_links(&body, &base, kind, terms);
        sort_by_relevance(&mut items);
        Ok(items)
    }
}

#[async_trait]
impl EvidenceSource for SearchClient {
    #[instrument(skip(self, issue_text))]
    async fn search(&self, issue_text: &str, limit: usize) -> EvidenceSet {
        let prepared = query::prepare(issue_text);
        let terms = query::scoring_terms(&prepared);
        debug!(query = %prepared, "prepared search query");

        let deadline = Instant::now() + self.overall_deadline;
        let (tx, mut rx) = mpsc::channel::<(SourceKind, Result<Vec<EvidenceItem>>)>(4);

        let mut launched = 0usize;
        {
            let me = self.clone();
            let tx = tx.clone();
            let prepared = prepared.clone();
            let terms = terms.clone();
            launched += 1;
            tokio::spawn(async move {
                let result = timeout(me.query_timeout, me.fetch_news(&prepared, limit, &terms))
                    .await
                    .unwrap_or_else(|_| Err(BriefError::Upstream("news search: timeout".into())));
                let _ = tx.send((SourceKind::News, result)).await;
            });
        }

        let portals = [
            (SourceKind::OfficialSite, self.official_site_url.clone()),
            (SourceKind::RegulatorFiling, self.filing_portal_url.clone()),
            (SourceKind::ExchangeDisclosure, self.exchange_portal_url.clone()),
        ];
        for (kind, portal_url) in portals {
            let Some(portal_url) = portal_url else { continue };
            let me = self.clone();
            let tx = tx.clone();
            let terms = terms.clone();
            launched += 1;
            tokio::spawn(async move {
                let result = timeout(
                    me.query_timeout,
                    me.fetch_portal(&portal_url, kind, &terms),
                )
                .await
                .unwrap_or_else(|_| Err(BriefError::Upstream(format!("{portal_url}: timeout"))));
                let _ = tx.send((kind, result)).await;
            });
        }
        drop(tx);

        let mut buckets: Vec<(SourceKind, Vec<EvidenceItem>)> = Vec::new();
        let mut quota_exceeded = false;

        for _ in 0..launched {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some((kind, Ok(items)))) => buckets.push((kind, items)),
                Ok(Some((kind, Err(BriefError::QuotaExceeded(msg))))) => {
                    warn!(source = kind.as_str(), %msg, "source quota exhausted");
                    quota_exceeded = true;
                }
                Ok(Some((kind, Err(e)))) => {
                    // Only the news bucket failure is noteworthy
                    if kind == SourceKind::News {
                        warn!(error = %e, "news search failed; evidence may be empty");
                    } else {
                        debug!(source = kind.as_str(), error = %e, "optional source failed");
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!("evidence-gathering deadline hit; using partial results");
                    break;
                }
            }
        }

        let ordered_kinds = [
            SourceKind::News,
            SourceKind::OfficialSite,
            SourceKind::RegulatorFiling,
            SourceKind::ExchangeDisclosure,
        ];
        let mut merged: Vec<EvidenceItem> = Vec::new();
        for kind in ordered_kinds {
            if let Some((_, items)) = buckets.iter().find(|(k, _)| *k == kind) {
                merged.extend(items.iter().cloned());
            }
        }

        let mut items = dedupe(merged);
        items.truncate(limit);

        info!(
            items = items.len(),
            quota_exceeded, "evidence gathering complete"
        );

        EvidenceSet {
            items,
            quota_exceeded,
        }
    }
}

// ---------------------------------------------------------------------------
// News API wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    items: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    originallink: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "pubDate")]
    pub_date: String,
}

#[derive(Debug, Deserialize)]
struct NewsErrorBody {
    #[serde(rename = "errorMessage")]
    error_message: String,
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Scoring, dedup, portal extraction
// ---------------------------------------------------------------------------

/// Relevance = 2 × title term hits + 1 × description term hits
/// + 3 when the subject company appears at all.
fn relevance(title: &str, description: &str, terms: &[String]) -> f64 {
    let mut score = 0.0;
    for term in terms {
        if title.contains(term.as_str()) {
            score += 2.0;
        }
        if description.contains(term.as_str()) {
            score += 1.0;
        }
    }
    if title.contains(query::COMPANY_NAME) || description.contains(query::COMPANY_NAME) {
        score += 3.0;
    }
    score
}

fn sort_by_relevance(items: &mut [EvidenceItem]) {
    items.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Deduplicate by normalized URL and drop items with neither title nor
/// description. First occurrence wins (buckets are pre-sorted).
fn dedupe(items: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| !(item.title.is_empty() && item.description.is_empty()))
        .filter(|item| seen.insert(normalize_url(&item.url)))
        .collect()
}

/// Normalize a URL for deduplication (strip fragment and trailing slash,
/// lowercase host via the parser).
fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            let mut s = url.to_string();
            if s.ends_with('/') && s.matches('/').count() > 3 {
                s.pop();
            }
            s
        }
        Err(_) => raw.to_string(),
    }
}

/// Pull anchor links out of a portal page; keep those whose text shares at
/// least one scoring term. Parsing is synchronous — `scraper::Html` must not
/// live across an await point.
fn extract_portal_links(
    body: &str,
    base: &Url,
    kind: SourceKind,
    terms: &[String],
) -> Vec<EvidenceItem> {
    let doc = scraper::Html::parse_document(body);
    let anchor_sel = scraper::Selector::parse("a[href]").expect("valid selector");

    let mut items = Vec::new();
    for el in doc.select(&anchor_sel) {
        let text = el.text().collect::<String>();
        let title = clean::clean_text(&text);
        if title.is_empty() || !terms.iter().any(|t| title.contains(t.as_str())) {
            continue;
        }
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let relevance_score = relevance(&title, "", terms);
        items.push(EvidenceItem {
            source_kind: kind,
            title,
            url: resolved.to_string(),
            description: String::new(),
            published_at: None,
            relevance_score,
        });
    }
    items
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(news_endpoint: String) -> SearchClient {
        let news = NewsSearchConfig {
            client_id_env: "IB_TEST_UNSET_ID".into(),
            client_secret_env: "IB_TEST_UNSET_SECRET".into(),
            endpoint: news_endpoint,
        };
        let pipeline = PipelineConfig {
            deadline_secs: 90,
            search_deadline_secs: 5,
            query_timeout_secs: 3,
            evidence_limit: 10,
        };
        SearchClient::new(&news, &pipeline)
            .unwrap()
            .with_credentials("test-id", "test-secret")
            .with_portal_urls(None, None, None)
    }

    fn news_body(items: &str) -> String {
        format!(r#"{{"items": [{items}]}}"#)
    }

    #[tokio::test]
    async fn news_results_are_cleaned_and_scored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header_exists("X-Naver-Client-Id"))
            .respond_with(ResponseTemplate::new(200).set_body_string(news_body(
                r#"{"title": "<b>포스코인터내셔널</b> 미얀마 가스전 실적",
                    "link": "https://n.example.com/a1",
                    "originallink": "https://news.example.com/a1",
                    "description": "가스전 실적 개선 보도",
                    "pubDate": "Mon, 14 Jul 2025 07:50:00 +0900"}"#,
            )))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let set = client
            .search("미얀마 가스전 실적 개선 배경 관련 문의드립니다", 5)
            .await;

        assert!(!set.quota_exceeded);
        assert_eq!(set.items.len(), 1);
        let item = &set.items[0];
        assert!(!item.title.contains("<b>"));
        assert_eq!(item.url, "https://news.example.com/a1");
        assert!(item.relevance_score >= 3.0);
        assert!(item.published_at.is_some());
    }

    #[tokio::test]
    async fn http_429_sets_quota_flag_with_empty_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_string(r#"{"errorMessage": "Rate limit exceeded"}"#),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let set = client
            .search("포스코인터내셔널 관련 이슈 문의드립니다 답변 부탁드립니다", 5)
            .await;

        assert!(set.quota_exceeded);
        assert!(set.items.is_empty());
    }

    #[tokio::test]
    async fn total_failure_yields_empty_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let set = client
            .search("포스코인터내셔널 관련 이슈 문의드립니다 답변 부탁드립니다", 5)
            .await;

        assert!(!set.quota_exceeded);
        assert!(set.items.is_empty());
    }

    #[tokio::test]
    async fn duplicate_urls_are_deduped_and_blank_items_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(news_body(
                r#"{"title": "포스코인터내셔널 보도 A", "originallink": "https://news.example.com/a#frag", "link": "", "description": "본문", "pubDate": ""},
                   {"title": "포스코인터내셔널 보도 A 재송고", "originallink": "https://news.example.com/a", "link": "", "description": "본문", "pubDate": ""},
                   {"title": "", "originallink": "https://news.example.com/empty", "link": "", "description": "", "pubDate": ""}"#,
            )))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let set = client
            .search("포스코인터내셔널 관련 이슈 문의드립니다 답변 부탁드립니다", 5)
            .await;

        assert_eq!(set.items.len(), 1);
    }

    #[tokio::test]
    async fn optional_portal_failure_keeps_news_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(ResponseTemplate::new(200).set_body_string(news_body(
                r#"{"title": "포스코인터내셔널 실적", "originallink": "https://news.example.com/b", "link": "", "description": "실적 보도", "pubDate": ""}"#,
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/portal"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let news = NewsSearchConfig {
            client_id_env: "IB_TEST_UNSET_ID".into(),
            client_secret_env: "IB_TEST_UNSET_SECRET".into(),
            endpoint: format!("{}/news", server.uri()),
        };
        let pipeline = PipelineConfig {
            deadline_secs: 90,
            search_deadline_secs: 5,
            query_timeout_secs: 3,
            evidence_limit: 10,
        };
        let client = SearchClient::new(&news, &pipeline)
            .unwrap()
            .with_credentials("test-id", "test-secret")
            .with_portal_urls(Some(format!("{}/portal", server.uri())), None, None);

        let set = client
            .search("포스코인터내셔널 실적 발표 관련 문의드립니다", 5)
            .await;

        assert_eq!(set.items.len(), 1);
        assert_eq!(set.items[0].source_kind, SourceKind::News);
    }

    #[tokio::test]
    async fn portal_links_matching_terms_become_evidence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(ResponseTemplate::new(200).set_body_string(news_body("")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/portal"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                    <a href="/board/1">미얀마 가스전 4단계 개발 공시</a>
                    <a href="/board/2">전혀 무관한 공지</a>
                </body></html>"#,
            ))
            .mount(&server)
            .await;

        let news = NewsSearchConfig {
            client_id_env: "IB_TEST_UNSET_ID".into(),
            client_secret_env: "IB_TEST_UNSET_SECRET".into(),
            endpoint: format!("{}/news", server.uri()),
        };
        let pipeline = PipelineConfig {
            deadline_secs: 90,
            search_deadline_secs: 5,
            query_timeout_secs: 3,
            evidence_limit: 10,
        };
        let client = SearchClient::new(&news, &pipeline)
            .unwrap()
            .with_credentials("test-id", "test-secret")
            .with_portal_urls(
                None,
                Some(format!("{}/portal", server.uri())),
                None,
            );

        let set = client
            .search("미얀마 가스전 개발 진척 관련 문의드립니다", 5)
            .await;

        assert_eq!(set.items.len(), 1);
        assert_eq!(set.items[0].source_kind, SourceKind::RegulatorFiling);
        assert!(set.items[0].url.ends_with("/board/1"));
    }

    #[test]
    fn relevance_weights() {
        let terms = vec!["실적".to_string(), "가스전".to_string()];
        // title hit ×2 + description hit ×1 + company hit ×3
        let score = relevance("포스코인터내셔널 실적", "가스전 보도", &terms);
        assert_eq!(score, 2.0 + 1.0 + 3.0);
    }

    #[test]
    fn normalize_url_strips_fragment_and_slash() {
        assert_eq!(
            normalize_url("https://news.example.com/a/#top"),
            "https://news.example.com/a"
        );
    }
}
