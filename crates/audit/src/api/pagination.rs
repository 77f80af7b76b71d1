//! Pagination strategies for the two audit APIs
//!
//! The legacy mail/disk API pages with opaque tokens whose chain has no
//! guaranteed length, so [`TokenPages`] caps each chain and re-anchors on
//! `beforeDate`. A burst within one overlap span that outlasts a chain is
//! read by following the token past the cap. The organization events API pages with an iteration key
//! that is stable for one call ([`IterationKeyPages`]).

use chrono::Duration;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use super::api::{LegacyEventsPage, OrgEventsPage};
use super::normalize::{normalize_events, sort_newest_first};
use super::{ApiRequest, AuditClient, EventFetcher, RetryPolicy, Transport};
use crate::config::Settings;
use crate::error::{Cause, Operation, SyncError};
use crate::models::{EventRecord, FetchWindow, SourceKind, format_cursor};
use crate::sync::Clock;

/// Records gathered during one fetch, deduplicated by canonical form
#[derive(Debug, Default)]
pub struct RecordSet {
    seen: HashSet<String>,
    records: Vec<EventRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records, ignoring ones already collected. Returns how many were new.
    pub fn extend(&mut self, records: impl IntoIterator<Item = EventRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if self.seen.insert(record.canonical().to_string()) {
                self.records.push(record);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<EventRecord> {
        self.records
    }
}

/// How one API walks through the pages of a window
pub trait PageStrategy: Send + Sync {
    fn collect(&self, client: &AuditClient, window: &FetchWindow, out: &mut RecordSet) -> Result<(), SyncError>;
}

/// Token pagination with a page budget and `beforeDate` re-anchoring
#[derive(Debug, Clone)]
pub struct TokenPages {
    pub source: SourceKind,
    pub url: String,
    pub page_size: u32,
    /// Token pages followed before the chain is abandoned
    pub page_budget: u32,
    /// Added to every `beforeDate` bound
    pub overlap: Duration,
}

impl PageStrategy for TokenPages {
    fn collect(&self, client: &AuditClient, window: &FetchWindow, out: &mut RecordSet) -> Result<(), SyncError> {
        let context = format!("{} {}", self.source, window);
        let mut before = window.ended_at + self.overlap;
        let mut request = ApiRequest::new(&self.url)
            .param("pageSize", self.page_size)
            .param("afterDate", format_cursor(&window.started_at))
            .param("beforeDate", format_cursor(&before));
        let mut chain_pages = 0;
        // Set once re-anchoring cannot move back; the chain is then followed
        // for as long as it keeps yielding new records.
        let mut extending = false;

        loop {
            let page: LegacyEventsPage = client.get_page(&request, &context)?;
            let mut records = normalize_events(self.source, page.events);
            sort_newest_first(&mut records);

            if let (Some(newest), Some(oldest)) = (records.first(), records.last()) {
                debug!(
                    "Received {} records, from {} to {}",
                    records.len(),
                    oldest.timestamp(),
                    newest.timestamp()
                );
            }
            let oldest = records.last().map(EventRecord::prefix);
            let added = out.extend(records);

            let Some(token) = page.next_page_token.filter(|t| !t.is_empty()) else {
                break;
            };

            if chain_pages < self.page_budget || (extending && added > 0) {
                chain_pages += 1;
                request.set("pageToken", token);
                continue;
            }

            let Some(oldest) = oldest else {
                error!("No data returned from API request. Exit from cycle.");
                debug!("Data for GET request: {}", request);
                break;
            };

            let anchored = oldest + self.overlap;
            if anchored <= window.started_at {
                debug!("Token walk reached the start of {} with {} records", window, out.len());
                break;
            }

            if anchored < before {
                debug!(
                    "Page budget of {} reached, re-anchoring beforeDate at {}",
                    self.page_budget,
                    format_cursor(&anchored)
                );
                before = anchored;
                request.remove("pageToken");
                request.set("beforeDate", format_cursor(&before));
                request.set("pageSize", self.page_size);
                chain_pages = 0;
                extending = false;
                continue;
            }

            if extending {
                error!(
                    "Token chain for {} stopped yielding records at {}; {} records collected",
                    self.source,
                    format_cursor(&before),
                    out.len()
                );
                return Err(SyncError::new(
                    Operation::FetchPage,
                    context,
                    Cause::Stalled(format!(
                        "no new records and beforeDate stuck at {}",
                        format_cursor(&before)
                    )),
                ));
            }

            warn!(
                "More than {} pages of {} records at or before {}; following the token past the page budget",
                self.page_budget + 1,
                self.source,
                format_cursor(&before)
            );
            extending = true;
            chain_pages += 1;
            request.set("pageToken", token);
        }

        Ok(())
    }
}

/// Iteration-key pagination over an inclusive window
#[derive(Debug, Clone)]
pub struct IterationKeyPages {
    pub source: SourceKind,
    pub url: String,
    pub page_size: u32,
}

impl PageStrategy for IterationKeyPages {
    fn collect(&self, client: &AuditClient, window: &FetchWindow, out: &mut RecordSet) -> Result<(), SyncError> {
        let context = format!("{} {}", self.source, window);
        let mut request = ApiRequest::new(&self.url)
            .param("started_at", format_cursor(&window.started_at))
            .param("ended_at", format_cursor(&window.ended_at))
            .param("count", self.page_size);

        loop {
            let page: OrgEventsPage = client.get_page(&request, &context)?;
            let mut records = normalize_events(self.source, page.items);
            sort_newest_first(&mut records);

            match (records.first(), records.last()) {
                (Some(newest), Some(oldest)) => debug!(
                    "Received {} records, from {} to {}",
                    records.len(),
                    format_cursor(&oldest.prefix()),
                    format_cursor(&newest.prefix())
                ),
                _ => {
                    info!("No data returned from API request.");
                    debug!("Data for GET request: {}", request);
                }
            }
            out.extend(records);

            let Some(key) = page.iteration_key.filter(|k| !k.is_empty()) else {
                break;
            };
            if request.get("iteration_key") == Some(key.as_str()) {
                warn!("API returned the same iteration key twice; stopping pagination");
                break;
            }
            request.set("iteration_key", key);
        }

        Ok(())
    }
}

/// Fetcher for one source: a shared client plus that source's pagination strategy
pub struct SourceFetcher {
    source: SourceKind,
    client: AuditClient,
    strategy: Box<dyn PageStrategy>,
}

impl SourceFetcher {
    pub fn new(source: SourceKind, client: AuditClient, strategy: Box<dyn PageStrategy>) -> Self {
        Self {
            source,
            client,
            strategy,
        }
    }

    /// Build the fetcher for `source` from settings
    pub fn for_source(
        source: SourceKind,
        settings: &Settings,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tuning = &settings.tuning;
        let client = AuditClient::new(
            transport,
            clock,
            RetryPolicy {
                max_attempts: tuning.max_retries,
                delay: tuning.retry_delay(),
            },
        );

        let strategy: Box<dyn PageStrategy> = match source {
            SourceKind::Mail | SourceKind::Disk => Box::new(TokenPages {
                source,
                url: endpoint(
                    settings.legacy_api_url.as_str(),
                    &format!(
                        "security/v1/org/{}/audit_log/{}",
                        settings.organization_id,
                        source.label()
                    ),
                ),
                page_size: tuning.legacy_page_size,
                page_budget: tuning.page_budget,
                overlap: tuning.overlap(),
            }),
            SourceKind::Organization => Box::new(IterationKeyPages {
                source,
                url: endpoint(
                    settings.org_api_url.as_str(),
                    &format!("auditlog/organizations/{}/events", settings.organization_id),
                ),
                page_size: tuning.org_page_size,
            }),
        };

        Self::new(source, client, strategy)
    }
}

impl EventFetcher for SourceFetcher {
    fn source(&self) -> SourceKind {
        self.source
    }

    fn fetch(&self, window: &FetchWindow) -> Result<Vec<EventRecord>, SyncError> {
        let mut out = RecordSet::new();
        self.strategy
            .collect(&self.client, window, &mut out)
            .map_err(|e| SyncError::new(Operation::FetchWindow, format!("{} {}", self.source, window), e.cause))?;
        Ok(out.into_records())
    }
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResponse, TransportError};
    use crate::sync::ManualClock;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves pages from a closure and records every request
    struct FakeApi<F> {
        respond: F,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl<F> FakeApi<F>
    where
        F: Fn(&ApiRequest, usize) -> ApiResponse + Send + Sync,
    {
        fn new(respond: F) -> Arc<Self> {
            Arc::new(Self {
                respond,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl<F> Transport for FakeApi<F>
    where
        F: Fn(&ApiRequest, usize) -> ApiResponse + Send + Sync,
    {
        fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            Ok((self.respond)(request, requests.len()))
        }
    }

    fn client(transport: Arc<dyn Transport>) -> AuditClient {
        let clock = ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        AuditClient::new(transport, Arc::new(clock), RetryPolicy::default())
    }

    fn window() -> FetchWindow {
        FetchWindow::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 3, 0, 0).unwrap(),
        )
    }

    fn token_pages(budget: u32) -> TokenPages {
        TokenPages {
            source: SourceKind::Mail,
            url: "https://legacy.test/security/v1/org/1/audit_log/mail".into(),
            page_size: 100,
            page_budget: budget,
            overlap: Duration::seconds(2),
        }
    }

    fn legacy_page(dates: &[&str], token: &str) -> ApiResponse {
        let events: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| json!({"date": d, "eventType": "message_seen", "n": i}))
            .collect();
        ApiResponse::ok(json!({"events": events, "nextPageToken": token}).to_string())
    }

    #[test]
    fn test_token_walk_until_empty_token() {
        let api = FakeApi::new(|_req: &ApiRequest, n| match n {
            1 => legacy_page(&["2024-03-01T02:00:00.000001Z", "2024-03-01T02:30:00Z"], "t1"),
            _ => legacy_page(&["2024-03-01T01:00:00Z"], ""),
        });

        let mut out = RecordSet::new();
        token_pages(10).collect(&client(api.clone()), &window(), &mut out).unwrap();

        assert_eq!(out.len(), 3);
        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].get("afterDate"), Some("2024-03-01T00:00:00Z"));
        assert_eq!(requests[0].get("beforeDate"), Some("2024-03-01T03:00:02Z"));
        assert_eq!(requests[0].get("pageSize"), Some("100"));
        assert_eq!(requests[0].get("pageToken"), None);
        assert_eq!(requests[1].get("pageToken"), Some("t1"));
    }

    #[test]
    fn test_endless_tokens_terminate_via_reanchoring() {
        // Every page returns the same records and a fresh token: without the
        // page budget this would never end.
        let api = FakeApi::new(|_req: &ApiRequest, n| {
            legacy_page(
                &["2024-03-01T01:00:00.500000Z", "2024-03-01T00:30:00.250000Z"],
                &format!("token-{n}"),
            )
        });

        let mut out = RecordSet::new();
        let err = token_pages(2)
            .collect(&client(api.clone()), &window(), &mut out)
            .unwrap_err();

        let requests = api.requests();
        // Two chains of budget + 1 pages, then one page past the budget that
        // yields nothing new.
        assert_eq!(requests.len(), 7);
        assert_eq!(requests[3].get("pageToken"), None);
        assert_eq!(requests[3].get("beforeDate"), Some("2024-03-01T00:30:02Z"));
        assert_eq!(requests[4].get("pageToken"), Some("token-4"));
        assert_eq!(requests[6].get("pageToken"), Some("token-6"));
        assert!(matches!(err.cause, Cause::Stalled(_)));
        assert_eq!(out.len(), 2);
    }

    /// Legacy API over a fixed record set: filters on the request's date
    /// bounds, sorts newest first and pages with numeric offsets as tokens
    fn offset_pages(dates: &[&str], req: &ApiRequest) -> ApiResponse {
        let bound = |key: &str| {
            chrono::NaiveDateTime::parse_from_str(req.get(key).unwrap(), "%Y-%m-%dT%H:%M:%SZ")
                .unwrap()
                .and_utc()
        };
        let (after, before) = (bound("afterDate"), bound("beforeDate"));
        let size: usize = req.get("pageSize").unwrap().parse().unwrap();
        let offset: usize = req.get("pageToken").map_or(0, |t| t.parse().unwrap());

        let mut matching: Vec<&str> = dates
            .iter()
            .copied()
            .filter(|d| {
                let second = crate::models::second_prefix(d).unwrap();
                second >= after && second <= before
            })
            .collect();
        matching.sort_by(|a, b| b.cmp(a));

        let events: Vec<_> = matching
            .iter()
            .skip(offset)
            .take(size)
            .map(|d| json!({"date": d, "eventType": "message_seen"}))
            .collect();
        let next = if offset + size < matching.len() {
            (offset + size).to_string()
        } else {
            String::new()
        };
        ApiResponse::ok(json!({"events": events, "nextPageToken": next}).to_string())
    }

    #[test]
    fn test_burst_longer_than_one_chain_is_collected() {
        // Six records share one second; a chain only holds four of them.
        const DATES: [&str; 7] = [
            "2024-03-01T02:00:00.100Z",
            "2024-03-01T02:00:00.200Z",
            "2024-03-01T02:00:00.300Z",
            "2024-03-01T02:00:00.400Z",
            "2024-03-01T02:00:00.500Z",
            "2024-03-01T02:00:00.600Z",
            "2024-03-01T00:10:00Z",
        ];
        let api = FakeApi::new(|req: &ApiRequest, _n| offset_pages(&DATES, req));
        let strategy = TokenPages {
            page_size: 2,
            ..token_pages(1)
        };

        let mut out = RecordSet::new();
        strategy.collect(&client(api.clone()), &window(), &mut out).unwrap();

        assert_eq!(out.len(), 7);
        let requests = api.requests();
        assert_eq!(requests.len(), 6);
        assert_eq!(requests[2].get("beforeDate"), Some("2024-03-01T02:00:02Z"));
        assert_eq!(requests[4].get("pageToken"), Some("4"));
        assert_eq!(requests[5].get("pageToken"), Some("6"));
    }

    #[test]
    fn test_reanchoring_walks_backwards() {
        // Simulates an API that serves 2 records before `beforeDate`, always with a token.
        let api = FakeApi::new(|req: &ApiRequest, _n| {
            let before = chrono::NaiveDateTime::parse_from_str(
                req.get("beforeDate").unwrap(),
                "%Y-%m-%dT%H:%M:%SZ",
            )
            .unwrap()
            .and_utc();
            let offset = if req.get("pageToken").is_some() { 40 } else { 20 };
            let a = format_cursor(&(before - Duration::minutes(offset)));
            let b = format_cursor(&(before - Duration::minutes(offset + 10)));
            if before <= Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap() {
                legacy_page(&[], "")
            } else {
                legacy_page(&[a.as_str(), b.as_str()], "more")
            }
        });

        let mut out = RecordSet::new();
        token_pages(1).collect(&client(api.clone()), &window(), &mut out).unwrap();

        let befores: Vec<String> = api
            .requests()
            .iter()
            .filter(|r| r.get("pageToken").is_none())
            .map(|r| r.get("beforeDate").unwrap().to_string())
            .collect();
        assert_eq!(befores[0], "2024-03-01T03:00:02Z");
        assert!(befores.windows(2).all(|w| w[1] < w[0]));
        assert!(out.len() > 4);
    }

    #[test]
    fn test_empty_page_with_token_stops_at_budget() {
        let api = FakeApi::new(|_req: &ApiRequest, _n| legacy_page(&[], "again"));

        let mut out = RecordSet::new();
        token_pages(3).collect(&client(api.clone()), &window(), &mut out).unwrap();

        assert_eq!(api.requests().len(), 4);
        assert!(out.is_empty());
    }

    #[test]
    fn test_duplicates_across_pages_are_collapsed() {
        let api = FakeApi::new(|_req: &ApiRequest, n| match n {
            1 => legacy_page(&["2024-03-01T02:00:00Z", "2024-03-01T01:00:00Z"], "t1"),
            _ => legacy_page(&["2024-03-01T02:00:00Z", "2024-03-01T01:00:00Z"], ""),
        });

        let mut out = RecordSet::new();
        token_pages(10).collect(&client(api), &window(), &mut out).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_iteration_key_walk() {
        let api = FakeApi::new(|_req: &ApiRequest, n| {
            let body = match n {
                1 => json!({
                    "items": [{"event": {"occurred_at": "2024-03-01T01:00:00.123Z", "type": "a"}}],
                    "iteration_key": "k1"
                }),
                2 => json!({
                    "items": [{"event": {"occurred_at": "2024-03-01T02:00:00.456Z", "type": "b"}}],
                    "iteration_key": ""
                }),
                _ => panic!("unexpected request"),
            };
            ApiResponse::ok(body.to_string())
        });
        let strategy = IterationKeyPages {
            source: SourceKind::Organization,
            url: "https://org.test/auditlog/organizations/1/events".into(),
            page_size: 100,
        };

        let mut out = RecordSet::new();
        strategy.collect(&client(api.clone()), &window(), &mut out).unwrap();

        assert_eq!(out.len(), 2);
        let requests = api.requests();
        assert_eq!(requests[0].get("started_at"), Some("2024-03-01T00:00:00Z"));
        assert_eq!(requests[0].get("ended_at"), Some("2024-03-01T03:00:00Z"));
        assert_eq!(requests[0].get("count"), Some("100"));
        assert_eq!(requests[0].get("iteration_key"), None);
        assert_eq!(requests[1].get("iteration_key"), Some("k1"));
    }

    #[test]
    fn test_iteration_key_missing_ends_walk() {
        let api = FakeApi::new(|_req: &ApiRequest, _n| ApiResponse::ok(json!({"items": []}).to_string()));
        let strategy = IterationKeyPages {
            source: SourceKind::Organization,
            url: "https://org.test/events".into(),
            page_size: 50,
        };

        let mut out = RecordSet::new();
        strategy.collect(&client(api.clone()), &window(), &mut out).unwrap();
        assert_eq!(api.requests().len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let api = FakeApi::new(|_req: &ApiRequest, _n| ApiResponse {
            status: 500,
            body: "boom".into(),
            request_id: None,
        });
        let fetcher = SourceFetcher::new(
            SourceKind::Disk,
            client(api.clone()),
            Box::new(token_pages(10)),
        );

        let err = fetcher.fetch(&window()).unwrap_err();
        assert_eq!(err.operation, Operation::FetchWindow);
        assert!(err.context.starts_with("disk "));
        assert_eq!(api.requests().len(), 3);
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("https://cloud-api.yandex.net/v1", "auditlog/organizations/5/events"),
            "https://cloud-api.yandex.net/v1/auditlog/organizations/5/events"
        );
        assert_eq!(
            endpoint("https://api360.yandex.net/", "security/v1/org/5/audit_log/mail"),
            "https://api360.yandex.net/security/v1/org/5/audit_log/mail"
        );
    }
}
