//! Scanner-wide test fixtures plus orchestrator tests driven by a mock
//! fetcher. No network access anywhere; certificates come from rcgen.

use crate::error::FetchError;
use crate::fetcher::{CertificateFetcher, FetchedCertificate};
use crate::scan::ScanOrchestrator;
use crate::ScanError;
use async_trait::async_trait;
use certwatch_common::types::{CertStatus, ThresholdSettings};
use rcgen::{CertificateParams, DnType, KeyPair};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 生成一张 `days` 天后过期的自签名证书链（仅叶证书，无中间证书）。
/// not_after 额外偏移半天，保证截断后的剩余天数恰好等于 `days`。
pub(crate) fn self_signed_chain(domain: &str, days: i64) -> FetchedCertificate {
    let mut params =
        CertificateParams::new(vec![domain.to_string()]).expect("certificate params");
    params
        .distinguished_name
        .push(DnType::CommonName, domain);
    let now = time::OffsetDateTime::now_utc();
    // far enough back that negative `days` values keep a sane validity window
    params.not_before = now - time::Duration::days(365);
    params.not_after = now + time::Duration::days(days) + time::Duration::hours(12);
    let key = KeyPair::generate().expect("key pair");
    let cert = params.self_signed(&key).expect("self-signed certificate");
    FetchedCertificate::new(cert.der().clone(), Vec::new())
}

enum MockBehavior {
    Chain(FetchedCertificate),
    Fail(String),
    Delay(Duration, FetchedCertificate),
}

/// 按域名查表返回预设结果的抓取器
struct MockFetcher {
    behaviors: HashMap<String, MockBehavior>,
}

impl MockFetcher {
    fn new(behaviors: Vec<(&str, MockBehavior)>) -> Arc<Self> {
        Arc::new(Self {
            behaviors: behaviors
                .into_iter()
                .map(|(domain, behavior)| (domain.to_string(), behavior))
                .collect(),
        })
    }
}

#[async_trait]
impl CertificateFetcher for MockFetcher {
    async fn fetch(&self, domain: &str, _port: u16) -> Result<FetchedCertificate, FetchError> {
        match self.behaviors.get(domain) {
            Some(MockBehavior::Chain(fetched)) => Ok(fetched.clone()),
            Some(MockBehavior::Fail(reason)) => Err(FetchError::Unreachable {
                reason: reason.clone(),
            }),
            Some(MockBehavior::Delay(duration, fetched)) => {
                tokio::time::sleep(*duration).await;
                Ok(fetched.clone())
            }
            None => Err(FetchError::Unreachable {
                reason: format!("no mock behavior for {domain}"),
            }),
        }
    }
}

fn orchestrator(fetcher: Arc<MockFetcher>, max_concurrent: usize) -> ScanOrchestrator {
    ScanOrchestrator::with_fetcher(fetcher, ThresholdSettings::default(), 443, max_concurrent)
}

fn domains(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_scan_one_record_per_domain() {
    let fetcher = MockFetcher::new(vec![
        ("ok.example", MockBehavior::Chain(self_signed_chain("ok.example", 90))),
        ("soon.example", MockBehavior::Chain(self_signed_chain("soon.example", 5))),
        ("down.example", MockBehavior::Fail("TCP connection failed".to_string())),
    ]);
    let list = domains(&["ok.example", "soon.example", "down.example"]);
    let report = orchestrator(fetcher, 4).scan(&list).await.unwrap();

    assert_eq!(report.total_domains, 3);
    assert_eq!(report.records.len(), 3);
    for domain in &list {
        let count = report.records.iter().filter(|r| &r.domain == domain).count();
        assert_eq!(count, 1, "exactly one record for {domain}");
    }
}

#[tokio::test]
async fn test_scan_rejects_empty_domain_list() {
    let fetcher = MockFetcher::new(vec![]);
    let result = orchestrator(fetcher, 4).scan(&[]).await;
    assert!(matches!(result, Err(ScanError::EmptyDomainList)));
}

#[tokio::test]
async fn test_fetch_failure_becomes_error_record() {
    let fetcher = MockFetcher::new(vec![(
        "down.example",
        MockBehavior::Fail("TLS handshake failed: connection reset".to_string()),
    )]);
    let report = orchestrator(fetcher, 4)
        .scan(&domains(&["down.example"]))
        .await
        .unwrap();

    let record = &report.records[0];
    assert_eq!(record.status, CertStatus::Error);
    assert_eq!(record.domain, "down.example");
    let message = record.error.as_deref().unwrap();
    assert!(message.contains("TLS handshake failed"));
    assert!(record.not_after.is_none());
}

#[tokio::test]
async fn test_one_failure_never_aborts_the_batch() {
    let fetcher = MockFetcher::new(vec![
        ("ok.example", MockBehavior::Chain(self_signed_chain("ok.example", 90))),
        ("down.example", MockBehavior::Fail("timed out".to_string())),
    ]);
    let report = orchestrator(fetcher, 4)
        .scan(&domains(&["down.example", "ok.example"]))
        .await
        .unwrap();

    assert_eq!(report.total_domains, 2);
    // self-signed 90-day cert: time-valid, downgraded to Invalid by the
    // chain pass; the failed fetch is the other error-like record
    assert_eq!(report.error_count, 2);
}

#[tokio::test]
async fn test_report_counts_and_has_issues() {
    let fetcher = MockFetcher::new(vec![
        ("warn.example", MockBehavior::Chain(self_signed_chain("warn.example", 20))),
        ("crit.example", MockBehavior::Chain(self_signed_chain("crit.example", 3))),
        ("gone.example", MockBehavior::Chain(self_signed_chain("gone.example", -10))),
        ("down.example", MockBehavior::Fail("unreachable".to_string())),
    ]);
    let report = orchestrator(fetcher, 4)
        .scan(&domains(&[
            "warn.example",
            "crit.example",
            "gone.example",
            "down.example",
        ]))
        .await
        .unwrap();

    assert_eq!(report.warning_count, 1);
    assert_eq!(report.critical_count, 1);
    assert_eq!(report.expired_count, 1);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.valid_count, 0);
    assert!(report.has_issues());
}

#[tokio::test]
async fn test_scan_runs_domains_concurrently() {
    let delay = Duration::from_millis(300);
    let fetcher = MockFetcher::new(vec![
        (
            "slow-a.example",
            MockBehavior::Delay(delay, self_signed_chain("slow-a.example", 90)),
        ),
        (
            "slow-b.example",
            MockBehavior::Delay(delay, self_signed_chain("slow-b.example", 90)),
        ),
    ]);
    let started = Instant::now();
    let report = orchestrator(fetcher, 4)
        .scan(&domains(&["slow-a.example", "slow-b.example"]))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.total_domains, 2);
    // two 300ms fetches in parallel must finish well under 600ms
    assert!(
        elapsed < Duration::from_millis(550),
        "scan took {elapsed:?}, fetches were not concurrent"
    );
}

#[tokio::test]
async fn test_scan_with_serial_concurrency_still_completes() {
    let fetcher = MockFetcher::new(vec![
        ("a.example", MockBehavior::Chain(self_signed_chain("a.example", 90))),
        ("b.example", MockBehavior::Chain(self_signed_chain("b.example", 90))),
        ("c.example", MockBehavior::Fail("unreachable".to_string())),
    ]);
    let report = orchestrator(fetcher, 1)
        .scan(&domains(&["a.example", "b.example", "c.example"]))
        .await
        .unwrap();
    assert_eq!(report.total_domains, 3);
}

#[tokio::test]
async fn test_scan_duration_and_start_time_recorded() {
    let fetcher = MockFetcher::new(vec![(
        "ok.example",
        MockBehavior::Delay(Duration::from_millis(50), self_signed_chain("ok.example", 90)),
    )]);
    let before = chrono::Utc::now();
    let report = orchestrator(fetcher, 4)
        .scan(&domains(&["ok.example"]))
        .await
        .unwrap();
    assert!(report.scan_started_at >= before);
    assert!(report.scan_duration >= Duration::from_millis(50));
}
