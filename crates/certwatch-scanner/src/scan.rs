use crate::classifier;
use crate::error::ScanError;
use crate::fetcher::{CertificateFetcher, TlsFetcher};
use certwatch_common::types::{CertificateRecord, ScanReport, ThresholdSettings};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// 扫描编排器：按并发上限对域名列表做一次完整检查
///
/// 每个域名独立抓取与分级，单个域名的失败只产生该域名的 Error 记录，
/// 绝不中断整批扫描。
pub struct ScanOrchestrator {
    fetcher: Arc<dyn CertificateFetcher>,
    thresholds: ThresholdSettings,
    port: u16,
    max_concurrent: usize,
}

impl ScanOrchestrator {
    pub fn new(
        connect_timeout_secs: u64,
        thresholds: ThresholdSettings,
        port: u16,
        max_concurrent: usize,
    ) -> Self {
        Self {
            fetcher: Arc::new(TlsFetcher::new(connect_timeout_secs)),
            thresholds,
            port,
            max_concurrent,
        }
    }

    /// 使用自定义抓取器构造（测试注入 mock 用）
    pub fn with_fetcher(
        fetcher: Arc<dyn CertificateFetcher>,
        thresholds: ThresholdSettings,
        port: u16,
        max_concurrent: usize,
    ) -> Self {
        Self {
            fetcher,
            thresholds,
            port,
            max_concurrent,
        }
    }

    /// 执行一次扫描，返回不可变的聚合报告
    ///
    /// 报告保证每个输入域名恰好对应一条记录。记录顺序不保证与输入一致，
    /// 按 `domain` 字段回溯。
    pub async fn scan(&self, domains: &[String]) -> Result<ScanReport, ScanError> {
        if domains.is_empty() {
            return Err(ScanError::EmptyDomainList);
        }

        let scan_started_at = Utc::now();
        let started = Instant::now();
        tracing::info!(
            total = domains.len(),
            max_concurrent = self.max_concurrent,
            port = self.port,
            "Starting certificate scan"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(domains.len());

        for domain in domains {
            // Acquire before spawn so no more than max_concurrent fetches
            // are in flight at once.
            let permit = semaphore.clone().acquire_owned().await?;
            let fetcher = Arc::clone(&self.fetcher);
            let thresholds = self.thresholds;
            let port = self.port;
            let task_domain = domain.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                check_domain(fetcher.as_ref(), &task_domain, port, &thresholds).await
            });
            handles.push((domain.clone(), handle));
        }

        let mut records = Vec::with_capacity(handles.len());
        for (domain, handle) in handles {
            match handle.await {
                Ok(record) => records.push(record),
                // A panicked or cancelled task still yields a record for its
                // domain so the one-record-per-domain guarantee holds.
                Err(e) => {
                    tracing::error!(domain = %domain, error = %e, "Scan task failed");
                    records.push(CertificateRecord::error_record(
                        &domain,
                        format!("scan task failed: {e}"),
                        Utc::now(),
                    ));
                }
            }
        }

        let report = ScanReport::from_records(records, scan_started_at, started.elapsed());
        tracing::info!(
            total = report.total_domains,
            valid = report.valid_count,
            warning = report.warning_count,
            critical = report.critical_count,
            expired = report.expired_count,
            errors = report.error_count,
            duration_ms = report.scan_duration.as_millis() as u64,
            "Certificate scan finished"
        );
        Ok(report)
    }
}

/// 单个域名的检查：抓取证书并分级，失败时合成 Error 记录
async fn check_domain(
    fetcher: &dyn CertificateFetcher,
    domain: &str,
    port: u16,
    thresholds: &ThresholdSettings,
) -> CertificateRecord {
    let now = Utc::now();
    match fetcher.fetch(domain, port).await {
        Ok(fetched) => {
            let record = classifier::classify(domain, &fetched, thresholds, now);
            tracing::info!(
                domain = %domain,
                status = %record.status,
                days = record.days_until_expiry,
                "Certificate checked"
            );
            record
        }
        Err(e) => {
            tracing::warn!(domain = %domain, error = %e, "Certificate fetch failed");
            CertificateRecord::error_record(domain, e.to_string(), now)
        }
    }
}
