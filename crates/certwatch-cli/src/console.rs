use certwatch_common::types::{short_issuer, CertStatus, ScanReport};

/// 将扫描报告渲染为终端表格 + 汇总行
pub fn render(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<36} {:<10} {:>6}  {:<12} {}\n",
        "DOMAIN", "STATUS", "DAYS", "EXPIRY", "ISSUER"
    ));
    out.push_str(&"-".repeat(96));
    out.push('\n');

    for record in report.sorted_records() {
        let days = if record.status == CertStatus::Error {
            "-".to_string()
        } else {
            record.days_until_expiry.to_string()
        };
        let expiry = record
            .not_after
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        // Error records have no issuer; surface the failure reason instead
        let detail = if record.issuer.is_empty() {
            record.error.clone().unwrap_or_else(|| "-".to_string())
        } else {
            short_issuer(&record.issuer)
        };
        out.push_str(&format!(
            "{:<36} {:<10} {:>6}  {:<12} {}\n",
            record.domain, record.status, days, expiry, detail
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "Checked {total} domain(s) in {secs:.1}s: {valid} valid, {warning} warning, {critical} critical, {expired} expired, {errors} error(s)\n",
        total = report.total_domains,
        secs = report.scan_duration.as_secs_f64(),
        valid = report.valid_count,
        warning = report.warning_count,
        critical = report.critical_count,
        expired = report.expired_count,
        errors = report.error_count,
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use certwatch_common::types::CertificateRecord;
    use chrono::{Duration, Utc};

    fn record(domain: &str, status: CertStatus, days: i64) -> CertificateRecord {
        let now = Utc::now();
        CertificateRecord {
            domain: domain.to_string(),
            status,
            subject: format!("CN={domain}"),
            issuer: if status == CertStatus::Error {
                String::new()
            } else {
                "C=US, O=Let's Encrypt, CN=R11".to_string()
            },
            not_before: Some(now - Duration::days(30)),
            not_after: if status == CertStatus::Error {
                None
            } else {
                Some(now + Duration::days(days))
            },
            days_until_expiry: days,
            san_list: vec![domain.to_string()],
            signature_algorithm: "ECDSAwithSHA256".to_string(),
            serial_number: "01".to_string(),
            fingerprint_sha256: "AA:BB".to_string(),
            error: if status == CertStatus::Error {
                Some("connection timed out".to_string())
            } else {
                None
            },
            checked_at: now,
        }
    }

    #[test]
    fn test_render_contains_every_domain_once() {
        let report = ScanReport::from_records(
            vec![
                record("ok.example.com", CertStatus::Valid, 90),
                record("down.example.com", CertStatus::Error, 0),
            ],
            Utc::now(),
            std::time::Duration::from_secs(2),
        );
        let output = render(&report);
        assert_eq!(output.matches("ok.example.com").count(), 1);
        assert_eq!(output.matches("down.example.com").count(), 1);
    }

    #[test]
    fn test_render_orders_valid_first() {
        let report = ScanReport::from_records(
            vec![
                record("crit.example.com", CertStatus::Critical, 3),
                record("ok.example.com", CertStatus::Valid, 90),
            ],
            Utc::now(),
            std::time::Duration::from_secs(1),
        );
        let output = render(&report);
        let ok_pos = output.find("ok.example.com").unwrap();
        let crit_pos = output.find("crit.example.com").unwrap();
        assert!(ok_pos < crit_pos);
    }

    #[test]
    fn test_render_error_row_shows_reason() {
        let report = ScanReport::from_records(
            vec![record("down.example.com", CertStatus::Error, 0)],
            Utc::now(),
            std::time::Duration::from_secs(1),
        );
        let output = render(&report);
        assert!(output.contains("connection timed out"));
        assert!(output.contains("1 error(s)"));
    }

    #[test]
    fn test_render_summary_counts() {
        let report = ScanReport::from_records(
            vec![
                record("a.example.com", CertStatus::Valid, 90),
                record("b.example.com", CertStatus::Warning, 20),
                record("c.example.com", CertStatus::Expired, -5),
            ],
            Utc::now(),
            std::time::Duration::from_secs(1),
        );
        let output = render(&report);
        assert!(output.contains("Checked 3 domain(s)"));
        assert!(output.contains("1 valid, 1 warning, 0 critical, 1 expired, 0 error(s)"));
    }
}
