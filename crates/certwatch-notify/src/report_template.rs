use certwatch_common::types::{short_issuer, CertStatus, CertificateRecord, ScanReport};
use chrono::Utc;

pub struct ReportRenderer;

impl ReportRenderer {
    /// 渲染 HTML 邮件报告
    pub fn render_html(report: &ScanReport, locale: &str) -> crate::error::Result<String> {
        let template = include_str!("templates/cert_report.html");
        let issue_count = report.warning_count
            + report.critical_count
            + report.expired_count
            + report.error_count;

        let (title, date_label, total_label, issue_label, valid_label, warning_label,
             critical_label, expired_label, error_label, domain_label, status_label,
             days_label, expiry_label, issuer_label, section_title, duration_label,
             footer_desc, generated_label) = if locale == "zh-CN" {
            (
                "证书巡检报告",
                "报告日期",
                "检查域名",
                "告警域名",
                "正常",
                "警告",
                "严重",
                "已过期",
                "异常",
                "域名",
                "状态",
                "剩余天数",
                "过期日期",
                "颁发者",
                "证书明细",
                "扫描耗时",
                "自动化证书监控系统",
                "生成时间",
            )
        } else {
            (
                "Certificate Scan Report",
                "Report Date",
                "Checked",
                "Issues",
                "Valid",
                "Warning",
                "Critical",
                "Expired",
                "Errors",
                "Domain",
                "Status",
                "Days Left",
                "Expiry Date",
                "Issuer",
                "Certificate Details",
                "Scan Duration",
                "Automated Certificate Monitoring",
                "Generated at",
            )
        };

        let (risk_level, risk_label) = if report.critical_count + report.expired_count > 0 {
            (
                "high",
                if locale == "zh-CN" {
                    "🔴 严重告警"
                } else {
                    "🔴 Critical Alert"
                },
            )
        } else if issue_count > 0 {
            (
                "medium",
                if locale == "zh-CN" {
                    "🟡 警告"
                } else {
                    "🟡 Warning"
                },
            )
        } else {
            (
                "normal",
                if locale == "zh-CN" {
                    "✅ 正常"
                } else {
                    "✅ All Clear"
                },
            )
        };

        let issue_value_class = if report.critical_count + report.expired_count > 0 {
            "is-danger"
        } else if issue_count > 0 {
            "is-warn"
        } else {
            ""
        };

        let table_rows = Self::build_html_table_rows(report, locale);
        let report_date = report.scan_started_at.format("%Y-%m-%d").to_string();
        let duration = format!("{:.1}s", report.scan_duration.as_secs_f64());
        let created_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let html = template
            .replace("{{lang}}", if locale == "zh-CN" { "zh" } else { "en" })
            .replace("{{title}}", title)
            .replace("{{date_label}}", date_label)
            .replace("{{report_date}}", &report_date)
            .replace("{{total_label}}", total_label)
            .replace("{{total_checked}}", &report.total_domains.to_string())
            .replace("{{issue_label}}", issue_label)
            .replace("{{issue_count}}", &issue_count.to_string())
            .replace("{{issue_value_class}}", issue_value_class)
            .replace("{{valid_label}}", valid_label)
            .replace("{{valid_count}}", &report.valid_count.to_string())
            .replace("{{warning_label}}", warning_label)
            .replace("{{warning_count}}", &report.warning_count.to_string())
            .replace("{{critical_label}}", critical_label)
            .replace("{{critical_count}}", &report.critical_count.to_string())
            .replace("{{expired_label}}", expired_label)
            .replace("{{expired_count}}", &report.expired_count.to_string())
            .replace("{{error_label}}", error_label)
            .replace("{{error_count}}", &report.error_count.to_string())
            .replace("{{risk_level}}", risk_level)
            .replace("{{risk_label}}", risk_label)
            .replace("{{section_title}}", section_title)
            .replace("{{domain_label}}", domain_label)
            .replace("{{status_label}}", status_label)
            .replace("{{days_label}}", days_label)
            .replace("{{expiry_label}}", expiry_label)
            .replace("{{issuer_label}}", issuer_label)
            .replace("{{table_rows}}", &table_rows)
            .replace("{{duration_label}}", duration_label)
            .replace("{{duration}}", &duration)
            .replace("{{footer_desc}}", footer_desc)
            .replace("{{generated_label}}", generated_label)
            .replace("{{created_at}}", &created_at);

        Ok(html)
    }

    fn build_html_table_rows(report: &ScanReport, locale: &str) -> String {
        let mut html = String::new();
        for record in report.sorted_records() {
            let (badge_class, badge_text) = status_badge(record.status, locale);

            let days_display = match record.status {
                CertStatus::Error => "-".to_string(),
                CertStatus::Expired => {
                    if locale == "zh-CN" {
                        format!(
                            "<span style='color:#b91c1c;font-weight:700'>已过期 {} 天</span>",
                            -record.days_until_expiry
                        )
                    } else {
                        format!(
                            "<span style='color:#b91c1c;font-weight:700'>Expired {}d ago</span>",
                            -record.days_until_expiry
                        )
                    }
                }
                CertStatus::Critical => format!(
                    "<span style='color:#b91c1c;font-weight:700'>{}</span>",
                    record.days_until_expiry
                ),
                CertStatus::Warning => format!(
                    "<span style='color:#8a6a00;font-weight:700'>{}</span>",
                    record.days_until_expiry
                ),
                _ => record.days_until_expiry.to_string(),
            };

            let expiry_display = record
                .not_after
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());

            // Error records carry no issuer; show the failure reason instead
            let issuer_display = if record.issuer.is_empty() {
                record.error.clone().unwrap_or_else(|| "-".to_string())
            } else {
                short_issuer(&record.issuer)
            };

            html.push_str(&format!(
                "<tr>\
                  <td><code>{domain}</code></td>\
                  <td><span class=\"badge {badge_class}\">{status}</span></td>\
                  <td class=\"num\">{days}</td>\
                  <td>{expiry}</td>\
                  <td style=\"font-family:'Inter',sans-serif;font-size:12px;color:var(--text-muted)\">{issuer}</td>\
                </tr>",
                domain = html_escape(&record.domain),
                badge_class = badge_class,
                status = badge_text,
                days = days_display,
                expiry = html_escape(&expiry_display),
                issuer = html_escape(&issuer_display),
            ));
        }
        html
    }

    /// 渲染纯文本报告（HTML 不可用时的降级内容）
    pub fn render_plain(report: &ScanReport, locale: &str) -> String {
        let issue_count = report.warning_count
            + report.critical_count
            + report.expired_count
            + report.error_count;
        let date = report.scan_started_at.format("%Y-%m-%d").to_string();

        let mut text = if locale == "zh-CN" {
            format!(
                "[证书巡检] {date} | 检查:{total} 正常:{valid} 告警:{issues}\n",
                date = date,
                total = report.total_domains,
                valid = report.valid_count,
                issues = issue_count,
            )
        } else {
            format!(
                "[Cert Scan] {date} | Checked:{total} Valid:{valid} Issues:{issues}\n",
                date = date,
                total = report.total_domains,
                valid = report.valid_count,
                issues = issue_count,
            )
        };

        for record in report.sorted_records() {
            text.push_str(&format!("- {}\n", plain_line(record, locale)));
        }

        text
    }
}

fn plain_line(record: &CertificateRecord, locale: &str) -> String {
    match record.status {
        CertStatus::Error => {
            let reason = record.error.as_deref().unwrap_or("unknown error");
            if locale == "zh-CN" {
                format!("{} (检查失败: {})", record.domain, reason)
            } else {
                format!("{} (check failed: {})", record.domain, reason)
            }
        }
        CertStatus::Invalid => {
            if locale == "zh-CN" {
                format!("{} (链校验失败)", record.domain)
            } else {
                format!("{} (chain validation failed)", record.domain)
            }
        }
        CertStatus::Expired => {
            if locale == "zh-CN" {
                format!("{} (已过期 {} 天)", record.domain, -record.days_until_expiry)
            } else {
                format!(
                    "{} (expired {}d ago)",
                    record.domain, -record.days_until_expiry
                )
            }
        }
        _ => {
            if locale == "zh-CN" {
                format!(
                    "{} ({}, 剩余 {} 天)",
                    record.domain, record.status, record.days_until_expiry
                )
            } else {
                format!(
                    "{} ({}, {}d left)",
                    record.domain, record.status, record.days_until_expiry
                )
            }
        }
    }
}

fn status_badge(status: CertStatus, locale: &str) -> (&'static str, &'static str) {
    match status {
        CertStatus::Valid => ("is-ok", if locale == "zh-CN" { "正常" } else { "Valid" }),
        CertStatus::Warning => ("is-warn", if locale == "zh-CN" { "警告" } else { "Warning" }),
        CertStatus::Critical => (
            "is-danger",
            if locale == "zh-CN" { "严重" } else { "Critical" },
        ),
        CertStatus::Expired => (
            "is-danger",
            if locale == "zh-CN" { "已过期" } else { "Expired" },
        ),
        CertStatus::Invalid => (
            "is-danger",
            if locale == "zh-CN" { "链无效" } else { "Invalid" },
        ),
        CertStatus::Error => ("is-info", if locale == "zh-CN" { "异常" } else { "Error" }),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
