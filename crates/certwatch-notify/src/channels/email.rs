use crate::error::{NotifyError, Result};
use crate::report_template::ReportRenderer;
use crate::NotificationChannel;
use async_trait::async_trait;
use certwatch_common::types::ScanReport;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP 邮件渠道：将扫描报告渲染为 HTML + 纯文本并逐个收件人投递
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    locale: String,
}

impl EmailChannel {
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        username: Option<&str>,
        password: Option<&str>,
        from: &str,
        locale: &str,
    ) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?.port(smtp_port);

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.to_string(),
            locale: locale.to_string(),
        })
    }

    fn subject(&self, report: &ScanReport) -> String {
        let date = report.scan_started_at.format("%Y-%m-%d");
        let issues = report.warning_count
            + report.critical_count
            + report.expired_count
            + report.error_count;
        if self.locale == "zh-CN" {
            format!(
                "[证书巡检] {date} 检查 {} 个域名，告警 {issues} 个",
                report.total_domains
            )
        } else {
            format!(
                "[certwatch] {date} - {issues} issue(s) across {} domain(s)",
                report.total_domains
            )
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    async fn send(&self, report: &ScanReport, recipients: &[String]) -> Result<()> {
        if recipients.is_empty() {
            return Err(NotifyError::InvalidConfig(
                "recipient list is empty".to_string(),
            ));
        }

        let subject = self.subject(report);
        let html = ReportRenderer::render_html(report, &self.locale)?;
        let plain = ReportRenderer::render_plain(report, &self.locale);
        let from: lettre::message::Mailbox = self.from.parse().map_err(NotifyError::Address)?;

        // One attempt per recipient; a failure for one recipient never blocks
        // the others.
        let mut failed = 0usize;
        for recipient in recipients {
            let to: lettre::message::Mailbox = match recipient.parse() {
                Ok(addr) => addr,
                Err(e) => {
                    tracing::error!(recipient = %recipient, error = %e, "Invalid recipient address");
                    failed += 1;
                    continue;
                }
            };
            let email = Message::builder()
                .from(from.clone())
                .to(to)
                .subject(&subject)
                .multipart(MultiPart::alternative_plain_html(
                    plain.clone(),
                    html.clone(),
                ))?;

            match self.transport.send(email).await {
                Ok(_) => {
                    tracing::info!(recipient = %recipient, "Report email sent");
                }
                Err(e) => {
                    tracing::error!(recipient = %recipient, error = %e, "Report email failed");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(NotifyError::Delivery {
                failed,
                total: recipients.len(),
            });
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
