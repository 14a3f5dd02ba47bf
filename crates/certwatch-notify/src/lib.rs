//! Delivery of certificate scan reports to external services.
//!
//! A finished [`certwatch_common::types::ScanReport`] is rendered by the
//! [`report_template::ReportRenderer`] (HTML plus a plain-text fallback) and
//! handed to a [`NotificationChannel`]. Email over SMTP is the built-in
//! channel.

pub mod channels;
pub mod error;
pub mod report_template;

use async_trait::async_trait;
use certwatch_common::types::ScanReport;

/// A delivery channel that sends a scan report to an external service.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers the report to every recipient.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery failed for at least one recipient.
    /// Delivery failures must stay contained here; the scan that produced
    /// the report has already completed.
    async fn send(&self, report: &ScanReport, recipients: &[String]) -> error::Result<()>;

    /// Returns the channel type name (e.g., `"email"`).
    fn channel_name(&self) -> &str;
}
