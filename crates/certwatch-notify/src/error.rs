/// Errors that can occur within the notification subsystem.
///
/// # Examples
///
/// ```rust
/// use certwatch_notify::error::NotifyError;
///
/// let err = NotifyError::InvalidConfig("missing smtp_host".to_string());
/// assert!(err.to_string().contains("smtp_host"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel configuration is missing a required field or contains an
    /// invalid value.
    #[error("Notify: invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// A sender or recipient address failed to parse.
    #[error("Notify: invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// SMTP transport error (relay resolution, TLS, protocol).
    #[error("Notify: SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Building the MIME message failed.
    #[error("Notify: failed to build email message: {0}")]
    Message(#[from] lettre::error::Error),

    /// Delivery completed with failures for some recipients.
    #[error("Notify: delivery failed for {failed} of {total} recipients")]
    Delivery { failed: usize, total: usize },
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
