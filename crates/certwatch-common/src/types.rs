use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Certificate health status derived from days-until-expiry plus a separate
/// chain-validation pass.
///
/// The default report sort order is
/// `Valid < Warning < Critical < Expired < Invalid < Error`; it is defined by
/// [`CertStatus::rank`], not by declaration order, so reordering variants
/// cannot silently change report output.
///
/// # Examples
///
/// ```
/// use certwatch_common::types::CertStatus;
///
/// let status: CertStatus = "warning".parse().unwrap();
/// assert_eq!(status, CertStatus::Warning);
/// assert_eq!(status.to_string(), "warning");
/// assert!(CertStatus::Error > CertStatus::Valid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertStatus {
    Valid,
    Warning,
    Critical,
    Expired,
    Invalid,
    Error,
}

impl CertStatus {
    /// 显式排序权重（报告输出按此排序，而非枚举声明顺序）
    pub fn rank(&self) -> u8 {
        match self {
            CertStatus::Valid => 0,
            CertStatus::Warning => 1,
            CertStatus::Critical => 2,
            CertStatus::Expired => 3,
            CertStatus::Invalid => 4,
            CertStatus::Error => 5,
        }
    }

    /// 是否计入报告的 error_count（Error 与 Invalid 均计入）
    pub fn is_error_like(&self) -> bool {
        matches!(self, CertStatus::Invalid | CertStatus::Error)
    }
}

impl Ord for CertStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for CertStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for CertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertStatus::Valid => write!(f, "valid"),
            CertStatus::Warning => write!(f, "warning"),
            CertStatus::Critical => write!(f, "critical"),
            CertStatus::Expired => write!(f, "expired"),
            CertStatus::Invalid => write!(f, "invalid"),
            CertStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for CertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(CertStatus::Valid),
            "warning" => Ok(CertStatus::Warning),
            "critical" => Ok(CertStatus::Critical),
            "expired" => Ok(CertStatus::Expired),
            "invalid" => Ok(CertStatus::Invalid),
            "error" => Ok(CertStatus::Error),
            _ => Err(format!("unknown certificate status: {s}")),
        }
    }
}

/// 阈值配置（一次扫描期间不可变）
///
/// 约定 `critical_days < warning_days`，但核心不做强制校验：
/// 状态推导按 Expired → Critical → Warning → Valid 的优先级短路。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdSettings {
    /// 警告阈值（天数），剩余天数 <= 此值触发 Warning
    pub warning_days: i64,
    /// 严重阈值（天数），剩余天数 <= 此值触发 Critical
    pub critical_days: i64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            warning_days: 30,
            critical_days: 7,
        }
    }
}

/// 单个域名的证书检查记录（生成后不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// 检查的域名
    pub domain: String,
    /// 健康状态
    pub status: CertStatus,
    /// 证书主体（DN 字符串）
    pub subject: String,
    /// 证书颁发者（DN 字符串）
    pub issuer: String,
    /// 证书生效时间（抓取失败时为 None）
    pub not_before: Option<DateTime<Utc>>,
    /// 证书过期时间（抓取失败时为 None）
    pub not_after: Option<DateTime<Utc>>,
    /// 距离过期天数（可为负；抓取失败时为 0）
    pub days_until_expiry: i64,
    /// SAN 扩展中的 DNS 名称列表（按证书内顺序，可为空）
    pub san_list: Vec<String>,
    /// 签名算法（如 SHA256withRSA）
    pub signature_algorithm: String,
    /// 证书序列号（冒号分隔十六进制）
    pub serial_number: String,
    /// 证书 SHA-256 指纹（DER 编码的哈希，冒号分隔十六进制）
    pub fingerprint_sha256: String,
    /// 错误信息（仅 status 为 Error/Invalid 或链校验失败时设置）
    pub error: Option<String>,
    /// 检查时间
    pub checked_at: DateTime<Utc>,
}

impl CertificateRecord {
    /// Synthesize the record for a domain whose fetch failed. All certificate
    /// fields stay at their zero value; the fetch failure reason is carried
    /// verbatim in `error`.
    pub fn error_record(domain: &str, reason: String, checked_at: DateTime<Utc>) -> Self {
        Self {
            domain: domain.to_string(),
            status: CertStatus::Error,
            subject: String::new(),
            issuer: String::new(),
            not_before: None,
            not_after: None,
            days_until_expiry: 0,
            san_list: Vec::new(),
            signature_algorithm: String::new(),
            serial_number: String::new(),
            fingerprint_sha256: String::new(),
            error: Some(reason),
            checked_at,
        }
    }
}

/// 一次扫描的聚合报告（构建后不可变，计数一次性推导）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// 每个输入域名对应一条记录（无顺序保证，按 domain 字段回溯）
    pub records: Vec<CertificateRecord>,
    /// 扫描开始时间（任何抓取动作之前捕获）
    pub scan_started_at: DateTime<Utc>,
    /// 整批扫描耗时
    pub scan_duration: std::time::Duration,
    /// 扫描域名总数
    pub total_domains: usize,
    pub valid_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
    pub expired_count: usize,
    /// Error 与 Invalid 记录之和
    pub error_count: usize,
}

impl ScanReport {
    /// Build the report from completed records, deriving the six counts in a
    /// single pass. Counts are computed here rather than updated
    /// incrementally so concurrent per-domain tasks never touch shared state.
    pub fn from_records(
        records: Vec<CertificateRecord>,
        scan_started_at: DateTime<Utc>,
        scan_duration: std::time::Duration,
    ) -> Self {
        let mut valid_count = 0;
        let mut warning_count = 0;
        let mut critical_count = 0;
        let mut expired_count = 0;
        let mut error_count = 0;
        for record in &records {
            match record.status {
                CertStatus::Valid => valid_count += 1,
                CertStatus::Warning => warning_count += 1,
                CertStatus::Critical => critical_count += 1,
                CertStatus::Expired => expired_count += 1,
                CertStatus::Invalid | CertStatus::Error => error_count += 1,
            }
        }
        Self {
            total_domains: records.len(),
            records,
            scan_started_at,
            scan_duration,
            valid_count,
            warning_count,
            critical_count,
            expired_count,
            error_count,
        }
    }

    /// 是否存在需要关注的记录（非 Valid 记录计入）
    pub fn has_issues(&self) -> bool {
        self.warning_count + self.critical_count + self.expired_count + self.error_count > 0
    }

    /// Records sorted for display: status rank first, then days-until-expiry
    /// ascending. Consumers that need a stable order sort explicitly; the
    /// `records` field itself carries no ordering guarantee.
    pub fn sorted_records(&self) -> Vec<&CertificateRecord> {
        let mut sorted: Vec<&CertificateRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            a.status
                .rank()
                .cmp(&b.status.rank())
                .then(a.days_until_expiry.cmp(&b.days_until_expiry))
                .then(a.domain.cmp(&b.domain))
        });
        sorted
    }
}

/// Extract the issuer's common name (the `CN=` component of the DN) for
/// compact display, falling back to the full string truncated to 47 chars
/// plus an ellipsis when no CN is present.
///
/// # Examples
///
/// ```
/// use certwatch_common::types::short_issuer;
///
/// let dn = "C=US, O=Let's Encrypt, CN=R11";
/// assert_eq!(short_issuer(dn), "R11");
/// ```
pub fn short_issuer(issuer: &str) -> String {
    for part in issuer.split(',') {
        let part = part.trim();
        if let Some(cn) = part.strip_prefix("CN=") {
            return cn.trim().to_string();
        }
    }
    let truncated: String = issuer.chars().take(47).collect();
    if truncated.chars().count() < issuer.chars().count() {
        format!("{truncated}...")
    } else {
        issuer.to_string()
    }
}
