use crate::fetcher::FetchedCertificate;
use certwatch_common::types::{CertStatus, CertificateRecord, ThresholdSettings};
use chrono::{DateTime, Utc};
use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{ServerName, UnixTime};
use rustls::RootCertStore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use x509_parser::der_parser::asn1_rs::Oid;
use x509_parser::oid_registry;
use x509_parser::prelude::*;

/// 对抓取到的证书做健康分级，生成该域名的检查记录。
///
/// 状态推导优先级（先命中先生效）：已过期 → Critical → Warning → Valid；
/// 之后独立执行一次链校验，仅当到期状态为 Valid 时才会降级为 Invalid。
pub fn classify(
    domain: &str,
    fetched: &FetchedCertificate,
    thresholds: &ThresholdSettings,
    now: DateTime<Utc>,
) -> CertificateRecord {
    let leaf_der = fetched.leaf();
    let (_, cert) = match X509Certificate::from_der(leaf_der.as_ref()) {
        Ok(parsed) => parsed,
        Err(e) => {
            return CertificateRecord::error_record(
                domain,
                format!("failed to parse X.509 certificate: {e}"),
                now,
            );
        }
    };

    let not_before = DateTime::from_timestamp(cert.validity().not_before.timestamp(), 0)
        .unwrap_or_default();
    let not_after =
        DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0).unwrap_or_default();
    let days_until_expiry = (not_after - now).num_days();
    let mut status = derive_status(not_after, days_until_expiry, thresholds, now);
    let mut error = None;

    // Independent trust pass. Only a time-valid certificate is downgraded;
    // Warning/Critical/Expired already flag the record and are never
    // double-reported. Machinery failures leave the status untouched.
    match validate_chain(fetched, domain) {
        ChainVerdict::Valid => {}
        ChainVerdict::Invalid(reason) => {
            if status == CertStatus::Valid {
                status = CertStatus::Invalid;
                error = Some(reason);
            } else {
                tracing::debug!(
                    domain,
                    reason = %reason,
                    "Chain invalid for already-flagged certificate"
                );
            }
        }
        ChainVerdict::Unavailable(reason) => {
            tracing::warn!(domain, reason = %reason, "Chain validation unavailable");
        }
    }

    CertificateRecord {
        domain: domain.to_string(),
        status,
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        not_before: Some(not_before),
        not_after: Some(not_after),
        days_until_expiry,
        san_list: extract_san(&cert),
        signature_algorithm: oid_to_sig_name(&cert.signature_algorithm.algorithm),
        serial_number: cert.raw_serial_as_string(),
        fingerprint_sha256: hex_encode(&Sha256::digest(leaf_der.as_ref())),
        error,
        checked_at: now,
    }
}

/// 到期状态推导。已过期由日期符号判定，与截断后的天数无关：
/// 当日内即将过期的证书 days 为 0，但状态是 Critical 而非 Expired。
pub fn derive_status(
    not_after: DateTime<Utc>,
    days_until_expiry: i64,
    thresholds: &ThresholdSettings,
    now: DateTime<Utc>,
) -> CertStatus {
    if not_after < now {
        CertStatus::Expired
    } else if days_until_expiry <= thresholds.critical_days {
        CertStatus::Critical
    } else if days_until_expiry <= thresholds.warning_days {
        CertStatus::Warning
    } else {
        CertStatus::Valid
    }
}

enum ChainVerdict {
    Valid,
    Invalid(String),
    Unavailable(String),
}

/// 使用 webpki-roots 信任锚对出示链做路径构建。
/// 校验器自身的故障不视为证书问题，绝不让链校验中断扫描。
fn validate_chain(fetched: &FetchedCertificate, domain: &str) -> ChainVerdict {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let verifier = match WebPkiServerVerifier::builder(Arc::new(roots)).build() {
        Ok(v) => v,
        Err(e) => return ChainVerdict::Unavailable(format!("failed to build chain verifier: {e}")),
    };
    let server_name = match ServerName::try_from(domain.to_string()) {
        Ok(name) => name,
        Err(e) => return ChainVerdict::Unavailable(format!("invalid server name: {e}")),
    };

    match verifier.verify_server_cert(
        fetched.leaf(),
        fetched.intermediates(),
        &server_name,
        &[],
        UnixTime::now(),
    ) {
        Ok(_) => ChainVerdict::Valid,
        Err(rustls::Error::InvalidCertificate(e)) => {
            ChainVerdict::Invalid(format!("chain validation failed: {e:?}"))
        }
        Err(e) => ChainVerdict::Unavailable(format!("chain validation error: {e}")),
    }
}

/// 提取 SAN 扩展中的 DNS 名称；扩展解析失败时退化为空列表
fn extract_san(cert: &X509Certificate<'_>) -> Vec<String> {
    cert.subject_alternative_name()
        .ok()
        .flatten()
        .map(|san| {
            san.value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some(dns.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// 将字节序列编码为十六进制字符串，冒号分隔
fn hex_encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// 将签名算法 OID 映射为可读名称
fn oid_to_sig_name(oid: &Oid) -> String {
    let known = [
        (oid_registry::OID_PKCS1_SHA256WITHRSA, "SHA256withRSA"),
        (oid_registry::OID_PKCS1_SHA384WITHRSA, "SHA384withRSA"),
        (oid_registry::OID_PKCS1_SHA512WITHRSA, "SHA512withRSA"),
        (oid_registry::OID_PKCS1_SHA1WITHRSA, "SHA1withRSA"),
        (oid_registry::OID_SIG_ECDSA_WITH_SHA256, "ECDSAwithSHA256"),
        (oid_registry::OID_SIG_ECDSA_WITH_SHA384, "ECDSAwithSHA384"),
        (oid_registry::OID_SIG_ECDSA_WITH_SHA512, "ECDSAwithSHA512"),
        (oid_registry::OID_SIG_ED25519, "Ed25519"),
    ];
    for (known_oid, name) in &known {
        if oid == known_oid {
            return name.to_string();
        }
    }
    format!("{oid}")
}
