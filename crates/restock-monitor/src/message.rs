//! Plain-text notification bodies.

use chrono::{DateTime, Utc};
use restock_core::{AppConfig, StockResult, VariantQuery};
use restock_scraper::StrategyFailure;

/// Upper bound on error detail quoted in a failure warning, in characters.
pub const MAX_ERROR_DETAIL_CHARS: usize = 300;

/// What the message is about: resolved product title, variant label and the
/// direct product+variant link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub product_title: String,
    pub variant_label: String,
    pub link: String,
}

/// Configured display names used when a source does not report its own.
#[derive(Debug, Clone, Default)]
pub struct Fallbacks {
    pub product_title: Option<String>,
    pub variant_label: Option<String>,
}

impl Fallbacks {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            product_title: config.product_title.clone(),
            variant_label: config.variant_label.clone(),
        }
    }

    /// Title: source, then configured title, then the handle.
    /// Label: source, then configured label, then `variant {id}`.
    #[must_use]
    pub fn subject(&self, query: &VariantQuery, result: Option<&StockResult>) -> Subject {
        let product_title = result
            .and_then(|r| r.product_title.clone())
            .or_else(|| self.product_title.clone())
            .unwrap_or_else(|| query.handle().to_owned());
        let variant_label = result
            .and_then(|r| r.variant_label.clone())
            .or_else(|| self.variant_label.clone())
            .unwrap_or_else(|| format!("variant {}", query.variant_id()));
        Subject {
            product_title,
            variant_label,
            link: query.page_url(),
        }
    }
}

#[must_use]
pub fn status_token(available: bool) -> &'static str {
    if available {
        "available"
    } else {
        "sold out"
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// The stock-change notification.
#[must_use]
pub fn stock_message(subject: &Subject, available: bool, now: DateTime<Utc>) -> String {
    format!(
        "{}\nVariant: {}\nStatus: {}\nLink: {}\nUpdated: {}",
        subject.product_title,
        subject.variant_label,
        status_token(available),
        subject.link,
        timestamp(now)
    )
}

/// Warning sent when every source raised an error.
#[must_use]
pub fn failure_warning(
    subject: &Subject,
    failures: &[StrategyFailure],
    now: DateTime<Utc>,
) -> String {
    let detail = failures
        .iter()
        .map(|f| format!("{}: {}", f.source, f.error))
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "Restock check failed for {} ({}): every source returned an error. Stock state unchanged.\nError: {}\nLink: {}\nAt: {}",
        subject.product_title,
        subject.variant_label,
        truncate_chars(&detail, MAX_ERROR_DETAIL_CHARS),
        subject.link,
        timestamp(now)
    )
}

/// Warning sent when the sources answered but none was decisive.
#[must_use]
pub fn ambiguous_warning(subject: &Subject, now: DateTime<Utc>) -> String {
    format!(
        "Restock check for {} ({}) was inconclusive: no source reported a clear stock state. Will retry on the next run.\nLink: {}\nAt: {}",
        subject.product_title,
        subject.variant_label,
        subject.link,
        timestamp(now)
    )
}

#[must_use]
pub fn test_message(subject: &Subject, now: DateTime<Utc>) -> String {
    format!(
        "Restock watcher test message.\nWatching: {} ({})\nLink: {}\nAt: {}",
        subject.product_title,
        subject.variant_label,
        subject.link,
        timestamp(now)
    )
}

/// Cuts `text` to at most `max_chars` characters, never splitting a char.
/// A trailing `…` replaces the last kept character when cut.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use restock_core::StockSource;
    use restock_scraper::ScraperError;

    use super::*;

    fn query() -> VariantQuery {
        VariantQuery::new("https://www.aloyoga.com", Some("ko-kr"), "seamless-bra", 42)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap()
    }

    #[test]
    fn subject_prefers_source_names() {
        let fallbacks = Fallbacks {
            product_title: Some("Configured".to_owned()),
            variant_label: Some("Configured / L".to_owned()),
        };
        let result = StockResult {
            available: true,
            variant_label: Some("White Heather / L".to_owned()),
            product_title: Some("Seamless Delight High Neck Bra".to_owned()),
            source: StockSource::Api,
        };
        let subject = fallbacks.subject(&query(), Some(&result));
        assert_eq!(subject.product_title, "Seamless Delight High Neck Bra");
        assert_eq!(subject.variant_label, "White Heather / L");
        assert_eq!(
            subject.link,
            "https://www.aloyoga.com/ko-kr/products/seamless-bra?variant=42"
        );
    }

    #[test]
    fn subject_falls_back_to_config_then_query() {
        let configured = Fallbacks {
            product_title: Some("Configured".to_owned()),
            variant_label: None,
        };
        let subject = configured.subject(&query(), None);
        assert_eq!(subject.product_title, "Configured");
        assert_eq!(subject.variant_label, "variant 42");

        let proxy_only = StockResult::new(false, StockSource::Proxy);
        let bare = Fallbacks::default().subject(&query(), Some(&proxy_only));
        assert_eq!(bare.product_title, "seamless-bra");
    }

    #[test]
    fn stock_message_has_every_field() {
        let subject = Fallbacks::default().subject(&query(), None);
        let msg = stock_message(&subject, false, now());
        assert_eq!(
            msg,
            "seamless-bra\nVariant: variant 42\nStatus: sold out\n\
             Link: https://www.aloyoga.com/ko-kr/products/seamless-bra?variant=42\n\
             Updated: 2026-03-01 09:05 UTC"
        );
        assert!(stock_message(&subject, true, now()).contains("Status: available"));
    }

    #[test]
    fn failure_warning_truncates_detail() {
        let subject = Fallbacks::default().subject(&query(), None);
        let failures = vec![StrategyFailure {
            source: StockSource::Api,
            error: ScraperError::InvalidUrl {
                url: "x".repeat(1000),
                reason: "bad".to_owned(),
            },
        }];
        let msg = failure_warning(&subject, &failures, now());
        let detail = msg
            .lines()
            .find_map(|l| l.strip_prefix("Error: "))
            .expect("error line");
        assert_eq!(detail.chars().count(), MAX_ERROR_DETAIL_CHARS);
        assert!(detail.starts_with("api: invalid URL"));
        assert!(detail.ends_with('…'));
    }

    #[test]
    fn ambiguous_warning_mentions_retry() {
        let subject = Fallbacks::default().subject(&query(), None);
        let msg = ambiguous_warning(&subject, now());
        assert!(msg.contains("inconclusive"));
        assert!(msg.contains("seamless-bra (variant 42)"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("품절품절품절", 4), "품절품…");
        assert_eq!(truncate_chars("short", 300), "short");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
