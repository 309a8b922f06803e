//! Ordered, first-match-wins availability signal rules.
//!
//! The rules are fuzzy by nature, so they are kept as plain data: negative
//! phrases always precede positive ones, and the first rule whose phrase
//! occurs in the text decides. Phrases are lowercase; callers pass lowercased
//! text.

/// One text rule: if `phrase` occurs, availability is `available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRule {
    pub phrase: &'static str,
    pub available: bool,
}

const fn sold_out(phrase: &'static str) -> SignalRule {
    SignalRule {
        phrase,
        available: false,
    }
}

const fn buyable(phrase: &'static str) -> SignalRule {
    SignalRule {
        phrase,
        available: true,
    }
}

/// Whole-page text rules (English + Korean storefront copy).
pub const PAGE_TEXT_RULES: &[SignalRule] = &[
    sold_out("out of stock"),
    sold_out("sold out"),
    sold_out("currently unavailable"),
    sold_out("일시품절"),
    sold_out("품절"),
    sold_out("재고 없음"),
    sold_out("재고없음"),
    buyable("add to bag"),
    buyable("add to cart"),
    buyable("buy it now"),
    buyable("장바구니 담기"),
    buyable("장바구니에 담기"),
    buyable("바로 구매"),
    buyable("구매하기"),
];

/// Labels that identify a purchase-action control.
pub const PURCHASE_LABELS: &[&str] = &[
    "add to bag",
    "add to cart",
    "buy it now",
    "buy now",
    "장바구니 담기",
    "장바구니에 담기",
    "바로 구매",
    "구매하기",
];

/// Labels that, on a purchase control, force "unavailable" even when the
/// control is not disabled.
pub const SOLD_OUT_LABELS: &[&str] = &[
    "sold out",
    "out of stock",
    "unavailable",
    "품절",
    "일시품절",
    "재고 없음",
];

const NEGATIVE_TOKENS: &[&str] = &["outofstock", "soldout", "discontinued", "품절"];
const POSITIVE_TOKENS: &[&str] = &["instock", "limitedavailability", "onlineonly", "instoreonly"];

/// Applies `rules` in order to lowercased `text`; first hit decides.
#[must_use]
pub fn scan_text(text: &str, rules: &[SignalRule]) -> Option<SignalRule> {
    rules.iter().copied().find(|rule| text.contains(rule.phrase))
}

/// Classifies a structured availability value such as
/// `"https://schema.org/InStock"`, `"out of stock"` or `"instock"`.
///
/// Returns `None` for values that carry no stock meaning (e.g. `PreOrder`).
#[must_use]
pub fn classify_availability_token(raw: &str) -> Option<bool> {
    let tail = raw.rsplit('/').next().unwrap_or(raw);
    let token: String = tail
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    if NEGATIVE_TOKENS.iter().any(|t| token.contains(t)) {
        return Some(false);
    }
    if POSITIVE_TOKENS.iter().any(|t| token.contains(t)) {
        return Some(true);
    }
    None
}
