//! Regex-based HTML helpers.
//!
//! Storefront product pages are large and theme-specific; a full DOM parse
//! buys nothing over targeted tag scans here. Every helper is tolerant of
//! attribute order, quoting style and case.

use std::sync::LazyLock;

use regex::Regex;

static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld script regex")
});
static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static LINK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("valid regex"));
static BUTTON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<button\b([^>]*)>(.*?)</button>").expect("valid button regex")
});
static SUBMIT_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<input\b[^>]*type\s*=\s*["']?submit["']?[^>]*>"#).expect("valid regex")
});
static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>|<noscript\b[^>]*>.*?</noscript>")
        .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A purchase-style control found on the page: a `<button>` or a submit input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Control {
    /// Raw attribute text of the opening tag.
    pub attrs: String,
    /// Visible label, whitespace-collapsed and lowercased.
    pub label: String,
}

impl Control {
    pub(crate) fn attr(&self, name: &str) -> Option<String> {
        extract_attr(&self.attrs, name)
    }

    /// `disabled` attribute, `aria-disabled="true"`, or a `disabled` class.
    pub(crate) fn is_disabled(&self) -> bool {
        has_bare_attr(&self.attrs, "disabled")
            || self
                .attr("aria-disabled")
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
            || self
                .attr("class")
                .is_some_and(|c| c.split_whitespace().any(|t| t.eq_ignore_ascii_case("disabled")))
    }
}

/// Raw bodies of every `<script type="application/ld+json">` block, in
/// document order.
pub(crate) fn json_ld_blocks(html: &str) -> Vec<&str> {
    JSON_LD_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim()))
        .filter(|raw| !raw.is_empty())
        .collect()
}

/// Finds the `content` of a `<meta>` whose `property`, `name` or `itemprop`
/// equals `key` (case-insensitive).
pub(crate) fn find_meta_content(html: &str, key: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let matches = ["property", "name", "itemprop"]
            .iter()
            .filter_map(|attr| extract_attr(tag, attr))
            .any(|v| v.eq_ignore_ascii_case(key));
        if matches {
            extract_attr(tag, "content")
        } else {
            None
        }
    })
}

/// Finds the `href` of a `<link itemprop="{itemprop}">` (microdata offers).
pub(crate) fn find_link_itemprop(html: &str, itemprop: &str) -> Option<String> {
    LINK_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        extract_attr(tag, "itemprop")
            .filter(|v| v.eq_ignore_ascii_case(itemprop))
            .and_then(|_| extract_attr(tag, "href"))
    })
}

/// All `<button>` elements and submit inputs, in document order.
pub(crate) fn controls(html: &str) -> Vec<Control> {
    let mut found: Vec<(usize, Control)> = BUTTON_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let attrs = cap.get(1).map_or("", |m| m.as_str()).to_string();
            let label = collapse(&TAG_RE.replace_all(cap.get(2).map_or("", |m| m.as_str()), " "))
                .to_lowercase();
            Some((whole.start(), Control { attrs, label }))
        })
        .collect();

    found.extend(SUBMIT_INPUT_RE.find_iter(html).map(|m| {
        let tag = m.as_str();
        let label = extract_attr(tag, "value")
            .map(|v| collapse(&v).to_lowercase())
            .unwrap_or_default();
        (
            m.start(),
            Control {
                attrs: tag.to_string(),
                label,
            },
        )
    }));

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, c)| c).collect()
}

/// Lowercased visible text: scripts, styles and tags removed, common entities
/// decoded, whitespace collapsed.
pub(crate) fn visible_text(html: &str) -> String {
    let without_code = SCRIPT_STYLE_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_code, " ");
    collapse(&decode_entities(&without_tags)).to_lowercase()
}

/// Collapses runs of whitespace to a single space and trims.
pub(crate) fn collapse(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extracts a quoted or bare attribute value from a tag's text.
pub(crate) fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!(
        r#"(?is)(?:^|[\s<]){}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
        regex::escape(attr)
    );
    let re = Regex::new(&pattern).ok()?;
    let cap = re.captures(tag)?;
    cap.get(1)
        .or_else(|| cap.get(2))
        .or_else(|| cap.get(3))
        .map(|m| decode_entities(m.as_str().trim()))
}

/// True when `attr` appears as a standalone attribute (`<button disabled>`)
/// or with any value (`disabled="disabled"`).
fn has_bare_attr(attrs: &str, attr: &str) -> bool {
    let pattern = format!(r"(?i)(?:^|\s){}(?:\s|=|/|$)", regex::escape(attr));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(attrs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_json_ld_blocks_in_order() {
        let html = r#"
            <script type="application/ld+json">{"a":1}</script>
            <script type="text/javascript">var x = 1;</script>
            <script TYPE='application/ld+json' id="p">
              {"b":2}
            </script>"#;
        assert_eq!(json_ld_blocks(html), vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn finds_meta_content_by_property_or_name() {
        let html = r#"<meta content="instock" property="product:availability">
                      <meta name="og:title" content="Bra">"#;
        assert_eq!(
            find_meta_content(html, "product:availability").as_deref(),
            Some("instock")
        );
        assert_eq!(find_meta_content(html, "og:title").as_deref(), Some("Bra"));
        assert!(find_meta_content(html, "og:availability").is_none());
    }

    #[test]
    fn finds_microdata_availability_link() {
        let html = r#"<link itemprop="availability" href="http://schema.org/OutOfStock">"#;
        assert_eq!(
            find_link_itemprop(html, "availability").as_deref(),
            Some("http://schema.org/OutOfStock")
        );
    }

    #[test]
    fn controls_capture_label_and_disabled_state() {
        let html = r#"
            <button type="button" class="menu">Menu</button>
            <button type="submit" name="add" class="btn product-form__submit" disabled>
              <span>Sold out</span>
            </button>
            <input type="submit" value="Add to Bag" aria-disabled="false">"#;
        let found = controls(html);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].label, "menu");
        assert!(!found[0].is_disabled());
        assert_eq!(found[1].label, "sold out");
        assert!(found[1].is_disabled());
        assert_eq!(found[1].attr("name").as_deref(), Some("add"));
        assert_eq!(found[2].label, "add to bag");
        assert!(!found[2].is_disabled());
    }

    #[test]
    fn disabled_class_counts_as_disabled() {
        let c = Control {
            attrs: r#" class="btn disabled""#.to_string(),
            label: "add to cart".to_string(),
        };
        assert!(c.is_disabled());
        let not = Control {
            attrs: r#" class="btn" data-disabled-text="Sold out""#.to_string(),
            label: "add to cart".to_string(),
        };
        assert!(!not.is_disabled());
    }

    #[test]
    fn visible_text_drops_scripts_and_styles() {
        let html = r#"<style>.x{}</style><script>var s = "Sold out";</script>
                      <p>Add&nbsp;to  <b>Bag</b></p>"#;
        assert_eq!(visible_text(html), "add to bag");
    }
}
