use serde::Serialize;

/// Which detection strategy produced a conclusive answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockSource {
    Api,
    StructuredMarkup,
    HeuristicText,
    Proxy,
}

impl StockSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StockSource::Api => "api",
            StockSource::StructuredMarkup => "structured_markup",
            StockSource::HeuristicText => "heuristic_text",
            StockSource::Proxy => "proxy",
        }
    }
}

impl std::fmt::Display for StockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conclusive availability reading.
///
/// "Unknown" is never stored here; it is expressed as [`Probe::Inconclusive`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockResult {
    pub available: bool,
    /// Variant title as the source reports it (e.g. `"White Heather / L"`).
    pub variant_label: Option<String>,
    /// Product title, when the source exposes one.
    pub product_title: Option<String>,
    pub source: StockSource,
}

impl StockResult {
    #[must_use]
    pub fn new(available: bool, source: StockSource) -> Self {
        Self {
            available,
            variant_label: None,
            product_title: None,
            source,
        }
    }
}

/// Outcome of a single strategy that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Conclusive(StockResult),
    /// The source answered but carried no decisive signal.
    Inconclusive,
}

impl Probe {
    #[must_use]
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Probe::Conclusive(_))
    }
}
