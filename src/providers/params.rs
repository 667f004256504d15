use std::borrow::Cow;

use serde::Serialize;

/// Ordered key/value parameters for a Trello request, handed to reqwest as
/// either a query or a form body.
///
/// Every value passes through here on its way to the wire, so titles and
/// descriptions containing `&`, `=`, `#` or newlines can't leak into
/// neighbouring fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(Vec<(&'static str, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.push((key, value.into()));
        self
    }

    /// Comma-joined list. Omitted entirely when empty.
    pub fn with_list(self, key: &'static str, values: &[String]) -> Self {
        if values.is_empty() {
            self
        } else {
            self.with(key, values.join(","))
        }
    }
}

/// Escape a value interpolated into a URL path.
pub fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}
