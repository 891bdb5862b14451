//! Credits of the data shown by a layer.

/// Attribution text with an optional link to the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    text: String,
    url: Option<String>,
}

impl Attribution {
    /// Creates a new `Attribution` with the given text and optional URL.
    pub fn new(text: impl Into<String>, url: Option<String>) -> Self {
        Self {
            text: text.into(),
            url,
        }
    }

    /// Attribution of OpenStreetMap data.
    pub fn openstreetmap() -> Self {
        Self::new(
            "© OpenStreetMap contributors",
            Some("https://www.openstreetmap.org/copyright".to_string()),
        )
    }

    /// Returns a reference to the text of the attribution.
    pub fn get_text(&self) -> &str {
        &self.text
    }

    /// Returns a reference to the URL associated with the attribution, if any.
    pub fn get_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
