use serde::{Deserialize, Serialize};

/// A single unit of source known to a registry
///
/// `content` and `url` are deliberately both optional: a loader may hand
/// over inline text, a location to read it from later, or both. When
/// `content` is empty the builder reads `url` at assembly time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Registry key, also injected into named `define()` calls
    pub id: String,

    /// Location the content can be fetched from
    pub url: Option<String>,

    /// Inline source text
    pub content: Option<String>,

    /// Ids this module needs, in declaration order
    pub dependencies: Vec<String>,

    /// Output grouping label
    pub package: String,

    /// Whether anonymous `define()` calls should be named with `id`
    pub amd: bool,
}

impl Module {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: None,
            content: None,
            dependencies: Vec::new(),
            package: String::new(),
            amd: false,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_amd(mut self, amd: bool) -> Self {
        self.amd = amd;
        self
    }

    /// True when there is no inline text to use
    pub fn has_empty_content(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty)
    }

    /// The url to read from, if the content has to be fetched
    pub fn pending_url(&self) -> Option<&str> {
        if !self.has_empty_content() {
            return None;
        }
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}
