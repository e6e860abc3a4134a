/// Represents a tag ref as listed by the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Full ref name, e.g. `refs/tags/2.1.0`
    pub name: String,
    /// Tagger time of the tag object in seconds since the epoch.
    /// `None` when the tag carries no readable tagger signature.
    pub created_at: Option<i64>,
}

impl TagRef {
    pub fn new(name: impl Into<String>, created_at: Option<i64>) -> Self {
        TagRef {
            name: name.into(),
            created_at,
        }
    }

    /// Tag name without its namespace (`refs/tags/` or any configured one)
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}
