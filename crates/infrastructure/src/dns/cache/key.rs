use compact_str::CompactString;
use ferrous_lookup_domain::Question;
use std::fmt;

/// Cache identity of a question: `name:class:type`, case-sensitive on the
/// canonical fully-qualified name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(CompactString);

impl CacheKey {
    #[inline]
    pub fn new(key: &str) -> Self {
        Self(CompactString::from(key))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&Question> for CacheKey {
    fn from(question: &Question) -> Self {
        Self::new(&question.canonical_key())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
