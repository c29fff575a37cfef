//! Version and name token patterns
//!
//! Package manager output is free-form, so tokens are recognised by shape
//! rather than by position:
//! - version: a digit, then `[0-9a-z-]*`, then up to four `.segment` groups
//!   (`1.2.3_0+universal` yields `1.2.3`)
//! - name: the whole token consists of `[a-zA-Z0-9.-]`

use regex::Regex;

/// Matcher for version and package-name tokens
pub struct VersionPattern {
    /// Regex for a version token anywhere in the text
    version_re: Regex,
    /// Regex for a complete package-name token
    name_re: Regex,
}

impl VersionPattern {
    pub fn new() -> Self {
        Self {
            version_re: Regex::new(r"[0-9][0-9a-z-]*(?:\.[0-9a-z-]+){0,4}").unwrap(),
            name_re: Regex::new(r"^[a-zA-Z0-9.-]+$").unwrap(),
        }
    }

    /// Extract the first version token from `text`
    pub fn extract_version<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.version_re.find(text).map(|m| m.as_str())
    }

    /// Return `text` if the whole token looks like a package name
    pub fn extract_name<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.name_re.is_match(text).then_some(text)
    }
}

impl Default for VersionPattern {
    fn default() -> Self {
        Self::new()
    }
}
