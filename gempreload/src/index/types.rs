//! Core index types.

use std::fmt;
use std::ops::Range;
use std::slice;

/// Resource name of the full specs index.
pub const FULL_SPECS_RESOURCE: &str = "specs.4.8.gz";

/// Resource name of the latest-versions specs index.
pub const LATEST_SPECS_RESOURCE: &str = "latest_specs.4.8.gz";

/// Which specs index to download from the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IndexSource {
    /// Every published version of every gem.
    #[default]
    Full,
    /// Only the newest version of each gem.
    Latest,
}

impl IndexSource {
    /// Select the source from a "latest only" flag.
    pub fn from_latest(latest: bool) -> Self {
        if latest {
            IndexSource::Latest
        } else {
            IndexSource::Full
        }
    }

    /// Repository-relative name of the index resource.
    pub fn resource_name(&self) -> &'static str {
        match self {
            IndexSource::Full => FULL_SPECS_RESOURCE,
            IndexSource::Latest => LATEST_SPECS_RESOURCE,
        }
    }
}

impl fmt::Display for IndexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

/// A gem name and version taken from a specs index entry.
///
/// Displays as `name-version`, which is also the stem of the gem's file
/// name on the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentifier {
    name: String,
    version: String,
}

impl PackageIdentifier {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Repository path of the packaged gem, e.g. `gems/rake-13.0.6.gem`.
    pub fn gem_path(&self) -> String {
        format!("gems/{}.gem", self)
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// The decoded contents of a specs index, in repository order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedIndex {
    entries: Vec<PackageIdentifier>,
}

impl DecodedIndex {
    pub fn new(entries: Vec<PackageIdentifier>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PackageIdentifier] {
        &self.entries
    }

    pub fn iter(&self) -> slice::Iter<'_, PackageIdentifier> {
        self.entries.iter()
    }

    /// Borrow a sub-range; `None` when the range falls outside the index.
    pub fn get(&self, range: Range<usize>) -> Option<&[PackageIdentifier]> {
        self.entries.get(range)
    }
}

impl From<Vec<PackageIdentifier>> for DecodedIndex {
    fn from(entries: Vec<PackageIdentifier>) -> Self {
        Self::new(entries)
    }
}

impl<'a> IntoIterator for &'a DecodedIndex {
    type Item = &'a PackageIdentifier;
    type IntoIter = slice::Iter<'a, PackageIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display() {
        let id = PackageIdentifier::new("rake", "13.0.6");
        assert_eq!(id.to_string(), "rake-13.0.6");
        assert_eq!(id.name(), "rake");
        assert_eq!(id.version(), "13.0.6");
    }

    #[test]
    fn test_identifier_gem_path() {
        let id = PackageIdentifier::new("nokogiri", "1.15.4");
        assert_eq!(id.gem_path(), "gems/nokogiri-1.15.4.gem");
    }

    #[test]
    fn test_source_resource_names() {
        assert_eq!(IndexSource::Full.resource_name(), "specs.4.8.gz");
        assert_eq!(IndexSource::Latest.resource_name(), "latest_specs.4.8.gz");
        assert_eq!(IndexSource::default(), IndexSource::Full);
        assert_eq!(IndexSource::from_latest(true), IndexSource::Latest);
        assert_eq!(IndexSource::from_latest(false), IndexSource::Full);
    }

    #[test]
    fn test_decoded_index_accessors() {
        let index = DecodedIndex::from(vec![
            PackageIdentifier::new("a", "1.0"),
            PackageIdentifier::new("b", "2.0"),
        ]);
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert_eq!(index.get(1..2).unwrap()[0].to_string(), "b-2.0");
        assert!(index.get(1..3).is_none());
        let names: Vec<_> = (&index).into_iter().map(|id| id.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
