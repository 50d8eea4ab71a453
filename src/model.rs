use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Principal granted read access to every user; marks a workspace public.
pub const WILDCARD_PRINCIPAL: &str = "*";

/// Separator between type name and type version in a version's `type` field.
pub const TYPE_SEPARATOR: char = '-';

/// Projection of a non-deleted workspace document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRow {
    #[serde(rename = "ws")]
    pub ws_id: i64,
    #[serde(rename = "numObj")]
    pub num_obj: i64,
}

/// Projection of a wildcard read ACL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAclRow {
    #[serde(rename = "id")]
    pub ws_id: i64,
}

/// Projection of a non-deleted object and its current version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRow {
    #[serde(rename = "ws")]
    pub ws_id: i64,
    #[serde(rename = "id")]
    pub obj_id: i64,
    pub numver: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRow {
    #[serde(rename = "type")]
    pub type_string: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_public(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type version such as `3` or `1.0`.
///
/// Ordered by dot-separated components. Integer components sort before
/// any other text and compare by value, so `2` sorts before `10` and `9`
/// before `1a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeVersion(pub String);

impl TypeVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Sort key of one version component: integers first, then plain text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment<'a> {
    Number(u64, &'a str),
    Text(&'a str),
}

impl<'a> Segment<'a> {
    fn of(raw: &'a str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) if raw.bytes().all(|b| b.is_ascii_digit()) => Segment::Number(n, raw),
            _ => Segment::Text(raw),
        }
    }
}

impl Ord for TypeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.0.split('.').map(Segment::of);
        let right = other.0.split('.').map(Segment::of);
        left.cmp(right)
    }
}

impl PartialOrd for TypeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TypeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TypeVersion {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// `<TypeName>-<TypeVersion>` split into its two halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeString {
    pub name: String,
    pub version: TypeVersion,
}

impl TypeString {
    /// Returns `None` unless the input has exactly one separator.
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, version) = raw.split_once(TYPE_SEPARATOR)?;
        if version.contains(TYPE_SEPARATOR) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            version: TypeVersion::from(version),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_string() {
        let parsed = TypeString::parse("Genome-3").unwrap();
        assert_eq!(parsed.name, "Genome");
        assert_eq!(parsed.version.as_str(), "3");

        let dotted = TypeString::parse("KBaseGenomes.Genome-8.2").unwrap();
        assert_eq!(dotted.name, "KBaseGenomes.Genome");
        assert_eq!(dotted.version.as_str(), "8.2");
    }

    #[test]
    fn test_parse_type_string_rejects_malformed() {
        for raw in ["Genome", "Genome-1-2", "--", ""] {
            assert!(TypeString::parse(raw).is_none(), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_parse_type_string_allows_empty_halves() {
        let no_version = TypeString::parse("Genome-").unwrap();
        assert_eq!(no_version.name, "Genome");
        assert_eq!(no_version.version.as_str(), "");

        let no_name = TypeString::parse("-1").unwrap();
        assert_eq!(no_name.name, "");
        assert_eq!(no_name.version.as_str(), "1");
    }

    #[test]
    fn test_type_version_ordering() {
        let mut versions: Vec<TypeVersion> = ["10", "2", "1.1", "1.0", "1", "beta", "alpha"]
            .into_iter()
            .map(TypeVersion::from)
            .collect();
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(TypeVersion::as_str).collect();
        assert_eq!(sorted, vec!["1", "1.0", "1.1", "2", "10", "alpha", "beta"]);
    }

    #[test]
    fn test_type_version_ordering_mixed_segments_is_consistent() {
        let ten = TypeVersion::from("10");
        let nine = TypeVersion::from("9");
        let one_a = TypeVersion::from("1a");
        assert!(nine < ten);
        assert!(ten < one_a);
        assert!(nine < one_a);

        let expected = vec!["01.0", "1", "1.0", "1.a", "9", "10", "1a", "9b", "rc"];
        let shuffles: [&[&str]; 3] = [
            &["rc", "1a", "10", "9", "1.a", "01.0", "1", "9b", "1.0"],
            &["9b", "1.0", "1", "rc", "9", "01.0", "10", "1.a", "1a"],
            &["1.a", "10", "rc", "1.0", "9b", "1a", "9", "1", "01.0"],
        ];
        for shuffle in shuffles {
            let mut versions: Vec<TypeVersion> =
                shuffle.iter().copied().map(TypeVersion::from).collect();
            versions.sort();
            let sorted: Vec<&str> = versions.iter().map(TypeVersion::as_str).collect();
            assert_eq!(sorted, expected);
        }
    }

    #[test]
    fn test_visibility_from_public() {
        assert_eq!(Visibility::from_public(true), Visibility::Public);
        assert_eq!(Visibility::from_public(false).to_string(), "private");
    }
}
