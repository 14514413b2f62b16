//! Dotted numeric versions.
//!
//! Product and API revisions in the vendor registry are named by strings such
//! as `"18.0"` or `"1.0.0.5"`. They must be compared numerically, component by
//! component, so that `"10.0"` sorts after `"9.0"`. Missing trailing
//! components count as zero, which makes `"1"` and `"1.0"` equal.

use crate::error::VersionError;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A parsed dotted version.
///
/// Equality, ordering and hashing ignore trailing zero components, while
/// [`Display`](fmt::Display) reproduces the text the version was parsed from.
///
/// # Examples
///
/// ```
/// use tagsheet_locator::Version;
///
/// let newer: Version = "2.10".parse()?;
/// let older: Version = "2.9".parse()?;
/// assert!(newer > older);
/// assert_eq!("1".parse::<Version>()?, "1.0".parse::<Version>()?);
/// # Ok::<(), tagsheet_locator::error::VersionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
    text: String,
}

impl Version {
    /// Parse a dotted version string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Empty`] for an empty string,
    /// [`VersionError::EmptyComponent`] when two dots are adjacent or the
    /// string starts or ends with a dot, and
    /// [`VersionError::InvalidComponent`] when a component is not an unsigned
    /// integer that fits in 64 bits.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        if text.is_empty() {
            return Err(VersionError::Empty);
        }

        let components = text
            .split('.')
            .map(|part| parse_component(text, part))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            components,
            text: text.to_owned(),
        })
    }

    /// Return the original text of the version.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Components with trailing zeros removed; the canonical form used for
    /// equality and hashing.
    fn significant(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |last| last + 1);
        self.components.get(..len).unwrap_or_default()
    }
}

fn parse_component(text: &str, part: &str) -> Result<u64, VersionError> {
    if part.is_empty() {
        return Err(VersionError::EmptyComponent {
            value: text.to_owned(),
        });
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::InvalidComponent {
            value: text.to_owned(),
            component: part.to_owned(),
        });
    }
    part.parse().map_err(|_| VersionError::InvalidComponent {
        value: text.to_owned(),
        component: part.to_owned(),
    })
}

/// Compare two versions component-wise, padding the shorter with zeros.
#[must_use]
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

/// Return the greatest version in `versions`.
///
/// When several entries compare equal (for example `"18"` and `"18.0"`), the
/// first one encountered is returned.
///
/// # Errors
///
/// Returns [`VersionError::NoCandidates`] when `versions` is empty.
pub fn max<'a, I>(versions: I) -> Result<&'a Version, VersionError>
where
    I: IntoIterator<Item = &'a Version>,
{
    versions
        .into_iter()
        .fold(None, |best: Option<&Version>, candidate| match best {
            Some(current) if current >= candidate => Some(current),
            _ => Some(candidate),
        })
        .ok_or(VersionError::NoCandidates)
}

/// Parse every name as a version and return the name of the greatest.
///
/// Registry keys must be descended into exactly as they are spelled, so this
/// returns the original name rather than a re-rendered version.
///
/// # Errors
///
/// Returns the first parse failure, or [`VersionError::NoCandidates`] when
/// `names` is empty.
pub fn highest_named<I, S>(names: I) -> Result<Version, VersionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let versions = names
        .into_iter()
        .map(|name| Version::parse(name.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    max(&versions).cloned()
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let left = self.components.get(i).copied().unwrap_or(0);
                let right = other.components.get(i).copied().unwrap_or(0);
                left.cmp(&right)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(text: &str) -> Version {
        Version::parse(text).expect("valid version")
    }

    #[rstest]
    #[case::double_digit_minor("2.10", "2.9", Ordering::Greater)]
    #[case::fourth_component("1.0.0.5", "1.0.0.4", Ordering::Greater)]
    #[case::trailing_zero("1", "1.0", Ordering::Equal)]
    #[case::many_trailing_zeros("18.0.0.0", "18", Ordering::Equal)]
    #[case::major_wins("10.0", "9.99.99", Ordering::Greater)]
    #[case::shorter_is_less("1.0", "1.0.1", Ordering::Less)]
    fn compares_numerically(#[case] left: &str, #[case] right: &str, #[case] expected: Ordering) {
        assert_eq!(compare(&v(left), &v(right)), expected);
        assert_eq!(compare(&v(right), &v(left)), expected.reverse());
    }

    #[rstest]
    #[case::empty("")]
    #[case::leading_dot(".1")]
    #[case::trailing_dot("1.")]
    #[case::double_dot("1..2")]
    #[case::alpha("1.a")]
    #[case::signed("-1.0")]
    #[case::plus("+1")]
    #[case::whitespace(" 1.0")]
    #[case::overflow("18446744073709551616")]
    fn rejects_malformed_versions(#[case] text: &str) {
        assert!(Version::parse(text).is_err(), "{text:?} should not parse");
    }

    #[test]
    fn display_preserves_original_text() {
        assert_eq!(v("18.00").to_string(), "18.00");
    }

    #[test]
    fn equal_versions_hash_identically() {
        use std::collections::HashSet;

        let set: HashSet<Version> = [v("1"), v("1.0"), v("1.0.0")].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn max_picks_greatest() {
        let versions = [v("17.0"), v("18.0"), v("9.0")];
        assert_eq!(max(&versions).expect("non-empty").as_str(), "18.0");
    }

    #[test]
    fn max_rejects_empty_input() {
        let versions: [Version; 0] = [];
        assert_eq!(max(&versions), Err(VersionError::NoCandidates));
    }

    #[test]
    fn max_keeps_first_of_equal_versions() {
        let versions = [v("18"), v("18.0")];
        assert_eq!(max(&versions).expect("non-empty").as_str(), "18");
    }

    #[test]
    fn highest_named_returns_original_spelling() {
        let highest = highest_named(["1.0", "1.10", "1.9"]).expect("valid names");
        assert_eq!(highest.as_str(), "1.10");
    }

    #[test]
    fn highest_named_fails_on_any_malformed_name() {
        let result = highest_named(["1.0", "latest"]);
        assert!(matches!(result, Err(VersionError::InvalidComponent { .. })));
    }
}
