//! Syntax validation for alias names, mount points and forward targets.
//!
//! Everything here is pure: collision checks against persisted records live
//! behind the [`crate::domain::ports::AliasRepository`] port.
//!
//! Names are lowercased and converted to their ASCII (IDNA) form before the
//! DNS label rules run, so `Bücher.Example` validates as
//! `xn--bcher-kva.example`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Host;

/// Longest permitted fully qualified name, in octets.
pub const MAX_DOMAIN_LENGTH: usize = 253;
/// Longest permitted DNS label, in octets.
pub const MAX_LABEL_LENGTH: usize = 63;
/// Label ceiling applied by [`LabelRule::Relaxed`].
pub const RELAXED_MAX_LABELS: usize = 127;
/// Label ceiling applied by [`LabelRule::Strict`] unless configured otherwise.
pub const DEFAULT_MAX_DOMAIN_LABELS: usize = 3;

const MIN_LABELS: usize = 2;
const RESERVED_MOUNT_SEGMENTS: [&str; 6] =
    ["htdocs", "backups", "cgi-bin", "errors", "logs", "phptmp"];

/// Label-count policy applied to a domain name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    /// Between two and `max_labels` labels.
    Strict { max_labels: usize },
    /// Between two and [`RELAXED_MAX_LABELS`] labels.
    Relaxed,
}

impl LabelRule {
    fn max_labels(self) -> usize {
        match self {
            Self::Strict { max_labels } => max_labels,
            Self::Relaxed => RELAXED_MAX_LABELS,
        }
    }
}

/// Reasons a proposed domain name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameSyntaxError {
    #[error("domain name must not be empty")]
    Empty,
    #[error("'{name}' cannot be converted to an ASCII domain name")]
    Idna { name: String },
    #[error("'{name}' is an address literal, not a domain name")]
    AddressLiteral { name: String },
    #[error("domain name is {length} octets long; the limit is {MAX_DOMAIN_LENGTH}")]
    TooLong { length: usize },
    #[error("domain name contains an empty label")]
    EmptyLabel,
    #[error("label '{label}' exceeds {MAX_LABEL_LENGTH} octets")]
    LabelTooLong { label: String },
    #[error("label '{label}' contains characters outside letters, digits and inner hyphens")]
    InvalidLabel { label: String },
    #[error("top-level label '{label}' must be alphabetic or punycode")]
    InvalidTopLevel { label: String },
    #[error("domain name has {count} labels; expected between {min} and {max}")]
    LabelCount { count: usize, min: usize, max: usize },
}

/// Syntactically valid domain name in lowercase ASCII form.
///
/// # Examples
/// ```
/// use panel::domain::{DomainName, LabelRule};
///
/// let name = DomainName::parse("Example.COM", LabelRule::Strict { max_labels: 3 })
///     .expect("valid name");
/// assert_eq!(name.as_str(), "example.com");
/// assert!(DomainName::parse("example..com", LabelRule::Relaxed).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    /// Normalise and validate a raw name.
    pub fn parse(raw: &str, rule: LabelRule) -> Result<Self, NameSyntaxError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NameSyntaxError::Empty);
        }
        let lowered = trimmed.to_lowercase();
        let ascii = to_ascii(&lowered)?;
        check_labels(&ascii, rule)?;
        Ok(Self(ascii))
    }

    /// Lowercase ASCII form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Number of dot-separated labels.
    pub fn label_count(&self) -> usize {
        self.0.split('.').count()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validate a domain name under the given label rule.
pub fn validate_domain_name(raw: &str, rule: LabelRule) -> Result<DomainName, NameSyntaxError> {
    DomainName::parse(raw, rule)
}

fn to_ascii(name: &str) -> Result<String, NameSyntaxError> {
    match Host::parse(name) {
        Ok(Host::Domain(ascii)) => Ok(ascii),
        Ok(Host::Ipv4(_) | Host::Ipv6(_)) => Err(NameSyntaxError::AddressLiteral {
            name: name.to_owned(),
        }),
        Err(_) => Err(NameSyntaxError::Idna {
            name: name.to_owned(),
        }),
    }
}

fn check_labels(ascii: &str, rule: LabelRule) -> Result<(), NameSyntaxError> {
    if ascii.len() > MAX_DOMAIN_LENGTH {
        return Err(NameSyntaxError::TooLong {
            length: ascii.len(),
        });
    }

    let labels: Vec<&str> = ascii.split('.').collect();
    for label in &labels {
        check_label(label)?;
    }

    let count = labels.len();
    let max = rule.max_labels();
    if !(MIN_LABELS..=max).contains(&count) {
        return Err(NameSyntaxError::LabelCount {
            count,
            min: MIN_LABELS,
            max,
        });
    }

    if let Some(top) = labels.last() {
        let punycode = top.starts_with("xn--");
        if !punycode && !top.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(NameSyntaxError::InvalidTopLevel {
                label: (*top).to_owned(),
            });
        }
    }
    Ok(())
}

fn check_label(label: &str) -> Result<(), NameSyntaxError> {
    if label.is_empty() {
        return Err(NameSyntaxError::EmptyLabel);
    }
    if label.len() > MAX_LABEL_LENGTH {
        return Err(NameSyntaxError::LabelTooLong {
            label: label.to_owned(),
        });
    }
    if !is_dns_label(label) {
        return Err(NameSyntaxError::InvalidLabel {
            label: label.to_owned(),
        });
    }
    Ok(())
}

fn is_dns_label(label: &str) -> bool {
    !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Reasons a mount point is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountPointSyntaxError {
    #[error("mount point must not be empty")]
    Empty,
    #[error("mount point must start with '/'")]
    NotRooted,
    #[error("mount point contains an empty segment")]
    EmptySegment,
    #[error("mount point segment '{segment}' is not a valid directory name")]
    InvalidSegment { segment: String },
    #[error("mount point segment '{segment}' is reserved")]
    ReservedSegment { segment: String },
}

/// Directory under the owning domain where an alias is served from.
///
/// # Examples
/// ```
/// use panel::domain::MountPoint;
///
/// assert!(MountPoint::parse("/").expect("root").is_root());
/// assert_eq!(MountPoint::parse("/Web").expect("valid").as_str(), "/web");
/// assert!(MountPoint::parse("web").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountPoint(String);

impl MountPoint {
    /// The document root of the owning domain.
    pub fn root() -> Self {
        Self("/".to_owned())
    }

    /// Normalise and validate a raw path.
    pub fn parse(raw: &str) -> Result<Self, MountPointSyntaxError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MountPointSyntaxError::Empty);
        }
        let lowered = trimmed.to_lowercase();
        let Some(rest) = lowered.strip_prefix('/') else {
            return Err(MountPointSyntaxError::NotRooted);
        };
        if rest.is_empty() {
            return Ok(Self::root());
        }

        for (index, segment) in rest.split('/').enumerate() {
            if segment.is_empty() {
                return Err(MountPointSyntaxError::EmptySegment);
            }
            if segment.len() > MAX_LABEL_LENGTH || !is_dns_label(segment) {
                return Err(MountPointSyntaxError::InvalidSegment {
                    segment: segment.to_owned(),
                });
            }
            if index == 0 && RESERVED_MOUNT_SEGMENTS.contains(&segment) {
                return Err(MountPointSyntaxError::ReservedSegment {
                    segment: segment.to_owned(),
                });
            }
        }
        Ok(Self(lowered))
    }

    /// Whether this is the domain's document root.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Normalised path.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a mount point.
pub fn validate_mount_point(raw: &str) -> Result<MountPoint, MountPointSyntaxError> {
    MountPoint::parse(raw)
}

/// Scheme prefix of a forwarding alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForwardPrefix {
    #[serde(rename = "http://")]
    Http,
    #[serde(rename = "https://")]
    Https,
    #[serde(rename = "ftp://")]
    Ftp,
}

impl ForwardPrefix {
    /// All accepted prefixes.
    pub const ALL: [ForwardPrefix; 3] = [
        ForwardPrefix::Http,
        ForwardPrefix::Https,
        ForwardPrefix::Ftp,
    ];

    /// Literal prefix including `://`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http://",
            Self::Https => "https://",
            Self::Ftp => "ftp://",
        }
    }
}

impl fmt::Display for ForwardPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unsupported forward prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported forward prefix '{input}'")]
pub struct ParseForwardPrefixError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for ForwardPrefix {
    type Err = ParseForwardPrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|prefix| prefix.as_str() == s)
            .copied()
            .ok_or_else(|| ParseForwardPrefixError {
                input: s.to_owned(),
            })
    }
}

/// Validated redirect destination of a forwarding alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    prefix: ForwardPrefix,
    host: DomainName,
}

impl ForwardTarget {
    /// Pick the label rule for a raw target.
    ///
    /// Targets with more than two dots are checked with the relaxed rule;
    /// shorter ones must satisfy the strict rule.
    pub fn rule_for(raw_target: &str, strict_max_labels: usize) -> LabelRule {
        if raw_target.matches('.').count() > 2 {
            LabelRule::Relaxed
        } else {
            LabelRule::Strict {
                max_labels: strict_max_labels,
            }
        }
    }

    /// Validate a forward target.
    ///
    /// # Examples
    /// ```
    /// use panel::domain::{ForwardPrefix, ForwardTarget};
    ///
    /// let target = ForwardTarget::parse(ForwardPrefix::Https, "a.b.c.d.example.com", 3)
    ///     .expect("relaxed rule accepts deep names");
    /// assert_eq!(target.url(), "https://a.b.c.d.example.com");
    /// ```
    pub fn parse(
        prefix: ForwardPrefix,
        raw_target: &str,
        strict_max_labels: usize,
    ) -> Result<Self, NameSyntaxError> {
        let target = raw_target.trim().to_lowercase();
        let rule = Self::rule_for(&target, strict_max_labels);
        let host = DomainName::parse(&target, rule)?;
        Ok(Self { prefix, host })
    }

    /// Scheme prefix.
    pub fn prefix(&self) -> ForwardPrefix {
        self.prefix
    }

    /// Destination host in ASCII form.
    pub fn host(&self) -> &DomainName {
        &self.host
    }

    /// Full forward URL stored on the alias row.
    pub fn url(&self) -> String {
        format!("{}{}", self.prefix.as_str(), self.host.as_str())
    }
}
