//! Provisioning status shared by domains, aliases and their children.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status stored on provisionable rows.
///
/// The panel writes rows in a pending state; the provisioning daemon moves
/// them to [`ItemStatus::Active`] once the change is applied on the host.
///
/// # Example
///
/// ```
/// # use panel::domain::ItemStatus;
/// assert_eq!(ItemStatus::Pending.as_str(), "toadd");
/// assert_eq!("todelete".parse::<ItemStatus>(), Ok(ItemStatus::Deleting));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Created by the panel, waiting for the daemon.
    Pending,
    /// Applied on the host.
    Active,
    /// Modified, waiting for the daemon.
    Changing,
    /// Scheduled for removal; excluded from quota counts.
    Deleting,
    /// Requested by a client, waiting for reseller approval.
    Ordered,
    /// Suspended.
    Disabled,
}

impl ItemStatus {
    /// All variants in storage order.
    pub const ALL: [ItemStatus; 6] = [
        ItemStatus::Pending,
        ItemStatus::Active,
        ItemStatus::Changing,
        ItemStatus::Deleting,
        ItemStatus::Ordered,
        ItemStatus::Disabled,
    ];

    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "toadd",
            Self::Active => "ok",
            Self::Changing => "change",
            Self::Deleting => "todelete",
            Self::Ordered => "ordered",
            Self::Disabled => "disabled",
        }
    }

    /// Whether rows in this status count towards quota usage.
    pub fn counts_towards_quota(&self) -> bool {
        !matches!(self, Self::Deleting)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item status '{input}'")]
pub struct ParseItemStatusError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for ItemStatus {
    type Err = ParseItemStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| ParseItemStatusError {
                input: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn every_status_parses_from_its_storage_form() {
        for status in ItemStatus::ALL {
            assert_eq!(status.as_str().parse::<ItemStatus>(), Ok(status));
        }
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        let err = "gone".parse::<ItemStatus>().expect_err("unknown status");
        assert_eq!(err.input, "gone");
    }

    #[rstest]
    #[case(ItemStatus::Pending, true)]
    #[case(ItemStatus::Ordered, true)]
    #[case(ItemStatus::Deleting, false)]
    fn deleting_rows_are_not_counted(#[case] status: ItemStatus, #[case] counted: bool) {
        assert_eq!(status.counts_towards_quota(), counted);
    }
}
