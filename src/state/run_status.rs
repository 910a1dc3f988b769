use std::fmt;

/// Lifecycle status of a scraping project run
///
/// Stored on both the `projects` row and each `runs` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// Created but never started
    Pending,

    /// A run is in progress
    Running,

    /// The pause flag was observed before all homepages were processed
    Paused,

    /// Every homepage of the project has a stored record
    Completed,

    /// The run finished its batches but some homepages produced no record
    Incomplete,

    /// Setup failed (connectivity, settings, storage)
    Error,
}

impl RunStatus {
    /// Returns true if no further work happens without a new run
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    /// Returns true if a new run may pick the project up again
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Paused | Self::Incomplete | Self::Error
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Error => "error",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "incomplete" => Some(Self::Incomplete),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Running,
            Self::Paused,
            Self::Completed,
            Self::Incomplete,
            Self::Error,
        ]
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());

        assert!(RunStatus::Paused.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Incomplete.is_terminal());
        assert!(RunStatus::Error.is_terminal());
    }

    #[test]
    fn test_is_resumable() {
        assert!(RunStatus::Paused.is_resumable());
        assert!(RunStatus::Incomplete.is_resumable());
        assert!(!RunStatus::Running.is_resumable());
        assert!(!RunStatus::Completed.is_resumable());
    }

    #[test]
    fn test_db_string_roundtrip() {
        for status in RunStatus::all_statuses() {
            let parsed = RunStatus::from_db_string(status.to_db_string());
            assert_eq!(Some(status), parsed);
        }
    }

    #[test]
    fn test_invalid_db_string() {
        assert_eq!(RunStatus::from_db_string("finished"), None);
        assert_eq!(RunStatus::from_db_string(""), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(RunStatus::Incomplete.to_string(), "incomplete");
    }
}
