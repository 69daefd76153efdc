//! What to do with expired messages.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Action applied to the messages a rule matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Copy to the trash folder. The originals are not flagged.
    Delete,
    /// Copy to the destination, then flag the originals `\Deleted`.
    Move(String),
    /// Copy to the destination.
    Copy(String),
    /// Nothing; the search itself applies the label.
    Label,
}

impl Action {
    /// Returns the action verb.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Move(_) => "move",
            Self::Copy(_) => "copy",
            Self::Label => "label",
        }
    }

    /// Returns the folder messages are copied to, if any.
    #[must_use]
    pub fn destination<'a>(&'a self, trash: &'a str) -> Option<&'a str> {
        match self {
            Self::Delete => Some(trash),
            Self::Move(dest) | Self::Copy(dest) => Some(dest),
            Self::Label => None,
        }
    }

    /// Checks if the originals are flagged `\Deleted` after copying.
    #[must_use]
    pub const fn flags_deleted(&self) -> bool {
        matches!(self, Self::Move(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move(dest) | Self::Copy(dest) => write!(f, "{}:{dest}", self.verb()),
            _ => f.write_str(self.verb()),
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    /// Parses `delete`, `label`, `move:<folder>` or `copy:<folder>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, dest) = match s.trim().split_once(':') {
            Some((verb, dest)) => (verb.trim(), Some(dest.trim())),
            None => (s.trim(), None),
        };

        let folder = |dest: Option<&str>| {
            dest.filter(|d| !d.is_empty())
                .map(str::to_string)
                .ok_or_else(|| Error::InvalidAction(format!("'{verb}' needs a destination folder")))
        };

        match verb.to_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "label" => Ok(Self::Label),
            "move" => folder(dest).map(Self::Move),
            "copy" => folder(dest).map(Self::Copy),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!("delete".parse::<Action>().unwrap(), Action::Delete);
        assert_eq!("label".parse::<Action>().unwrap(), Action::Label);
        assert_eq!(
            "move:Archive/2020".parse::<Action>().unwrap(),
            Action::Move("Archive/2020".to_string())
        );
        assert_eq!(
            "copy: [Gmail]/All Mail".parse::<Action>().unwrap(),
            Action::Copy("[Gmail]/All Mail".to_string())
        );
    }

    #[test]
    fn test_invalid_actions() {
        assert!(matches!("move".parse::<Action>(), Err(Error::InvalidAction(_))));
        assert!(matches!("copy:".parse::<Action>(), Err(Error::InvalidAction(_))));
        assert!(matches!("shred".parse::<Action>(), Err(Error::InvalidAction(_))));
    }

    #[test]
    fn test_destination() {
        assert_eq!(Action::Delete.destination("Trash"), Some("Trash"));
        assert_eq!(Action::Move("A".to_string()).destination("Trash"), Some("A"));
        assert_eq!(Action::Label.destination("Trash"), None);
        assert!(Action::Move("A".to_string()).flags_deleted());
        assert!(!Action::Delete.flags_deleted());
    }

    #[test]
    fn test_display() {
        assert_eq!(Action::Move("A".to_string()).to_string(), "move:A");
        assert_eq!(Action::Delete.to_string(), "delete");
    }
}
