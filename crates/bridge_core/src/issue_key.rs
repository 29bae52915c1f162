//! Composite issue identifier joining a code-host issue to its chat thread.

use std::fmt;
use std::str::FromStr;

use crate::errors::IssueKeyError;

#[cfg(test)]
#[path = "issue_key_tests.rs"]
mod tests;

/// Composite identifier `owner/repo#number`.
///
/// An `IssueKey` uniquely identifies one issue across both systems and is the
/// join key between code-host events and chat threads. Owner, repository, and
/// number are validated at construction and immutable afterwards.
///
/// # Examples
///
/// ```rust
/// use bridge_core::IssueKey;
///
/// let key = IssueKey::new("acme", "widgets", 42).unwrap();
/// assert_eq!(key.to_string(), "acme/widgets#42");
///
/// let parsed: IssueKey = "acme/widgets#42".parse().unwrap();
/// assert_eq!(parsed, key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueKey {
    owner: String,
    repo: String,
    number: u64,
}

impl IssueKey {
    /// Create a new issue key.
    ///
    /// # Errors
    ///
    /// Returns an error if owner or repository are empty, or the number is
    /// zero.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        number: u64,
    ) -> Result<Self, IssueKeyError> {
        let owner = owner.into();
        let repo = repo.into();

        if owner.is_empty() {
            return Err(IssueKeyError::EmptyOwner);
        }
        if repo.is_empty() {
            return Err(IssueKeyError::EmptyRepository);
        }
        if number == 0 {
            return Err(IssueKeyError::ZeroNumber);
        }

        Ok(Self {
            owner,
            repo,
            number,
        })
    }

    /// Repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Issue number within the repository.
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

impl FromStr for IssueKey {
    type Err = IssueKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repo_part, number_part) = s
            .rsplit_once('#')
            .ok_or_else(|| IssueKeyError::Malformed(s.to_string()))?;
        let (owner, repo) = repo_part
            .split_once('/')
            .ok_or_else(|| IssueKeyError::Malformed(s.to_string()))?;
        let number: u64 = number_part
            .parse()
            .map_err(|_| IssueKeyError::Malformed(s.to_string()))?;

        Self::new(owner, repo, number)
    }
}
