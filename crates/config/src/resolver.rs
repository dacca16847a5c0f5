//! Profile to repository binding

use crate::config::Config;
use crate::profile::Profile;
use crate::repository::Repository;
use lohup_core::{Error, Result};

impl Config {
    /// The repository used by profiles without an explicit `repo`
    ///
    /// When several repositories are flagged `default`, the one declared
    /// last wins.
    pub fn default_repository(&self) -> Option<&Repository> {
        self.repos().values().rev().find(|repo| repo.is_default())
    }

    /// Find the repository a profile backs up to
    ///
    /// An explicit `repo` must name an existing repository; it never falls
    /// back to the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnlinkedProfile`] when the named repository does not
    /// exist, or when no repository is named and none is flagged default.
    pub fn resolve(&self, profile: &Profile) -> Result<&Repository> {
        let repo = match profile.repo() {
            Some(name) => self.repos().get(name),
            None => self.default_repository(),
        };

        repo.ok_or_else(|| Error::UnlinkedProfile {
            profile: profile.name().to_string(),
        })
    }

    /// Resolve every profile, in declaration order
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::UnlinkedProfile`] encountered.
    pub fn resolve_all(&self) -> Result<Vec<(&Profile, &Repository)>> {
        self.profiles()
            .values()
            .map(|profile| Ok((profile, self.resolve(profile)?)))
            .collect()
    }
}
