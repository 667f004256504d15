use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::issue::RepoRef;

/// GitHub's closing keywords, e.g. `Fixes #7` or `resolves octo/widgets#9`.
static CLOSING_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:close[sd]?|fix(?:e[sd])?|resolve[sd]?):?\s+(?:([a-z0-9_.-]+)/([a-z0-9_.-]+))?#(\d+)\b",
    )
    .expect("closing reference pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueReference {
    pub repo: RepoRef,
    pub number: u64,
}

impl fmt::Display for IssueReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Every issue a pull request body says it closes, in order of first mention.
/// References without `owner/repo` point at `current`.
pub fn closing_references(body: &str, current: &RepoRef) -> Vec<IssueReference> {
    let mut refs: Vec<IssueReference> = Vec::new();
    for caps in CLOSING_REFERENCE.captures_iter(body) {
        let Ok(number) = caps[3].parse::<u64>() else {
            continue;
        };
        let repo = match (caps.get(1), caps.get(2)) {
            (Some(owner), Some(name)) => RepoRef::new(owner.as_str(), name.as_str()),
            _ => current.clone(),
        };
        let reference = IssueReference { repo, number };
        if !refs.contains(&reference) {
            refs.push(reference);
        }
    }
    refs
}
