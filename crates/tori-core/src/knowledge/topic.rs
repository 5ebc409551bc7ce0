use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of subjects a message can be routed to.
///
/// Declaration order is classification priority: when a message mentions
/// several topics the earliest one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Fees,
    Enrolment,
    Grades,
    Events,
    Contacts,
    Mylearn,
    /// No rule matched.
    Fallback,
}

impl Topic {
    /// Topics with a stored knowledge entry, in priority order.
    pub const ROUTABLE: [Topic; 6] = [
        Topic::Fees,
        Topic::Enrolment,
        Topic::Grades,
        Topic::Events,
        Topic::Contacts,
        Topic::Mylearn,
    ];

    /// Returns all topics in priority order, `Fallback` last.
    pub fn all() -> [Self; 7] {
        [
            Self::Fees,
            Self::Enrolment,
            Self::Grades,
            Self::Events,
            Self::Contacts,
            Self::Mylearn,
            Self::Fallback,
        ]
    }

    /// Lower-case tag used on the wire and in knowledge files.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fees => "fees",
            Self::Enrolment => "enrolment",
            Self::Grades => "grades",
            Self::Events => "events",
            Self::Contacts => "contacts",
            Self::Mylearn => "mylearn",
            Self::Fallback => "fallback",
        }
    }

    /// Lower-case substrings that select this topic. Empty for `Fallback`.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Fees => &["fee"],
            Self::Enrolment => &["enrol", "enroll", "add/drop"],
            Self::Grades => &["grade", "mark"],
            Self::Events => &["event", "campus"],
            Self::Contacts => &["contact", "support", "helpdesk"],
            Self::Mylearn => &["mylearn", "guide", "portal"],
            Self::Fallback => &[],
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTopic(pub String);

impl fmt::Display for UnknownTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown topic: {}", self.0)
    }
}

impl std::error::Error for UnknownTopic {}

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or(UnknownTopic(s.to_string()))
    }
}
