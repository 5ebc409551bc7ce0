//! Static Topic → reply mapping. Built once at start-up and shared read-only.

use std::collections::HashMap;
use std::path::Path;

use super::Topic;

/// Placeholder replaced with the student's name in the fallback template.
pub const NAME_PLACEHOLDER: &str = "{name}";

const FEES: &str = "You can view and pay your fees via the Student Portal → Payments.
If you need a plan, contact Student Services.";

const ENROLMENT: &str = "Manage enrolments in MyLearn: “My Subjects” → “Add/Drop”.
Please check prerequisites and census dates first.";

const GRADES: &str = "Find grades inside each subject: open the subject → “Grades”.
Feedback appears once released by your lecturer.";

const EVENTS: &str = "Upcoming items: Hackathon • Careers Fair • Study Skills.
See the Student Hub calendar for dates and RSVP links.";

const CONTACTS: &str = "Student Services: support@university.edu
IT Helpdesk: ithelp@university.edu
Phone: (02) 1234 5678";

const MYLEARN: &str = "MyLearn walkthrough:
1) Dashboard shows announcements and deadlines.
2) Click “My Subjects”.
3) Inside a subject: Announcements, Modules, Assessments.
4) The “Grades” tab shows marks and feedback when released.";

const FALLBACK_TEMPLATE: &str = "I can help with fees, enrolment, grades, campus events, contacts, or a MyLearn walkthrough. What do you need, {name}?";

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("failed to read knowledge file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse knowledge file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Canned replies per topic. Every routable topic always has a non-empty entry.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: HashMap<Topic, String>,
    fallback_template: String,
}

impl KnowledgeBase {
    /// Built-in student-services answers.
    pub fn builtin() -> Self {
        let entries = [
            (Topic::Fees, FEES),
            (Topic::Enrolment, ENROLMENT),
            (Topic::Grades, GRADES),
            (Topic::Events, EVENTS),
            (Topic::Contacts, CONTACTS),
            (Topic::Mylearn, MYLEARN),
        ]
        .into_iter()
        .map(|(t, s)| (t, s.to_string()))
        .collect();
        Self {
            entries,
            fallback_template: FALLBACK_TEMPLATE.to_string(),
        }
    }

    /// Loads overrides from a JSON object keyed by topic tag. Missing or blank
    /// entries keep the built-in text; unknown keys are skipped.
    pub fn load_json_path(path: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: shown.clone(),
            source,
        })?;
        let overrides: HashMap<String, String> =
            serde_json::from_str(&raw).map_err(|source| KnowledgeError::Parse {
                path: shown.clone(),
                source,
            })?;
        let kb = Self::builtin().with_overrides(overrides);
        tracing::info!(target: "tori::knowledge", path = %shown, "Knowledge overrides loaded");
        Ok(kb)
    }

    fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        for (key, text) in overrides {
            let Ok(topic) = key.parse::<Topic>() else {
                tracing::warn!(target: "tori::knowledge", key = %key, "Skipping unknown topic in knowledge file");
                continue;
            };
            if text.trim().is_empty() {
                tracing::warn!(target: "tori::knowledge", topic = %topic, "Blank knowledge entry ignored");
                continue;
            }
            if topic == Topic::Fallback {
                if !text.contains(NAME_PLACEHOLDER) {
                    tracing::warn!(
                        target: "tori::knowledge",
                        "Fallback template without {} placeholder ignored",
                        NAME_PLACEHOLDER
                    );
                    continue;
                }
                self.fallback_template = text;
            } else {
                self.entries.insert(topic, text);
            }
        }
        self
    }

    /// Stored entry for a routable topic. `None` for `Fallback`, which is rendered per request.
    pub fn entry(&self, topic: Topic) -> Option<&str> {
        self.entries.get(&topic).map(String::as_str)
    }

    /// Reply text for `topic`. The fallback template addresses the student by `name`.
    pub fn reply(&self, topic: Topic, name: &str) -> String {
        match self.entry(topic) {
            Some(text) => text.to_string(),
            None => self.fallback_template.replace(NAME_PLACEHOLDER, name),
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}
