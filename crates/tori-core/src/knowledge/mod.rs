//! Topic tags and the static knowledge base.
//!
//! | Topic     | Keywords (lower-case substrings)   |
//! |-----------|------------------------------------|
//! | fees      | fee                                |
//! | enrolment | enrol, enroll, add/drop            |
//! | grades    | grade, mark                        |
//! | events    | event, campus                      |
//! | contacts  | contact, support, helpdesk         |
//! | mylearn   | mylearn, guide, portal             |
//! | fallback  | (none matched)                     |

mod store;
mod topic;

pub use store::{KnowledgeBase, KnowledgeError, NAME_PLACEHOLDER};
pub use topic::{Topic, UnknownTopic};
