//! Request bodies for the chat routes. Field names follow the browser widget
//! deployments (`message`/`prompt`, `context`/`student`/`profile`).

use serde::Deserialize;
use serde_json::Value;
use tori_core::{ChatRequest, StudentContext};

const MESSAGE_KEYS: [&str; 2] = ["message", "prompt"];
const CONTEXT_KEYS: [&str; 3] = ["context", "student", "profile"];

/// Context sent by a client: the login-page identity, free text, or anything else.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContextValue {
    Student(StudentContext),
    Text(String),
    Other(Value),
}

impl ContextValue {
    /// Identity usable for personalization; free text carries none.
    pub(crate) fn student(&self) -> Option<StudentContext> {
        match self {
            Self::Student(ctx) if !ctx.is_empty() => Some(ctx.clone()),
            _ => None,
        }
    }

    /// Text appended to the LLM system prompt.
    pub(crate) fn prompt_text(&self) -> String {
        match self {
            Self::Student(ctx) => ctx.as_prompt_text(),
            Self::Text(s) => s.trim().to_string(),
            Self::Other(Value::Null) => String::new(),
            Self::Other(v) => v.to_string(),
        }
    }
}

/// `POST /api/chat` and `POST /api/ask` body.
///
/// Any JSON value is accepted. The first present key among the aliases wins,
/// so a body carrying both `context` and `student` is not rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Value")]
pub(crate) struct ChatBody {
    pub(crate) message: String,
    pub(crate) context: Option<ContextValue>,
}

impl From<Value> for ChatBody {
    fn from(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        let message = MESSAGE_KEYS
            .iter()
            .find_map(|k| match fields.remove(*k) {
                Some(Value::String(s)) => Some(s),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_default();
        let context = CONTEXT_KEYS
            .iter()
            .find_map(|k| fields.remove(*k).filter(|v| !v.is_null()))
            .and_then(|v| serde_json::from_value(v).ok());
        Self { message, context }
    }
}

impl ChatBody {
    pub(crate) fn into_request(self) -> ChatRequest {
        let context = self.context.as_ref().and_then(ContextValue::student);
        ChatRequest {
            text: self.message,
            context,
        }
    }

    pub(crate) fn context_text(&self) -> Option<String> {
        self.context
            .as_ref()
            .map(ContextValue::prompt_text)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alternate_field_names() {
        let body: ChatBody =
            serde_json::from_str(r#"{ "prompt": "fees?", "student": { "name": "Sam", "id": "s1" } }"#).unwrap();
        assert_eq!(body.context_text().as_deref(), Some("Name: Sam\nStudent ID: s1"));
        let req = body.into_request();
        assert_eq!(req.text, "fees?");
        assert_eq!(req.greeting_name(), "Sam");
    }

    #[test]
    fn text_context_has_no_identity() {
        let body: ChatBody = serde_json::from_str(r#"{ "message": "hi", "context": "Year 2 IT" }"#).unwrap();
        assert_eq!(body.context_text().as_deref(), Some("Year 2 IT"));
        assert!(body.into_request().context.is_none());

        let empty: ChatBody = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.message, "");
        assert!(empty.context_text().is_none());
    }

    #[test]
    fn numeric_id_and_scalar_context_are_accepted() {
        let body: ChatBody =
            serde_json::from_str(r#"{ "prompt": "fees?", "student": { "name": "Sam", "id": 12345 } }"#).unwrap();
        assert_eq!(body.context_text().as_deref(), Some("Name: Sam\nStudent ID: 12345"));

        let body: ChatBody = serde_json::from_str(r#"{ "message": "fees?", "context": 42 }"#).unwrap();
        assert_eq!(body.context_text().as_deref(), Some("42"));
        let req = body.into_request();
        assert_eq!(req.text, "fees?");
        assert!(req.context.is_none());
    }

    #[test]
    fn first_context_alias_wins() {
        let body: ChatBody = serde_json::from_str(
            r#"{ "message": "hi", "context": { "name": "Ana" }, "student": { "name": "Sam" } }"#,
        )
        .unwrap();
        assert_eq!(body.into_request().greeting_name(), "Ana");

        let odd: ChatBody = serde_json::from_str(r#"["fees"]"#).unwrap();
        assert_eq!(odd.message, "");
        assert!(odd.context.is_none());
    }
}
