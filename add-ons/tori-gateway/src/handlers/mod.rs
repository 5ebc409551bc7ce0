//! HTTP request handlers and their body types.

pub(crate) mod chat;
