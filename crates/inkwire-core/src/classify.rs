//! Inbound frame classification.
//!
//! Inbound frames are JSON objects. Only three fields matter:
//! - `type`: event kind, `"message"` for chat messages
//! - `text`: message body
//! - `attachments`: rich attachments, each with `pretext`, `title`, `text`
//!
//! A field that is missing and a field of the wrong type are treated the same:
//! the default (empty) value is used.

use serde::Serialize;
use serde_json::{Map, Value};

/// Display-ready result of classifying one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A plain chat message.
    PlainText { body: String },
    /// The first attachment of a rich message.
    Attachment {
        pretext: String,
        title: String,
        body: String,
    },
    /// Nothing to show.
    Ignored,
}

impl Notification {
    /// Whether this should be handed to the renderer.
    pub fn is_renderable(&self) -> bool {
        !matches!(self, Notification::Ignored)
    }
}

/// Payload was not a JSON object.
#[derive(Debug, thiserror::Error)]
#[error("payload is not a JSON object: {0}")]
pub struct ParseError(#[from] serde_json::Error);

/// Typed view of the fields the classifier reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundFrame {
    pub kind: Option<String>,
    pub text: Option<String>,
    pub attachments: Vec<AttachmentFields>,
}

/// Fields of a single attachment. Missing ones are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentFields {
    pub pretext: String,
    pub title: String,
    pub text: String,
}

impl InboundFrame {
    /// Parse raw payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self, ParseError> {
        let map: Map<String, Value> = serde_json::from_slice(payload)?;

        let attachments = map
            .get("attachments")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(AttachmentFields::from_value).collect())
            .unwrap_or_default();

        Ok(Self {
            kind: string_field(&map, "type"),
            text: string_field(&map, "text"),
            attachments,
        })
    }

    /// Apply the classification rules. Attachments win over text.
    pub fn into_notification(self) -> Notification {
        if let Some(first) = self.attachments.into_iter().next() {
            return Notification::Attachment {
                pretext: first.pretext,
                title: first.title,
                body: first.text,
            };
        }

        match (self.kind.as_deref(), self.text) {
            (Some("message"), Some(body)) if !body.is_empty() => Notification::PlainText { body },
            _ => Notification::Ignored,
        }
    }
}

impl AttachmentFields {
    fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        Self {
            pretext: string_field(map, "pretext").unwrap_or_default(),
            title: string_field(map, "title").unwrap_or_default(),
            text: string_field(map, "text").unwrap_or_default(),
        }
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Classify one inbound payload.
///
/// Never fails: unparseable payloads are logged and come back as
/// [`Notification::Ignored`].
pub fn classify(payload: &[u8]) -> Notification {
    let frame = match InboundFrame::parse(payload) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Ignoring inbound frame: {}", e);
            return Notification::Ignored;
        }
    };

    let kind = frame.kind.clone();
    let notification = frame.into_notification();
    if !notification.is_renderable() {
        tracing::debug!(kind = kind.as_deref().unwrap_or("<none>"), "Ignored inbound frame");
    }
    notification
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message() {
        let n = classify(br#"{"type":"message","text":"build passed"}"#);
        assert_eq!(
            n,
            Notification::PlainText {
                body: "build passed".into()
            }
        );
    }

    #[test]
    fn attachment() {
        let n = classify(br#"{"attachments":[{"pretext":"P","title":"T","text":"B"}]}"#);
        assert_eq!(
            n,
            Notification::Attachment {
                pretext: "P".into(),
                title: "T".into(),
                body: "B".into(),
            }
        );
    }

    #[test]
    fn empty_text_is_ignored() {
        assert_eq!(
            classify(br#"{"type":"message","text":""}"#),
            Notification::Ignored
        );
    }

    #[test]
    fn attachments_win_over_text() {
        let n = classify(
            br#"{"type":"message","text":"fallback","attachments":[{"title":"Deploy"}]}"#,
        );
        assert_eq!(
            n,
            Notification::Attachment {
                pretext: String::new(),
                title: "Deploy".into(),
                body: String::new(),
            }
        );
    }

    #[test]
    fn only_first_attachment_is_used() {
        let n = classify(br#"{"attachments":[{"title":"one"},{"title":"two"}]}"#);
        assert!(matches!(n, Notification::Attachment { title, .. } if title == "one"));
    }

    #[test]
    fn empty_attachments_fall_through_to_text() {
        let n = classify(br#"{"type":"message","text":"hi","attachments":[]}"#);
        assert_eq!(n, Notification::PlainText { body: "hi".into() });
    }

    #[test]
    fn wrong_types_use_defaults() {
        let n = classify(br#"{"attachments":[{"pretext":1,"title":null,"text":["x"]}]}"#);
        assert_eq!(
            n,
            Notification::Attachment {
                pretext: String::new(),
                title: String::new(),
                body: String::new(),
            }
        );

        // A non-object attachment still counts, with empty fields.
        let n = classify(br#"{"attachments":["oops"]}"#);
        assert!(matches!(n, Notification::Attachment { .. }));

        // Non-string text is as good as absent.
        assert_eq!(
            classify(br#"{"type":"message","text":42}"#),
            Notification::Ignored
        );
        // Non-array attachments are as good as absent.
        assert_eq!(
            classify(br#"{"type":"message","text":"x","attachments":{"title":"t"}}"#),
            Notification::PlainText { body: "x".into() }
        );
    }

    #[test]
    fn other_event_types_are_ignored() {
        assert_eq!(classify(br#"{"type":"hello"}"#), Notification::Ignored);
        assert_eq!(
            classify(br#"{"type":"pong","reply_to":3}"#),
            Notification::Ignored
        );
        assert_eq!(
            classify(br#"{"type":"user_typing","text":"hi"}"#),
            Notification::Ignored
        );
    }

    #[test]
    fn unparseable_is_ignored() {
        assert_eq!(classify(b"not json"), Notification::Ignored);
        assert_eq!(classify(b"[1,2,3]"), Notification::Ignored);
        assert_eq!(classify(b""), Notification::Ignored);
        assert!(InboundFrame::parse(b"\"just a string\"").is_err());
    }

    #[test]
    fn classification_is_idempotent() {
        let payloads: [&[u8]; 4] = [
            br#"{"type":"message","text":"build passed"}"#,
            br#"{"attachments":[{"pretext":"P","title":"T","text":"B"}]}"#,
            br#"{"type":"message","text":""}"#,
            b"garbage",
        ];
        for payload in payloads {
            assert_eq!(classify(payload), classify(payload));
        }
    }
}
