use std::time::Duration;

use botdesk_core::config::ChatConfig;
use botdesk_core::{BotdeskError, BotdeskResult};
use serde::{Deserialize, Serialize};

/// Sent when the webhook reply carries no usable text.
pub const DEFAULT_CHAT_REPLY: &str = "Sorry, I couldn't process your message right now.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest<'a> {
    message: &'a str,
    widget_id: &'a str,
}

/// The reply shapes automation webhooks are known to produce.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WebhookReply {
    /// Some workflows answer with a list of items; the first one wins.
    Batch(Vec<WebhookReply>),
    Fields(ReplyFields),
    Text(String),
    Other(serde_json::Value),
}

/// Candidate reply fields. Held as raw values so one field of an unexpected
/// type does not hide usable text in a later one.
#[derive(Debug, Default, Deserialize)]
pub struct ReplyFields {
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

impl WebhookReply {
    /// Pick the reply text: `output`, then `response`, then `message`, then
    /// `text`. `None` when nothing usable is present.
    pub fn into_text(self) -> Option<String> {
        match self {
            WebhookReply::Batch(items) => items.into_iter().next().and_then(WebhookReply::into_text),
            WebhookReply::Fields(fields) => [fields.output, fields.response, fields.message, fields.text]
                .into_iter()
                .find_map(|value| match value {
                    Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
                    _ => None,
                }),
            WebhookReply::Text(text) if !text.trim().is_empty() => Some(text),
            WebhookReply::Text(_) | WebhookReply::Other(_) => None,
        }
    }
}

/// One-shot relay to the chat webhook. No retries.
#[derive(Clone)]
pub struct ChatRelay {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl ChatRelay {
    pub fn new(config: &ChatConfig) -> BotdeskResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BotdeskError::InternalError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    pub async fn relay(&self, message: &str, widget_id: &str) -> BotdeskResult<String> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| BotdeskError::InternalError("chat webhook not configured".to_string()))?;

        let resp = self
            .client
            .post(url)
            .json(&WebhookRequest { message, widget_id })
            .send()
            .await
            .map_err(|e| BotdeskError::Upstream(format!("chat webhook unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BotdeskError::Upstream(format!(
                "chat webhook returned {status}: {text}"
            )));
        }

        let reply: WebhookReply = resp
            .json()
            .await
            .map_err(|e| BotdeskError::Upstream(format!("undecodable chat webhook reply: {e}")))?;

        Ok(reply.into_text().unwrap_or_else(|| {
            tracing::debug!(widget_id, "chat webhook reply had no text, using default");
            DEFAULT_CHAT_REPLY.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_of(value: serde_json::Value) -> Option<String> {
        serde_json::from_value::<WebhookReply>(value).unwrap().into_text()
    }

    #[test]
    fn output_wins_over_response() {
        assert_eq!(
            text_of(json!({"output": "from output", "response": "from response"})).as_deref(),
            Some("from output")
        );
    }

    #[test]
    fn falls_through_empty_fields_in_order() {
        assert_eq!(
            text_of(json!({"output": "", "response": "from response"})).as_deref(),
            Some("from response")
        );
        assert_eq!(text_of(json!({"message": "m", "text": "t"})).as_deref(), Some("m"));
        assert_eq!(text_of(json!({"text": "t"})).as_deref(), Some("t"));
    }

    #[test]
    fn non_string_field_does_not_hide_later_text() {
        assert_eq!(
            text_of(json!({"output": 42, "response": "ok"})).as_deref(),
            Some("ok")
        );
        assert_eq!(
            text_of(json!({"output": {"nested": true}, "response": null, "text": "last"}))
                .as_deref(),
            Some("last")
        );
    }

    #[test]
    fn batch_uses_first_item() {
        assert_eq!(
            text_of(json!([{"output": "first"}, {"output": "second"}])).as_deref(),
            Some("first")
        );
        assert_eq!(text_of(json!([])), None);
    }

    #[test]
    fn bare_string_reply() {
        assert_eq!(text_of(json!("hello")).as_deref(), Some("hello"));
    }

    #[test]
    fn unusable_shapes_yield_none() {
        assert_eq!(text_of(json!({"output": {"nested": true}})), None);
        assert_eq!(text_of(json!({})), None);
        assert_eq!(text_of(json!(42)), None);
        assert_eq!(text_of(json!(null)), None);
    }
}
