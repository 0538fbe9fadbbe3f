//! Reply collaborator contract
//!
//! The dispatcher never talks to the chat transport directly. Every reply,
//! acknowledgement, and typing indicator goes through a [`Responder`]
//! supplied with the dispatch context.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ResponderError;

/// Colour used by the built-in error embeds
pub const ERROR_COLOUR: u32 = 0xFF0000;

/// Rich content block attached to a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: String,
    pub colour: Option<u32>,
}

impl Embed {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: description.into(),
            colour: None,
        }
    }

    /// Short red embed used for denials and failures
    pub fn error(description: impl Into<String>) -> Self {
        Self::new(description).with_colour(ERROR_COLOUR)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_colour(mut self, colour: u32) -> Self {
        self.colour = Some(colour);
        self
    }
}

/// Outgoing reply: plain text, rich content, or both
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reply {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub ephemeral: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Self::default()
        }
    }

    pub fn with_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// Text of the reply, falling back to the embed description
    pub fn body(&self) -> &str {
        self.content
            .as_deref()
            .or_else(|| self.embed.as_ref().map(|e| e.description.as_str()))
            .unwrap_or_default()
    }
}

impl From<&str> for Reply {
    fn from(content: &str) -> Self {
        Reply::text(content)
    }
}

impl From<String> for Reply {
    fn from(content: String) -> Self {
        Reply::text(content)
    }
}

impl From<Embed> for Reply {
    fn from(embed: Embed) -> Self {
        Reply::embed(embed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputStyle {
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInput {
    pub id: String,
    pub label: String,
    pub style: InputStyle,
    pub required: bool,
}

/// Form-like prompt sent as the one-time acknowledgement of an interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub title: String,
    pub inputs: Vec<PromptInput>,
}

impl Prompt {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        style: InputStyle,
        required: bool,
    ) -> Self {
        self.inputs.push(PromptInput {
            id: id.into(),
            label: label.into(),
            style,
            required,
        });
        self
    }
}

/// Narrow reply/acknowledge capability the transport provides
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, reply: Reply) -> Result<(), ResponderError>;

    async fn acknowledge_with_prompt(&self, prompt: Prompt) -> Result<(), ResponderError>;

    /// Provisional acknowledgement; the eventual reply follows up on it
    async fn defer(&self, _ephemeral: bool) -> Result<(), ResponderError> {
        Ok(())
    }

    async fn send_typing(&self) -> Result<(), ResponderError> {
        Ok(())
    }
}

/// Responder that drops everything; handy for hosts without a reply channel
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResponder;

#[async_trait]
impl Responder for NoopResponder {
    async fn reply(&self, _reply: Reply) -> Result<(), ResponderError> {
        Ok(())
    }

    async fn acknowledge_with_prompt(&self, _prompt: Prompt) -> Result<(), ResponderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_body_prefers_content() {
        assert_eq!(Reply::text("hi").body(), "hi");
        assert_eq!(Reply::embed(Embed::error("nope")).body(), "nope");
        assert_eq!(Reply::default().body(), "");
    }

    #[test]
    fn test_error_embed_is_red() {
        let embed = Embed::error("Unknown Command.");
        assert_eq!(embed.colour, Some(ERROR_COLOUR));
        assert!(embed.title.is_none());
    }

    #[tokio::test]
    async fn test_noop_responder_accepts_everything() {
        let responder = NoopResponder;
        assert!(responder.reply(Reply::text("x")).await.is_ok());
        assert!(responder
            .acknowledge_with_prompt(Prompt::new("form", "Form"))
            .await
            .is_ok());
        assert!(responder.defer(true).await.is_ok());
        assert!(responder.send_typing().await.is_ok());
    }
}
