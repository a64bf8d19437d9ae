use serde::{Deserialize, Serialize};

/// An inbound conversational event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Text { body: String },
    Button { id: String },
}

impl Event {
    pub fn text(body: impl Into<String>) -> Self {
        Event::Text { body: body.into() }
    }

    pub fn button(id: impl Into<String>) -> Self {
        Event::Button { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    pub label: String,
}

impl Button {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// An outbound message with optional buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Put `text` above this reply's text.
    pub fn prefixed(mut self, text: &str) -> Self {
        if text.is_empty() {
            return self;
        }
        self.text = if self.text.is_empty() {
            text.to_string()
        } else {
            format!("{text}\n\n{}", self.text)
        };
        self
    }

    pub fn has_button(&self, id: &str) -> bool {
        self.buttons.iter().any(|b| b.id == id)
    }
}
