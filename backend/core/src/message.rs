use serde::{Deserialize, Serialize};

/// An image ready to be sent inline to a model.
///
/// `data` is the bare base64 payload (no data URL header).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "image", rename_all = "camelCase")]
pub struct ImageBlock {
    pub data: String,
    pub mime_type: String,
}

impl ImageBlock {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// One block of user-turn content handed to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl From<ImageBlock> for ContentBlock {
    fn from(image: ImageBlock) -> Self {
        ContentBlock::Image {
            data: image.data,
            mime_type: image.mime_type,
        }
    }
}

/// The effective user turn after attachments have been folded in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTurn {
    pub content: Vec<ContentBlock>,
}

impl UserTurn {
    /// Build a turn from the (already augmented) message text and inline images.
    ///
    /// An empty message contributes no text block.
    pub fn new(message: &str, images: impl IntoIterator<Item = ImageBlock>) -> Self {
        let mut content = Vec::new();
        if !message.is_empty() {
            content.push(ContentBlock::Text {
                text: message.to_string(),
            });
        }
        content.extend(images.into_iter().map(ContentBlock::from));
        Self { content }
    }

    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Image { .. } => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.content
            .iter()
            .filter(|block| matches!(block, ContentBlock::Image { .. }))
            .count()
    }
}
