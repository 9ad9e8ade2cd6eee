//! Content Catalogue
//!
//! Keyed lookup of canned message bodies and attachments, loaded from a JSON
//! file so copy can be edited without recompiling. The payment workflow only
//! asks for the tier-specific unlock message; everything else feeds the
//! onboarding funnel in the dispatcher.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chat::{InlineButton, InlineKeyboard};
use crate::error::{CoreError, Result};
use crate::tier::Tier;

/// Placeholder substituted with the gated-channel link at send time
const ACCESS_LINK_SLOT: &str = "{access_link}";

/// A button as authored in the catalogue: either a link or a bot action
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

impl Button {
    fn to_inline(&self) -> Option<InlineButton> {
        if let Some(url) = &self.url {
            return Some(InlineButton::Url {
                text: self.text.clone(),
                url: url.clone(),
            });
        }
        self.action.as_ref().map(|action| InlineButton::Callback {
            text: self.text.clone(),
            action: action.clone(),
        })
    }
}

/// Convert authored buttons to an inline keyboard, one per row
pub fn keyboard_from(buttons: &[Button]) -> Option<InlineKeyboard> {
    let rows: Vec<Vec<InlineButton>> = buttons
        .iter()
        .filter_map(|b| b.to_inline().map(|btn| vec![btn]))
        .collect();
    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboard { rows })
    }
}

/// Greeting shown on `/start`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartMessage {
    pub text: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

/// The free promo lesson
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoLesson {
    pub video_url: String,
    pub caption: String,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

/// A drip post
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostMessage {
    pub text: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

/// The two-tier offer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TariffMessage {
    pub text: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
    #[serde(default)]
    pub button_caption: Option<String>,
}

/// Sent exactly once after a successful payment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnlockMessage {
    pub text: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Everything the funnel can say, in authoring order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageCatalog {
    pub start_message: StartMessage,
    pub video_lesson: VideoLesson,
    pub post_2: PostMessage,
    pub post_3: PostMessage,
    pub post_4: PostMessage,
    pub tariff_message: TariffMessage,
    pub after_payment_tariff_1: UnlockMessage,
    pub after_payment_tariff_2: UnlockMessage,
}

/// Read-only view over the loaded catalogue
#[derive(Clone, Debug)]
pub struct ContentStore {
    catalog: MessageCatalog,
}

impl ContentStore {
    /// Load the catalogue from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Content(format!("cannot read {}: {e}", path.display()))
        })?;
        let catalog: MessageCatalog = serde_json::from_str(&raw)
            .map_err(|e| CoreError::Content(format!("malformed {}: {e}", path.display())))?;
        Ok(Self { catalog })
    }

    pub fn from_catalog(catalog: MessageCatalog) -> Self {
        Self { catalog }
    }

    pub fn start(&self) -> &StartMessage {
        &self.catalog.start_message
    }

    pub fn video_lesson(&self) -> &VideoLesson {
        &self.catalog.video_lesson
    }

    /// Drip posts in sending order
    pub fn drip_posts(&self) -> [&PostMessage; 3] {
        [
            &self.catalog.post_2,
            &self.catalog.post_3,
            &self.catalog.post_4,
        ]
    }

    pub fn tariffs(&self) -> &TariffMessage {
        &self.catalog.tariff_message
    }

    /// Tier-specific unlock message with the gated link substituted in
    pub fn unlock_message(&self, tier: Tier, access_link: &str) -> UnlockMessage {
        let template = match tier {
            Tier::SelfPaced => &self.catalog.after_payment_tariff_1,
            Tier::Mentored => &self.catalog.after_payment_tariff_2,
        };
        UnlockMessage {
            text: template.text.replace(ACCESS_LINK_SLOT, access_link),
            photos: template.photos.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> MessageCatalog {
        serde_json::from_value(serde_json::json!({
            "start_message": { "text": "hi", "photos": ["https://cdn.example/1.jpg"] },
            "video_lesson": {
                "video_url": "https://cdn.example/lesson.mp4",
                "caption": "free lesson",
                "buttons": [{ "text": "watch", "url": "https://cdn.example/lesson.mp4" }]
            },
            "post_2": { "text": "p2", "buttons": [{ "text": "tariffs", "action": "show_tariffs" }] },
            "post_3": { "text": "p3" },
            "post_4": { "text": "p4" },
            "tariff_message": {
                "text": "two tiers",
                "buttons": [
                    { "text": "buy 1", "action": "pay_tariff_1" },
                    { "text": "buy 2", "action": "pay_tariff_2" }
                ]
            },
            "after_payment_tariff_1": { "text": "welcome tier 1: {access_link}" },
            "after_payment_tariff_2": { "text": "welcome tier 2: {access_link}" }
        }))
        .expect("sample catalogue")
    }

    #[test]
    fn test_unlock_message_substitutes_link() {
        let store = ContentStore::from_catalog(sample_catalog());
        let msg = store.unlock_message(Tier::SelfPaced, "https://t.me/+secret");
        assert_eq!(msg.text, "welcome tier 1: https://t.me/+secret");
    }

    #[test]
    fn test_keyboard_conversion_skips_empty_buttons() {
        let buttons = vec![
            Button {
                text: "open".into(),
                url: Some("https://example.com".into()),
                action: None,
            },
            Button {
                text: "dead".into(),
                url: None,
                action: None,
            },
        ];
        let kb = keyboard_from(&buttons).expect("keyboard");
        assert_eq!(kb.rows.len(), 1);
    }

    #[test]
    fn test_drip_posts_order() {
        let store = ContentStore::from_catalog(sample_catalog());
        let texts: Vec<&str> = store.drip_posts().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["p2", "p3", "p4"]);
    }
}
