//! Outbound Message Assembly
//!
//! Turns catalogue entries (text + photos + authored buttons) into gateway
//! calls. Photos go out first so the text with its keyboard lands last.

use glow_core::{
    ChatGateway, ChatId, ContentStore, MediaRef, Result, content::keyboard_from,
};

/// Deliver a catalogue post: photos, then text with its keyboard
pub async fn send_post(
    chat: &dyn ChatGateway,
    to: ChatId,
    text: &str,
    photos: &[String],
    buttons: &[glow_core::content::Button],
) -> Result<()> {
    for photo in photos {
        chat.send_photo(to, &MediaRef::Url(photo.clone()), None).await?;
    }
    chat.send_message(to, text, keyboard_from(buttons).as_ref())
        .await
}

/// Deliver the two-tier offer with its buy buttons
pub async fn send_tariffs(chat: &dyn ChatGateway, content: &ContentStore, to: ChatId) -> Result<()> {
    let tariffs = content.tariffs();
    send_post(chat, to, &tariffs.text, &tariffs.photos, &tariffs.buttons).await?;
    if let Some(caption) = &tariffs.button_caption {
        chat.send_message(to, caption, None).await?;
    }
    Ok(())
}
