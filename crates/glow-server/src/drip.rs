//! Drip Scheduler
//!
//! Fire-and-forget follow-ups after `/start`: the three promo posts, then
//! the tariff offer. Purely presentational — no persistence, no correctness
//! requirement; a failed send is logged and the sequence moves on.

use std::sync::Arc;
use std::time::Duration;

use glow_core::{ChatGateway, ChatId, ContentStore};

use crate::outbox;

/// Delays between `/start` and each drip post, in order
const POST_DELAYS: [Duration; 3] = [
    Duration::from_secs(10 * 60),
    Duration::from_secs(60 * 60),
    Duration::from_secs(3 * 60 * 60),
];

/// Pause between the last post and the tariff offer
const TARIFF_DELAY: Duration = Duration::from_secs(5 * 60);

/// Spawn the drip sequence for one chat
pub fn schedule(chat_gateway: Arc<dyn ChatGateway>, content: Arc<ContentStore>, chat: ChatId) {
    tokio::spawn(async move {
        for (post, delay) in content.drip_posts().into_iter().zip(POST_DELAYS) {
            tokio::time::sleep(delay).await;
            if let Err(e) =
                outbox::send_post(chat_gateway.as_ref(), chat, &post.text, &post.photos, &post.buttons)
                    .await
            {
                tracing::warn!(chat_id = %chat, error = %e, "Drip post delivery failed");
            }
        }

        tokio::time::sleep(TARIFF_DELAY).await;
        if let Err(e) = outbox::send_tariffs(chat_gateway.as_ref(), content.as_ref(), chat).await {
            tracing::warn!(chat_id = %chat, error = %e, "Tariff offer delivery failed");
        }
    });
}
