//! Admin Panel
//!
//! Admins can replace the free lesson video. Upload mode is a persisted,
//! expiring session row rather than in-process state, so a restart inside
//! the window does not strand the admin.

use chrono::Duration;

use glow_core::{ChatGateway, ChatId, Result, User};
use glow_store::{AdminStore, VideoAsset};
use glow_telegram::IncomingVideo;

/// Catalogue name of the free lesson video
pub const LESSON_VIDEO: &str = "video_lesson";

/// How long an opened upload session stays usable
const UPLOAD_TTL_MINUTES: i64 = 10;

/// `/admin` — show the panel summary
pub async fn panel(store: &dyn AdminStore, chat: &dyn ChatGateway, to: ChatId) -> Result<()> {
    let lesson = store
        .video(LESSON_VIDEO)
        .await
        .map_err(|e| glow_core::CoreError::Other(e.to_string()))?;

    let lesson_line = match lesson {
        Some(asset) => format!("Lesson video: uploaded ({})", asset.created_at.date_naive()),
        None => "Lesson video: using the catalogue URL".into(),
    };

    chat.send_message(
        to,
        &format!(
            "**Admin panel**\n\n{lesson_line}\n\n\
             /upload_video — replace the free lesson video"
        ),
        None,
    )
    .await
}

/// `/upload_video` — open an upload session
pub async fn open_upload(
    store: &dyn AdminStore,
    chat: &dyn ChatGateway,
    admin: &User,
    to: ChatId,
) -> Result<()> {
    store
        .open_upload_session(admin.id, Duration::minutes(UPLOAD_TTL_MINUTES))
        .await
        .map_err(|e| glow_core::CoreError::Other(e.to_string()))?;

    tracing::info!(admin_id = %admin.id, "Upload session opened");
    chat.send_message(
        to,
        &format!("Send the new lesson video within {UPLOAD_TTL_MINUTES} minutes."),
        None,
    )
    .await
}

/// A video message from an admin: consume the session if one is active
pub async fn handle_video(
    store: &dyn AdminStore,
    chat: &dyn ChatGateway,
    admin: &User,
    to: ChatId,
    video: &IncomingVideo,
) -> Result<()> {
    let active = store
        .take_upload_session(admin.id)
        .await
        .map_err(|e| glow_core::CoreError::Other(e.to_string()))?;

    if !active {
        tracing::debug!(admin_id = %admin.id, "Video received with no upload session");
        return Ok(());
    }

    let asset = VideoAsset {
        file_size: video.file_size,
        duration_secs: video.duration,
        mime_type: video.mime_type.clone(),
        ..VideoAsset::new(LESSON_VIDEO, video.file_id.clone())
    };
    store
        .save_video(&asset)
        .await
        .map_err(|e| glow_core::CoreError::Other(e.to_string()))?;

    tracing::info!(admin_id = %admin.id, file_id = %asset.file_id, "Lesson video replaced");
    chat.send_message(to, "Lesson video updated.", None).await
}
