//! Inbound Dispatcher
//!
//! Long-polls the messenger and routes commands and button presses to their
//! handlers. Every update passes the access gate first; each one is handled
//! as its own task so a slow payment call never blocks the poll loop.

use std::sync::Arc;
use std::time::Duration;

use glow_core::{
    ChatGateway, ChatId, ContentStore, InlineKeyboard, MediaRef, Result as CoreResult, Tier,
    User, content::keyboard_from,
};
use glow_payments::PaymentWorkflow;
use glow_store::{AdminStore, LedgerStore};
use glow_telegram::{CallbackQuery, IncomingMessage, TelegramBot, Update};

use crate::{admin, drip, gate, outbox};

/// Callback actions authored into the catalogue's buttons
const ACTION_SHOW_TARIFFS: &str = "show_tariffs";
const ACTION_PAY_TIER_1: &str = "pay_tariff_1";
const ACTION_PAY_TIER_2: &str = "pay_tariff_2";

/// Routes inbound chat traffic
pub struct Dispatcher {
    bot: Arc<TelegramBot>,
    store: Arc<dyn LedgerStore>,
    admin_store: Arc<dyn AdminStore>,
    workflow: Arc<PaymentWorkflow>,
    content: Arc<ContentStore>,
}

impl Dispatcher {
    pub fn new(
        bot: Arc<TelegramBot>,
        store: Arc<dyn LedgerStore>,
        admin_store: Arc<dyn AdminStore>,
        workflow: Arc<PaymentWorkflow>,
        content: Arc<ContentStore>,
    ) -> Self {
        Self {
            bot,
            store,
            admin_store,
            workflow,
            content,
        }
    }

    /// Poll for updates forever, spawning one task per update
    pub async fn run(self: Arc<Self>) {
        let mut offset = 0i64;
        loop {
            match self.bot.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let dispatcher = self.clone();
                        tokio::spawn(async move {
                            dispatcher.handle_update(update).await;
                        });
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Update poll failed");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    async fn handle_update(&self, update: Update) {
        if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        } else if let Some(message) = update.message {
            self.handle_message(message).await;
        }
    }

    async fn handle_callback(&self, callback: CallbackQuery) {
        if let Err(e) = self.bot.answer_callback(&callback.id).await {
            tracing::warn!(error = %e, "Callback acknowledgment failed");
        }

        let user = match gate::ensure_user(self.store.as_ref(), &callback.from).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user_id = callback.from.id, error = %e, "Access gate failed");
                return;
            }
        };
        let chat = callback
            .message
            .as_ref()
            .map_or_else(|| ChatId::from(user.id), |m| ChatId(m.chat.id));

        let outcome = match callback.data.as_deref() {
            Some(ACTION_SHOW_TARIFFS) => {
                outbox::send_tariffs(self.bot.as_ref(), self.content.as_ref(), chat).await
            }
            Some(ACTION_PAY_TIER_1) => self.buy(&user, Tier::SelfPaced, chat).await,
            Some(ACTION_PAY_TIER_2) => self.buy(&user, Tier::Mentored, chat).await,
            other => {
                tracing::debug!(action = ?other, "Unknown callback action");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            tracing::error!(user_id = %user.id, error = %e, "Callback handling failed");
            let _ = self.bot.send_message(chat, &e.user_message(), None).await;
        }
    }

    async fn handle_message(&self, message: IncomingMessage) {
        let Some(from) = message.from.clone() else {
            return;
        };
        let user = match gate::ensure_user(self.store.as_ref(), &from).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user_id = from.id, error = %e, "Access gate failed");
                return;
            }
        };
        let chat = ChatId(message.chat.id);

        let outcome = if let Some(video) = &message.video {
            if user.is_admin {
                admin::handle_video(self.admin_store.as_ref(), self.bot.as_ref(), &user, chat, video)
                    .await
            } else {
                Ok(())
            }
        } else {
            match message.text.as_deref() {
                Some("/start") => self.start(&user, chat).await,
                Some("/payments") => self.history(&user, chat).await,
                Some("/admin") if user.is_admin => {
                    admin::panel(self.admin_store.as_ref(), self.bot.as_ref(), chat).await
                }
                Some("/upload_video") if user.is_admin => {
                    admin::open_upload(self.admin_store.as_ref(), self.bot.as_ref(), &user, chat)
                        .await
                }
                other => {
                    tracing::debug!(user_id = %user.id, text = ?other, "Ignoring message");
                    Ok(())
                }
            }
        };

        if let Err(e) = outcome {
            tracing::error!(user_id = %user.id, error = %e, "Update handling failed");
            let _ = self.bot.send_message(chat, &e.user_message(), None).await;
        }
    }

    /// `/start` — greet, send the free lesson, arm the drip sequence
    async fn start(&self, user: &User, chat: ChatId) -> CoreResult<()> {
        tracing::info!(user_id = %user.id, name = user.display_name(), "Funnel started");

        let start = self.content.start();
        outbox::send_post(self.bot.as_ref(), chat, &start.text, &start.photos, &start.buttons)
            .await?;
        self.send_lesson(chat).await?;

        drip::schedule(self.bot.clone(), self.content.clone(), chat);
        Ok(())
    }

    /// The free lesson: an admin-uploaded file id when available, the
    /// catalogue URL otherwise; protected either way
    async fn send_lesson(&self, chat: ChatId) -> CoreResult<()> {
        let lesson = self.content.video_lesson();
        let video = match self.admin_store.video(admin::LESSON_VIDEO).await {
            Ok(Some(asset)) => MediaRef::FileId(asset.file_id),
            Ok(None) => MediaRef::Url(lesson.video_url.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "Video asset lookup failed, using catalogue URL");
                MediaRef::Url(lesson.video_url.clone())
            }
        };

        self.bot
            .send_video(
                chat,
                &video,
                Some(&lesson.caption),
                keyboard_from(&lesson.buttons).as_ref(),
                true,
            )
            .await
    }

    /// Buy button: open a charge and hand back the payment link
    async fn buy(&self, user: &User, tier: Tier, chat: ChatId) -> CoreResult<()> {
        match self.workflow.create_charge(user.id, tier).await {
            Ok(created) => {
                let keyboard = InlineKeyboard::link(
                    format!("Pay {} RUB", created.attempt.amount_rub),
                    created.confirmation_url,
                );
                self.bot
                    .send_message(
                        chat,
                        &format!(
                            "**{}**\n\nComplete the payment and the lessons unlock automatically.",
                            tier.label()
                        ),
                        Some(&keyboard),
                    )
                    .await
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, tier = ?tier, error = %e, "Charge creation failed");
                self.bot.send_message(chat, e.user_message(), None).await
            }
        }
    }

    /// `/payments` — history, newest first
    async fn history(&self, user: &User, chat: ChatId) -> CoreResult<()> {
        match self.workflow.list_payments(user.id).await {
            Ok(attempts) if attempts.is_empty() => {
                self.bot
                    .send_message(chat, "You have no payments yet.", None)
                    .await
            }
            Ok(attempts) => {
                let lines: Vec<String> = attempts
                    .iter()
                    .map(|a| {
                        format!(
                            "{} — {} — {} {} — {}",
                            a.created_at.format("%Y-%m-%d"),
                            a.tier.label(),
                            a.amount_rub,
                            a.currency,
                            a.status
                        )
                    })
                    .collect();
                self.bot
                    .send_message(chat, &format!("**Your payments**\n\n{}", lines.join("\n")), None)
                    .await
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "History lookup failed");
                self.bot.send_message(chat, e.user_message(), None).await
            }
        }
    }
}
