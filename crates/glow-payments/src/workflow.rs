//! Payment Workflow
//!
//! Orchestrates charge creation and webhook reconciliation over the ledger
//! store. All collaborators are injected at construction; nothing in here
//! reaches into ambient global state.

use std::sync::Arc;

use glow_core::{
    ChatGateway, ChatId, ContentStore, MediaRef, PaymentAttempt, PaymentStatus, Tier, UserId,
};
use glow_store::LedgerStore;

use crate::error::{PaymentError, Result};
use crate::gateway::{NewCharge, PaymentProvider};

/// Static workflow settings
#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    /// Where the provider sends the buyer after checkout
    pub return_url: String,

    /// The gated resource (private channel invite) unlocked on payment
    pub access_link: String,
}

/// Result of opening a charge
#[derive(Clone, Debug)]
pub struct CreatedCharge {
    pub attempt: PaymentAttempt,
    /// Redirect URL to show the buyer
    pub confirmation_url: String,
}

/// Result of reconciling a webhook delivery
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    /// Whether this call flipped the buyer's access on (true at most once
    /// per charge over all deliveries)
    pub access_granted: bool,

    /// Stored status after reconciliation
    pub status: PaymentStatus,
}

/// The payment-confirmation core
pub struct PaymentWorkflow {
    store: Arc<dyn LedgerStore>,
    provider: Arc<dyn PaymentProvider>,
    chat: Arc<dyn ChatGateway>,
    content: Arc<ContentStore>,
    config: WorkflowConfig,
}

impl PaymentWorkflow {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        provider: Arc<dyn PaymentProvider>,
        chat: Arc<dyn ChatGateway>,
        content: Arc<ContentStore>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            provider,
            chat,
            content,
            config,
        }
    }

    /// Open a charge for `tier` and record it as `pending`.
    ///
    /// No notification is sent here; the buyer gets the redirect link from
    /// the caller and everything else waits for the webhook.
    pub async fn create_charge(&self, user: UserId, tier: Tier) -> Result<CreatedCharge> {
        let request = NewCharge {
            amount_rub: tier.price_rub(),
            currency: "RUB".into(),
            description: tier.description().into(),
            return_url: self.config.return_url.clone(),
            user_id: user,
        };

        let charge = self.provider.create_charge(&request).await?;
        let confirmation_url = charge
            .confirmation_url
            .ok_or_else(|| PaymentError::InvalidResponse("charge without confirmation url".into()))?;

        let mut attempt = PaymentAttempt::pending(charge.id, user, tier);
        attempt.status = charge.status;
        self.store.insert_attempt(&attempt).await?;

        tracing::info!(
            charge_id = %attempt.charge_id,
            user_id = %user,
            tier = ?tier,
            amount_rub = attempt.amount_rub,
            "Charge opened"
        );

        Ok(CreatedCharge {
            attempt,
            confirmation_url,
        })
    }

    /// Apply the provider's authoritative status for `charge_id`.
    ///
    /// Idempotent over at-least-once webhook delivery: duplicate and racing
    /// deliveries of a terminal status update nothing, grant nothing and
    /// notify no one. The webhook payload itself is never trusted for the
    /// status; only the id is taken from it.
    pub async fn reconcile(&self, charge_id: &str) -> Result<Reconciliation> {
        let charge = self.provider.get_charge(charge_id).await?;

        let Some(attempt) = self.store.attempt(charge_id).await? else {
            tracing::warn!(charge_id, "Webhook for a charge we never created");
            return Err(PaymentError::UnknownAttempt(charge_id.into()));
        };

        if attempt.status.is_terminal() || attempt.status == charge.status {
            tracing::debug!(
                charge_id,
                stored = %attempt.status,
                fetched = %charge.status,
                "Duplicate delivery, nothing to apply"
            );
            return Ok(Reconciliation {
                access_granted: false,
                status: attempt.status,
            });
        }

        // The store applies the change only if the row is still non-terminal,
        // so two deliveries racing past the check above cannot both win.
        let applied = self.store.advance_status(charge_id, charge.status).await?;
        if !applied {
            return Ok(Reconciliation {
                access_granted: false,
                status: charge.status,
            });
        }

        if charge.status == PaymentStatus::Succeeded {
            self.store.grant_access(attempt.user_id).await?;
            tracing::info!(
                charge_id,
                user_id = %attempt.user_id,
                tier = ?attempt.tier,
                "Payment succeeded, access granted"
            );
            self.notify_unlocked(&attempt).await;
            return Ok(Reconciliation {
                access_granted: true,
                status: charge.status,
            });
        }

        tracing::info!(charge_id, status = %charge.status, "Status recorded");
        Ok(Reconciliation {
            access_granted: false,
            status: charge.status,
        })
    }

    /// Payment history for a user, newest first
    pub async fn list_payments(&self, user: UserId) -> Result<Vec<PaymentAttempt>> {
        Ok(self.store.attempts_for_user(user).await?)
    }

    /// One tier-specific unlock message per successful reconciliation.
    ///
    /// Delivery failure is logged, not propagated: failing the webhook now
    /// would only trigger a redelivery that lands in the duplicate no-op
    /// path, so the log line (charge id + user id) is the replay handle.
    async fn notify_unlocked(&self, attempt: &PaymentAttempt) {
        let message = self
            .content
            .unlock_message(attempt.tier, &self.config.access_link);
        let chat = ChatId::from(attempt.user_id);

        for photo in &message.photos {
            if let Err(e) = self
                .chat
                .send_photo(chat, &MediaRef::Url(photo.clone()), None)
                .await
            {
                tracing::warn!(
                    charge_id = %attempt.charge_id,
                    user_id = %attempt.user_id,
                    error = %e,
                    "Unlock photo delivery failed"
                );
            }
        }

        if let Err(e) = self.chat.send_message(chat, &message.text, None).await {
            tracing::error!(
                charge_id = %attempt.charge_id,
                user_id = %attempt.user_id,
                error = %e,
                "Unlock notification failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use glow_core::{InlineKeyboard, Result as CoreResult};
    use glow_store::MemoryStore;

    use super::*;
    use crate::gateway::Charge;

    /// Provider stub: scripted statuses, generated charge ids
    #[derive(Default)]
    struct FakeProvider {
        statuses: Mutex<HashMap<String, PaymentStatus>>,
        created: Mutex<u64>,
        fail_create: bool,
    }

    impl FakeProvider {
        fn failing() -> Self {
            Self {
                fail_create: true,
                ..Self::default()
            }
        }

        fn set_status(&self, charge_id: &str, status: PaymentStatus) {
            self.statuses
                .lock()
                .unwrap()
                .insert(charge_id.into(), status);
        }
    }

    #[async_trait]
    impl PaymentProvider for FakeProvider {
        async fn create_charge(&self, _request: &NewCharge) -> Result<Charge> {
            if self.fail_create {
                return Err(PaymentError::GatewayUnavailable("503".into()));
            }
            let mut created = self.created.lock().unwrap();
            *created += 1;
            let id = format!("charge-{created}");
            self.statuses
                .lock()
                .unwrap()
                .insert(id.clone(), PaymentStatus::Pending);
            Ok(Charge {
                id,
                status: PaymentStatus::Pending,
                confirmation_url: Some("https://pay.example/checkout".into()),
            })
        }

        async fn get_charge(&self, charge_id: &str) -> Result<Charge> {
            let statuses = self.statuses.lock().unwrap();
            let status = statuses
                .get(charge_id)
                .copied()
                .ok_or_else(|| PaymentError::UnknownAttempt(charge_id.into()))?;
            Ok(Charge {
                id: charge_id.into(),
                status,
                confirmation_url: None,
            })
        }
    }

    /// Chat stub recording every delivered text
    #[derive(Default)]
    struct RecordingChat {
        messages: Mutex<Vec<(ChatId, String)>>,
    }

    #[async_trait]
    impl ChatGateway for RecordingChat {
        async fn send_message(
            &self,
            chat: ChatId,
            text: &str,
            _keyboard: Option<&InlineKeyboard>,
        ) -> CoreResult<()> {
            self.messages.lock().unwrap().push((chat, text.into()));
            Ok(())
        }

        async fn send_photo(
            &self,
            _chat: ChatId,
            _photo: &MediaRef,
            _caption: Option<&str>,
        ) -> CoreResult<()> {
            Ok(())
        }

        async fn send_video(
            &self,
            _chat: ChatId,
            _video: &MediaRef,
            _caption: Option<&str>,
            _keyboard: Option<&InlineKeyboard>,
            _protect: bool,
        ) -> CoreResult<()> {
            Ok(())
        }

        async fn answer_callback(&self, _callback_id: &str) -> CoreResult<()> {
            Ok(())
        }
    }

    fn content() -> ContentStore {
        ContentStore::from_catalog(
            serde_json::from_value(serde_json::json!({
                "start_message": { "text": "hi" },
                "video_lesson": { "video_url": "https://cdn.example/l.mp4", "caption": "lesson" },
                "post_2": { "text": "p2" },
                "post_3": { "text": "p3" },
                "post_4": { "text": "p4" },
                "tariff_message": { "text": "tiers" },
                "after_payment_tariff_1": { "text": "tier 1 welcome: {access_link}" },
                "after_payment_tariff_2": { "text": "tier 2 welcome: {access_link}" }
            }))
            .unwrap(),
        )
    }

    struct Fixture {
        workflow: PaymentWorkflow,
        store: Arc<MemoryStore>,
        provider: Arc<FakeProvider>,
        chat: Arc<RecordingChat>,
    }

    fn fixture_with(provider: FakeProvider) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(provider);
        let chat = Arc::new(RecordingChat::default());
        let workflow = PaymentWorkflow::new(
            store.clone(),
            provider.clone(),
            chat.clone(),
            Arc::new(content()),
            WorkflowConfig {
                return_url: "https://t.me/glow_bot".into(),
                access_link: "https://t.me/+secret".into(),
            },
        );
        Fixture {
            workflow,
            store,
            provider,
            chat,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(FakeProvider::default())
    }

    async fn ensure_buyer(fx: &Fixture, id: i64) -> UserId {
        let user = fx
            .store
            .ensure_user(UserId(id), &Default::default())
            .await
            .unwrap();
        user.id
    }

    #[tokio::test]
    async fn test_create_charge_records_pending_attempt() {
        let fx = fixture();
        let buyer = ensure_buyer(&fx, 1).await;

        let created = fx
            .workflow
            .create_charge(buyer, Tier::Mentored)
            .await
            .unwrap();

        assert_eq!(created.attempt.amount_rub, 5000);
        assert_eq!(created.attempt.status, PaymentStatus::Pending);
        assert_eq!(created.confirmation_url, "https://pay.example/checkout");
        let stored = fx
            .store
            .attempt(&created.attempt.charge_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.tier, Tier::Mentored);
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_no_ledger_row() {
        let fx = fixture_with(FakeProvider::failing());
        let buyer = ensure_buyer(&fx, 1).await;

        let result = fx.workflow.create_charge(buyer, Tier::SelfPaced).await;
        assert!(matches!(result, Err(PaymentError::GatewayUnavailable(_))));
        assert!(fx.workflow.list_payments(buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_succeeded_reconcile_grants_access_and_notifies() {
        let fx = fixture();
        let buyer = ensure_buyer(&fx, 1).await;
        let created = fx
            .workflow
            .create_charge(buyer, Tier::Mentored)
            .await
            .unwrap();
        let charge_id = created.attempt.charge_id;

        fx.provider.set_status(&charge_id, PaymentStatus::Succeeded);
        let outcome = fx.workflow.reconcile(&charge_id).await.unwrap();

        assert!(outcome.access_granted);
        assert_eq!(outcome.status, PaymentStatus::Succeeded);
        assert!(fx.store.user(buyer).await.unwrap().unwrap().has_access);

        let messages = fx.chat.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1, "tier 2 welcome: https://t.me/+secret");
    }

    #[tokio::test]
    async fn test_duplicate_delivery_notifies_once() {
        let fx = fixture();
        let buyer = ensure_buyer(&fx, 1).await;
        let created = fx
            .workflow
            .create_charge(buyer, Tier::SelfPaced)
            .await
            .unwrap();
        let charge_id = created.attempt.charge_id;
        fx.provider.set_status(&charge_id, PaymentStatus::Succeeded);

        let first = fx.workflow.reconcile(&charge_id).await.unwrap();
        let second = fx.workflow.reconcile(&charge_id).await.unwrap();

        assert!(first.access_granted);
        assert!(!second.access_granted);
        assert_eq!(second.status, PaymentStatus::Succeeded);
        assert_eq!(fx.chat.messages.lock().unwrap().len(), 1);
        let stored = fx.store.attempt(&charge_id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_waiting_for_capture_then_succeeded() {
        let fx = fixture();
        let buyer = ensure_buyer(&fx, 1).await;
        let created = fx
            .workflow
            .create_charge(buyer, Tier::SelfPaced)
            .await
            .unwrap();
        let charge_id = created.attempt.charge_id;

        fx.provider
            .set_status(&charge_id, PaymentStatus::WaitingForCapture);
        let held = fx.workflow.reconcile(&charge_id).await.unwrap();
        assert!(!held.access_granted);
        assert_eq!(held.status, PaymentStatus::WaitingForCapture);
        assert!(!fx.store.user(buyer).await.unwrap().unwrap().has_access);

        fx.provider.set_status(&charge_id, PaymentStatus::Succeeded);
        let captured = fx.workflow.reconcile(&charge_id).await.unwrap();
        assert!(captured.access_granted);
        assert_eq!(fx.chat.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_canceled_reconcile_grants_nothing() {
        let fx = fixture();
        let buyer = ensure_buyer(&fx, 1).await;
        let created = fx
            .workflow
            .create_charge(buyer, Tier::SelfPaced)
            .await
            .unwrap();
        let charge_id = created.attempt.charge_id;

        fx.provider.set_status(&charge_id, PaymentStatus::Canceled);
        let outcome = fx.workflow.reconcile(&charge_id).await.unwrap();

        assert!(!outcome.access_granted);
        assert_eq!(outcome.status, PaymentStatus::Canceled);
        assert!(!fx.store.user(buyer).await.unwrap().unwrap().has_access);
        assert!(fx.chat.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_cancellation_cannot_regress_success() {
        let fx = fixture();
        let buyer = ensure_buyer(&fx, 1).await;
        let created = fx
            .workflow
            .create_charge(buyer, Tier::SelfPaced)
            .await
            .unwrap();
        let charge_id = created.attempt.charge_id;

        fx.provider.set_status(&charge_id, PaymentStatus::Succeeded);
        fx.workflow.reconcile(&charge_id).await.unwrap();

        // a stale delivery claims the charge was canceled
        fx.provider.set_status(&charge_id, PaymentStatus::Canceled);
        let outcome = fx.workflow.reconcile(&charge_id).await.unwrap();

        assert!(!outcome.access_granted);
        assert_eq!(outcome.status, PaymentStatus::Succeeded);
        let stored = fx.store.attempt(&charge_id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_unknown_charge_is_an_error() {
        let fx = fixture();
        fx.provider.set_status("foreign", PaymentStatus::Succeeded);

        let result = fx.workflow.reconcile("foreign").await;
        assert!(matches!(result, Err(PaymentError::UnknownAttempt(_))));
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let fx = fixture();
        let buyer = ensure_buyer(&fx, 1).await;
        let first = fx
            .workflow
            .create_charge(buyer, Tier::SelfPaced)
            .await
            .unwrap();
        let second = fx
            .workflow
            .create_charge(buyer, Tier::Mentored)
            .await
            .unwrap();

        let history = fx.workflow.list_payments(buyer).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].charge_id, second.attempt.charge_id);
        assert_eq!(history[1].charge_id, first.attempt.charge_id);
    }
}
