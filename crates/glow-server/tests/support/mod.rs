//! Shared fixtures: memory-backed state, a scripted provider and a
//! recording chat gateway wired into the real router.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;

use glow_core::{
    ChatGateway, ChatId, ContentStore, InlineKeyboard, MediaRef, PaymentStatus,
    Result as CoreResult,
};
use glow_payments::{
    Charge, NewCharge, PaymentError, PaymentProvider, PaymentWorkflow, Result as PaymentResult,
    SIGNATURE_HEADER, WorkflowConfig, sign_payload,
};
use glow_server::{router, state::AppState};
use glow_store::MemoryStore;

pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const ACCESS_LINK: &str = "https://t.me/+secret";

/// Provider stub with scripted charge statuses
#[derive(Default)]
pub struct FakeProvider {
    statuses: Mutex<HashMap<String, PaymentStatus>>,
    fetches: Mutex<u32>,
}

impl FakeProvider {
    pub fn set_status(&self, charge_id: &str, status: PaymentStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(charge_id.into(), status);
    }

    pub fn fetch_count(&self) -> u32 {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_charge(&self, _request: &NewCharge) -> PaymentResult<Charge> {
        Err(PaymentError::GatewayUnavailable("not scripted".into()))
    }

    async fn get_charge(&self, charge_id: &str) -> PaymentResult<Charge> {
        *self.fetches.lock().unwrap() += 1;
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
pub struct RecordingChat {
    messages: Mutex<Vec<(ChatId, String)>>,
}

impl RecordingChat {
    pub fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
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
        .expect("sample catalogue"),
    )
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeProvider>,
    pub chat: Arc<RecordingChat>,
}

pub fn build_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(FakeProvider::default());
    let chat = Arc::new(RecordingChat::default());

    let workflow = Arc::new(PaymentWorkflow::new(
        store.clone(),
        provider.clone(),
        chat.clone(),
        Arc::new(content()),
        WorkflowConfig {
            return_url: "https://t.me/glow_bot".into(),
            access_link: ACCESS_LINK.into(),
        },
    ));

    TestApp {
        app: router(AppState::new(workflow, WEBHOOK_SECRET)),
        store,
        provider,
        chat,
    }
}

/// A correctly signed webhook POST
pub fn signed_webhook(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook/payment")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, sign_payload(WEBHOOK_SECRET, body.as_bytes()))
        .body(Body::from(body.to_owned()))
        .expect("request")
}
