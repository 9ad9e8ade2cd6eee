//! Payment Gateway Adapter
//!
//! Thin typed client for the provider's payments API. Authorization is HTTP
//! basic (shop id / secret key); every create carries a fresh
//! `Idempotence-Key` so a retried HTTP call cannot open a second charge.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use glow_core::{PaymentStatus, UserId};

use crate::error::{PaymentError, Result};

const DEFAULT_API_BASE: &str = "https://api.yookassa.ru/v3";

/// Request to open a charge
#[derive(Clone, Debug)]
pub struct NewCharge {
    /// Amount in whole rubles
    pub amount_rub: i64,
    pub currency: String,
    pub description: String,
    /// Where the provider sends the buyer after payment
    pub return_url: String,
    /// Buyer, carried as charge metadata
    pub user_id: UserId,
}

/// A charge as the provider reports it
#[derive(Clone, Debug)]
pub struct Charge {
    pub id: String,
    pub status: PaymentStatus,
    /// Redirect URL for the buyer; present on freshly created charges
    pub confirmation_url: Option<String>,
}

/// Typed surface of the external payment provider
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Open a redirect-confirmation charge
    async fn create_charge(&self, request: &NewCharge) -> Result<Charge>;

    /// Fetch the authoritative state of a charge
    async fn get_charge(&self, charge_id: &str) -> Result<Charge>;
}

/// Provider client configuration
#[derive(Clone, Debug)]
pub struct YookassaConfig {
    /// API base URL (overridable for tests)
    pub api_base: String,
    pub shop_id: String,
    pub secret_key: String,
    pub timeout_secs: u64,
}

impl YookassaConfig {
    pub fn new(shop_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            shop_id: shop_id.into(),
            secret_key: secret_key.into(),
            timeout_secs: 15,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let shop_id = std::env::var("YOOKASSA_SHOP_ID")
            .map_err(|_| PaymentError::Config("YOOKASSA_SHOP_ID not set".into()))?;
        let secret_key = std::env::var("YOOKASSA_SECRET_KEY")
            .map_err(|_| PaymentError::Config("YOOKASSA_SECRET_KEY not set".into()))?;
        let mut config = Self::new(shop_id, secret_key);
        if let Ok(base) = std::env::var("YOOKASSA_API_BASE") {
            config.api_base = base;
        }
        Ok(config)
    }
}

// ---- wire types ------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AmountBody {
    value: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct ConfirmationBody {
    #[serde(rename = "type")]
    kind: &'static str,
    return_url: String,
}

#[derive(Debug, Serialize)]
struct PaymentMethodBody {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct MetadataBody {
    user_id: String,
}

#[derive(Debug, Serialize)]
struct CreatePaymentBody {
    amount: AmountBody,
    payment_method_data: PaymentMethodBody,
    confirmation: ConfirmationBody,
    capture: bool,
    description: String,
    metadata: MetadataBody,
}

#[derive(Debug, Deserialize)]
struct PaymentObject {
    id: String,
    status: String,
    #[serde(default)]
    confirmation: Option<ConfirmationObject>,
}

#[derive(Debug, Deserialize)]
struct ConfirmationObject {
    #[serde(default)]
    confirmation_url: Option<String>,
}

/// Whole rubles to the provider's decimal string
fn format_amount(amount_rub: i64) -> String {
    format!("{amount_rub}.00")
}

fn parse_payment(body: &str) -> Result<Charge> {
    let object: PaymentObject = serde_json::from_str(body)
        .map_err(|e| PaymentError::InvalidResponse(format!("{e}; body={body}")))?;
    let status = PaymentStatus::parse(&object.status).ok_or_else(|| {
        PaymentError::InvalidResponse(format!("unknown status '{}'", object.status))
    })?;
    Ok(Charge {
        id: object.id,
        status,
        confirmation_url: object.confirmation.and_then(|c| c.confirmation_url),
    })
}

/// YooKassa payments API client
pub struct YookassaClient {
    client: reqwest::Client,
    config: YookassaConfig,
}

impl YookassaClient {
    /// Create a new client
    pub fn new(config: YookassaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::Config(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(YookassaConfig::from_env()?)
    }
}

#[async_trait]
impl PaymentProvider for YookassaClient {
    async fn create_charge(&self, request: &NewCharge) -> Result<Charge> {
        let body = CreatePaymentBody {
            amount: AmountBody {
                value: format_amount(request.amount_rub),
                currency: request.currency.clone(),
            },
            payment_method_data: PaymentMethodBody { kind: "bank_card" },
            confirmation: ConfirmationBody {
                kind: "redirect",
                return_url: request.return_url.clone(),
            },
            capture: true,
            description: request.description.clone(),
            metadata: MetadataBody {
                user_id: request.user_id.to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/payments", self.config.api_base))
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .header("Idempotence-Key", uuid::Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(PaymentError::GatewayUnavailable(format!(
                "status={status} body={text}"
            )));
        }

        let charge = parse_payment(&text)?;
        tracing::info!(charge_id = %charge.id, status = %charge.status, "Charge created");
        Ok(charge)
    }

    async fn get_charge(&self, charge_id: &str) -> Result<Charge> {
        let response = self
            .client
            .get(format!("{}/payments/{charge_id}", self.config.api_base))
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .send()
            .await
            .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::UnknownAttempt(charge_id.into()));
        }
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(PaymentError::GatewayUnavailable(format!(
                "status={status} body={text}"
            )));
        }

        parse_payment(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_formatting() {
        assert_eq!(format_amount(3000), "3000.00");
        assert_eq!(format_amount(5000), "5000.00");
    }

    #[test]
    fn test_create_body_shape() {
        let body = CreatePaymentBody {
            amount: AmountBody {
                value: format_amount(3000),
                currency: "RUB".into(),
            },
            payment_method_data: PaymentMethodBody { kind: "bank_card" },
            confirmation: ConfirmationBody {
                kind: "redirect",
                return_url: "https://t.me/glow_bot".into(),
            },
            capture: true,
            description: "Home Glow course, self-paced".into(),
            metadata: MetadataBody {
                user_id: "42".into(),
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["amount"]["value"], "3000.00");
        assert_eq!(value["payment_method_data"]["type"], "bank_card");
        assert_eq!(value["confirmation"]["type"], "redirect");
        assert_eq!(value["capture"], true);
        assert_eq!(value["metadata"]["user_id"], "42");
    }

    #[test]
    fn test_parse_payment_response() {
        let charge = parse_payment(
            r#"{
                "id": "2d9f1b5c-000f-5000-8000-18db351245c7",
                "status": "pending",
                "confirmation": {
                    "type": "redirect",
                    "confirmation_url": "https://yoomoney.ru/checkout/payments/v2/contract"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(charge.id, "2d9f1b5c-000f-5000-8000-18db351245c7");
        assert_eq!(charge.status, PaymentStatus::Pending);
        assert!(charge.confirmation_url.is_some());
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let result = parse_payment(r#"{"id": "x", "status": "refunded"}"#);
        assert!(matches!(result, Err(PaymentError::InvalidResponse(_))));
    }
}
