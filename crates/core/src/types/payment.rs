//! Stripe payment types.
//!
//! These mirror the subset of Stripe objects the checkout flow consumes: the
//! payment intent returned by the backend and the result of confirming it
//! with the Stripe payment element. No payment logic lives here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, PaymentIntentId};

/// ISO 4217 currency codes accepted at checkout.
///
/// Stripe expects lowercase codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
}

impl Currency {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Usd | Self::Cad | Self::Aud => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
        }
    }

    /// Uppercase ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
        }
    }
}

/// An amount in the currency's smallest unit (cents for USD), as Stripe
/// represents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: Currency,
}

impl Money {
    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_minor_units(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// The amount in the currency's standard unit (dollars, not cents).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.amount, 2)
    }

    /// Format for display, e.g. `$19.99`.
    #[must_use]
    pub fn display(self) -> String {
        format!("{}{:.2}", self.currency.symbol(), self.to_decimal())
    }
}

/// Lifecycle status of a Stripe `PaymentIntent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
}

impl PaymentIntentStatus {
    /// Whether the intent can no longer change state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Canceled)
    }
}

/// A Stripe `PaymentIntent` as relayed by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    /// Secret handed to the payment element; never log it.
    pub client_secret: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: Currency,
    pub status: PaymentIntentStatus,
    /// Creation time (Unix seconds on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
}

impl PaymentIntent {
    /// The intent amount with its currency.
    #[must_use]
    pub const fn money(&self) -> Money {
        Money::from_minor_units(self.amount, self.currency)
    }
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("id", &self.id)
            .field("client_secret", &"[REDACTED]")
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("status", &self.status)
            .field("created", &self.created)
            .finish()
    }
}

/// Body sent to the backend to open a payment intent for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub order_id: OrderId,
    pub amount: i64,
    pub currency: Currency,
}

/// Error object returned by Stripe.js when confirmation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeError {
    /// Error category, e.g. `card_error` or `validation_error`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decline_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Raw result of `stripe.confirmPayment`: exactly one side is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent: Option<PaymentIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StripeError>,
}

/// What the checkout page should do after confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded(PaymentIntentId),
    Processing(PaymentIntentId),
    /// Further customer action (3-D Secure, new card) is needed.
    RequiresAction(PaymentIntentId),
    Failed(StripeError),
}

impl From<ConfirmPaymentResult> for PaymentOutcome {
    fn from(result: ConfirmPaymentResult) -> Self {
        if let Some(error) = result.error {
            return Self::Failed(error);
        }

        let Some(intent) = result.payment_intent else {
            return Self::Failed(StripeError {
                kind: "api_error".to_owned(),
                code: None,
                decline_code: None,
                message: Some("Stripe returned neither a payment intent nor an error".to_owned()),
            });
        };

        match intent.status {
            PaymentIntentStatus::Succeeded | PaymentIntentStatus::RequiresCapture => {
                Self::Succeeded(intent.id)
            }
            PaymentIntentStatus::Processing => Self::Processing(intent.id),
            PaymentIntentStatus::RequiresAction
            | PaymentIntentStatus::RequiresConfirmation
            | PaymentIntentStatus::RequiresPaymentMethod => Self::RequiresAction(intent.id),
            PaymentIntentStatus::Canceled => Self::Failed(StripeError {
                kind: "invalid_request_error".to_owned(),
                code: Some("payment_intent_canceled".to_owned()),
                decline_code: None,
                message: Some("The payment was canceled".to_owned()),
            }),
        }
    }
}
