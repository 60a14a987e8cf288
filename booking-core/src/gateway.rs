//! Payment gateway adapter seam
//!
//! The gateway itself is an external collaborator: this core hands it an
//! opaque charge token and gets back an external transaction id. Gateway
//! failures are infrastructure errors, not business errors; they leave the
//! reservation PENDING so confirmation can be retried.

use crate::types::Currency;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Charge request forwarded to the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    /// Amount to charge
    pub amount: Decimal,

    /// Charge currency
    pub currency: Currency,

    /// Free-form description shown on the customer's statement
    pub description: String,

    /// Opaque charge token obtained by the client
    pub token: String,
}

/// Gateway-side failure (network, declined charge, etc.)
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct GatewayError(pub String);

impl From<GatewayError> for crate::Error {
    fn from(err: GatewayError) -> Self {
        crate::Error::Gateway(err.0)
    }
}

/// External payment gateway
pub trait PaymentGateway: Send + Sync {
    /// Charge a token; returns the external transaction id on success
    fn charge(&self, request: &ChargeRequest) -> Result<String, GatewayError>;
}

/// Always-approve gateway for tests and the server stub.
///
/// Fabricates transaction ids; never touches a real payment rail.
#[derive(Default)]
pub struct SandboxGateway;

impl SandboxGateway {
    /// Create a sandbox gateway
    pub fn new() -> Self {
        Self
    }
}

impl PaymentGateway for SandboxGateway {
    fn charge(&self, request: &ChargeRequest) -> Result<String, GatewayError> {
        tracing::debug!(
            amount = %request.amount,
            currency = %request.currency,
            "Sandbox charge approved"
        );
        Ok(format!("ch_sandbox_{}", Uuid::now_v7().simple()))
    }
}

/// Always-failing gateway for exercising the retry path in tests
#[derive(Default)]
pub struct FailingGateway;

impl PaymentGateway for FailingGateway {
    fn charge(&self, _request: &ChargeRequest) -> Result<String, GatewayError> {
        Err(GatewayError("gateway unreachable".to_string()))
    }
}
