//! Checkout and discount validation endpoints. Codes are stored uppercase;
//! lookups normalize the submitted code first.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::checkout::client::SessionRequest;
use crate::checkout::discount::{apply_discount, code_valid};
use crate::errors::AppError;
use crate::models::discount::DiscountCodeRow;
use crate::state::AppState;

async fn lookup_code(db: &PgPool, raw: &str) -> Result<DiscountCodeRow, AppError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::Validation("discount code is empty".to_string()));
    }
    sqlx::query_as("SELECT * FROM discount_codes WHERE code = $1")
        .bind(&code)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Discount code {code} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Discount validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub code: String,
    pub product: String,
    pub amount_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    pub code: String,
    pub percent_off: i32,
    pub discount_amount_cents: i64,
    pub final_amount_cents: i64,
    pub bonus_credits: i32,
}

/// POST /api/discount/validate
pub async fn handle_validate_discount(
    State(state): State<AppState>,
    Json(req): Json<DiscountRequest>,
) -> Result<Json<DiscountResponse>, AppError> {
    if req.amount_cents <= 0 {
        return Err(AppError::Validation(
            "amount_cents must be positive".to_string(),
        ));
    }

    let row = lookup_code(&state.db, &req.code).await?;
    code_valid(&row, &req.product, Utc::now()).map_err(AppError::Validation)?;

    let discount_amount_cents = apply_discount(req.amount_cents, row.percent_off);
    Ok(Json(DiscountResponse {
        code: row.code,
        percent_off: row.percent_off,
        discount_amount_cents,
        final_amount_cents: req.amount_cents - discount_amount_cents,
        bonus_credits: row.bonus_credits,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Checkout session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub product: String,
    pub amount_cents: i64,
    pub discount_code: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub session_url: String,
    /// Amount actually sent to the provider, after any discount.
    pub amount_cents: i64,
    pub bonus_credits: i32,
}

/// POST /api/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    if req.product.trim().is_empty() {
        return Err(AppError::Validation("product is required".to_string()));
    }
    if req.amount_cents <= 0 {
        return Err(AppError::Validation(
            "amount_cents must be positive".to_string(),
        ));
    }

    let mut amount_cents = req.amount_cents;
    let mut bonus_credits = 0;
    if let Some(code) = req.discount_code.as_deref().filter(|c| !c.trim().is_empty()) {
        let row = lookup_code(&state.db, code).await?;
        code_valid(&row, &req.product, Utc::now()).map_err(AppError::Validation)?;
        amount_cents -= apply_discount(amount_cents, row.percent_off);
        bonus_credits = row.bonus_credits;
    }

    let session = state
        .payments
        .create_session(&SessionRequest {
            product: &req.product,
            amount_cents,
            success_url: req.success_url.as_deref(),
            cancel_url: req.cancel_url.as_deref(),
        })
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    info!(
        "Created checkout session {} for {} at {amount_cents} cents",
        session.session_id, req.product
    );

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        session_url: session.session_url,
        amount_cents,
        bonus_credits,
    }))
}
