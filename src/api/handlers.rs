//! Route handlers for goods, sales and wallets.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::{Validate, ValidationError};

use super::{error::ApiError, extract::ValidatedJson, AppState};
use crate::domain::aggregates::Good;
use crate::domain::events::SaleEvent;
use crate::domain::value_objects::{check_money, Amount, GoodName, Price, Stock};
use crate::store::WalletUpdate;

/// Upper bound on goods returned by the listing.
pub const GOODS_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Serialize)]
pub struct GoodSummary {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct GoodDetails {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: String,
    pub count: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddGoodRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(custom = "money")]
    pub price: Decimal,
    #[validate(range(min = 0, max = 2147483647))]
    pub count: i64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaleRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub good_name: String,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_balance: Decimal,
    pub purchased_item: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WalletTransaction {
    #[validate(custom = "money")]
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct WalletView {
    pub username: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

fn money(value: &Decimal) -> Result<(), ValidationError> {
    check_money(*value).map_err(|e| {
        let mut err = ValidationError::new("money");
        err.message = Some(e.to_string().into());
        err
    })
}

fn wallet_view(username: String, update: WalletUpdate) -> Result<Json<WalletView>, ApiError> {
    match update {
        WalletUpdate::Applied(balance) => Ok(Json(WalletView { username, balance: balance.amount() })),
        WalletUpdate::NotFound => Err(ApiError::not_found("User not found")),
        WalletUpdate::InsufficientFunds => Err(ApiError::bad_request("Insufficient balance")),
        WalletUpdate::LimitExceeded => Err(ApiError::bad_request("Balance limit exceeded")),
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "storefront-sales"}))
}

pub async fn list_goods(State(s): State<AppState>) -> Result<Json<Vec<GoodSummary>>, ApiError> {
    let goods = s.store.list_goods_in_stock(GOODS_PAGE_LIMIT).await?;
    Ok(Json(goods.iter().map(|g| GoodSummary { name: g.name().to_string(), price: g.price().amount() }).collect()))
}

pub async fn get_good(State(s): State<AppState>, Path(name): Path<String>) -> Result<Json<GoodDetails>, ApiError> {
    let good = s.store.find_good(&name).await?.ok_or_else(|| ApiError::not_found("Good not found"))?;
    Ok(Json(GoodDetails {
        name: good.name().to_string(),
        price: good.price().amount(),
        description: good.description().unwrap_or_default().to_string(),
        count: good.count().value(),
    }))
}

pub async fn add_good(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<AddGoodRequest>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = GoodName::new(r.name).map_err(|e| ApiError::validation(e.to_string()))?;
    let price = Price::new(r.price).map_err(|e| ApiError::validation(e.to_string()))?;
    let count = u32::try_from(r.count).map(Stock::new).map_err(|_| ApiError::validation("count out of range"))?;
    let good = Good::new(name, price, count, r.description);
    if !s.store.insert_good(&good).await? {
        return Err(ApiError::bad_request("Good already exists"));
    }
    tracing::info!(good = %good.name(), count = count.value(), "good added");
    Ok((StatusCode::CREATED, Json(json!({"message": "Good added successfully"}))))
}

pub async fn make_sale(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<SaleRequest>) -> Result<Json<SaleResponse>, ApiError> {
    let receipt = s.sales.process_sale(&r.username, &r.good_name).await?;
    if let Some(nats) = &s.nats {
        publish(nats, &receipt.event).await;
    }
    Ok(Json(SaleResponse {
        message: receipt.message,
        remaining_balance: receipt.remaining_balance,
        purchased_item: receipt.purchased_item,
    }))
}

pub async fn get_wallet(State(s): State<AppState>, Path(username): Path<String>) -> Result<Json<WalletView>, ApiError> {
    let wallet = s.store.find_wallet(&username).await?.ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(WalletView { username: wallet.username().to_string(), balance: wallet.balance().amount() }))
}

pub async fn add_to_wallet(
    State(s): State<AppState>,
    Path(username): Path<String>,
    ValidatedJson(r): ValidatedJson<WalletTransaction>,
) -> Result<Json<WalletView>, ApiError> {
    let amount = Amount::new(r.amount).map_err(|e| ApiError::validation(e.to_string()))?;
    let update = s.store.credit_wallet(&username, amount).await?;
    tracing::info!(%username, amount = %amount.value(), ?update, "wallet credit");
    wallet_view(username, update)
}

pub async fn deduct_from_wallet(
    State(s): State<AppState>,
    Path(username): Path<String>,
    ValidatedJson(r): ValidatedJson<WalletTransaction>,
) -> Result<Json<WalletView>, ApiError> {
    let amount = Amount::new(r.amount).map_err(|e| ApiError::validation(e.to_string()))?;
    let update = s.store.debit_wallet(&username, amount).await?;
    tracing::info!(%username, amount = %amount.value(), ?update, "wallet debit");
    wallet_view(username, update)
}

// A sale stays committed whether or not its event goes out.
async fn publish(nats: &async_nats::Client, event: &SaleEvent) {
    let payload = match serde_json::to_vec(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode sale event");
            return;
        }
    };
    if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
        tracing::warn!(error = %e, subject = event.subject(), "failed to publish sale event");
    }
}
