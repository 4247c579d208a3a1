//! Read-only order queries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use orderflow_store::OrderStore;
use orderflow_types::{AppResponse, OrderId, OrderRecord, PartyId, constants};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-facing view of a committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub title: String,
    pub supplier_id: PartyId,
    pub consumer_id: PartyId,
    pub price: Decimal,
    pub processing_start_at: DateTime<Utc>,
    pub processing_end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Time spent in the processing delay and recheck.
    pub processing_ms: i64,
}

impl From<OrderRecord> for OrderView {
    fn from(record: OrderRecord) -> Self {
        let processing_ms = record.processing_time().num_milliseconds();
        Self {
            id: record.id,
            title: record.title,
            supplier_id: record.supplier_id,
            consumer_id: record.consumer_id,
            price: record.price,
            processing_start_at: record.processing_start_at,
            processing_end_at: record.processing_end_at,
            created_at: record.created_at,
            processing_ms,
        }
    }
}

pub struct OrderQueries {
    orders: Arc<dyn OrderStore>,
}

impl OrderQueries {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    pub async fn get(&self, id: OrderId) -> AppResponse<OrderView> {
        match self.orders.find_order(id).await {
            Ok(Some(record)) => AppResponse::ok(record.into(), constants::SUCCESS_MESSAGE),
            Ok(None) => {
                tracing::warn!(order_id = %id, "Order not found");
                AppResponse::fail(constants::ORDER_NOT_FOUND_MESSAGE)
            }
            Err(err) => {
                tracing::error!(order_id = %id, error = %err, "Order lookup failed");
                AppResponse::fail(constants::STORAGE_FAILURE_MESSAGE)
            }
        }
    }

    /// Every committed order, oldest first.
    pub async fn list(&self) -> AppResponse<Vec<OrderView>> {
        match self.orders.all_orders().await {
            Ok(records) => AppResponse::ok(
                records.into_iter().map(OrderView::from).collect(),
                constants::SUCCESS_MESSAGE,
            ),
            Err(err) => {
                tracing::error!(error = %err, "Order listing failed");
                AppResponse::fail(constants::STORAGE_FAILURE_MESSAGE)
            }
        }
    }
}
