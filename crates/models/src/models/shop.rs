use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Status of a shop order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

/// A product in the studio shop
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock_quantity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A customer order placed through the shop
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Order {
    pub id: String,
    pub user_id: Option<String>,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}
