//! Order records.

use nevyra_core::UserId;
use nevyra_core::api::OrderRecord;

/// An order and the user who placed it.
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub user_id: UserId,
    pub record: OrderRecord,
}
