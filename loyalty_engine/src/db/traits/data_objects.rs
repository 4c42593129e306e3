use crate::db_types::Order;

#[derive(Debug, Clone, PartialEq)]
pub enum InsertOrderResult {
    Inserted(Order),
    /// The same account already submitted this order number.
    AlreadyExists(Order),
}

impl InsertOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            InsertOrderResult::Inserted(o) => o,
            InsertOrderResult::AlreadyExists(o) => o,
        }
    }
}
