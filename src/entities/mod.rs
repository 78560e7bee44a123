//! Entity types - orders, order lines and reference rows

pub mod order;
pub mod reference;

pub use order::{
    format_timestamp, InvalidOrder, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus,
    ORDER_PREFIX, TIMESTAMP_FORMAT,
};
pub use reference::{same_text, ReferenceItem};
