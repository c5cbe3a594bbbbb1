//! Business logic services for the Stockroom inventory backend

pub mod audit;
pub mod inbound;
pub mod item;
pub mod notification;
pub mod outbound;
pub mod request;

pub use inbound::InboundService;
pub use item::ItemService;
pub use notification::{NotificationService, Notifier};
pub use outbound::OutboundService;
pub use request::RequestService;
