//! HTTP handlers

pub mod health;
pub mod inbound;
pub mod item;
pub mod notification;
pub mod outbound;
pub mod request;

pub use health::*;
pub use inbound::*;
pub use item::*;
pub use notification::*;
pub use outbound::*;
pub use request::*;
