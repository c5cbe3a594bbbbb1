//! Domain models for the Stockroom inventory backend

mod item;
mod movement;
mod notification;
mod request;
mod user;

pub use item::*;
pub use movement::*;
pub use notification::*;
pub use request::*;
pub use user::*;

#[cfg(test)]
pub(crate) use item::sample_item;
#[cfg(test)]
pub(crate) use movement::sample_inbound;
#[cfg(test)]
pub(crate) use request::sample_request;
