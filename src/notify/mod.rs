//! Change and error notifications.
//!
//! The scheduler publishes [`ChangeEvent`]s and [`ErrorEvent`]s through two
//! independent [`SubscriberRegistry`] instances.

mod events;
pub mod subscriber;

pub use events::{ChangeEvent, ErrorEvent};
pub use subscriber::{EventStream, SubscriberRegistry, SubscriptionHandle};
