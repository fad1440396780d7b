mod bus;
mod events;

pub use bus::{EventBus, Listener, SubscriptionId};
pub use events::*;
