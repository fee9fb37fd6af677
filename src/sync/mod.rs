//! Event plumbing between a screen's range and its data fetches

pub mod broadcaster;
pub mod scheduler;

pub use broadcaster::{Broadcaster, Subscription};
pub use scheduler::FetchScheduler;
