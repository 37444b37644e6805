//! Resilient HTTP delivery
//!
//! One [`DeliveryClient`] per outbound call: bounded retries with a fixed
//! wait, interruptible through a shared [`StopToken`].

mod client;
mod options;
mod stop;

pub use client::DeliveryClient;
pub use options::{ClientOptions, RestMethod, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT};
pub use stop::StopToken;
