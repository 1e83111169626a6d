//! Generation provider abstraction.
//!
//! This module provides the `ProviderAdapter` trait wrapping one external
//! generative-media service (submit a job, poll it, cancel it, download its
//! result) together with the concrete adapters:
//!
//! - `PiapiProvider` - PiAPI task queue fronting hosted video models
//! - `VeoProvider` - Veo-style bearer-token API, tolerates inline results
//! - `PlaceholderProvider` - deterministic local clip synthesis, the
//!   guaranteed tail of every provider chain
//!
//! Adapters carry their own polling interval and deadline; the tracker and
//! fallback layers are provider-agnostic.

mod http;
mod piapi;
mod placeholder;
mod traits;
mod types;
mod veo;

pub use piapi::{PiapiConfig, PiapiProvider};
pub use placeholder::{PlaceholderConfig, PlaceholderProvider, PLACEHOLDER_PROVIDER_NAME};
pub use traits::ProviderAdapter;
pub use types::{
    AspectRatio, GenerationRequest, PollStatus, ProviderError, SubmitAck, Transition,
};
pub use veo::{VeoConfig, VeoProvider};
