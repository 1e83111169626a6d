//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the external seams - the
//! provider adapter and the media engine - allowing comprehensive pipeline
//! testing without real services or a real ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelforge_core::testing::{MockMediaEngine, MockProvider};
//!
//! let provider = MockProvider::new("mock");
//! let engine = MockMediaEngine::new();
//!
//! // Configure behavior
//! provider.enqueue_unavailable("503").await;
//! provider.enqueue_success(2).await;
//! engine.fail_step("mux", "disk full").await;
//! ```

mod mock_engine;
mod mock_provider;

pub use mock_engine::{MockMediaEngine, RecordedOperation};
pub use mock_provider::MockProvider;
