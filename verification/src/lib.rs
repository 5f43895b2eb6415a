//! Wallet ownership verification.
//!
//! An identity proves control of a wallet by placing a normal on-chain
//! order whose share count equals a one-time signal code issued here.
//! The webhook pipeline validates incoming trade notifications layer by
//! layer (schema, on-chain truth, replay, challenge match, ownership)
//! and commits the verification atomically.

pub mod challenge;
pub mod error;
pub mod outcomes;
pub mod pipeline;
pub mod schema;

pub use challenge::{ChallengeConfig, ChallengeService, IssuedChallenge};
pub use error::{ChallengeError, PipelineError};
pub use outcomes::{Outcome, RejectReason};
pub use pipeline::{BatchSummary, VerificationPipeline};
pub use schema::{ClaimedTransfer, RawNotification, SchemaError};
