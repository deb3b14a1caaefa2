//! Generation gateway: prompts, backend calls under deadline and retry, and
//! normalization of what comes back.

pub mod extract;
pub mod gateway;
pub mod normalize;
pub mod prompt;
pub mod request;

pub use extract::{ClaimReport, NO_ONE, VoteReport, WITHHELD};
pub use gateway::{GatewaySettings, GenerationGateway};
pub use normalize::normalize_text;
pub use request::{DirectedMessage, Generated, GenerationRequest, RequestKind};
