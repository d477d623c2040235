//! Entity structs for all Strata domain objects.
//!
//! Each entity maps to a table in the libSQL database. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema` for JSON output and JSONL
//! import.

mod candidate;
mod digest;
mod item;
mod queue_item;
mod synthesis;

pub use candidate::{NewCandidate, SynthesisCandidate};
pub use digest::Digest;
pub use item::{EmbeddedItem, Item, NewItem};
pub use queue_item::{NewQueueItem, QueueItem};
pub use synthesis::{DevelopedSynthesis, SynthesisDraft};
