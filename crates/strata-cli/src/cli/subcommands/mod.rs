mod digest;
mod embed;
mod item;
mod queue;
mod synthesis;

pub use digest::DigestCommands;
pub use embed::EmbedCommands;
pub use item::ItemCommands;
pub use queue::QueueCommands;
pub use synthesis::{SynthesisCommands, SynthesisRunArgs};
