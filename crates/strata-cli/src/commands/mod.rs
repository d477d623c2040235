pub mod digest;
pub mod dispatch;
pub mod embed;
pub mod item;
pub mod queue;
pub mod synthesis;

pub use dispatch::dispatch;
