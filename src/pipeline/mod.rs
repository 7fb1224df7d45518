//! Decode → classify → extract → assemble, plus the background poller
//! that drives it against a mail source.

pub mod poller;
pub mod processor;

pub use poller::{MailSource, PollStats, spawn_poller};
pub use processor::Pipeline;
