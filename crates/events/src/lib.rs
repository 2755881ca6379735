//! Domain events and the envelope they are persisted in.

mod envelope;
mod event;

pub use envelope::EventEnvelope;
pub use event::Event;
