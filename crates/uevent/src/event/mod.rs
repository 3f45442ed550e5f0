//! Events: the arity-independent [`EventBase`] and the typed [`Event`].

mod base;
mod signature;
mod typed;

pub use base::EventBase;
pub use signature::{EventContext, EventSignature, Signature};
pub use typed::{Event, Event0, Event1, Event2, Event3, Event4};
