//! The planning loop.
//!
//! The [`Orchestrator`] drives one request:
//!
//! 1. **Seed** the conversation with the system instruction and the prompt
//! 2. **Ask the model** for its next step, advertising every tool
//! 3. **If a tool call**: dispatch it through the bridge, fold the result
//!    back in with a "Continue." nudge, and ask again
//! 4. **If a final message** (or an error): report it and stop
//!
//! Every step is reported as a [`TraceEvent`](vibeforge_core::TraceEvent)
//! through a [`TraceSink`] as soon as it happens.

pub mod orchestrator;
pub mod sink;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::{Orchestrator, RunOutcome, Termination};
pub use sink::TraceSink;
