//! The reasoning loop and turn controller for Persanna.
//!
//! A turn follows a **Decide → Act → Observe** cycle:
//!
//! 1. **Receive** a user message from the host
//! 2. **Build context**: persona prompt, memory window, tool list
//! 3. **Ask the model** for its next step
//! 4. **If a tool is requested**: run it, append the observation, go to 3
//! 5. **If a final answer**: append it to the session log and return it
//!
//! The loop stops on a final answer, or fails when the iteration budget or
//! the wall-clock budget runs out.

pub mod accountant;
pub mod context;
pub mod executor;
pub mod parser;
pub mod prompt;
pub mod turn;

#[cfg(test)]
mod test_helpers;

pub use accountant::{MeteredProvider, UsageAccountant};
pub use context::{MemoryWindow, TraceEntry, TraceKind, Transcript, WindowSettings};
pub use executor::{AgentExecutor, ExecutorOutput};
pub use parser::{AgentStep, ToolInvocation};
pub use turn::{TurnController, TurnOutcome, TurnResult};
