//! Command handlers for the lexrag CLI.

pub mod ask;
pub mod batch;
pub mod eval;
pub mod index;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use batch::BatchCommand;
pub use eval::EvalCommand;
pub use index::IndexCommand;
