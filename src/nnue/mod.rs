//! Efficiently updatable neural network evaluation (spec.md §4.E).

pub mod accumulator;
pub mod finny;
pub mod network;
pub mod stack;
pub mod update;

pub use accumulator::Accumulator;
pub use network::NnueNetwork;
pub use stack::AccumulatorStack;
pub use update::NnueUpdate;
