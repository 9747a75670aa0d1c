pub mod compositor;
pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod queue;
pub mod registry;
pub mod storage;
pub mod worker;
