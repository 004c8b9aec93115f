pub mod codec;
pub mod error;
pub mod forces;
pub mod id;
pub mod model;
pub mod simulation;

pub use codec::{BlobStore, MemoryStore, Persistence, STORAGE_KEY, decode, encode};
pub use error::GraphError;
pub use id::NodeId;
pub use model::*;
pub use simulation::{ForceSimulation, SimulationConfig, Viewport};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::stable_graph::NodeIndex;
