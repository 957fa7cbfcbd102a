mod component;
mod inspector;
mod interaction;
mod render;
mod selection;
mod simulation;
mod snapshot;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use render::Generation;
pub use simulation::SimulationConfig;
pub use snapshot::GraphSnapshot;
pub use types::GraphData;
