pub mod audit;
pub mod config;
pub mod conflict;
pub mod errors;
pub mod feedback;
pub mod forge;
pub mod stage;
