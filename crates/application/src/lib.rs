//! hostres application layer: collaborator ports and the resolution
//! scheduler core.
pub mod ports;
pub mod scheduler;
pub mod services;
