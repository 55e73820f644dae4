// Domain layer: core models and ports (interfaces) that adapters implement.

pub mod model;
pub mod ports;
