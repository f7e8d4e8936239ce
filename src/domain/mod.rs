// Domain layer: core models and ports (interfaces) shared by the pipeline and the adapters.

pub mod model;
pub mod ports;
