// Domain layer: value types, the optics engine and ports (interfaces).

pub mod model;
pub mod optics;
pub mod ports;
