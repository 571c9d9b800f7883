// Domain layer: product payload, extraction results and the ports the engine works against.

pub mod model;
pub mod ports;
