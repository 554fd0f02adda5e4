// Domain layer: schema, models and ports (interfaces). No I/O here.

pub mod model;
pub mod ports;
pub mod schema;
