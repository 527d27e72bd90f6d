//! MTBF engine math utilities.

pub mod math;

pub use math::stable::*;
pub use math::gamma::*;
pub use math::quadrature::{integrate, Quadrature, QuadratureError, QuadratureResult};
pub use math::optimize::{minimize, Method, MinimizeOptions, MinimizeResult};
