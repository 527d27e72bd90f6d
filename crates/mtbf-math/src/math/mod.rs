//! Core math modules.

pub mod stable;
pub mod gamma;
pub mod quadrature;
pub mod optimize;
