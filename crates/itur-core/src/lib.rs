//! Shared foundation for the ITU-R propagation models: error taxonomy,
//! unit-tagged quantities, shape broadcasting and the geophysical Grid Store.

pub mod broadcast;
pub mod error;
pub mod grid;
pub mod store;
pub mod units;

pub use broadcast::{broadcast_shape, Broadcaster, Canonical};
pub use error::{check_open_range, check_range, ItuError, Result};
pub use grid::{log_interpolate, GeophysicalMap, GridAxis, Interpolation, MapStack, Stencil};
pub use store::{GridStore, MapSpec, StackSpec};
pub use units::{PhysicalDimension, Quantity, Unit};
