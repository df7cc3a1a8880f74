//! Search-vector encodings
//!
//! This module provides the codec seam between the optimizer's flat vectors
//! and the domain structures an objective consumes.

pub mod bounds;
pub mod codec;

pub mod prelude {
    pub use super::bounds::*;
    pub use super::codec::*;
}
