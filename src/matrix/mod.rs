//! Matrix storage, element types and the untiled reference product.
//!
//! The reference product is the correctness baseline every tiled and
//! threaded configuration is checked against.

pub mod dense;
pub mod element;
pub mod naive_ijk;
pub mod transpose;

pub use dense::Matrix;
pub use element::Element;
