//! Detection backends.
//!
//! Two interchangeable backends implement [`DetectorBackend`]:
//! a heuristic color/shape detector and a feature-gated ONNX object
//! detector. Callers depend only on the trait, never on which variant
//! is active.

pub mod backend;
pub mod backends;
pub mod registry;
pub mod result;

pub use backend::DetectorBackend;
pub use backends::color::ColorBackend;
pub use backends::scripted::ScriptedBackend;
#[cfg(feature = "backend-tract")]
pub use backends::tract::TractBackend;
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection};
