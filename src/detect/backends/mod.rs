pub mod color;
pub mod scripted;
#[cfg(feature = "backend-tract")]
pub mod tract;
