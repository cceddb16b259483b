//! Source transforms applied before in-process evaluation.

mod jsx;

pub use jsx::transform_jsx;
