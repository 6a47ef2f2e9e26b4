pub mod reconciler;
pub mod reconciler_tests;

pub use reconciler::{Reconciler, UiIntent};
