//! UI layer: the declarative view tree and the egui shell that paints it.

pub mod app;
pub mod view;

pub use app::ManagerApp;
