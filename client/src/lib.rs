mod app;
pub mod controller;
mod dom;
pub mod geometry;
pub mod highlight;
pub mod listeners;
pub mod map_view;
mod maplibre;
mod net;
pub mod persistence;
pub mod simplify;
pub mod state;
pub mod store;
pub mod strategy;
pub mod util;

pub use app::run;
pub use controller::DrawingController;
pub use map_view::MapView;
