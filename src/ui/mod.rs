pub mod tile_loader;
pub mod timeline_view;
pub mod window;

pub use window::MainWindow;
