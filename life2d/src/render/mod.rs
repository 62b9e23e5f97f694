mod canvas;
mod loader;
mod surface;

pub use canvas::{Canvas, TextCommand};
pub use loader::{load_image_from_bytes, load_image_from_file};
pub use surface::{Color, DrawOptions, Surface, BLACK, WHITE};
