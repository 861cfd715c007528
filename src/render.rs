use std::path::Path;

use crate::tree::{NodeId, Tree};

/// Presentation collaborator driven by the navigator.
pub trait Renderer {
    /// Draws `current`, a menu inside `tree`.
    fn render(&mut self, tree: &Tree, current: NodeId);

    /// Releases the display so an emulator can take it over.
    fn destroy_presentation(&mut self);

    /// Recreates the display after [`Renderer::destroy_presentation`].
    fn setup_presentation(&mut self) -> Result<(), String>;

    /// Image shown next to the menu. `None` clears it.
    fn show_snapshot(&mut self, image: Option<&Path>);

    /// Number of entries a page up/down moves by.
    fn page_size(&self) -> usize;
}
