//! Display surface interface implemented by the UI shell

/// A region that shows one clock's text.
///
/// The core never touches pixels: it hands the shell a string and the shell
/// decides where and how to draw it.
pub trait Surface: Send + Sync + 'static {
    /// Draws the current clock text.
    fn render_text(&self, text: &str);

    /// Whether the surface can still be drawn to. A torn-down surface makes
    /// its scheduler stop.
    fn is_alive(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "surface"
    }
}
