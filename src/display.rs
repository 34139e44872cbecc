//! Terminal surface for `--display`

use std::{
    io::{self, Write},
    sync::atomic::{AtomicBool, Ordering},
};

use crate::scheduler::Surface;

/// Prints each frame on its own line, prefixed with a label.
#[derive(Debug)]
pub struct ConsoleSurface {
    label: String,
    alive: AtomicBool,
}

impl ConsoleSurface {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            alive: AtomicBool::new(true),
        }
    }

    /// Stops further output; the bound scheduler winds down on its next tick.
    pub fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl Surface for ConsoleSurface {
    fn render_text(&self, text: &str) {
        let mut out = io::stdout().lock();
        if writeln!(out, "{:>9}  {}", self.label, text).is_err() {
            self.close();
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_marks_surface_dead() {
        let surface = ConsoleSurface::new("stopwatch");
        assert!(surface.is_alive());
        assert_eq!(surface.name(), "stopwatch");
        surface.close();
        assert!(!surface.is_alive());
    }
}
