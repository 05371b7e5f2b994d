//! Open/close behavior of the modal embed.
//!
//! The rendered markup wires the same transitions in the host page; this type
//! is the single place they are defined.

/// What the user clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    OpenButton,
    CloseButton,
    /// The dimmed overlay itself, outside the modal box.
    OverlayBackground,
    /// Anywhere inside the modal box (including the iframe).
    ModalBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModalState {
    open: bool,
}

impl ModalState {
    /// Starts hidden.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn click(&mut self, target: ClickTarget) {
        self.open = match target {
            ClickTarget::OpenButton => true,
            ClickTarget::CloseButton | ClickTarget::OverlayBackground => false,
            ClickTarget::ModalBody => self.open,
        };
    }

    /// CSS `display` value for the overlay.
    pub fn overlay_display(&self) -> &'static str {
        if self.open { "flex" } else { "none" }
    }
}
