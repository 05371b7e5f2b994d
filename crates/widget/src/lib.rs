//! `loyalty-widget`: the embeddable loyalty widget.
//!
//! A host page includes the loader script with `data-tenant`, `data-host` and
//! `data-mode` attributes. In `iframe` mode the widget page is inlined where
//! the script sits; in `modal` mode a button opens it inside an overlay.

pub mod embed;
pub mod markup;
pub mod modal;

pub use embed::{EmbedConfig, WidgetError, WidgetMode};
pub use markup::{render, script_tag};
pub use modal::{ClickTarget, ModalState};
