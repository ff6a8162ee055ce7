//! Font picker
//!
//! Lets a user browse a remote font catalog (lazily loaded, searched with a debounced filter and
//! shown one page at a time), pick a font, or upload a font file, and registers the choice in the
//! site style document.
//!
//! The controller is [`picker::FontPicker`]. Everything it talks to sits behind a trait:
//! [`transport::Transport`], [`styles::StyleService`], [`media::MediaService`],
//! [`view::ViewManager`] and [`sfnt::FontParser`]; a concrete implementation of each one is
//! provided as well.

pub mod catalog;
pub mod config;
pub mod error;
pub mod font;
pub mod media;
pub mod picker;
pub mod sfnt;
pub mod styles;
pub mod transport;
pub mod utils;
pub mod view;

pub use error::FontPickerError;
pub use picker::{CatalogState, FontPicker, PickerEvent, Services};
