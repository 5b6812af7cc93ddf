//! Core types shared by the engine and front-ends: cell ranges, the
//! drag/toggle selection model and the clipboard capability.

pub mod clipboard;
pub mod range;
pub mod selection;

pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard};
pub use range::{CellRef, Range};
pub use selection::{CellGrid, Modifiers, PointerButton, SelectionMode, SelectionModel};
