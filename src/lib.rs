// ABOUTME: Library module for the present-plus server.
// ABOUTME: Contains theme resolution, asset staging, document rendering and directory listings.

// Reexport modules
pub mod config;
pub mod dirconfig;
pub mod document;
pub mod errors;
pub mod listing;
pub mod render;
pub mod server;
pub mod staging;
pub mod stylesheet;
pub mod templates;
pub mod theme;
pub mod utils;

// Reexport common types and functions
pub use config::Config;
pub use dirconfig::DirectoryConfig;
pub use document::{Doc, DocKind, DocumentParser, ParseMode, PresentParser};
pub use errors::{PresentError, Result};
pub use listing::{DirEntry, DirectoryLister, DirectoryListing};
pub use render::DocumentRenderer;
pub use server::{Dispatcher, Reply};
pub use staging::{AssetStager, AtomicSequence, StagingPolicy, StagingSequence};
pub use templates::TemplateSet;
pub use theme::{LoadedTheme, Theme, ThemeLoader, ThemeResolver};
