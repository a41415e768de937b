//! # Labbook Assets
//!
//! Scanning and classification of a research project's files.
//!
//! ## Pipeline
//!
//! ```text
//! Project root
//!     │
//!     ├──> Asset Scanner (one listing per directory)
//!     │      └─> Raw tree + content types
//!     │
//!     ├──> Handler Pipeline (file stats → Python → R → SAS → Stata → Java)
//!     │      └─> Metadata records per node
//!     │
//!     └──> Reconciler
//!            └─> Tree carrying persisted notes and attributes
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use labbook_assets::{merge_annotations, AssetNode, AssetScanner};
//!
//! fn rescan(persisted: &AssetNode) -> labbook_assets::Result<AssetNode> {
//!     let fresh = AssetScanner::default().scan("/path/to/project")?;
//!     Ok(merge_annotations(fresh, persisted))
//! }
//! ```

mod classifier;
mod error;
mod handler;
mod handlers;
pub mod key;
mod node;
mod note;
mod reconcile;
mod scanner;
pub mod tree;
mod worker;

pub use classifier::{
    applicable_attributes, attribute_definition, classify_key, default_content_types, AppliesTo,
    AttributeDefinition, ContentType, ATTRIBUTES,
};
pub use error::{AssetError, Result};
pub use handler::{AssetHandler, HandlerPipeline};
pub use handlers::{
    include_file, parse_java_libraries, parse_python_libraries, parse_r_libraries,
    parse_sas_libraries, parse_stata_libraries, FileHandler, JavaHandler, PythonHandler, RHandler,
    SasHandler, StataHandler, ACCESS_ERROR, DEFAULT_HIDDEN, JAVA_EXTENSIONS, PYTHON_EXTENSIONS,
    READ_ERROR, R_EXTENSIONS, SAS_EXTENSIONS, STATA_EXTENSIONS,
};
pub use node::{
    AssetKind, AssetNode, CodeMetadata, FileMetadata, HandlerId, HandlerMetadata, ImportLibrary,
    Library, PackageLibrary,
};
pub use note::Note;
pub use reconcile::merge_annotations;
pub use scanner::AssetScanner;
pub use worker::{
    handle_request, serve_lines, ScanOutcome, ScanRequest, ScanResponse, ScanWorker,
    ScanWorkerHandle,
};
