//! Static asset serving: path resolution, content types, file responses.
//!
//! # Data Flow
//! ```text
//! URL path
//!     → resolver.rs (decode, confine to static root, index.html fallback)
//!     → server.rs (read file, pick content type + cache directive)
//!     → response
//! ```

pub mod mime;
pub mod resolver;
pub mod server;

pub use server::serve;
