//! Studio Site Core - homepage content engine
//!
//! # Guarantees
//! 1. Content is checked against the schema before it ships
//! 2. A tracked href is always derived from base URL + source, never patched
//! 3. Each tracked entity emits at most one visibility event per page load
//! 4. The page view is sent once per load
//! 5. Rendering and tracking never halt the page

pub mod analytics;
pub mod config;
pub mod content;
pub mod dom;
pub mod error;
pub mod links;
pub mod loader;
pub mod page;
pub mod render;
pub mod validation;
pub mod visibility;

pub use analytics::{AnalyticsEvent, AnalyticsGateway, PageViewConfig, Payload, Transport};
pub use config::SiteConfig;
pub use content::{ContentDocument, SchemaMetadata, EXPECTED_SCHEMA_TITLE};
pub use dom::{Document, DomSurface, Node};
pub use error::{SiteError, SiteResult};
pub use links::{AttributionDefaults, LinkBuilder, TrackedLink};
pub use loader::{ContentLoader, Fetcher, FileFetcher};
pub use page::HomePage;
pub use render::{ContentRenderer, RenderReport};
pub use validation::{validate, ValidationResult, ValidationRule, ValidationViolation, Validator};
pub use visibility::{Concern, IntersectionEntry, Rect, SeenSet, Sighting, Viewport, VisibilityTracker};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
