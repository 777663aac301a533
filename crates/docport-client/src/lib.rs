//! HTTP client for the documentation portal API.
//!
//! [`PortalClient`] is a blocking client mirroring every route of the portal
//! server. [`CachedPortal`] wraps it with a [`SectionCache`] so navigation
//! can be rendered without fetching the section list on every page.
//!
//! # Example
//!
//! ```no_run
//! use docport_client::{CachedPortal, NewSection, PortalClient};
//!
//! # fn main() -> Result<(), docport_client::ClientError> {
//! let mut portal = CachedPortal::new(PortalClient::new("http://localhost:8080"));
//!
//! let guide = portal.create(&NewSection::new("Guide").with_order(1))?;
//! portal.save_content(guide.secno, "<h1>Guide</h1>")?;
//!
//! for root in portal.navigation()? {
//!     for (depth, section) in root.walk() {
//!         println!("{}{}", "  ".repeat(depth), section.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod client;
mod error;
mod types;

#[cfg(test)]
mod test_server;

pub use cache::{CachedPortal, SectionCache};
pub use client::PortalClient;
pub use error::ClientError;
pub use types::{Listing, NewSection, Page, Section, SectionUpdate};
