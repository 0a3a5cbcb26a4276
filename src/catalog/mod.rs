//! Gallery set resolution.
//!
//! A "set" is an ordered collection of images belonging to one gallery. The
//! catalog resolves a set id into its title and image list; the download
//! pipeline consumes the result without ever talking to the metadata layer
//! itself.
//!
//! The production catalog reads a JSON manifest per set from the same blob
//! store that holds the images. Anything that can produce a [`GallerySet`]
//! can stand in for it behind the [`Catalog`] trait.

mod manifest;
mod types;

pub use manifest::{Catalog, ManifestCatalog, DEFAULT_MANIFEST_PREFIX};
pub use types::{GallerySet, ImageDescriptor, TrustTier};
