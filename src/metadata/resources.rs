//! The manifest resource table of a module.
//!
//! [`Resources`] keeps entries in table order. Names are not unique keys: after an entry has
//! been rewritten the table can briefly hold several entries with the same name, so callers
//! that track a specific entry swap it by pointer identity with [`Resources::replace_entry`].
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use dotscope_reactor::metadata::resources::{
//!     ManifestResource, ManifestResourceAttributes, Resources,
//! };
//! use dotscope_reactor::metadata::token::Token;
//!
//! let resources = Resources::new();
//! let original = resources.push(ManifestResource::embedded(
//!     Token::new(0x2800_0001),
//!     "payload.bin",
//!     ManifestResourceAttributes::PRIVATE,
//!     vec![1, 2, 3],
//! ));
//!
//! let updated = Arc::new(original.with_data(vec![4, 5]));
//! assert!(resources.replace_entry(&original, updated).is_some());
//!
//! assert!(resources.position(&original).is_none());
//! assert_eq!(resources.get("payload.bin").unwrap().data, vec![4, 5]);
//! ```

use std::sync::{Arc, RwLock};

use bitflags::bitflags;

use crate::metadata::token::Token;

/// A reference-counted pointer to a [`ManifestResource`]
pub type ManifestResourceRc = Arc<ManifestResource>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Visibility attributes of a manifest resource (ECMA-335 II.23.1.9)
    pub struct ManifestResourceAttributes : u32 {
        /// The Resource is exported from the Assembly
        const PUBLIC = 0x0001;
        /// The Resource is private to the Assembly
        const PRIVATE = 0x0002;
    }
}

/// Where the bytes of a non-embedded resource live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// A file of the same assembly (`File` table)
    File(String),
    /// Another assembly (`AssemblyRef` table)
    AssemblyRef(String),
}

/// A named, attribute-tagged blob of the resource table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestResource {
    /// Token of the `ManifestResource` row
    pub token: Token,
    /// Resource name
    pub name: String,
    /// Visibility flags
    pub flags: ManifestResourceAttributes,
    /// `None` if the resource is embedded in this module
    pub source: Option<ResourceSource>,
    /// Raw bytes; empty for resources that live elsewhere
    pub data: Vec<u8>,
}

impl ManifestResource {
    /// Creates a resource embedded in the current module.
    pub fn embedded(
        token: Token,
        name: impl Into<String>,
        flags: ManifestResourceAttributes,
        data: Vec<u8>,
    ) -> Self {
        ManifestResource {
            token,
            name: name.into(),
            flags,
            source: None,
            data,
        }
    }

    /// Creates a resource whose data lives in another file or assembly.
    pub fn linked(
        token: Token,
        name: impl Into<String>,
        flags: ManifestResourceAttributes,
        source: ResourceSource,
    ) -> Self {
        ManifestResource {
            token,
            name: name.into(),
            flags,
            source: Some(source),
            data: Vec::new(),
        }
    }

    /// Returns `true` if the bytes are stored in this module.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.source.is_none()
    }

    /// A new embedded entry with the same token, name and flags but different bytes.
    #[must_use]
    pub fn with_data(&self, data: Vec<u8>) -> Self {
        ManifestResource {
            token: self.token,
            name: self.name.clone(),
            flags: self.flags,
            source: None,
            data,
        }
    }
}

/// Ordered manifest resource table.
#[derive(Default)]
pub struct Resources {
    data: RwLock<Vec<ManifestResourceRc>>,
}

impl Resources {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Resources {
            data: RwLock::new(Vec::new()),
        }
    }

    /// First entry named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ManifestResourceRc> {
        read_lock!(self.data)
            .iter()
            .find(|resource| resource.name == name)
            .cloned()
    }

    /// First embedded entry named `name`.
    #[must_use]
    pub fn find_embedded(&self, name: &str) -> Option<ManifestResourceRc> {
        read_lock!(self.data)
            .iter()
            .find(|resource| resource.is_embedded() && resource.name == name)
            .cloned()
    }

    /// Index of exactly this entry (pointer identity), if it is still in the table.
    #[must_use]
    pub fn position(&self, resource: &ManifestResourceRc) -> Option<usize> {
        read_lock!(self.data)
            .iter()
            .position(|entry| Arc::ptr_eq(entry, resource))
    }

    /// Swaps the entry at `index`, returning the previous one.
    ///
    /// Returns `None` and leaves the table untouched if `index` is out of range.
    pub fn replace(
        &self,
        index: usize,
        resource: ManifestResourceRc,
    ) -> Option<ManifestResourceRc> {
        let mut data = write_lock!(self.data);
        let slot = data.get_mut(index)?;
        Some(std::mem::replace(slot, resource))
    }

    /// Swaps exactly `current` (pointer identity) for `resource` under one write lock.
    ///
    /// Returns the index the entry occupied, or `None` if `current` is no longer in the table,
    /// in which case the table is left untouched.
    pub fn replace_entry(
        &self,
        current: &ManifestResourceRc,
        resource: ManifestResourceRc,
    ) -> Option<usize> {
        let mut data = write_lock!(self.data);
        let index = data.iter().position(|entry| Arc::ptr_eq(entry, current))?;
        data[index] = resource;
        Some(index)
    }

    /// Appends an entry and returns the shared handle stored in the table.
    pub fn push(&self, resource: ManifestResource) -> ManifestResourceRc {
        let resource = Arc::new(resource);
        write_lock!(self.data).push(resource.clone());
        resource
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock!(self.data).len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock!(self.data).is_empty()
    }

    /// Iterates over a snapshot of the table in order.
    pub fn iter(&self) -> std::vec::IntoIter<ManifestResourceRc> {
        read_lock!(self.data).clone().into_iter()
    }
}
