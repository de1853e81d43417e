//! Read-only registry of item definitions and material variants.
//!
//! The property memo is a pure function of catalog data, so replacing the
//! catalog on an [`crate::scoring::Engine`] clears that memo.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GearzError, Result};
use crate::types::{DefinitionId, ItemDefinition, MaterialId, MaterialVariant};

/// Definitions and materials known to the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    definitions: HashMap<DefinitionId, ItemDefinition>,
    materials: HashMap<MaterialId, MaterialVariant>,
}

impl ItemCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a definition.
    pub fn insert_definition(&mut self, definition: ItemDefinition) {
        self.definitions.insert(definition.id, definition);
    }

    /// Register (or replace) a material variant.
    pub fn insert_material(&mut self, material: MaterialVariant) {
        self.materials.insert(material.id, material);
    }

    /// Builder-style definition registration.
    #[must_use]
    pub fn with_definition(mut self, definition: ItemDefinition) -> Self {
        self.insert_definition(definition);
        self
    }

    /// Builder-style material registration.
    #[must_use]
    pub fn with_material(mut self, material: MaterialVariant) -> Self {
        self.insert_material(material);
        self
    }

    /// Look up a definition.
    ///
    /// # Errors
    /// Returns [`GearzError::UnknownDefinition`] if `id` is not registered.
    pub fn definition(&self, id: DefinitionId) -> Result<&ItemDefinition> {
        self.definitions
            .get(&id)
            .ok_or(GearzError::UnknownDefinition(id))
    }

    /// Look up a material variant.
    ///
    /// # Errors
    /// Returns [`GearzError::UnknownMaterial`] if `id` is not registered.
    pub fn material(&self, id: MaterialId) -> Result<&MaterialVariant> {
        self.materials.get(&id).ok_or(GearzError::UnknownMaterial(id))
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Iterate over all definitions in unspecified order.
    pub fn definitions(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.definitions.values()
    }
}
