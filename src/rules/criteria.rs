//! Per-variant element criteria, injected into the catalog.

use crate::rules::catalog::ElementRecord;

/// Decides which elements qualify as starters and which transformations a variant allows.
pub trait VariantCriteria: Send + Sync {
    fn qualifies_as_starter(&self, element: &ElementRecord) -> bool;

    fn qualifies_as_evolution(&self, _from: &ElementRecord, _to: &ElementRecord) -> bool {
        true
    }
}

/// Base-stage starters, every transformation allowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCriteria;

impl VariantCriteria for StandardCriteria {
    fn qualifies_as_starter(&self, element: &ElementRecord) -> bool {
        element.evolves_from.is_none()
    }
}

/// Single-tag variant: starters and transformation targets must carry `tag`.
#[derive(Clone, Debug)]
pub struct TagCriteria {
    pub tag: String,
}

impl TagCriteria {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl VariantCriteria for TagCriteria {
    fn qualifies_as_starter(&self, element: &ElementRecord) -> bool {
        element.evolves_from.is_none() && element.has_tag(&self.tag)
    }

    fn qualifies_as_evolution(&self, _from: &ElementRecord, to: &ElementRecord) -> bool {
        to.has_tag(&self.tag)
    }
}
