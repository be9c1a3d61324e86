use std::collections::HashMap;

use serde::Serialize;

/// Identity of a cached record: model name plus id key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectKey {
    pub model: String,
    pub id: String,
}

impl ObjectKey {
    pub fn new(model: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            id: id.into(),
        }
    }
}

/// Instance-level ownership links between cached records.
///
/// Holds identifiers only; the records themselves belong to the store.
/// Every child in `owner` appears in exactly one `owned` list and vice versa.
#[derive(Debug, Default)]
pub struct OwnershipLedger {
    owner: HashMap<ObjectKey, ObjectKey>,
    owned: HashMap<ObjectKey, Vec<ObjectKey>>,
}

impl OwnershipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `child` to `parent`. A child that already has an owner keeps it
    /// and `false` is returned.
    pub fn link(&mut self, parent: ObjectKey, child: ObjectKey) -> bool {
        if self.owner.contains_key(&child) {
            return false;
        }
        self.owned.entry(parent.clone()).or_default().push(child.clone());
        self.owner.insert(child, parent);
        true
    }

    pub fn owner_of(&self, child: &ObjectKey) -> Option<&ObjectKey> {
        self.owner.get(child)
    }

    /// Children of `parent` in link order.
    pub fn owned_by(&self, parent: &ObjectKey) -> &[ObjectKey] {
        self.owned.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of owned records.
    pub fn len(&self) -> usize {
        self.owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }
}
