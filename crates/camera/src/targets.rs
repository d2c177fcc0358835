use blockytry_common::TargetId;
use glam::Vec3;
use std::collections::BTreeMap;

/// Points the eyepoint can lock on to, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: BTreeMap<TargetId, Vec3>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new point and return its id.
    pub fn insert(&mut self, position: Vec3) -> TargetId {
        let id = TargetId::new();
        self.targets.insert(id, position);
        id
    }

    /// Move an existing target. Returns false if the id is unknown.
    pub fn set(&mut self, id: TargetId, position: Vec3) -> bool {
        match self.targets.get_mut(&id) {
            Some(p) => {
                *p = position;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: TargetId) -> Option<Vec3> {
        self.targets.remove(&id)
    }

    pub fn get(&self, id: TargetId) -> Option<Vec3> {
        self.targets.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetId, Vec3)> + '_ {
        self.targets.iter().map(|(id, p)| (*id, *p))
    }
}
