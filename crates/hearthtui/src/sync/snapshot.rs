use std::collections::HashMap;

use crate::hub::Entity;

/// The full set of entities as of the last completed refresh.
///
/// Never modified after construction; a refresh builds a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entities: HashMap<String, Entity>,
}

impl Snapshot {
    /// Index entities by id. Later duplicates win.
    pub fn from_entities(entities: Vec<Entity>) -> Self {
        Self {
            entities: entities
                .into_iter()
                .map(|e| (e.entity_id().to_string(), e))
                .collect(),
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.get(entity_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in display order: by domain, then by friendly name.
    ///
    /// `domain` restricts the result to one domain when given.
    pub fn sorted(&self, domain: Option<&str>) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self
            .entities
            .values()
            .filter(|e| domain.is_none_or(|d| e.domain() == d))
            .collect();

        entities.sort_by(|a, b| {
            (a.domain(), a.friendly_name.as_str(), a.entity_id())
                .cmp(&(b.domain(), b.friendly_name.as_str(), b.entity_id()))
        });
        entities
    }
}
