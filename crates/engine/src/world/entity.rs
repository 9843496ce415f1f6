#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Hands out generation-checked entity handles.
///
/// Indices of destroyed entities are parked until [`EntityRegistry::end_tick`]
/// so a handle captured earlier in the same tick can never alias a freshly
/// spawned entity.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_indices: Vec<u32>,
    released_this_tick: Vec<u32>,
    live_count: usize,
}

impl EntityRegistry {
    pub fn spawn(&mut self) -> Entity {
        let index = match self.free_indices.pop() {
            Some(index) => index,
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                self.alive.push(false);
                index
            }
        };
        self.alive[index as usize] = true;
        self.live_count += 1;
        Entity {
            index,
            generation: self.generations[index as usize],
        }
    }

    /// Returns false when the handle is stale or already destroyed.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let index = entity.index as usize;
        self.alive[index] = false;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.released_this_tick.push(entity.index);
        self.live_count -= 1;
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let index = entity.index as usize;
        index < self.alive.len() && self.alive[index] && self.generations[index] == entity.generation
    }

    pub fn end_tick(&mut self) {
        self.free_indices.append(&mut self.released_this_tick);
    }

    pub fn len(&self) -> usize {
        self.live_count
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(index, _)| Entity {
                index: index as u32,
                generation: self.generations[index],
            })
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: T,
}

/// Sparse component storage indexed by entity index.
///
/// Lookups compare the stored generation with the handle's, so a component
/// attached to an earlier occupant of the same index is never returned.
#[derive(Debug, Clone)]
pub struct ComponentTable<T> {
    slots: Vec<Option<Slot<T>>>,
    len: usize,
}

impl<T> Default for ComponentTable<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }
}

impl<T> ComponentTable<T> {
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let index = entity.index as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        let previous = self.slots[index].replace(Slot {
            generation: entity.generation,
            value,
        });
        match previous {
            Some(slot) if slot.generation == entity.generation => Some(slot.value),
            Some(_) => None,
            None => {
                self.len += 1;
                None
            }
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        match self.slots.get(entity.index as usize) {
            Some(Some(slot)) if slot.generation == entity.generation => Some(&slot.value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.slots.get_mut(entity.index as usize) {
            Some(Some(slot)) if slot.generation == entity.generation => Some(&mut slot.value),
            _ => None,
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.slots.get_mut(entity.index as usize)?;
        if slot
            .as_ref()
            .is_some_and(|slot| slot.generation == entity.generation)
        {
            self.len -= 1;
            return slot.take().map(|slot| slot.value);
        }
        None
    }

    /// Occupied slots. `EntityWorld::destroy` purges every table, so this
    /// matches the live count unless the registry is driven directly.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entities holding this component, in index order.
    ///
    /// The list is a snapshot: systems iterate it while mutating tables.
    pub fn entities(&self, registry: &EntityRegistry) -> Vec<Entity> {
        self.iter(registry).map(|(entity, _)| entity).collect()
    }

    pub fn iter<'a>(
        &'a self,
        registry: &'a EntityRegistry,
    ) -> impl Iterator<Item = (Entity, &'a T)> + 'a {
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            let slot = slot.as_ref()?;
            let entity = Entity {
                index: index as u32,
                generation: slot.generation,
            };
            registry.is_alive(entity).then_some((entity, &slot.value))
        })
    }

    pub fn iter_mut<'a>(
        &'a mut self,
        registry: &'a EntityRegistry,
    ) -> impl Iterator<Item = (Entity, &'a mut T)> + 'a {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                let slot = slot.as_mut()?;
                let entity = Entity {
                    index: index as u32,
                    generation: slot.generation,
                };
                registry
                    .is_alive(entity)
                    .then_some((entity, &mut slot.value))
            })
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }
}
