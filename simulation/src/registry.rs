//! World registry: the authoritative list of live entities.
//!
//! All access goes through one `RwLock`. Snapshots and scans take the read
//! side; every mutation takes the write side and either fully applies or
//! leaves the list untouched. No caller ever gets a reference into the inner
//! `Vec`.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::components::Entity;
use crate::error::{AdmissionReason, ArenaError, Result};

/// Admission bound of the single-entity editor path.
pub const EDITOR_BOUND: f64 = 500.0;

/// Inclusive admission rectangle `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const EDITOR: Bounds = Bounds::new(EDITOR_BOUND, EDITOR_BOUND);

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// NaN coordinates are outside every bound.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }

    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(0.0, self.width), y.clamp(0.0, self.height))
    }

    fn check(&self, entity: &Entity) -> Result<()> {
        if self.contains(entity.x, entity.y) {
            Ok(())
        } else {
            Err(ArenaError::rejected(
                &entity.name,
                AdmissionReason::OutOfBounds {
                    x: entity.x,
                    y: entity.y,
                    width: self.width,
                    height: self.height,
                },
            ))
        }
    }
}

/// A name survives the `<Type> <Name> <X> <Y>` record format.
pub fn is_record_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

#[derive(Debug)]
pub struct Registry {
    entities: RwLock<Vec<Entity>>,
    bounds: Bounds,
}

impl Registry {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            entities: RwLock::new(Vec::new()),
            bounds,
        }
    }

    /// Registry for hand-edited rosters, admitting positions up to 500.
    pub fn for_editor() -> Self {
        Self::new(Bounds::EDITOR)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Name and position rules shared by every admission path.
    fn admissible(&self, entity: &Entity) -> Result<()> {
        if !is_record_name(&entity.name) {
            return Err(ArenaError::rejected(
                &entity.name,
                AdmissionReason::InvalidName,
            ));
        }
        self.bounds.check(entity)
    }

    // Every critical section leaves the list valid, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Entity>> {
        self.entities.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Entity>> {
        self.entities.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit one entity. Fails without mutation on a duplicate or malformed
    /// name, or an out-of-bounds position.
    pub fn add(&self, entity: Entity) -> Result<()> {
        self.admissible(&entity)?;
        let mut entities = self.write();
        if entities.iter().any(|e| e.name == entity.name) {
            return Err(ArenaError::rejected(
                entity.name,
                AdmissionReason::DuplicateName,
            ));
        }
        entities.push(entity);
        Ok(())
    }

    /// Admit a batch in one exclusive section. Either every entity is admitted
    /// or none is.
    pub fn extend(&self, batch: Vec<Entity>) -> Result<()> {
        let mut entities = self.write();
        let mut taken: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        for entity in &batch {
            self.admissible(entity)?;
            if !taken.insert(entity.name.as_str()) {
                return Err(ArenaError::rejected(
                    &entity.name,
                    AdmissionReason::DuplicateName,
                ));
            }
        }
        drop(taken);
        entities.extend(batch);
        Ok(())
    }

    /// Swap the whole list for `batch`, validated as if added one by one to an
    /// empty registry. On error the current list is kept.
    pub fn replace_all(&self, batch: Vec<Entity>) -> Result<()> {
        let mut taken = HashSet::with_capacity(batch.len());
        for entity in &batch {
            self.admissible(entity)?;
            if !taken.insert(entity.name.as_str()) {
                return Err(ArenaError::rejected(
                    &entity.name,
                    AdmissionReason::DuplicateName,
                ));
            }
        }
        *self.write() = batch;
        Ok(())
    }

    /// Remove every entity whose name is in `names`; returns how many went.
    pub fn remove_by_names<S: AsRef<str>>(&self, names: &[S]) -> usize {
        if names.is_empty() {
            return 0;
        }
        let doomed: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        let mut entities = self.write();
        let before = entities.len();
        entities.retain(|e| !doomed.contains(e.name.as_str()));
        before - entities.len()
    }

    /// Publish a new value for `name`. Returns `false` and changes nothing when
    /// `name` is gone (killed since the caller's snapshot), when `updated` breaks
    /// the name or bounds rules, or when it would take a name another entity holds.
    pub fn replace(&self, name: &str, updated: Entity) -> bool {
        if self.admissible(&updated).is_err() {
            return false;
        }
        let mut entities = self.write();
        if updated.name != name && entities.iter().any(|e| e.name == updated.name) {
            return false;
        }
        match entities.iter_mut().find(|e| e.name == name) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    /// Independent copy of the current list, in insertion order.
    pub fn snapshot(&self) -> Vec<Entity> {
        self.read().clone()
    }

    pub fn get(&self, name: &str) -> Option<Entity> {
        self.read().iter().find(|e| e.name == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}
