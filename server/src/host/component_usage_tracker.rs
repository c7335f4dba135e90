use std::collections::HashMap;

use esnet_shared::{ComponentKind, EntityId, Frame};

/// 'Mark and sweep' ledger of the (entity, component) pairs a client currently
/// cares about.
///
/// Every tick marks each covered pair with the current frame. Sweeping a pair
/// answers whether a change to it should be sent, and expires pairs that were
/// not marked this frame.
pub struct ComponentUsageTracker {
    frames: HashMap<(EntityId, ComponentKind), Frame>,
}

impl ComponentUsageTracker {
    pub fn new() -> Self {
        Self {
            frames: HashMap::new(),
        }
    }

    /// Marks every pair as covered as of `frame`
    pub fn set<'a>(
        &mut self,
        entities: impl IntoIterator<Item = &'a EntityId>,
        kind: &ComponentKind,
        frame: Frame,
    ) {
        for entity in entities {
            self.frames.insert((*entity, *kind), frame);
        }
    }

    /// Records pairs that are leaving interest this frame, keeping any older
    /// mark. The pair stays sweepable until the end of the tick so the change
    /// that caused it to leave is delivered.
    pub fn set_expiring<'a>(
        &mut self,
        entities: impl IntoIterator<Item = &'a EntityId>,
        kind: &ComponentKind,
        frame: Frame,
    ) {
        let expiring = frame.saturating_sub(1);
        for entity in entities {
            self.frames.entry((*entity, *kind)).or_insert(expiring);
        }
    }

    /// Returns the frame the pair was last marked at, or `None` if the client
    /// does not care about it. A pair last marked before `frame` is no longer
    /// covered: it is returned one final time and removed.
    pub fn get_and_expire(
        &mut self,
        entity: &EntityId,
        kind: &ComponentKind,
        frame: Frame,
    ) -> Option<Frame> {
        let key = (*entity, *kind);
        let last = *self.frames.get(&key)?;
        if last < frame {
            self.frames.remove(&key);
        }
        Some(last)
    }

    /// Removes every pair that was not marked at `frame`
    pub fn expire_older_than(&mut self, frame: Frame) -> usize {
        let before = self.frames.len();
        self.frames.retain(|_, last| *last >= frame);
        before - self.frames.len()
    }

    pub fn contains(&self, entity: &EntityId, kind: &ComponentKind) -> bool {
        self.frames.contains_key(&(*entity, *kind))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Default for ComponentUsageTracker {
    fn default() -> Self {
        Self::new()
    }
}
