//! Zone manager for object locations and movement.
//!
//! Every zone is ordered (index 0 is the bottom, the last element is the
//! top), so a move can always be undone by reinserting at the index the
//! object left from. Storage uses `im` persistent collections, which makes
//! snapshots of the whole table O(1).

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult, GameRng, ObjectId, PlayerId};

/// Kinds of zones in the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    Stack,
}

impl ZoneKind {
    /// Whether each player has their own zone of this kind.
    #[must_use]
    pub const fn is_per_player(self) -> bool {
        matches!(self, ZoneKind::Library | ZoneKind::Hand | ZoneKind::Graveyard)
    }

    /// Who may look at objects in zones of this kind.
    #[must_use]
    pub const fn visibility(self) -> ZoneVisibility {
        match self {
            ZoneKind::Library => ZoneVisibility::Hidden,
            ZoneKind::Hand => ZoneVisibility::OwnerOnly,
            _ => ZoneVisibility::Public,
        }
    }
}

/// Visibility class of a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneVisibility {
    /// Nobody sees the contents (library).
    Hidden,
    /// Only the owner sees the contents (hand).
    OwnerOnly,
    /// Everyone, spectators included.
    Public,
}

/// A concrete zone: a kind plus the owning seat for per-player zones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub owner: Option<PlayerId>,
}

impl Zone {
    #[must_use]
    pub const fn library(player: PlayerId) -> Self {
        Self { kind: ZoneKind::Library, owner: Some(player) }
    }

    #[must_use]
    pub const fn hand(player: PlayerId) -> Self {
        Self { kind: ZoneKind::Hand, owner: Some(player) }
    }

    #[must_use]
    pub const fn graveyard(player: PlayerId) -> Self {
        Self { kind: ZoneKind::Graveyard, owner: Some(player) }
    }

    pub const BATTLEFIELD: Self = Self { kind: ZoneKind::Battlefield, owner: None };
    pub const EXILE: Self = Self { kind: ZoneKind::Exile, owner: None };
    pub const STACK: Self = Self { kind: ZoneKind::Stack, owner: None };
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.owner {
            Some(p) => write!(f, "{:?}({})", self.kind, p.0),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// Position for inserting an object into a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Top of the zone (end of the list).
    Top,
    /// Bottom of the zone (index 0).
    Bottom,
    /// Specific index, clamped to the zone length.
    Index(usize),
}

/// Tracks which zone each object is in, and in what order.
///
/// ```
/// use ccg_rules::core::{ObjectId, PlayerId};
/// use ccg_rules::zones::{Zone, ZoneManager, ZonePosition};
///
/// let library = Zone::library(PlayerId::new(0));
/// let mut zones = ZoneManager::new();
/// zones.init_zone(library);
///
/// zones.add(ObjectId(10), library, ZonePosition::Top).unwrap();
/// zones.add(ObjectId(11), library, ZonePosition::Bottom).unwrap();
///
/// assert_eq!(zones.contents(library), vec![ObjectId(11), ObjectId(10)]);
/// assert_eq!(zones.top(library), Some(ObjectId(10)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneManager {
    locations: OrdMap<ObjectId, Zone>,
    order: OrdMap<Zone, Vector<ObjectId>>,
}

impl ZoneManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty zone. Objects can only be placed in known zones.
    pub fn init_zone(&mut self, zone: Zone) {
        if !self.order.contains_key(&zone) {
            self.order.insert(zone, Vector::new());
        }
    }

    #[must_use]
    pub fn has_zone(&self, zone: Zone) -> bool {
        self.order.contains_key(&zone)
    }

    /// All known zones.
    pub fn zones(&self) -> impl Iterator<Item = Zone> + '_ {
        self.order.keys().copied()
    }

    /// Place an object that is in no zone yet.
    pub fn add(&mut self, object: ObjectId, zone: Zone, position: ZonePosition) -> EngineResult<usize> {
        if self.locations.contains_key(&object) {
            return Err(EngineError::ObjectExists(object));
        }
        let order = self
            .order
            .get_mut(&zone)
            .ok_or_else(|| EngineError::UnknownZone(zone.to_string()))?;

        let index = match position {
            ZonePosition::Top => order.len(),
            ZonePosition::Bottom => 0,
            ZonePosition::Index(i) => i.min(order.len()),
        };
        order.insert(index, object);
        self.locations.insert(object, zone);
        Ok(index)
    }

    /// Take an object out of its zone.
    ///
    /// Returns the zone and index it occupied, or `None` if it was in no zone.
    pub fn remove(&mut self, object: ObjectId) -> Option<(Zone, usize)> {
        let zone = self.locations.remove(&object)?;
        let order = self.order.get_mut(&zone)?;
        let index = order.index_of(&object)?;
        order.remove(index);
        Some((zone, index))
    }

    /// Move an object to another zone (or another position in the same zone).
    ///
    /// Returns where it was before the move.
    pub fn move_to(
        &mut self,
        object: ObjectId,
        zone: Zone,
        position: ZonePosition,
    ) -> EngineResult<Option<(Zone, usize)>> {
        if !self.order.contains_key(&zone) {
            return Err(EngineError::UnknownZone(zone.to_string()));
        }
        let previous = self.remove(object);
        self.add(object, zone, position)?;
        Ok(previous)
    }

    #[must_use]
    pub fn zone_of(&self, object: ObjectId) -> Option<Zone> {
        self.locations.get(&object).copied()
    }

    #[must_use]
    pub fn index_of(&self, object: ObjectId) -> Option<usize> {
        let zone = self.locations.get(&object)?;
        self.order.get(zone)?.index_of(&object)
    }

    #[must_use]
    pub fn is_in(&self, object: ObjectId, zone: Zone) -> bool {
        self.locations.get(&object) == Some(&zone)
    }

    /// Objects in a zone, bottom to top.
    #[must_use]
    pub fn contents(&self, zone: Zone) -> Vec<ObjectId> {
        self.order
            .get(&zone)
            .map(|o| o.iter().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self, zone: Zone) -> usize {
        self.order.get(&zone).map_or(0, Vector::len)
    }

    #[must_use]
    pub fn top(&self, zone: Zone) -> Option<ObjectId> {
        self.order.get(&zone)?.last().copied()
    }

    /// Shuffle a zone in place, returning the order it had before.
    pub fn shuffle(&mut self, zone: Zone, rng: &mut GameRng) -> EngineResult<Vec<ObjectId>> {
        let order = self
            .order
            .get_mut(&zone)
            .ok_or_else(|| EngineError::UnknownZone(zone.to_string()))?;
        let before: Vec<ObjectId> = order.iter().copied().collect();
        *order = rng.permute(&before).into_iter().collect();
        Ok(before)
    }

    /// Replace a zone's order with a permutation of its current contents.
    pub fn restore_order(&mut self, zone: Zone, contents: Vec<ObjectId>) -> EngineResult<()> {
        let order = self
            .order
            .get_mut(&zone)
            .ok_or_else(|| EngineError::UnknownZone(zone.to_string()))?;
        *order = contents.into_iter().collect();
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, object: ObjectId) -> bool {
        self.locations.contains_key(&object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Zone {
        Zone::library(PlayerId::new(0))
    }

    fn manager() -> ZoneManager {
        let mut zones = ZoneManager::new();
        zones.init_zone(library());
        zones.init_zone(Zone::hand(PlayerId::new(0)));
        zones.init_zone(Zone::BATTLEFIELD);
        zones
    }

    #[test]
    fn test_positions() {
        let mut zones = manager();
        zones.add(ObjectId(10), library(), ZonePosition::Top).unwrap();
        zones.add(ObjectId(11), library(), ZonePosition::Bottom).unwrap();
        zones.add(ObjectId(12), library(), ZonePosition::Index(1)).unwrap();

        assert_eq!(zones.contents(library()), vec![ObjectId(11), ObjectId(12), ObjectId(10)]);
        assert_eq!(zones.index_of(ObjectId(12)), Some(1));
    }

    #[test]
    fn test_move_reports_origin() {
        let mut zones = manager();
        zones.add(ObjectId(1), library(), ZonePosition::Top).unwrap();
        zones.add(ObjectId(2), library(), ZonePosition::Top).unwrap();

        let hand = Zone::hand(PlayerId::new(0));
        let origin = zones.move_to(ObjectId(1), hand, ZonePosition::Top).unwrap();

        assert_eq!(origin, Some((library(), 0)));
        assert!(zones.is_in(ObjectId(1), hand));
        assert_eq!(zones.len(library()), 1);

        // Moving back to the recorded index restores the order.
        zones.move_to(ObjectId(1), library(), ZonePosition::Index(0)).unwrap();
        assert_eq!(zones.contents(library()), vec![ObjectId(1), ObjectId(2)]);
    }

    #[test]
    fn test_unknown_zone() {
        let mut zones = manager();
        let err = zones.add(ObjectId(1), Zone::EXILE, ZonePosition::Top).unwrap_err();
        assert!(matches!(err, EngineError::UnknownZone(_)));
    }

    #[test]
    fn test_duplicate_add() {
        let mut zones = manager();
        zones.add(ObjectId(1), Zone::BATTLEFIELD, ZonePosition::Top).unwrap();
        let err = zones.add(ObjectId(1), library(), ZonePosition::Top).unwrap_err();
        assert_eq!(err, EngineError::ObjectExists(ObjectId(1)));
    }

    #[test]
    fn test_shuffle_and_restore() {
        let mut zones = manager();
        for i in 0..20 {
            zones.add(ObjectId(i), library(), ZonePosition::Top).unwrap();
        }
        let mut rng = GameRng::new(42);
        let before = zones.shuffle(library(), &mut rng).unwrap();
        assert_ne!(before, zones.contents(library()));

        zones.restore_order(library(), before.clone()).unwrap();
        assert_eq!(zones.contents(library()), before);
    }

    #[test]
    fn test_visibility_classes() {
        assert_eq!(ZoneKind::Library.visibility(), ZoneVisibility::Hidden);
        assert_eq!(ZoneKind::Hand.visibility(), ZoneVisibility::OwnerOnly);
        assert_eq!(ZoneKind::Battlefield.visibility(), ZoneVisibility::Public);
        assert!(ZoneKind::Graveyard.is_per_player());
        assert!(!ZoneKind::Exile.is_per_player());
    }
}
