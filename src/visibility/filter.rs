//! Visibility filters.

use crate::core::{ObjectId, PlayerId};
use crate::objects::ObjectManager;
use crate::properties::ObjectKind;
use crate::zones::ZoneVisibility;

/// Decides which objects an observer may see.
///
/// `observer` is `None` for spectators.
pub trait VisibilityFilter {
    fn is_visible(&self, manager: &ObjectManager, object: ObjectId, observer: Option<PlayerId>) -> bool;
}

/// Everything is visible to everyone.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysVisible;

impl VisibilityFilter for AlwaysVisible {
    fn is_visible(&self, _manager: &ObjectManager, _object: ObjectId, _observer: Option<PlayerId>) -> bool {
        true
    }
}

/// Visibility by zone: libraries are hidden from everyone, hands are shown
/// to their owner only, every other zone is public. Player objects and
/// objects outside any zone are always visible.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZoneVisibilityFilter;

impl VisibilityFilter for ZoneVisibilityFilter {
    fn is_visible(&self, manager: &ObjectManager, object: ObjectId, observer: Option<PlayerId>) -> bool {
        let Ok(obj) = manager.object(object) else {
            return false;
        };
        if *obj.kind() == ObjectKind::PLAYER {
            return true;
        }
        let Some(zone) = manager.zone_of(object) else {
            return true;
        };
        match zone.kind.visibility() {
            ZoneVisibility::Public => true,
            ZoneVisibility::Hidden => false,
            ZoneVisibility::OwnerOnly => observer.is_some() && observer == zone.owner,
        }
    }
}
