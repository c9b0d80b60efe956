//! Built-in rule properties.
//!
//! Every registry starts with these, so flow parts and scopes can rely on
//! them without a lookup.

use super::property::{ObjectKind, Property, PropertyFlags};
use super::registry::Descriptors;
use super::value::PropertyType;
use crate::core::{ObjectId, PlayerId};

/// Typed handles to the built-in properties.
#[derive(Clone, Copy, Debug)]
pub struct StandardProperties {
    // === Player ===
    /// Seat of a player object.
    pub seat: Property<Option<PlayerId>>,
    pub life: Property<i64>,
    pub max_hand_size: Property<i64>,
    pub lands_per_turn: Property<i64>,
    /// Owner-only knowledge.
    pub mulligans_taken: Property<i64>,

    // === Card ===
    pub name: Property<String>,
    pub power: Property<i64>,
    pub toughness: Property<i64>,
    pub tapped: Property<bool>,
    pub damage: Property<i64>,
    pub is_land: Property<bool>,
    pub is_creature: Property<bool>,
    pub owner: Property<Option<PlayerId>>,
    pub controller: Property<Option<PlayerId>>,

    // === Attached ===
    pub lands_played_this_turn: Property<i64>,
    pub attacking: Property<bool>,
    pub blocking: Property<Option<ObjectId>>,
    pub drew_from_empty_library: Property<bool>,
}

fn add<T: PropertyType>(
    table: &mut Descriptors,
    name: &str,
    owner: ObjectKind,
    flags: PropertyFlags,
    default: T,
) -> Property<T> {
    Property::from_id(table.push(name, owner, flags, default.into_value()))
}

impl StandardProperties {
    pub(super) fn register(table: &mut Descriptors) -> Self {
        use PropertyFlags as F;

        let player = ObjectKind::PLAYER;
        let card = ObjectKind::CARD;
        let any = ObjectKind::ANY;

        Self {
            seat: add(table, "Seat", player.clone(), F::NONE, None::<PlayerId>),
            life: add(table, "Life", player.clone(), F::NONE, 0i64),
            max_hand_size: add(table, "MaxHandSize", player.clone(), F::MODIFIABLE, 7i64),
            lands_per_turn: add(table, "LandsPerTurn", player.clone(), F::MODIFIABLE, 1i64),
            mulligans_taken: add(table, "MulligansTaken", player, F::PRIVATE, 0i64),

            name: add(table, "Name", card.clone(), F::NONE, String::new()),
            power: add(table, "Power", card.clone(), F::MODIFIABLE, 0i64),
            toughness: add(table, "Toughness", card.clone(), F::MODIFIABLE, 0i64),
            tapped: add(table, "Tapped", card.clone(), F::NONE, false),
            damage: add(table, "Damage", card.clone(), F::NONE, 0i64),
            is_land: add(table, "IsLand", card.clone(), F::NONE, false),
            is_creature: add(table, "IsCreature", card.clone(), F::MODIFIABLE, false),
            owner: add(table, "Owner", card.clone(), F::NONE, None::<PlayerId>),
            controller: add(table, "Controller", card, F::MODIFIABLE, None::<PlayerId>),

            lands_played_this_turn: add(table, "LandsPlayedThisTurn", any.clone(), F::ATTACHED, 0i64),
            attacking: add(table, "Attacking", any.clone(), F::ATTACHED, false),
            blocking: add(table, "Blocking", any.clone(), F::ATTACHED, None::<ObjectId>),
            drew_from_empty_library: add(table, "DrewFromEmptyLibrary", any, F::ATTACHED, false),
        }
    }
}
