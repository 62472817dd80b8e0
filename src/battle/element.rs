//! Elements and the suppression cycle.

use serde::{Deserialize, Serialize};

/// Multiplier when the attacker suppresses the defender.
pub const ADVANTAGE: f64 = 1.15;

/// Multiplier when the defender suppresses the attacker.
pub const DISADVANTAGE: f64 = 0.85;

/// One of the six battle elements, or `None` for neutral sources.
///
/// Gem values on the match grid are element ids `0..6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Element {
    /// Fire. Id 0.
    Forge,
    /// Water. Id 1.
    Tide,
    /// Plants. Id 2.
    Life,
    /// Sun. Id 3.
    Sol,
    /// Crystal. Id 4.
    Stone,
    /// Wood. Id 5.
    Root,
    /// Neutral. Id -1.
    #[default]
    None,
}

impl Element {
    /// The six real elements, in id order.
    pub const ALL: [Element; 6] = [
        Element::Forge,
        Element::Tide,
        Element::Life,
        Element::Sol,
        Element::Stone,
        Element::Root,
    ];

    /// Numeric id (`-1` for `None`).
    #[must_use]
    pub const fn id(self) -> i8 {
        match self {
            Element::Forge => 0,
            Element::Tide => 1,
            Element::Life => 2,
            Element::Sol => 3,
            Element::Stone => 4,
            Element::Root => 5,
            Element::None => -1,
        }
    }

    /// Element for a numeric id. Ids outside `-1..=5` map to `None` in the
    /// result, so callers can reject them.
    #[must_use]
    pub const fn from_id(id: i64) -> Option<Element> {
        match id {
            0 => Some(Element::Forge),
            1 => Some(Element::Tide),
            2 => Some(Element::Life),
            3 => Some(Element::Sol),
            4 => Some(Element::Stone),
            5 => Some(Element::Root),
            -1 => Some(Element::None),
            _ => None,
        }
    }

    /// Element matching a gem value. Gem values past the sixth element wrap.
    #[must_use]
    pub const fn from_gem(gem: u8) -> Element {
        Element::ALL[(gem % 6) as usize]
    }

    /// Gem value for this element, if it is a real element.
    #[must_use]
    pub const fn gem(self) -> Option<u8> {
        match self {
            Element::None => None,
            other => Some(other.id().unsigned_abs()),
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Element::Forge => "Forge",
            Element::Tide => "Tide",
            Element::Life => "Life",
            Element::Sol => "Sol",
            Element::Stone => "Stone",
            Element::Root => "Root",
            Element::None => "None",
        }
    }

    /// Display color as a hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Element::Forge => "#ff4d4d",
            Element::Tide => "#4da6ff",
            Element::Life => "#4dff88",
            Element::Sol => "#ffff4d",
            Element::Stone => "#bf4dff",
            Element::Root => "#8b4513",
            Element::None => "#ffffff",
        }
    }

    /// Display icon.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Element::Forge => "🔥",
            Element::Tide => "💧",
            Element::Life => "🌿",
            Element::Sol => "☀️",
            Element::Stone => "💎",
            Element::Root => "🌳",
            Element::None => "👤",
        }
    }

    /// The element this one suppresses.
    ///
    /// The relation is the cycle Root → Stone → Tide → Forge → Life → Sol → Root.
    #[must_use]
    pub const fn suppresses(self) -> Option<Element> {
        match self {
            Element::Root => Some(Element::Stone),
            Element::Stone => Some(Element::Tide),
            Element::Tide => Some(Element::Forge),
            Element::Forge => Some(Element::Life),
            Element::Life => Some(Element::Sol),
            Element::Sol => Some(Element::Root),
            Element::None => None,
        }
    }
}

/// Damage multiplier for `attacker` hitting `defender`.
///
/// `None` on either side is always neutral.
#[must_use]
pub fn damage_modifier(attacker: Element, defender: Element) -> f64 {
    if attacker == Element::None || defender == Element::None {
        return 1.0;
    }
    if attacker.suppresses() == Some(defender) {
        ADVANTAGE
    } else if defender.suppresses() == Some(attacker) {
        DISADVANTAGE
    } else {
        1.0
    }
}

/// Apply the element modifier to an integer amount, flooring the result.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn modified_damage(amount: u32, attacker: Element, defender: Element) -> u32 {
    (f64::from(amount) * damage_modifier(attacker, defender)).floor() as u32
}
