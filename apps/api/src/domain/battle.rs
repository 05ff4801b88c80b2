use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three stats a battle is decided on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStats {
    pub hp: u32,
    pub attack: u32,
    pub speed: u32,
}

/// Which of the two combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
}

/// Result of comparing two combatants stat by stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BattleOutcome {
    pub first_points: u8,
    pub second_points: u8,
    pub winner: Side,
}

/// Decides a battle between two combatants.
///
/// Each of hp, attack and speed awards one point to the strictly greater
/// side; equal values award nothing. The first combatant wins only with
/// strictly more points, so a points tie goes to the second.
///
/// # Example
/// ```
/// use pokemon_team_api::domain::battle::{decide, BattleStats, Side};
///
/// let pikachu = BattleStats { hp: 35, attack: 55, speed: 90 };
/// let snorlax = BattleStats { hp: 160, attack: 110, speed: 30 };
///
/// assert_eq!(decide(&pikachu, &snorlax).winner, Side::Second);
/// ```
pub fn decide(first: &BattleStats, second: &BattleStats) -> BattleOutcome {
    let axes = [
        (first.hp, second.hp),
        (first.attack, second.attack),
        (first.speed, second.speed),
    ];

    let (mut first_points, mut second_points) = (0u8, 0u8);
    for (a, b) in axes {
        if a > b {
            first_points += 1;
        } else if b > a {
            second_points += 1;
        }
    }

    let winner = if first_points > second_points {
        Side::First
    } else {
        Side::Second
    };

    BattleOutcome {
        first_points,
        second_points,
        winner,
    }
}

/// One entry in the battle history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub id: u64,
    pub pokemon1: String,
    pub pokemon2: String,
    pub winner: String,
    pub timestamp: DateTime<Utc>,
}

/// A battle result waiting to be recorded
#[derive(Debug, Clone, PartialEq)]
pub struct NewBattle {
    pub pokemon1: String,
    pub pokemon2: String,
    pub winner: String,
}

impl NewBattle {
    pub fn into_record(self, id: u64, timestamp: DateTime<Utc>) -> BattleRecord {
        BattleRecord {
            id,
            pokemon1: self.pokemon1,
            pokemon2: self.pokemon2,
            winner: self.winner,
            timestamp,
        }
    }
}
