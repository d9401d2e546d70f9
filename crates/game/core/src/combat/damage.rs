//! Damage formula.

/// Defense value of buildings and lairs.
pub const STRUCTURE_DEFENSE: i32 = 2;

/// Damage dealt by one strike: attack minus defense, never below 1.
pub const fn damage(attack: i32, defense: i32) -> i32 {
    let raw = attack - defense;
    if raw < 1 { 1 } else { raw }
}
