//! Fixed score tables: standard arrays, point-buy costs, proficiency bonus.

/// The fallback standard array when a class has no array of its own.
pub const DEFAULT_STANDARD_ARRAY: [i32; 6] = [15, 14, 13, 12, 10, 8];

/// Point-buy budget.
pub const POINT_BUY_BUDGET: i32 = 27;

/// Lowest and highest base score purchasable under point buy.
pub const POINT_BUY_RANGE: (i32, i32) = (8, 15);

/// Point-buy cost of a base score, if purchasable.
pub fn point_buy_cost(base: i32) -> Option<i32> {
    match base {
        8 => Some(0),
        9 => Some(1),
        10 => Some(2),
        11 => Some(3),
        12 => Some(4),
        13 => Some(5),
        14 => Some(7),
        15 => Some(9),
        _ => None,
    }
}

/// Proficiency bonus by character level.
pub fn proficiency_bonus(level: u8) -> i32 {
    ((level.max(1) as i32 - 1) / 4) + 2
}

/// Fixed fallback arrays, ordered STR/DEX/CON/INT/WIS/CHA with the high
/// scores placed where each class wants them. Used when the class record is
/// missing or carries no array of its own.
pub fn fallback_standard_array(class_id: &str) -> [i32; 6] {
    match class_id.to_lowercase().as_str() {
        "barbarian" => [15, 13, 14, 10, 12, 8],
        "fighter" => [15, 14, 13, 8, 12, 10],
        "paladin" => [15, 10, 13, 8, 12, 14],
        "monk" | "ranger" => [12, 15, 13, 8, 14, 10],
        "rogue" => [12, 15, 13, 14, 10, 8],
        "cleric" => [13, 10, 14, 8, 15, 12],
        "druid" => [10, 12, 14, 8, 15, 13],
        "wizard" => [8, 13, 14, 15, 12, 10],
        "bard" | "sorcerer" | "warlock" => [8, 13, 14, 10, 12, 15],
        _ => DEFAULT_STANDARD_ARRAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proficiency_bonus_progression() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(8), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(13), 5);
        assert_eq!(proficiency_bonus(17), 6);
        assert_eq!(proficiency_bonus(20), 6);
    }

    #[test]
    fn proficiency_bonus_clamps_level_zero() {
        assert_eq!(proficiency_bonus(0), 2);
    }

    #[test]
    fn point_buy_costs_match_table() {
        assert_eq!(point_buy_cost(8), Some(0));
        assert_eq!(point_buy_cost(13), Some(5));
        assert_eq!(point_buy_cost(14), Some(7));
        assert_eq!(point_buy_cost(15), Some(9));
        assert_eq!(point_buy_cost(7), None);
        assert_eq!(point_buy_cost(16), None);
    }

    #[test]
    fn default_array_costs_exactly_the_budget() {
        let total: i32 = DEFAULT_STANDARD_ARRAY
            .iter()
            .filter_map(|&score| point_buy_cost(score))
            .sum();
        assert_eq!(total, POINT_BUY_BUDGET);
    }

    #[test]
    fn fallback_arrays_are_permutations_of_the_default() {
        for class in ["barbarian", "druid", "wizard", "rogue", "unknown"] {
            let mut array = fallback_standard_array(class);
            array.sort_unstable();
            let mut expected = DEFAULT_STANDARD_ARRAY;
            expected.sort_unstable();
            assert_eq!(array, expected, "class {}", class);
        }
    }
}
