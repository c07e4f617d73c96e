use mizu_core::{CustomerProfile, CustomerSuggestion, MealPreference, SeatPreference};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatingConfig {
    /// Seats are drawn from rows `1..=rows`.
    pub rows: u32,
    pub aisle_letters: String,
    pub window_letters: String,
}

impl Default for SeatingConfig {
    fn default() -> Self {
        Self {
            rows: 30,
            aisle_letters: "ACEGJ".to_string(),
            window_letters: "BDFHK".to_string(),
        }
    }
}

/// Preference passthrough plus a random seat. There is no collision check, so two
/// customers can end up with the same seat number.
pub struct SuggestionEngine {
    config: SeatingConfig,
}

impl SuggestionEngine {
    pub fn new(config: SeatingConfig) -> Self {
        Self { config }
    }

    /// `None` when the profile has no usable name.
    pub fn suggest<R: Rng>(
        &self,
        profile: &CustomerProfile,
        rng: &mut R,
    ) -> Option<CustomerSuggestion> {
        let (first_name, last_name) = split_name(profile.name.as_deref()?)?;
        let seat = SeatPreference::from_stated(profile.seat_preference.as_deref());

        Some(CustomerSuggestion {
            first_name,
            last_name,
            email: profile.email.clone(),
            seat_suggestion: seat,
            meal_suggestion: MealPreference::from_stated(profile.meal_preference.as_deref()),
            most_common_route: profile
                .frequent_routes
                .as_deref()
                .and_then(most_common_route),
            assigned_seat_number: self.assign_seat_number(seat, rng),
        })
    }

    /// Random row plus a letter from the preference's letter set, e.g. `"17C"`.
    pub fn assign_seat_number<R: Rng>(&self, preference: SeatPreference, rng: &mut R) -> String {
        let row = rng.gen_range(1..=self.config.rows.max(1));
        let letters: Vec<char> = match preference {
            SeatPreference::Aisle => self.config.aisle_letters.chars().collect(),
            SeatPreference::Window => self.config.window_letters.chars().collect(),
        };

        match letters.choose(rng) {
            Some(letter) => format!("{}{}", row, letter),
            None => row.to_string(),
        }
    }
}

/// Mode of a comma-separated route list. Ties go to the route seen first.
pub fn most_common_route(frequent_routes: &str) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for route in frequent_routes.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        match counts.iter().position(|(seen, _)| *seen == route) {
            Some(index) => counts[index].1 += 1,
            None => counts.push((route, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (route, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((route, count));
        }
    }
    best.map(|(route, _)| route.to_string())
}

/// First whitespace-separated word, then the rest. A one-word name has an empty last name.
pub fn split_name(name: &str) -> Option<(String, String)> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut parts = name.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.next().unwrap_or_default().trim().to_string();
    Some((first, last))
}
