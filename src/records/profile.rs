//! The user profile singleton and its typed patch
//!
//! Every feature that touches the profile describes its change as a
//! [`ProfilePatch`]; [`apply_patch`] is the only way a patch reaches a
//! profile, so a sequence of patches can be replayed deterministically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub character_name: String,
    pub age: u32,
    pub blood_pressure: String,
    pub blood_sugar: f64,
    /// 1-10
    pub stress_level: u8,
    pub hemoglobin: f64,
    pub medi_points: u32,
    pub unlocked_items: Vec<String>,
    pub equipped_base: String,
    pub equipped_face: String,
    pub equipped_shirt: String,
    pub equipped_pants: String,
    pub equipped_shoes: String,
    pub equipped_pet: String,
    pub last_check_in: Option<NaiveDate>,
    pub streak: u32,
    pub max_streak: u32,
}

impl UserProfile {
    pub fn has_unlocked(&self, item_id: &str) -> bool {
        self.unlocked_items.iter().any(|id| id == item_id)
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        initial_profile()
    }
}

/// The profile every new installation starts with
pub fn initial_profile() -> UserProfile {
    UserProfile {
        name: "New Explorer".to_string(),
        character_name: "MediBot".to_string(),
        age: 25,
        blood_pressure: "120/80".to_string(),
        blood_sugar: 90.0,
        stress_level: 3,
        hemoglobin: 14.5,
        medi_points: 200,
        unlocked_items: ["base_1", "face_1", "shirt_1", "pants_1", "shoes_1"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        equipped_base: "base_1".to_string(),
        equipped_face: "face_1".to_string(),
        equipped_shirt: "shirt_1".to_string(),
        equipped_pants: "pants_1".to_string(),
        equipped_shoes: "shoes_1".to_string(),
        equipped_pet: String::new(),
        last_check_in: None,
        streak: 0,
        max_streak: 0,
    }
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub character_name: Option<String>,
    pub age: Option<u32>,
    pub blood_pressure: Option<String>,
    pub blood_sugar: Option<f64>,
    pub stress_level: Option<u8>,
    pub hemoglobin: Option<f64>,
    pub medi_points: Option<u32>,
    pub unlocked_items: Option<Vec<String>>,
    pub equipped_base: Option<String>,
    pub equipped_face: Option<String>,
    pub equipped_shirt: Option<String>,
    pub equipped_pants: Option<String>,
    pub equipped_shoes: Option<String>,
    pub equipped_pet: Option<String>,
    pub last_check_in: Option<NaiveDate>,
    pub streak: Option<u32>,
    pub max_streak: Option<u32>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }

    pub fn points(mut self, medi_points: u32) -> Self {
        self.medi_points = Some(medi_points);
        self
    }

    pub fn blood_pressure(mut self, value: impl Into<String>) -> Self {
        self.blood_pressure = Some(value.into());
        self
    }

    pub fn blood_sugar(mut self, value: f64) -> Self {
        self.blood_sugar = Some(value);
        self
    }

    pub fn stress_level(mut self, value: u8) -> Self {
        self.stress_level = Some(value);
        self
    }

    pub fn hemoglobin(mut self, value: f64) -> Self {
        self.hemoglobin = Some(value);
        self
    }

    pub fn character_name(mut self, value: impl Into<String>) -> Self {
        self.character_name = Some(value.into());
        self
    }
}

/// Merge a patch into a profile, returning the new profile
pub fn apply_patch(profile: &UserProfile, patch: &ProfilePatch) -> UserProfile {
    let mut next = profile.clone();

    macro_rules! merge {
        ($($field:ident),* $(,)?) => {
            $(
                if let Some(value) = &patch.$field {
                    next.$field = value.clone();
                }
            )*
        };
    }

    merge!(
        name,
        character_name,
        age,
        blood_pressure,
        blood_sugar,
        stress_level,
        hemoglobin,
        medi_points,
        unlocked_items,
        equipped_base,
        equipped_face,
        equipped_shirt,
        equipped_pants,
        equipped_shoes,
        equipped_pet,
        streak,
        max_streak,
    );

    if let Some(date) = patch.last_check_in {
        next.last_check_in = Some(date);
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_profile() {
        let profile = initial_profile();
        assert_eq!(profile.medi_points, 200);
        assert_eq!(profile.streak, 0);
        assert!(profile.has_unlocked("face_1"));
        assert!(!profile.has_unlocked("pet_cat"));
        assert!(profile.equipped_pet.is_empty());
    }

    #[test]
    fn test_patch_only_touches_named_fields() {
        let profile = initial_profile();
        let patch = ProfilePatch::default().points(210).blood_sugar(101.5);

        let next = apply_patch(&profile, &patch);

        assert_eq!(next.medi_points, 210);
        assert_eq!(next.blood_sugar, 101.5);
        assert_eq!(next.name, profile.name);
        assert_eq!(next.unlocked_items, profile.unlocked_items);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let profile = initial_profile();
        assert!(ProfilePatch::default().is_empty());
        assert_eq!(apply_patch(&profile, &ProfilePatch::default()), profile);
    }

    #[test]
    fn test_replaying_patches_is_deterministic() {
        let patches = vec![
            ProfilePatch::default().points(250),
            ProfilePatch::default().character_name("Nova"),
            ProfilePatch::default().points(150).stress_level(6),
        ];

        let run = || {
            patches
                .iter()
                .fold(initial_profile(), |profile, patch| apply_patch(&profile, patch))
        };

        let first = run();
        assert_eq!(first, run());
        assert_eq!(first.medi_points, 150);
        assert_eq!(first.character_name, "Nova");
        assert_eq!(first.stress_level, 6);
    }
}
