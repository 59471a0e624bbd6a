//! Avatar shop paid for with Medi Points

use super::Companion;
use crate::records::{ProfilePatch, UserProfile};
use crate::{MediZenError, Result};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvatarCategory {
    Base,
    Face,
    Shirt,
    Pants,
    Shoes,
    Pet,
}

impl std::fmt::Display for AvatarCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AvatarCategory::Base => "Base",
            AvatarCategory::Face => "Face",
            AvatarCategory::Shirt => "Shirt",
            AvatarCategory::Pants => "Pants",
            AvatarCategory::Shoes => "Shoes",
            AvatarCategory::Pet => "Pet",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarItem {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: u32,
    pub category: AvatarCategory,
}

const fn item(id: &'static str, name: &'static str, cost: u32, category: AvatarCategory) -> AvatarItem {
    AvatarItem {
        id,
        name,
        cost,
        category,
    }
}

use AvatarCategory::*;

pub const AVATAR_ITEMS: [AvatarItem; 26] = [
    item("base_1", "Adventurer Body", 0, Base),
    item("base_2", "Healer Body", 200, Base),
    item("base_3", "Cyber Chassis", 500, Base),
    item("base_4", "Noble Form", 1000, Base),
    item("face_1", "Adventurer Alex", 0, Face),
    item("face_2", "Healer Hope", 100, Face),
    item("face_3", "Cyber Sam", 300, Face),
    item("face_4", "Legendary Leo", 600, Face),
    item("face_cool", "Cool Shades", 150, Face),
    item("face_mask", "Care Mask", 50, Face),
    item("shirt_1", "Basic Tee", 0, Shirt),
    item("shirt_2", "Lab Coat", 150, Shirt),
    item("shirt_3", "Track Suit", 300, Shirt),
    item("shirt_4", "Formal Suit", 600, Shirt),
    item("pants_1", "Blue Jeans", 0, Pants),
    item("pants_2", "Yoga Pants", 100, Pants),
    item("pants_3", "Medical Scrubs", 250, Pants),
    item("pants_4", "Neon Slacks", 450, Pants),
    item("shoes_1", "Sneakers", 0, Shoes),
    item("shoes_2", "Doctor Clogs", 50, Shoes),
    item("shoes_3", "Hiking Boots", 150, Shoes),
    item("shoes_4", "Golden Boots", 500, Shoes),
    item("pet_cat", "Grinning Cat", 150, Pet),
    item("pet_dog", "Loyal Pup", 150, Pet),
    item("pet_robot", "Health Bot", 400, Pet),
    item("pet_dragon", "Ancient Drake", 1500, Pet),
];

pub fn find_item(id: &str) -> Option<&'static AvatarItem> {
    AVATAR_ITEMS.iter().find(|item| item.id == id)
}

fn require_item(id: &str) -> Result<&'static AvatarItem> {
    find_item(id).ok_or_else(|| MediZenError::NotFound(format!("avatar item {}", id)))
}

/// Patch spending the item's cost and unlocking it
pub fn purchase_patch(profile: &UserProfile, item: &AvatarItem) -> Result<ProfilePatch> {
    if profile.has_unlocked(item.id) {
        return Err(MediZenError::InvalidInput(format!("{} is already owned", item.name)));
    }
    if profile.medi_points < item.cost {
        return Err(MediZenError::InsufficientPoints {
            needed: item.cost,
            available: profile.medi_points,
        });
    }

    let mut unlocked = profile.unlocked_items.clone();
    unlocked.push(item.id.to_string());
    Ok(ProfilePatch {
        medi_points: Some(profile.medi_points - item.cost),
        unlocked_items: Some(unlocked),
        ..Default::default()
    })
}

/// Patch putting the item into its category slot
pub fn equip_patch(profile: &UserProfile, item: &AvatarItem) -> Result<ProfilePatch> {
    if !profile.has_unlocked(item.id) {
        return Err(MediZenError::InvalidInput(format!("{} is locked", item.name)));
    }

    let id = Some(item.id.to_string());
    let mut patch = ProfilePatch::default();
    match item.category {
        Base => patch.equipped_base = id,
        Face => patch.equipped_face = id,
        Shirt => patch.equipped_shirt = id,
        Pants => patch.equipped_pants = id,
        Shoes => patch.equipped_shoes = id,
        Pet => patch.equipped_pet = id,
    }
    Ok(patch)
}

impl Companion {
    pub fn purchase_item(&self, item_id: &str) -> Result<UserProfile> {
        let item = require_item(item_id)?;
        let profile = self.store.mutate(|data| {
            let patch = purchase_patch(&data.profile, item)?;
            data.profile = crate::records::apply_patch(&data.profile, &patch);
            Ok(data.profile.clone())
        })?;
        info!("Bought {} for {} points", item.name, item.cost);
        Ok(profile)
    }

    pub fn equip_item(&self, item_id: &str) -> Result<UserProfile> {
        let item = require_item(item_id)?;
        self.store.mutate(|data| {
            let patch = equip_patch(&data.profile, item)?;
            data.profile = crate::records::apply_patch(&data.profile, &patch);
            Ok(data.profile.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{apply_patch, initial_profile};
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: HashSet<_> = AVATAR_ITEMS.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), AVATAR_ITEMS.len());
        let pets = AVATAR_ITEMS.iter().filter(|i| i.category == AvatarCategory::Pet).count();
        assert_eq!(pets, 4);
    }

    #[test]
    fn test_starter_items_are_free_and_owned() {
        let profile = initial_profile();
        for item in AVATAR_ITEMS.iter().filter(|i| i.cost == 0) {
            assert!(profile.has_unlocked(item.id), "{} should be owned", item.id);
        }
    }

    #[test]
    fn test_purchase_deducts_and_unlocks() {
        let profile = initial_profile();
        let cat = find_item("pet_cat").unwrap();

        let next = apply_patch(&profile, &purchase_patch(&profile, cat).unwrap());
        assert_eq!(next.medi_points, 50);
        assert!(next.has_unlocked("pet_cat"));
        assert!(purchase_patch(&next, cat).is_err());
    }

    #[test]
    fn test_purchase_without_points() {
        let dragon = find_item("pet_dragon").unwrap();
        assert!(matches!(
            purchase_patch(&initial_profile(), dragon),
            Err(MediZenError::InsufficientPoints {
                needed: 1500,
                available: 200
            })
        ));
    }

    #[test]
    fn test_equip_sets_category_slot() {
        let mut profile = initial_profile();
        let dog = find_item("pet_dog").unwrap();
        assert!(equip_patch(&profile, dog).is_err());

        profile.unlocked_items.push("pet_dog".into());
        let next = apply_patch(&profile, &equip_patch(&profile, dog).unwrap());
        assert_eq!(next.equipped_pet, "pet_dog");
        assert_eq!(next.equipped_face, "face_1");
    }
}
