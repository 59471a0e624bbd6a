//! Medicine lookup and the shopping cart

use super::Companion;
use crate::gateway::{Blob, MedicineDraft};
use crate::records::{new_id, Medicine};
use crate::{MediZenError, Result};
use std::path::Path;

/// Price used when an item is added without one
pub const DEFAULT_CART_PRICE: f64 = 199.0;

/// Price shown for scanned prescriptions the model did not price
pub const MARKET_SCAN_PRICE: f64 = 299.0;

/// Fill the gaps of a model-provided medicine
pub fn complete_medicine(draft: MedicineDraft, fallback_price: f64) -> Medicine {
    fn or_default(value: Option<String>, default: &str) -> String {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    Medicine {
        id: draft
            .id
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| new_id("med")),
        name: or_default(draft.name, "Generic Product"),
        kind: or_default(draft.kind, "Pharmaceutical"),
        uses: draft.uses,
        dosage: or_default(draft.dosage, "Consult Physician"),
        price: draft.price.filter(|p| *p > 0.0).unwrap_or(fallback_price),
        description: draft.description.unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<Medicine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, draft: MedicineDraft) -> &Medicine {
        self.items.push(complete_medicine(draft, DEFAULT_CART_PRICE));
        // Just pushed, so the slice cannot be empty
        &self.items[self.items.len() - 1]
    }

    pub fn items(&self) -> &[Medicine] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|m| m.price).sum()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Companion {
    pub async fn identify_medicine(&self, name: &str) -> Result<MedicineDraft> {
        if name.trim().is_empty() {
            return Err(MediZenError::InvalidInput("medicine name is required".into()));
        }
        self.gateway.identify_medicine(name.trim()).await
    }

    pub async fn identify_medicine_image(&self, path: &Path) -> Result<MedicineDraft> {
        let image = Blob::from_file(path)?;
        self.gateway.analyze_medicine_image(&image).await
    }

    pub async fn suggest_medicines(&self, symptoms: &str) -> Result<Vec<MedicineDraft>> {
        if symptoms.trim().is_empty() {
            return Err(MediZenError::InvalidInput("describe the symptoms".into()));
        }
        self.gateway.suggest_medicines(symptoms.trim()).await
    }

    /// Medicines found in a prescription or report, priced for the market view
    pub async fn scan_prescription(&self, path: &Path) -> Result<Vec<Medicine>> {
        let document = Blob::from_file(path)?;
        let drafts = self.gateway.extract_medicines_from_report(&document).await?;
        Ok(drafts
            .into_iter()
            .map(|d| complete_medicine(d, MARKET_SCAN_PRICE))
            .collect())
    }
}
