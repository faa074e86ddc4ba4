//! Credit pack catalog for scout-billing.
//!
//! Packs are static configuration, not user data: each maps a fixed price
//! in the currency's minor unit to a fixed number of search credits.

use serde::{Deserialize, Serialize};

/// A purchasable credit pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditPack {
    /// Stable catalog identifier (e.g. "starter").
    pub id: String,

    /// Price in the currency's smallest unit (cents for USD).
    pub price_minor_units: i64,

    /// Number of credits granted on a successful purchase.
    pub credits_granted: i64,

    /// Payment-processor price ID, if the pack is mirrored there.
    #[serde(default)]
    pub processor_price_id: Option<String>,
}

/// The static catalog of purchasable packs.
///
/// Loaded from configuration at startup; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackCatalog {
    packs: Vec<CreditPack>,
}

impl PackCatalog {
    /// Build a catalog from a list of packs.
    #[must_use]
    pub fn new(packs: Vec<CreditPack>) -> Self {
        Self { packs }
    }

    /// Resolve a pack by catalog ID or processor price ID.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<&CreditPack> {
        self.packs.iter().find(|pack| {
            pack.id == id || pack.processor_price_id.as_deref() == Some(id)
        })
    }

    /// All packs, in catalog order.
    #[must_use]
    pub fn packs(&self) -> &[CreditPack] {
        &self.packs
    }
}

impl Default for PackCatalog {
    fn default() -> Self {
        Self {
            packs: vec![
                CreditPack {
                    id: "starter".into(),
                    price_minor_units: 900, // $9
                    credits_granted: 50,
                    processor_price_id: None,
                },
                CreditPack {
                    id: "growth".into(),
                    price_minor_units: 2900, // $29
                    credits_granted: 200,
                    processor_price_id: None,
                },
                CreditPack {
                    id: "scale".into(),
                    price_minor_units: 9900, // $99
                    credits_granted: 1000,
                    processor_price_id: None,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_resolves_by_id() {
        let catalog = PackCatalog::default();
        let pack = catalog.resolve("starter").unwrap();
        assert_eq!(pack.credits_granted, 50);
        assert_eq!(pack.price_minor_units, 900);
    }

    #[test]
    fn unknown_pack_is_none() {
        let catalog = PackCatalog::default();
        assert!(catalog.resolve("enterprise").is_none());
    }

    #[test]
    fn resolves_by_processor_price_id() {
        let catalog = PackCatalog::new(vec![CreditPack {
            id: "starter".into(),
            price_minor_units: 900,
            credits_granted: 50,
            processor_price_id: Some("price_123".into()),
        }]);

        let pack = catalog.resolve("price_123").unwrap();
        assert_eq!(pack.id, "starter");
    }

    #[test]
    fn catalog_deserializes_from_config_json() {
        let json = r#"{"packs":[{"id":"trial","price_minor_units":100,"credits_granted":5}]}"#;
        let catalog: PackCatalog = serde_json::from_str(json).unwrap();
        let pack = catalog.resolve("trial").unwrap();
        assert_eq!(pack.credits_granted, 5);
        assert!(pack.processor_price_id.is_none());
    }
}
