//! Climates and continents: province sets carrying a modifier.

use crate::map::province::ProvinceIndex;
use crate::modifier::ModifierId;
use crate::registry::HasIdentifier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClimateId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContinentId(pub u16);

/// A named province set whose membership applies a modifier to each member
/// province. Used for both climates and continents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceSetModifier {
    identifier: String,
    /// The CLIMATE- or CONTINENT-type modifier carrying the set's
    /// effect values.
    modifier: Option<ModifierId>,
    provinces: Vec<ProvinceIndex>,
}

impl ProvinceSetModifier {
    pub(crate) fn new(identifier: impl Into<String>, modifier: Option<ModifierId>) -> Self {
        Self {
            identifier: identifier.into(),
            modifier,
            provinces: Vec::new(),
        }
    }

    pub fn modifier(&self) -> Option<ModifierId> {
        self.modifier
    }

    pub fn provinces(&self) -> &[ProvinceIndex] {
        &self.provinces
    }

    pub(crate) fn add_province(&mut self, province: ProvinceIndex) {
        self.provinces.push(province);
    }
}

impl HasIdentifier for ProvinceSetModifier {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}
