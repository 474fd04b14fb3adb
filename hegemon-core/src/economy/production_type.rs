//! Production type definitions: what a producer makes, from what, with whom.

use crate::economy::good::GoodId;
use crate::fixed::Fixed;
use crate::pop::{PopSize, PopTypeId};
use crate::registry::{HasIdentifier, Registry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductionTypeId(pub u16);

/// How a job's workforce share feeds into the production formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobEffect {
    Output,
    Throughput,
}

/// One employed role in a production type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Job {
    pub pop_type: PopTypeId,
    pub effect: JobEffect,
    pub effect_multiplier: Fixed,
    /// Cap on the workforce share this job can contribute, applied when the
    /// effect multiplier is not one.
    pub amount: Fixed,
}

/// Immutable description of a production operation: output good, base
/// quantities, worker jobs, optional owner job, inputs and the farm/mine
/// classification driving which RGO modifiers apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionType {
    identifier: String,
    output_good: GoodId,
    base_output_quantity: Fixed,
    base_workforce_size: PopSize,
    owner: Option<Job>,
    jobs: Vec<Job>,
    input_goods: BTreeMap<GoodId, Fixed>,
    farm: bool,
    mine: bool,
}

impl ProductionType {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identifier: impl Into<String>,
        output_good: GoodId,
        base_output_quantity: Fixed,
        base_workforce_size: PopSize,
        owner: Option<Job>,
        jobs: Vec<Job>,
        input_goods: BTreeMap<GoodId, Fixed>,
        farm: bool,
        mine: bool,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            output_good,
            base_output_quantity,
            base_workforce_size,
            owner,
            jobs,
            input_goods,
            farm,
            mine,
        }
    }

    pub fn output_good(&self) -> GoodId {
        self.output_good
    }

    pub fn base_output_quantity(&self) -> Fixed {
        self.base_output_quantity
    }

    pub fn base_workforce_size(&self) -> PopSize {
        self.base_workforce_size
    }

    pub fn owner(&self) -> Option<&Job> {
        self.owner.as_ref()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn input_goods(&self) -> &BTreeMap<GoodId, Fixed> {
        &self.input_goods
    }

    pub fn is_farm(&self) -> bool {
        self.farm
    }

    pub fn is_mine(&self) -> bool {
        self.mine
    }

    /// Whether a pop of this type is employable by one of the jobs.
    pub fn employs(&self, pop_type: PopTypeId) -> bool {
        self.jobs.iter().any(|job| job.pop_type == pop_type)
    }
}

impl HasIdentifier for ProductionType {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug)]
pub struct ProductionTypeManager {
    production_types: Registry<ProductionType>,
}

impl Default for ProductionTypeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductionTypeManager {
    pub fn new() -> Self {
        Self {
            production_types: Registry::new("production types"),
        }
    }

    pub fn add_production_type(&mut self, production_type: ProductionType) -> bool {
        if production_type.identifier().is_empty() {
            log::error!("invalid production type identifier - empty");
            return false;
        }
        if production_type.base_workforce_size <= 0 {
            log::error!(
                "production type {} has non-positive base workforce size",
                production_type.identifier()
            );
            return false;
        }
        self.production_types.add(production_type)
    }

    pub fn lock(&mut self) {
        self.production_types.lock();
    }

    pub fn production_types(&self) -> &Registry<ProductionType> {
        &self.production_types
    }

    pub fn production_type(&self, id: ProductionTypeId) -> Option<&ProductionType> {
        self.production_types.by_index(id.0 as usize)
    }

    pub fn production_type_id(&self, identifier: &str) -> Option<ProductionTypeId> {
        self.production_types
            .index_of(identifier)
            .map(|i| ProductionTypeId(i as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_workforce() {
        let mut manager = ProductionTypeManager::new();
        let bad = ProductionType::new(
            "broken_rgo",
            GoodId(0),
            Fixed::ONE,
            0,
            None,
            Vec::new(),
            BTreeMap::new(),
            true,
            false,
        );
        assert!(!manager.add_production_type(bad));
    }

    #[test]
    fn employs_checks_job_pop_types() {
        let farmers = PopTypeId(0);
        let labourers = PopTypeId(1);
        let production_type = ProductionType::new(
            "grain_farm",
            GoodId(0),
            Fixed::from_int(2),
            10_000,
            None,
            vec![Job {
                pop_type: farmers,
                effect: JobEffect::Throughput,
                effect_multiplier: Fixed::ONE,
                amount: Fixed::ONE,
            }],
            BTreeMap::new(),
            true,
            false,
        );
        assert!(production_type.employs(farmers));
        assert!(!production_type.employs(labourers));
    }
}
