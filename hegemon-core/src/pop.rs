//! Pop types and pops.
//!
//! Pops are owned by their province. During the parallel order-submission
//! phase each province's pops are touched only by that province's worker;
//! during clearing the settlement dispatcher mutates them from the single
//! clearing thread.

use crate::economy::artisan::ArtisanalProducer;
use crate::fixed::Fixed;
use crate::registry::{HasIdentifier, Registry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pop head-count.
pub type PopSize = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PopTypeId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CultureId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReligionId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdeologyId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IssueId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strata {
    Poor,
    Middle,
    Rich,
}

/// Immutable description of a pop category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopType {
    identifier: String,
    strata: Strata,
    is_slave: bool,
    can_be_recruited: bool,
}

impl PopType {
    pub fn new(
        identifier: impl Into<String>,
        strata: Strata,
        is_slave: bool,
        can_be_recruited: bool,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            strata,
            is_slave,
            can_be_recruited,
        }
    }

    pub fn strata(&self) -> Strata {
        self.strata
    }

    pub fn is_slave(&self) -> bool {
        self.is_slave
    }

    pub fn can_be_recruited(&self) -> bool {
        self.can_be_recruited
    }
}

impl HasIdentifier for PopType {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug)]
pub struct PopTypeManager {
    pop_types: Registry<PopType>,
}

impl Default for PopTypeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PopTypeManager {
    pub fn new() -> Self {
        Self {
            pop_types: Registry::new("pop types"),
        }
    }

    pub fn add_pop_type(&mut self, pop_type: PopType) -> bool {
        self.pop_types.add(pop_type)
    }

    pub fn lock(&mut self) {
        self.pop_types.lock();
    }

    pub fn pop_types(&self) -> &Registry<PopType> {
        &self.pop_types
    }

    pub fn pop_type(&self, id: PopTypeId) -> Option<&PopType> {
        self.pop_types.by_index(id.0 as usize)
    }

    pub fn pop_type_id(&self, identifier: &str) -> Option<PopTypeId> {
        self.pop_types.index_of(identifier).map(|i| PopTypeId(i as u8))
    }
}

/// A population unit: a head count with a type, money, attitudes and an
/// optional artisanal producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pop {
    pop_type: PopTypeId,
    size: PopSize,
    culture: CultureId,
    religion: ReligionId,
    ideology_distribution: BTreeMap<IdeologyId, Fixed>,
    issue_distribution: BTreeMap<IssueId, Fixed>,
    cash: Fixed,
    literacy: Fixed,
    consciousness: Fixed,
    militancy: Fixed,
    rgo_owner_income_today: Fixed,
    rgo_worker_income_today: Fixed,
    artisan_income_today: Fixed,
    artisan: Option<ArtisanalProducer>,
}

impl Pop {
    pub fn new(pop_type: PopTypeId, size: PopSize, culture: CultureId, religion: ReligionId) -> Self {
        Self {
            pop_type,
            size,
            culture,
            religion,
            ideology_distribution: BTreeMap::new(),
            issue_distribution: BTreeMap::new(),
            cash: Fixed::ZERO,
            literacy: Fixed::ZERO,
            consciousness: Fixed::ZERO,
            militancy: Fixed::ZERO,
            rgo_owner_income_today: Fixed::ZERO,
            rgo_worker_income_today: Fixed::ZERO,
            artisan_income_today: Fixed::ZERO,
            artisan: None,
        }
    }

    pub fn pop_type(&self) -> PopTypeId {
        self.pop_type
    }

    pub fn size(&self) -> PopSize {
        self.size
    }

    pub fn culture(&self) -> CultureId {
        self.culture
    }

    pub fn religion(&self) -> ReligionId {
        self.religion
    }

    pub fn cash(&self) -> Fixed {
        self.cash
    }

    pub fn literacy(&self) -> Fixed {
        self.literacy
    }

    pub fn consciousness(&self) -> Fixed {
        self.consciousness
    }

    pub fn militancy(&self) -> Fixed {
        self.militancy
    }

    pub fn set_cash(&mut self, cash: Fixed) {
        self.cash = cash;
    }

    pub fn set_attitudes(&mut self, literacy: Fixed, consciousness: Fixed, militancy: Fixed) {
        self.literacy = literacy;
        self.consciousness = consciousness;
        self.militancy = militancy;
    }

    pub fn set_ideology(&mut self, ideology: IdeologyId, weight: Fixed) {
        self.ideology_distribution.insert(ideology, weight);
    }

    pub fn set_issue(&mut self, issue: IssueId, weight: Fixed) {
        self.issue_distribution.insert(issue, weight);
    }

    pub fn ideology_distribution(&self) -> &BTreeMap<IdeologyId, Fixed> {
        &self.ideology_distribution
    }

    pub fn issue_distribution(&self) -> &BTreeMap<IssueId, Fixed> {
        &self.issue_distribution
    }

    pub fn artisan(&self) -> Option<&ArtisanalProducer> {
        self.artisan.as_ref()
    }

    pub(crate) fn artisan_mut(&mut self) -> Option<&mut ArtisanalProducer> {
        self.artisan.as_mut()
    }

    pub fn set_artisan(&mut self, artisan: Option<ArtisanalProducer>) {
        self.artisan = artisan;
    }

    pub(crate) fn take_artisan(&mut self) -> Option<ArtisanalProducer> {
        self.artisan.take()
    }

    pub(crate) fn put_artisan(&mut self, artisan: ArtisanalProducer) {
        self.artisan = Some(artisan);
    }

    /// Debit cash for an order being placed; the settlement refunds any
    /// money left over.
    pub(crate) fn spend_cash(&mut self, amount: Fixed) {
        self.cash = Fixed::max(Fixed::ZERO, self.cash - amount);
    }

    pub(crate) fn add_cash(&mut self, amount: Fixed) {
        self.cash += amount;
    }

    pub fn add_rgo_owner_income(&mut self, income: Fixed) {
        self.cash += income;
        self.rgo_owner_income_today += income;
    }

    pub fn add_rgo_worker_income(&mut self, income: Fixed) {
        self.cash += income;
        self.rgo_worker_income_today += income;
    }

    pub fn add_artisan_income(&mut self, income: Fixed) {
        self.cash += income;
        self.artisan_income_today += income;
    }

    pub fn rgo_owner_income_today(&self) -> Fixed {
        self.rgo_owner_income_today
    }

    pub fn rgo_worker_income_today(&self) -> Fixed {
        self.rgo_worker_income_today
    }

    pub fn artisan_income_today(&self) -> Fixed {
        self.artisan_income_today
    }

    /// Reset per-tick income trackers at the start of a new day.
    pub(crate) fn reset_daily_income(&mut self) {
        self.rgo_owner_income_today = Fixed::ZERO;
        self.rgo_worker_income_today = Fixed::ZERO;
        self.artisan_income_today = Fixed::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_tracks_cash() {
        let mut pop = Pop::new(PopTypeId(0), 1000, CultureId(0), ReligionId(0));
        pop.add_rgo_worker_income(Fixed::from_int(5));
        pop.add_rgo_owner_income(Fixed::from_int(3));
        assert_eq!(pop.cash(), Fixed::from_int(8));
        assert_eq!(pop.rgo_worker_income_today(), Fixed::from_int(5));
        pop.reset_daily_income();
        assert_eq!(pop.rgo_worker_income_today(), Fixed::ZERO);
        assert_eq!(pop.cash(), Fixed::from_int(8));
    }

    #[test]
    fn spend_cash_floors_at_zero() {
        let mut pop = Pop::new(PopTypeId(0), 1000, CultureId(0), ReligionId(0));
        pop.add_cash(Fixed::from_int(2));
        pop.spend_cash(Fixed::from_int(5));
        assert_eq!(pop.cash(), Fixed::ZERO);
    }

    #[test]
    fn pop_type_manager_lookup() {
        let mut manager = PopTypeManager::new();
        assert!(manager.add_pop_type(PopType::new("farmers", Strata::Poor, false, false)));
        assert!(manager.add_pop_type(PopType::new("slaves", Strata::Poor, true, false)));
        manager.lock();
        let slaves = manager.pop_type_id("slaves").unwrap();
        assert!(manager.pop_type(slaves).unwrap().is_slave());
    }
}
