//! Resource Gathering Operations: the single production operation a
//! province hosts.
//!
//! The daily step runs in two halves. Sizing, hiring and production happen
//! during the parallel order-submission phase, reading only the province's
//! own pops, its cached modifier sum and the owning state's aggregates.
//! Income distribution happens during the serial clearing phase, where the
//! settlement dispatcher has the whole map and can reach owner pops in
//! sibling provinces.

use crate::economy::production_type::{JobEffect, ProductionType, ProductionTypeId};
use crate::fixed::Fixed;
use crate::map::state::State;
use crate::modifier::cache::ModifierEffectCache;
use crate::modifier::sum::ModifierSum;
use crate::pop::{Pop, PopSize, PopTypeManager};
use serde::{Deserialize, Serialize};

/// One pop's hired share of the RGO workforce, by position in the
/// province's pop list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub pop: usize,
    pub size: PopSize,
}

/// Mutable RGO state attached to a province instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGatheringOperation {
    production_type: Option<ProductionTypeId>,
    size_multiplier: Fixed,
    revenue_yesterday: Fixed,
    output_quantity_yesterday: Fixed,
    unsold_quantity_yesterday: Fixed,
    employees: Vec<Employee>,
    max_employee_count: Fixed,
    total_employee_count: PopSize,
    total_paid_employee_count: PopSize,
    total_owner_income: Fixed,
    total_employee_income: Fixed,
    /// Hired head-count per pop type, indexed by pop type id.
    employee_count_per_type: Vec<PopSize>,
    /// Workers of matching type present in the province, counted during
    /// sizing and reused by the pay phase.
    total_worker_count: PopSize,
    /// Owner pops of the owner job's type across the state, counted during
    /// production and reused by the pay phase.
    total_owner_count_in_state: PopSize,
}

impl ResourceGatheringOperation {
    pub fn new(pop_type_count: usize) -> Self {
        Self {
            production_type: None,
            size_multiplier: Fixed::ZERO,
            revenue_yesterday: Fixed::ZERO,
            output_quantity_yesterday: Fixed::ZERO,
            unsold_quantity_yesterday: Fixed::ZERO,
            employees: Vec::new(),
            max_employee_count: Fixed::ZERO,
            total_employee_count: 0,
            total_paid_employee_count: 0,
            total_owner_income: Fixed::ZERO,
            total_employee_income: Fixed::ZERO,
            employee_count_per_type: vec![0; pop_type_count],
            total_worker_count: 0,
            total_owner_count_in_state: 0,
        }
    }

    pub fn production_type(&self) -> Option<ProductionTypeId> {
        self.production_type
    }

    pub fn set_production_type(&mut self, production_type: Option<ProductionTypeId>) {
        self.production_type = production_type;
    }

    pub fn size_multiplier(&self) -> Fixed {
        self.size_multiplier
    }

    pub fn revenue_yesterday(&self) -> Fixed {
        self.revenue_yesterday
    }

    pub fn output_quantity_yesterday(&self) -> Fixed {
        self.output_quantity_yesterday
    }

    pub fn unsold_quantity_yesterday(&self) -> Fixed {
        self.unsold_quantity_yesterday
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn max_employee_count(&self) -> Fixed {
        self.max_employee_count
    }

    pub fn total_employee_count(&self) -> PopSize {
        self.total_employee_count
    }

    pub fn total_paid_employee_count(&self) -> PopSize {
        self.total_paid_employee_count
    }

    pub fn total_owner_income(&self) -> Fixed {
        self.total_owner_income
    }

    pub fn total_employee_income(&self) -> Fixed {
        self.total_employee_income
    }

    pub(crate) fn total_worker_count(&self) -> PopSize {
        self.total_worker_count
    }

    pub(crate) fn total_owner_count_in_state(&self) -> PopSize {
        self.total_owner_count_in_state
    }

    /// Size modifier: 1 plus the global and local farm/mine size effects
    /// and the good-specific size effect, clamped to ≥ 0.
    pub(crate) fn calculate_size_modifier(
        &self,
        production_type: &ProductionType,
        sum: &ModifierSum,
        cache: &ModifierEffectCache,
    ) -> Fixed {
        let mut size_modifier = Fixed::ONE;
        if production_type.is_farm() {
            size_modifier += sum.effect_nullcheck(cache.farm_rgo_size_global)
                + sum.effect_nullcheck(cache.farm_rgo_size_local);
        }
        if production_type.is_mine() {
            size_modifier += sum.effect_nullcheck(cache.mine_rgo_size_global)
                + sum.effect_nullcheck(cache.mine_rgo_size_local);
        }
        let good_effects = cache.good_effects(production_type.output_good());
        size_modifier += sum.effect_nullcheck(good_effects.rgo_size);
        Fixed::max(size_modifier, Fixed::ZERO)
    }

    /// Count matching workers, derive the size multiplier and the maximum
    /// employee count. Returns the total worker count in the province.
    pub(crate) fn update_size(
        &mut self,
        production_type: &ProductionType,
        pops: &[Pop],
        sum: &ModifierSum,
        cache: &ModifierEffectCache,
        size_modifier: Fixed,
    ) -> PopSize {
        let mut total_worker_count: PopSize = 0;
        for pop in pops {
            if production_type.employs(pop.pop_type()) {
                total_worker_count += pop.size();
            }
        }

        let mut base_size_modifier = Fixed::ONE;
        if production_type.is_farm() {
            base_size_modifier += sum.effect_nullcheck(cache.farm_rgo_size_local);
        }
        if production_type.is_mine() {
            base_size_modifier += sum.effect_nullcheck(cache.mine_rgo_size_local);
        }

        let base_workforce_size = Fixed::from_int(production_type.base_workforce_size());
        if base_size_modifier == Fixed::ZERO {
            self.size_multiplier = Fixed::ZERO;
        } else {
            self.size_multiplier = ((Fixed::from_int(total_worker_count)
                / (base_size_modifier * base_workforce_size))
                .ceil()
                * Fixed::ONE_POINT_FIVE)
                .floor();
        }
        self.max_employee_count = (size_modifier * self.size_multiplier * base_workforce_size).floor();
        self.total_worker_count = total_worker_count;
        total_worker_count
    }

    /// Hire matching pops, everyone if capacity allows, otherwise all pops
    /// proportionally with per-pop floors.
    pub(crate) fn hire(
        &mut self,
        production_type: &ProductionType,
        pops: &[Pop],
        pop_types: &PopTypeManager,
        available_worker_count: PopSize,
    ) {
        self.total_employee_count = 0;
        self.total_paid_employee_count = 0;
        self.employees.clear();
        self.employee_count_per_type.fill(0);

        if self.max_employee_count <= Fixed::ZERO || available_worker_count <= 0 {
            return;
        }

        let proportion_to_hire = if self.max_employee_count >= Fixed::from_int(available_worker_count)
        {
            Fixed::ONE
        } else {
            self.max_employee_count / Fixed::from_int(available_worker_count)
        };

        for (index, pop) in pops.iter().enumerate() {
            if !production_type.employs(pop.pop_type()) {
                continue;
            }
            let pop_size_to_hire = (proportion_to_hire * Fixed::from_int(pop.size()))
                .floor()
                .to_int();
            if let Some(count) = self.employee_count_per_type.get_mut(pop.pop_type().0 as usize) {
                *count += pop_size_to_hire;
            }
            self.employees.push(Employee {
                pop: index,
                size: pop_size_to_hire,
            });
            self.total_employee_count += pop_size_to_hire;
            let is_slave = pop_types
                .pop_type(pop.pop_type())
                .is_some_and(|pop_type| pop_type.is_slave());
            if !is_slave {
                self.total_paid_employee_count += pop_size_to_hire;
            }
        }
    }

    /// The production formula: base output × size modifier × size
    /// multiplier × throughput factors × output factors.
    pub(crate) fn produce(
        &mut self,
        production_type: &ProductionType,
        state: Option<&State>,
        sum: &ModifierSum,
        cache: &ModifierEffectCache,
        size_modifier: Fixed,
    ) -> Fixed {
        self.total_owner_count_in_state = 0;
        if size_modifier == Fixed::ZERO || self.max_employee_count <= Fixed::ZERO {
            return Fixed::ZERO;
        }

        let mut throughput_multiplier = Fixed::ONE;
        let mut output_multiplier = Fixed::ONE;

        if let Some(owner_job) = production_type.owner() {
            let Some(state) = state else {
                log::error!("RGO owner share needs a state, but the province has none");
                return Fixed::ZERO;
            };
            let state_population = state.total_population();
            let owner_count = state.pop_type_size(owner_job.pop_type);
            self.total_owner_count_in_state = owner_count;
            if owner_count > 0 && state_population > 0 {
                let share = owner_job.effect_multiplier * Fixed::from_int(owner_count)
                    / Fixed::from_int(state_population);
                match owner_job.effect {
                    JobEffect::Output => output_multiplier += share,
                    JobEffect::Throughput => throughput_multiplier += share,
                }
            }
        }

        throughput_multiplier += sum.effect_nullcheck(cache.rgo_throughput)
            + sum.effect_nullcheck(cache.local_rgo_throughput);
        output_multiplier +=
            sum.effect_nullcheck(cache.rgo_output) + sum.effect_nullcheck(cache.local_rgo_output);

        if production_type.is_farm() {
            throughput_multiplier += sum.effect_nullcheck(cache.farm_rgo_throughput_global);
            output_multiplier += sum.effect_nullcheck(cache.farm_rgo_output_global)
                + sum.effect_nullcheck(cache.farm_rgo_output_local);
        }
        if production_type.is_mine() {
            throughput_multiplier += sum.effect_nullcheck(cache.mine_rgo_throughput_global);
            output_multiplier += sum.effect_nullcheck(cache.mine_rgo_output_global)
                + sum.effect_nullcheck(cache.mine_rgo_output_local);
        }
        let good_effects = cache.good_effects(production_type.output_good());
        throughput_multiplier += sum.effect_nullcheck(good_effects.rgo_throughput);
        output_multiplier += sum.effect_nullcheck(good_effects.rgo_output);

        let mut throughput_from_workers = Fixed::ZERO;
        let mut output_from_workers = Fixed::ONE;
        for (type_index, &employees_of_type) in self.employee_count_per_type.iter().enumerate() {
            for job in production_type.jobs() {
                if job.pop_type.0 as usize != type_index {
                    continue;
                }
                let mut relative_to_workforce =
                    Fixed::from_int(employees_of_type) / self.max_employee_count;
                if job.effect_multiplier != Fixed::ONE && relative_to_workforce > job.amount {
                    relative_to_workforce = job.amount;
                }
                match job.effect {
                    JobEffect::Output => {
                        output_from_workers += job.effect_multiplier * relative_to_workforce;
                    }
                    JobEffect::Throughput => {
                        throughput_from_workers += job.effect_multiplier * relative_to_workforce;
                    }
                }
            }
        }

        production_type.base_output_quantity()
            * size_modifier
            * self.size_multiplier
            * throughput_multiplier
            * throughput_from_workers
            * output_multiplier
            * output_from_workers
    }

    pub(crate) fn record_output(&mut self, output: Fixed) {
        self.output_quantity_yesterday = output;
        self.unsold_quantity_yesterday = Fixed::ZERO;
    }

    pub(crate) fn record_income(
        &mut self,
        revenue: Fixed,
        total_owner_income: Fixed,
        total_employee_income: Fixed,
    ) {
        self.revenue_yesterday = revenue;
        self.total_owner_income = total_owner_income;
        self.total_employee_income = total_employee_income;
    }
}

/// Revenue distribution, run on the clearing thread once the output sale
/// settles (or immediately when selling at base price on day one).
///
/// Owners across the state take `min(0.5, 2 × owners / workers)` of the
/// revenue split by pop size; non-slave employees split the rest by hired
/// size. A slave-only RGO burns its revenue: the money leaves circulation.
pub(crate) fn pay_employees(
    map: &mut crate::map::instance::MapInstance,
    province_index: crate::map::province::ProvinceIndex,
    revenue: Fixed,
    production_types: &crate::economy::production_type::ProductionTypeManager,
    pop_types: &PopTypeManager,
) {
    let Some(province) = map.province_instance(province_index) else {
        log::error!("cannot pay RGO employees of unknown province #{}", province_index.0);
        return;
    };
    let rgo = province.rgo();
    let Some(production_type_id) = rgo.production_type() else {
        return;
    };
    let total_worker_count = rgo.total_worker_count();
    let total_owner_count = rgo.total_owner_count_in_state();
    let total_paid_count = rgo.total_paid_employee_count();
    let state_id = province.state();

    if revenue <= Fixed::ZERO || total_worker_count <= 0 {
        if revenue < Fixed::ZERO {
            log::error!("negative RGO revenue for province #{}", province_index.0);
        }
        if let Some(province) = map.province_instance_mut(province_index) {
            province.rgo_mut().record_income(revenue, Fixed::ZERO, Fixed::ZERO);
        }
        return;
    }

    let Some(production_type) = production_types.production_type(production_type_id) else {
        log::error!("RGO references unknown production type #{}", production_type_id.0);
        return;
    };

    let mut revenue_left = revenue;
    let mut total_owner_income = Fixed::ZERO;
    let mut total_employee_income = Fixed::ZERO;

    if total_owner_count > 0 {
        if let (Some(owner_job), Some(state_id)) = (production_type.owner(), state_id) {
            let owner_pop_type = owner_job.pop_type;
            let owner_share = Fixed::min(
                Fixed::HALF,
                Fixed::TWO * Fixed::from_int(total_owner_count) / Fixed::from_int(total_worker_count),
            );
            let provinces_in_state: Vec<_> = map
                .state_manager()
                .state(state_id)
                .map(|state| state.provinces().to_vec())
                .unwrap_or_default();
            for state_province in provinces_in_state {
                let Some(instance) = map.province_instance_mut(state_province) else {
                    continue;
                };
                for pop in instance.pops_mut() {
                    if pop.pop_type() != owner_pop_type {
                        continue;
                    }
                    let income_for_this_pop = revenue_left * owner_share * Fixed::from_int(pop.size())
                        / Fixed::from_int(total_owner_count);
                    pop.add_rgo_owner_income(income_for_this_pop);
                    total_owner_income += income_for_this_pop;
                }
            }
            revenue_left *= Fixed::ONE - owner_share;
        }
    }

    if total_paid_count > 0 {
        let employees = map
            .province_instance(province_index)
            .map(|province| province.rgo().employees().to_vec())
            .unwrap_or_default();
        if let Some(province) = map.province_instance_mut(province_index) {
            for employee in employees {
                let Some(pop) = province.pops_mut().get_mut(employee.pop) else {
                    log::error!("RGO employee references missing pop {}", employee.pop);
                    continue;
                };
                let is_slave = pop_types
                    .pop_type(pop.pop_type())
                    .is_some_and(|pop_type| pop_type.is_slave());
                if is_slave {
                    continue;
                }
                let income_for_this_pop =
                    revenue_left * Fixed::from_int(employee.size) / Fixed::from_int(total_paid_count);
                pop.add_rgo_worker_income(income_for_this_pop);
                total_employee_income += income_for_this_pop;
            }
        }
    }
    // Slave-only RGOs pay nobody: the revenue is removed from circulation.

    if let Some(province) = map.province_instance_mut(province_index) {
        province
            .rgo_mut()
            .record_income(revenue, total_owner_income, total_employee_income);
    }
}
