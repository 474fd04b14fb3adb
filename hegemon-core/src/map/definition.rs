//! The immutable map: provinces, colours, raster shapes, adjacencies,
//! regions, climates and continents.
//!
//! Built once from raster buffers and tabular records, then used as the
//! fixed substrate for per-tick traversal. The x axis wraps (the world is
//! a cylinder); the y axis does not.

use crate::fixed::Fixed;
use crate::map::climate::{ClimateId, ContinentId, ProvinceSetModifier};
use crate::map::province::{
    Adjacency, AdjacencyKind, Position, ProvinceDefinition, ProvinceIndex, NO_CANAL,
};
use crate::map::region::{Region, RegionId};
use crate::map::terrain::{TerrainTypeId, TerrainTypeManager};
use crate::modifier::ModifierId;
use crate::registry::{HasIdentifier, Registry};
use crate::types::colour::Colour;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One pixel of the imported shape image: province index and raw terrain
/// palette index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ShapePixel {
    pub index: ProvinceIndex,
    pub terrain: u8,
}

/// One row of the province definition table (`province,red,green,blue`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceRecord {
    pub identifier: String,
    pub colour: Colour,
}

/// One row of the adjacency table (`From,To,Type,Through,Data`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacencyRecord {
    pub from: String,
    pub to: String,
    pub kind: String,
    pub through: Option<String>,
    pub data: u8,
}

const DEFAULT_MAX_PROVINCES: usize = u16::MAX as usize - 1;

#[derive(Debug)]
pub struct MapDefinition {
    provinces: Registry<ProvinceDefinition>,
    colour_index: HashMap<u32, ProvinceIndex>,
    /// Adjacency list per external province index; slot 0 is unused.
    adjacencies: Vec<Vec<Adjacency>>,
    water_provinces_locked: bool,
    water_province_count: usize,
    regions: Registry<Region>,
    climates: Registry<ProvinceSetModifier>,
    continents: Registry<ProvinceSetModifier>,
    terrain_type_manager: TerrainTypeManager,
    width: u32,
    height: u32,
    shape_image: Vec<ShapePixel>,
    max_provinces: usize,
}

impl Default for MapDefinition {
    fn default() -> Self {
        Self::new()
    }
}

fn valid_basic_identifier(identifier: &str) -> bool {
    identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Decode pixel `index` of a BGR byte buffer.
fn colour_at(data: &[u8], pixel_index: usize) -> Colour {
    let i = pixel_index * 3;
    Colour::new(data[i + 2], data[i + 1], data[i])
}

impl MapDefinition {
    pub fn new() -> Self {
        Self {
            provinces: Registry::with_offset("provinces", 1),
            colour_index: HashMap::new(),
            adjacencies: Vec::new(),
            water_provinces_locked: false,
            water_province_count: 0,
            regions: Registry::new("regions"),
            climates: Registry::new("climates"),
            continents: Registry::new("continents"),
            terrain_type_manager: TerrainTypeManager::new(),
            width: 0,
            height: 0,
            shape_image: Vec::new(),
            max_provinces: DEFAULT_MAX_PROVINCES,
        }
    }

    // ----- provinces --------------------------------------------------

    pub fn set_max_provinces(&mut self, max_provinces: usize) -> bool {
        if max_provinces == 0 {
            log::error!("max province count must be positive");
            return false;
        }
        if !self.provinces.is_empty() || self.provinces.is_locked() {
            log::error!("cannot set max province count after provinces have been added");
            return false;
        }
        self.max_provinces = max_provinces;
        true
    }

    /// Register a province with a unique, non-null colour.
    pub fn add_province(&mut self, identifier: &str, colour: Colour) -> bool {
        if self.provinces.len() >= self.max_provinces {
            log::error!(
                "the province list is full - maximum number of provinces is {}",
                self.max_provinces
            );
            return false;
        }
        if identifier.is_empty() {
            log::error!("invalid province identifier - empty");
            return false;
        }
        if !valid_basic_identifier(identifier) {
            log::error!(
                "invalid province identifier {} (alphanumeric and underscore only)",
                identifier
            );
            return false;
        }
        if colour.is_null() {
            log::error!("invalid province colour for {} - null", identifier);
            return false;
        }
        if let Some(&existing) = self.colour_index.get(&colour.pack()) {
            let existing_identifier = self
                .province(existing)
                .map(HasIdentifier::identifier)
                .unwrap_or("?");
            log::error!(
                "duplicate province colours: {} and {} both use {}",
                existing_identifier,
                identifier,
                colour
            );
            return false;
        }
        let index = ProvinceIndex(self.provinces.next_index() as u16);
        if !self
            .provinces
            .add(ProvinceDefinition::new(identifier, colour, index))
        {
            return false;
        }
        self.colour_index.insert(colour.pack(), index);
        true
    }

    pub fn lock_provinces(&mut self) {
        self.provinces.lock();
        self.adjacencies = vec![Vec::new(); self.provinces.len() + 1];
    }

    /// Bulk-load the province definition table, then lock.
    pub fn load_province_definitions(&mut self, records: &[ProvinceRecord]) -> bool {
        if records.is_empty() {
            log::error!("no entries in province definition table");
            return false;
        }
        self.provinces.reserve(records.len());
        let mut ok = true;
        for record in records {
            ok &= self.add_province(&record.identifier, record.colour);
        }
        self.lock_provinces();
        ok
    }

    pub fn provinces(&self) -> &Registry<ProvinceDefinition> {
        &self.provinces
    }

    pub fn province_count(&self) -> usize {
        self.provinces.len()
    }

    pub fn province(&self, index: ProvinceIndex) -> Option<&ProvinceDefinition> {
        self.provinces.by_index(index.0 as usize)
    }

    pub fn province_by_identifier(&self, identifier: &str) -> Option<&ProvinceDefinition> {
        self.provinces.by_identifier(identifier)
    }

    pub fn province_index(&self, identifier: &str) -> Option<ProvinceIndex> {
        self.provinces
            .index_of(identifier)
            .map(|i| ProvinceIndex(i as u16))
    }

    /// O(1) colour → province lookup; null for unknown colours.
    pub fn province_index_from_colour(&self, colour: Colour) -> ProvinceIndex {
        self.colour_index
            .get(&colour.pack())
            .copied()
            .unwrap_or(ProvinceIndex::NULL)
    }

    fn province_mut(&mut self, index: ProvinceIndex) -> Option<&mut ProvinceDefinition> {
        self.provinces.item_mut_by_index(index.0 as usize)
    }

    // ----- water provinces --------------------------------------------

    pub fn set_water_province(&mut self, identifier: &str) -> bool {
        if self.water_provinces_locked {
            log::error!("the water province list has already been locked");
            return false;
        }
        let Some(index) = self.province_index(identifier) else {
            log::error!("unrecognised water province identifier: {}", identifier);
            return false;
        };
        let Some(province) = self.province_mut(index) else {
            return false;
        };
        if province.is_water() {
            log::warn!("province {} is already a water province", identifier);
            return true;
        }
        province.set_water(true);
        self.water_province_count += 1;
        true
    }

    pub fn set_water_province_list(&mut self, identifiers: &[&str]) -> bool {
        if self.water_provinces_locked {
            log::error!("the water province list has already been locked");
            return false;
        }
        let mut ok = true;
        for identifier in identifiers {
            ok &= self.set_water_province(identifier);
        }
        self.lock_water_provinces();
        ok
    }

    pub fn lock_water_provinces(&mut self) {
        self.water_provinces_locked = true;
        log::info!(
            "locked water provinces after registering {}",
            self.water_province_count
        );
    }

    // ----- raster import ----------------------------------------------

    /// Import the province-colour and terrain rasters.
    ///
    /// `province_data` is a top-down 24-bit BGR buffer, `terrain_data` an
    /// 8-bit palette-index buffer of the same dimensions. Produces the
    /// per-pixel shape image and, per province: pixel count, centroid and
    /// dominant terrain. Provinces with no pixels are flagged off-map;
    /// unrecognised colours are reported once each.
    pub fn import_raster(
        &mut self,
        province_data: &[u8],
        terrain_data: &[u8],
        width: u32,
        height: u32,
        detailed_errors: bool,
    ) -> bool {
        if !self.provinces.is_locked() {
            log::error!("the shape image cannot be generated until provinces are locked");
            return false;
        }
        if !self.terrain_type_manager.terrain_type_mappings_are_locked() {
            log::error!(
                "the shape image cannot be generated until terrain type mappings are locked"
            );
            return false;
        }
        let pixel_count = width as usize * height as usize;
        if pixel_count == 0 {
            log::error!("invalid raster dimensions {}x{}", width, height);
            return false;
        }
        if province_data.len() != pixel_count * 3 {
            log::error!(
                "province raster size {} does not match {}x{} 24-bit pixels",
                province_data.len(),
                width,
                height
            );
            return false;
        }
        if terrain_data.len() != pixel_count {
            log::error!(
                "terrain raster size {} does not match {}x{} pixels",
                terrain_data.len(),
                width,
                height
            );
            return false;
        }

        self.width = width;
        self.height = height;
        self.shape_image = vec![ShapePixel::default(); pixel_count];

        let province_count = self.provinces.len();
        let mut unrecognised_colours: HashSet<u32> = HashSet::new();
        let mut pixels_per_province = vec![0i64; province_count];
        let mut position_sums = vec![(0i64, 0i64); province_count];
        let mut terrain_histograms: Vec<BTreeMap<TerrainTypeId, i64>> =
            vec![BTreeMap::new(); province_count];

        for y in 0..height as usize {
            for x in 0..width as usize {
                let pixel_index = x + y * width as usize;
                let province_colour = colour_at(province_data, pixel_index);

                // Neighbouring pixels usually share a colour; reuse their
                // resolved index instead of hashing the colour again.
                let mut province_index = ProvinceIndex::NULL;
                let mut resolved = false;
                if x > 0 && colour_at(province_data, pixel_index - 1) == province_colour {
                    province_index = self.shape_image[pixel_index - 1].index;
                    resolved = true;
                }
                if !resolved
                    && y > 0
                    && colour_at(province_data, pixel_index - width as usize) == province_colour
                {
                    province_index = self.shape_image[pixel_index - width as usize].index;
                    resolved = true;
                }
                if !resolved {
                    province_index = self.province_index_from_colour(province_colour);
                    if province_index.is_null()
                        && unrecognised_colours.insert(province_colour.pack())
                        && detailed_errors
                    {
                        log::warn!(
                            "unrecognised province colour {} at ({}, {})",
                            province_colour,
                            x,
                            y
                        );
                    }
                }

                let terrain_index = terrain_data[pixel_index];
                self.shape_image[pixel_index] = ShapePixel {
                    index: province_index,
                    terrain: terrain_index,
                };

                if !province_index.is_null() {
                    let position = province_index.0 as usize - 1;
                    pixels_per_province[position] += 1;
                    position_sums[position].0 += x as i64;
                    position_sums[position].1 += y as i64;
                    if let Some(terrain) =
                        self.terrain_type_manager.terrain_for_index(terrain_index)
                    {
                        *terrain_histograms[position].entry(terrain).or_insert(0) += 1;
                    }
                }
            }
        }

        if !unrecognised_colours.is_empty() {
            log::warn!(
                "province image contains {} unrecognised province colours",
                unrecognised_colours.len()
            );
        }

        let mut missing = 0usize;
        for position in 0..province_count {
            let dominant_terrain = terrain_histograms[position]
                .iter()
                .max_by_key(|&(_, &count)| count)
                .map(|(&terrain, _)| terrain);
            let count = pixels_per_province[position];
            let centre = if count > 0 {
                Position {
                    x: Fixed::from_int(position_sums[position].0) / Fixed::from_int(count),
                    y: Fixed::from_int(position_sums[position].1) / Fixed::from_int(count),
                }
            } else {
                Position::default()
            };
            let Some(province) = self.provinces.item_mut_by_index(position + 1) else {
                continue;
            };
            province.set_terrain(dominant_terrain);
            province.set_shape(count > 0, count, centre);
            if count == 0 {
                missing += 1;
                if detailed_errors {
                    log::warn!("province missing from shape image: {}", province.identifier());
                }
            }
        }
        if missing > 0 {
            log::warn!("province image is missing {} province colours", missing);
        }

        true
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn shape_image(&self) -> &[ShapePixel] {
        &self.shape_image
    }

    pub fn province_index_at(&self, x: u32, y: u32) -> ProvinceIndex {
        if x < self.width && y < self.height {
            self.shape_image[(x + y * self.width) as usize].index
        } else {
            ProvinceIndex::NULL
        }
    }

    // ----- adjacencies ------------------------------------------------

    pub fn adjacencies_of(&self, province: ProvinceIndex) -> &[Adjacency] {
        self.adjacencies
            .get(province.0 as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_adjacent_to(&self, from: ProvinceIndex, to: ProvinceIndex) -> bool {
        self.adjacencies_of(from)
            .iter()
            .any(|adjacency| adjacency.to == to)
    }

    /// Euclidean distance between two provinces' centroids, with the x
    /// delta wrapped around the cylinder.
    pub fn calculate_distance_between(&self, from: ProvinceIndex, to: ProvinceIndex) -> Fixed {
        let (Some(from), Some(to)) = (self.province(from), self.province(to)) else {
            return Fixed::ZERO;
        };
        let (from_pos, to_pos) = (from.centre(), to.centre());
        let width = Fixed::from_int(self.width as i64);
        let dx = to_pos.x - from_pos.x;
        let min_x = (dx.abs()).min((dx + width).abs()).min((dx - width).abs());
        let dy = to_pos.y - from_pos.y;
        (min_x * min_x + dy * dy).sqrt()
    }

    /// Called for every adjacent pixel pair; returns whether a new edge was
    /// added, hence no error logging in the false cases.
    pub fn add_standard_adjacency(&mut self, from: ProvinceIndex, to: ProvinceIndex) -> bool {
        if from == to {
            return false;
        }
        let from_needs_adjacency = !self.is_adjacent_to(from, to);
        let to_needs_adjacency = !self.is_adjacent_to(to, from);
        if !from_needs_adjacency && !to_needs_adjacency {
            return false;
        }
        let (Some(from_def), Some(to_def)) = (self.province(from), self.province(to)) else {
            return false;
        };
        let (from_water, to_water) = (from_def.is_water(), to_def.is_water());

        let kind = if from_water != to_water {
            AdjacencyKind::Coastal
        } else if from_water {
            AdjacencyKind::Water
        } else {
            AdjacencyKind::Land
        };
        if kind == AdjacencyKind::Coastal {
            // Mark the land side as coastal.
            if let Some(province) = self.province_mut(from) {
                province.set_coastal(!from_water);
            }
            if let Some(province) = self.province_mut(to) {
                province.set_coastal(!to_water);
            }
        }

        let distance = self.calculate_distance_between(from, to);
        if from_needs_adjacency {
            self.adjacencies[from.0 as usize].push(Adjacency {
                to,
                distance,
                kind,
                through: None,
                data: NO_CANAL,
            });
        }
        if to_needs_adjacency {
            self.adjacencies[to.0 as usize].push(Adjacency {
                to: from,
                distance,
                kind,
                through: None,
                data: NO_CANAL,
            });
        }
        true
    }

    /// Walk the shape image and connect every 4-neighbour pixel pair in
    /// different provinces, wrapping in x but not in y.
    pub fn generate_standard_adjacencies(&mut self) -> bool {
        let mut changed = false;
        let width = self.width as usize;
        for y in 0..self.height as usize {
            for x in 0..width {
                let current = self.shape_image[x + y * width].index;
                if current.is_null() {
                    continue;
                }
                let right = self.shape_image[(x + 1) % width + y * width].index;
                if !right.is_null() {
                    changed |= self.add_standard_adjacency(current, right);
                }
                if y + 1 < self.height as usize {
                    let below = self.shape_image[x + (y + 1) * width].index;
                    if !below.is_null() {
                        changed |= self.add_standard_adjacency(current, below);
                    }
                }
            }
        }
        changed
    }

    /// Add a typed adjacency from the tabular source, validating endpoints,
    /// through province and canal data per type. Both directions are
    /// written; conversions are only allowed WATER→CANAL and LAND→STRAIT.
    pub fn add_special_adjacency(
        &mut self,
        from: ProvinceIndex,
        to: ProvinceIndex,
        kind: AdjacencyKind,
        mut through: Option<ProvinceIndex>,
        mut data: u8,
    ) -> bool {
        use AdjacencyKind::*;

        if from == to {
            log::error!("trying to add {} adjacency from province {} to itself", kind.name(), from);
            return false;
        }
        let (Some(from_def), Some(to_def)) = (self.province(from), self.province(to)) else {
            log::error!("{} adjacency has unknown endpoint ({} or {})", kind.name(), from, to);
            return false;
        };
        let (from_water, to_water) = (from_def.is_water(), to_def.is_water());

        match kind {
            Land | Strait => {
                if from_water || to_water {
                    log::error!(
                        "{} adjacency from {} to {} has water endpoint(s)",
                        kind.name(),
                        from,
                        to
                    );
                    return false;
                }
            }
            Water | Canal => {
                if !from_water || !to_water {
                    log::error!(
                        "{} adjacency from {} to {} has land endpoint(s)",
                        kind.name(),
                        from,
                        to
                    );
                    return false;
                }
            }
            Coastal => {
                if from_water == to_water {
                    log::error!(
                        "coastal adjacency from {} to {} has both land or water endpoints",
                        from,
                        to
                    );
                    return false;
                }
            }
            // Impassable accepts any endpoints: land-land replaces the land
            // edge, land-water and water-water delete the existing edge.
            Impassable => {}
        }

        if kind == Strait || kind == Canal {
            let water_expected = kind == Strait;
            let through_water = through.and_then(|t| self.province(t)).map(|p| p.is_water());
            match through_water {
                Some(actual) if actual == water_expected => {}
                _ => {
                    log::error!(
                        "{} adjacency from {} to {} has a missing or wrong-domain through province",
                        kind.name(),
                        from,
                        to
                    );
                    return false;
                }
            }
        } else if through.is_some() {
            log::warn!(
                "{} adjacency from {} to {} has a non-null through province",
                kind.name(),
                from,
                to
            );
            through = None;
        }

        if data != NO_CANAL && kind != Canal {
            log::warn!(
                "{} adjacency from {} to {} has invalid data {}",
                kind.name(),
                from,
                to,
                data
            );
            data = NO_CANAL;
        }

        let distance = self.calculate_distance_between(from, to);
        let forward = self.write_special_adjacency(from, to, kind, through, data, distance);
        let backward = self.write_special_adjacency(to, from, kind, through, data, distance);
        forward && backward
    }

    fn write_special_adjacency(
        &mut self,
        from: ProvinceIndex,
        to: ProvinceIndex,
        kind: AdjacencyKind,
        through: Option<ProvinceIndex>,
        data: u8,
        distance: Fixed,
    ) -> bool {
        use AdjacencyKind::*;

        let list = &mut self.adjacencies[from.0 as usize];
        let existing = list.iter().position(|adjacency| adjacency.to == to);

        let Some(position) = existing else {
            if kind == Impassable {
                log::warn!(
                    "provinces {} and {} do not have an existing adjacency to make impassable",
                    from,
                    to
                );
                return true;
            }
            list.push(Adjacency {
                to,
                distance,
                kind,
                through,
                data,
            });
            return true;
        };

        let existing_kind = list[position].kind;
        if kind == existing_kind {
            log::warn!("adjacency from {} to {} already has type {}", from, to, kind.name());
            if kind != Strait && kind != Canal {
                // Straits and canals might change through or data;
                // otherwise nothing to do.
                return true;
            }
        }
        if kind == Impassable {
            if existing_kind == Water || existing_kind == Coastal {
                list.remove(position);
                return true;
            }
        } else if kind != Strait && kind != Canal {
            log::error!(
                "provinces {} and {} already have an existing {} adjacency, cannot create a {} adjacency",
                from,
                to,
                existing_kind.name(),
                kind.name()
            );
            return false;
        } else {
            let convertible_from = if kind == Canal { Water } else { Land };
            if kind != existing_kind && existing_kind != convertible_from {
                log::error!(
                    "cannot convert {} adjacency from {} to {} to type {}",
                    existing_kind.name(),
                    from,
                    to,
                    kind.name()
                );
                return false;
            }
        }
        list[position] = Adjacency {
            to,
            distance,
            kind,
            through,
            data,
        };
        true
    }

    /// Load the adjacency table rows. Types: `land`, `sea` (a strait),
    /// `impassable`, `canal`.
    pub fn load_adjacency_records(&mut self, records: &[AdjacencyRecord]) -> bool {
        if records.is_empty() {
            log::error!("no entries in province adjacency table");
            return false;
        }
        let mut ok = true;
        for record in records {
            let Some(from) = self.province_index(&record.from) else {
                log::error!("unrecognised adjacency from province: {:?}", record.from);
                ok = false;
                continue;
            };
            let Some(to) = self.province_index(&record.to) else {
                log::error!("unrecognised adjacency to province: {:?}", record.to);
                ok = false;
                continue;
            };
            let kind = match record.kind.as_str() {
                "land" => AdjacencyKind::Land,
                "sea" => AdjacencyKind::Strait,
                "impassable" => AdjacencyKind::Impassable,
                "canal" => AdjacencyKind::Canal,
                other => {
                    log::error!("invalid adjacency type: {:?}", other);
                    ok = false;
                    continue;
                }
            };
            let through = record
                .through
                .as_deref()
                .and_then(|identifier| self.province_index(identifier));
            ok &= self.add_special_adjacency(from, to, kind, through, record.data);
        }
        ok
    }

    // ----- regions ----------------------------------------------------

    /// Add a region over the named provinces. The region is meta if any
    /// member already belongs to a non-meta region; non-meta regions set
    /// each member's back-pointer.
    pub fn add_region(&mut self, identifier: &str, province_identifiers: &[&str], colour: Colour) -> bool {
        if identifier.is_empty() {
            log::error!("invalid region identifier - empty");
            return false;
        }
        let mut ok = true;
        let mut members = Vec::with_capacity(province_identifiers.len());
        for province_identifier in province_identifiers {
            match self.province_index(province_identifier) {
                Some(index) => members.push(index),
                None => {
                    log::error!(
                        "unrecognised province {} in region {}",
                        province_identifier,
                        identifier
                    );
                    ok = false;
                }
            }
        }
        if members.is_empty() {
            log::warn!("no valid provinces in list for region {}", identifier);
            return true;
        }

        let meta = members
            .iter()
            .any(|&member| self.province(member).is_some_and(|p| p.region().is_some()));

        let region_id = RegionId(self.regions.next_index() as u16);
        if !self
            .regions
            .add(Region::new(identifier, colour, meta, members.clone()))
        {
            return false;
        }
        if !meta {
            for member in members {
                if let Some(province) = self.province_mut(member) {
                    province.set_region(Some(region_id));
                }
            }
        }
        ok
    }

    pub fn lock_regions(&mut self) {
        self.regions.lock();
    }

    pub fn regions(&self) -> &Registry<Region> {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.by_index(id.0 as usize)
    }

    // ----- climates and continents ------------------------------------

    pub fn add_climate(&mut self, identifier: &str, modifier: Option<ModifierId>) -> bool {
        if identifier.is_empty() {
            log::error!("invalid climate identifier - empty");
            return false;
        }
        self.climates
            .add(ProvinceSetModifier::new(identifier, modifier))
    }

    /// Membership is first-wins: a province already in another climate
    /// stays there, with a warning.
    pub fn add_province_to_climate(&mut self, climate: &str, province: &str) -> bool {
        let Some(climate_position) = self.climates.index_of(climate) else {
            log::error!("unrecognised climate: {}", climate);
            return false;
        };
        let climate_id = ClimateId(climate_position as u16);
        let Some(index) = self.province_index(province) else {
            log::error!("unrecognised province {} in climate {}", province, climate);
            return false;
        };
        match self.province(index).and_then(ProvinceDefinition::climate) {
            Some(existing) if existing == climate_id => {
                log::warn!("province {} defined twice in climate {}", province, climate);
                return true;
            }
            Some(_) => {
                log::warn!("province {} found in multiple climates, keeping the first", province);
                return true;
            }
            None => {}
        }
        if let Some(definition) = self.province_mut(index) {
            definition.set_climate(Some(climate_id));
        }
        if let Some(set) = self.climates.item_mut_by_index(climate_position) {
            set.add_province(index);
        }
        true
    }

    pub fn lock_climates(&mut self) {
        self.climates.lock();
    }

    pub fn climates(&self) -> &Registry<ProvinceSetModifier> {
        &self.climates
    }

    pub fn climate(&self, id: ClimateId) -> Option<&ProvinceSetModifier> {
        self.climates.by_index(id.0 as usize)
    }

    pub fn add_continent(&mut self, identifier: &str, modifier: Option<ModifierId>) -> bool {
        if identifier.is_empty() {
            log::error!("invalid continent identifier - empty");
            return false;
        }
        self.continents
            .add(ProvinceSetModifier::new(identifier, modifier))
    }

    /// Membership is first-wins, as for climates.
    pub fn add_province_to_continent(&mut self, continent: &str, province: &str) -> bool {
        let Some(continent_position) = self.continents.index_of(continent) else {
            log::error!("unrecognised continent: {}", continent);
            return false;
        };
        let continent_id = ContinentId(continent_position as u16);
        let Some(index) = self.province_index(province) else {
            log::error!("unrecognised province {} in continent {}", province, continent);
            return false;
        };
        if self.province(index).and_then(ProvinceDefinition::continent).is_some() {
            log::warn!("province {} found in multiple continents, keeping the first", province);
            return true;
        }
        if let Some(definition) = self.province_mut(index) {
            definition.set_continent(Some(continent_id));
        }
        if let Some(set) = self.continents.item_mut_by_index(continent_position) {
            set.add_province(index);
        }
        true
    }

    pub fn lock_continents(&mut self) {
        self.continents.lock();
    }

    pub fn continents(&self) -> &Registry<ProvinceSetModifier> {
        &self.continents
    }

    pub fn continent(&self, id: ContinentId) -> Option<&ProvinceSetModifier> {
        self.continents.by_index(id.0 as usize)
    }

    // ----- terrain ----------------------------------------------------

    pub fn terrain_type_manager(&self) -> &TerrainTypeManager {
        &self.terrain_type_manager
    }

    pub fn terrain_type_manager_mut(&mut self) -> &mut TerrainTypeManager {
        &mut self.terrain_type_manager
    }
}
