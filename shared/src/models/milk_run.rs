//! Milk-run route builder
//!
//! Bundles several farmers' industrial-grade lots into one factory pickup.
//! Stops are taken greedily in ascending distance from the factory until the
//! truck is full or no remaining stop lies within the detour radius. The
//! resulting stop order is part of the output: distance and fill figures are
//! computed from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::carbon::{co2_per_kg, compute_carbon, is_green_certified, CarbonSummary};
use super::crop::TransportMode;
use crate::catalog::CropCatalog;
use crate::error::{EngineError, EngineResult};
use crate::params::HarvestParams;
use crate::types::round_f64;
use crate::validation::{validate_distance_km, validate_lot_kg};

/// A processing factory receiving industrial-grade produce
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Factory {
    pub id: String,
    pub name: String,
    pub location: String,
}

/// Road distance from a farm to one factory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactoryDistance {
    pub factory_id: String,
    pub distance_km: f64,
}

/// A farmer's lot waiting for factory pickup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickupCandidate {
    pub farmer_id: String,
    pub farmer_name: String,
    pub crop_key: String,
    pub crop_name: String,
    pub quantity_kg: i64,
    pub location: String,
    pub factory_distances: Vec<FactoryDistance>,
}

impl PickupCandidate {
    pub fn distance_to(&self, factory_id: &str) -> Option<f64> {
        self.factory_distances
            .iter()
            .find(|d| d.factory_id == factory_id)
            .map(|d| d.distance_km)
    }

    /// Nearest factory among `factories`; ties go to the earlier factory
    pub fn nearest_factory<'a>(&self, factories: &'a [Factory]) -> Option<&'a Factory> {
        let mut best: Option<(&Factory, f64)> = None;
        for factory in factories {
            if let Some(distance) = self.distance_to(&factory.id) {
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((factory, distance));
                }
            }
        }
        best.map(|(factory, _)| factory)
    }

    fn validate(&self) -> EngineResult<()> {
        validate_lot_kg("quantity_kg", self.quantity_kg)?;
        for d in &self.factory_distances {
            validate_distance_km("distance_km", d.distance_km)?;
        }
        Ok(())
    }
}

/// One pickup on a consolidated route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilkRunStop {
    pub farmer_id: String,
    pub farmer_name: String,
    pub quantity_kg: i64,
    pub crop_name: String,
    pub location: String,
    pub distance_from_factory_km: f64,
}

/// A consolidated factory pickup; `stops` are in pickup order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilkRunRoute {
    pub id: String,
    pub factory_id: String,
    pub factory_name: String,
    pub factory_location: String,
    pub stops: Vec<MilkRunStop>,
    pub total_quantity_kg: i64,
    pub truck_capacity_kg: i64,
    pub truck_fill_percent: f64,
    pub estimated_distance_km: f64,
    /// Distance the same lots would cover as separate round trips
    pub separate_trips_distance_km: f64,
    pub carbon_saved_kg: f64,
    pub transport: TransportMode,
    pub green_certification: bool,
    pub carbon: CarbonSummary,
}

/// Route for one factory plus the candidates left for a later cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilkRunPlan {
    pub route: Option<MilkRunRoute>,
    pub deferred: Vec<PickupCandidate>,
}

/// Routes for every factory in one pickup cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PickupCyclePlan {
    pub routes: Vec<MilkRunRoute>,
    /// Candidates that did not fit this cycle, to be queued again
    pub deferred: Vec<PickupCandidate>,
    /// Candidates with no distance to any known factory
    pub unassigned: Vec<PickupCandidate>,
}

/// Build a single consolidated route, failing if no candidate can be picked up
pub fn build_milk_run(
    route_id: &str,
    factory: &Factory,
    candidates: Vec<PickupCandidate>,
    truck_capacity_kg: i64,
    catalog: &CropCatalog,
    params: &HarvestParams,
) -> EngineResult<MilkRunRoute> {
    plan_milk_run(route_id, factory, candidates, truck_capacity_kg, catalog, params)?
        .route
        .ok_or_else(|| {
            EngineError::invalid(
                "candidates",
                "no candidate lies within the detour radius and fits the truck",
            )
        })
}

/// Greedy bundling for one factory
pub fn plan_milk_run(
    route_id: &str,
    factory: &Factory,
    candidates: Vec<PickupCandidate>,
    truck_capacity_kg: i64,
    catalog: &CropCatalog,
    params: &HarvestParams,
) -> EngineResult<MilkRunPlan> {
    validate_lot_kg("truck_capacity_kg", truck_capacity_kg)?;
    for candidate in &candidates {
        candidate.validate()?;
        catalog.lookup(&candidate.crop_key)?;
    }

    let mut deferred = Vec::new();
    let mut reachable: Vec<(f64, PickupCandidate)> = Vec::new();
    for candidate in candidates {
        match candidate.distance_to(&factory.id) {
            Some(distance) => reachable.push((distance, candidate)),
            None => deferred.push(candidate),
        }
    }
    // Stable, so equal distances keep submission order
    reachable.sort_by(|a, b| a.0.total_cmp(&b.0));

    let max_detour_km = params.milk_run.max_detour_km;
    let mut selected: Vec<(f64, PickupCandidate)> = Vec::new();
    let mut total_quantity_kg = 0i64;
    for (distance, candidate) in reachable {
        if distance <= max_detour_km && total_quantity_kg + candidate.quantity_kg <= truck_capacity_kg
        {
            total_quantity_kg += candidate.quantity_kg;
            selected.push((distance, candidate));
        } else {
            deferred.push(candidate);
        }
    }

    if selected.is_empty() {
        return Ok(MilkRunPlan {
            route: None,
            deferred,
        });
    }

    let transport = route_transport(&selected, catalog, params)?;
    let factor = params.carbon.emission_factors.factor_for(transport);
    // Unrounded fill drives every threshold; only the reported figure is rounded
    let fill_percent = (total_quantity_kg as f64 * 100.0 / truck_capacity_kg as f64).min(100.0);
    let truck_fill_percent = round_f64(fill_percent, 2);

    let distances: Vec<f64> = selected.iter().map(|(d, _)| *d).collect();
    let estimated_distance_km = route_distance(&distances, params.milk_run.stop_detour_km);
    let separate_trips_distance_km: f64 = distances.iter().map(|d| 2.0 * d).sum();

    let consolidated_kg = co2_per_kg(factor, estimated_distance_km, fill_percent)
        * total_quantity_kg as f64;
    let separate_kg: f64 = selected
        .iter()
        .map(|(d, c)| {
            let fill = c.quantity_kg as f64 * 100.0 / truck_capacity_kg as f64;
            co2_per_kg(factor, 2.0 * d, fill) * c.quantity_kg as f64
        })
        .sum();

    let carbon = compute_carbon(
        transport,
        estimated_distance_km,
        fill_percent,
        &params.carbon,
    )?;

    let stops = selected
        .into_iter()
        .map(|(distance, c)| MilkRunStop {
            farmer_id: c.farmer_id,
            farmer_name: c.farmer_name,
            quantity_kg: c.quantity_kg,
            crop_name: c.crop_name,
            location: c.location,
            distance_from_factory_km: distance,
        })
        .collect();

    Ok(MilkRunPlan {
        route: Some(MilkRunRoute {
            id: route_id.to_string(),
            factory_id: factory.id.clone(),
            factory_name: factory.name.clone(),
            factory_location: factory.location.clone(),
            stops,
            total_quantity_kg,
            truck_capacity_kg,
            truck_fill_percent,
            estimated_distance_km: round_f64(estimated_distance_km, 2),
            separate_trips_distance_km: round_f64(separate_trips_distance_km, 2),
            carbon_saved_kg: round_f64((separate_kg - consolidated_kg).max(0.0), 2),
            transport,
            green_certification: is_green_certified(fill_percent, &params.carbon),
            carbon,
        }),
        deferred,
    })
}

/// Out to the first stop, along the stops in order, back from the last
fn route_distance(distances: &[f64], stop_detour_km: f64) -> f64 {
    let (Some(first), Some(last)) = (distances.first(), distances.last()) else {
        return 0.0;
    };
    let legs: f64 = distances
        .windows(2)
        .map(|w| (w[1] - w[0]).abs() + stop_detour_km)
        .sum();
    first + legs + last
}

/// The most emission-heavy transport needed by any stop's crop
fn route_transport(
    selected: &[(f64, PickupCandidate)],
    catalog: &CropCatalog,
    params: &HarvestParams,
) -> EngineResult<TransportMode> {
    let factors = &params.carbon.emission_factors;
    let mut transport: Option<TransportMode> = None;
    for (_, candidate) in selected {
        let mode = catalog.lookup(&candidate.crop_key)?.transport;
        if transport.map_or(true, |t| factors.factor_for(mode) > factors.factor_for(t)) {
            transport = Some(mode);
        }
    }
    transport.ok_or_else(|| EngineError::invalid("candidates", "route has no stops"))
}

/// Assign each candidate to its nearest factory
pub fn assign_to_factories(
    factories: &[Factory],
    candidates: Vec<PickupCandidate>,
) -> (BTreeMap<String, Vec<PickupCandidate>>, Vec<PickupCandidate>) {
    let mut groups: BTreeMap<String, Vec<PickupCandidate>> = BTreeMap::new();
    let mut unassigned = Vec::new();
    for candidate in candidates {
        match candidate.nearest_factory(factories) {
            Some(factory) => groups.entry(factory.id.clone()).or_default().push(candidate),
            None => unassigned.push(candidate),
        }
    }
    (groups, unassigned)
}

/// Run one pickup cycle: group by nearest factory, then build a route per factory
pub fn plan_pickup_cycle(
    cycle_id: &str,
    factories: &[Factory],
    candidates: Vec<PickupCandidate>,
    truck_capacity_kg: i64,
    catalog: &CropCatalog,
    params: &HarvestParams,
) -> EngineResult<PickupCyclePlan> {
    let (mut groups, unassigned) = assign_to_factories(factories, candidates);
    let mut plan = PickupCyclePlan {
        unassigned,
        ..Default::default()
    };

    for factory in factories {
        let Some(group) = groups.remove(&factory.id) else {
            continue;
        };
        let route_id = format!("{}-{}", cycle_id, factory.id);
        let factory_plan =
            plan_milk_run(&route_id, factory, group, truck_capacity_kg, catalog, params)?;
        plan.routes.extend(factory_plan.route);
        plan.deferred.extend(factory_plan.deferred);
    }

    Ok(plan)
}
