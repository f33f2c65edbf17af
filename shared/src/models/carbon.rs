//! Carbon footprint calculator for produce transport

use serde::{Deserialize, Serialize};

use super::crop::TransportMode;
use crate::error::EngineResult;
use crate::params::CarbonParams;
use crate::types::round_f64;
use crate::validation::{validate_distance_km, validate_fill_percent};

/// Emissions summary for one trip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarbonSummary {
    pub transport_method: TransportMode,
    pub distance_km: f64,
    pub is_local_loop: bool,
    pub distance_penalty: f64,
    pub truck_fill_percent: f64,
    /// kg CO2 emitted per kg of produce moved
    pub co2_per_kg: f64,
    pub green_certification: bool,
}

/// factor * (distance / 100) * (100 / fill); callers validate fill > 0
pub fn co2_per_kg(emission_factor: f64, distance_km: f64, truck_fill_percent: f64) -> f64 {
    emission_factor * (distance_km / 100.0) * (100.0 / truck_fill_percent)
}

pub fn is_green_certified(truck_fill_percent: f64, params: &CarbonParams) -> bool {
    truck_fill_percent >= params.green_fill_threshold_percent
}

/// Estimate per-kg emissions for a trip
pub fn compute_carbon(
    transport_method: TransportMode,
    distance_km: f64,
    truck_fill_percent: f64,
    params: &CarbonParams,
) -> EngineResult<CarbonSummary> {
    validate_distance_km("distance_km", distance_km)?;
    validate_fill_percent(truck_fill_percent)?;

    let factor = params.emission_factors.factor_for(transport_method);
    let is_local_loop = distance_km <= params.local_loop_km;
    let distance_penalty = if is_local_loop {
        0.0
    } else {
        round_f64(distance_km * params.per_km_penalty, 2)
    };

    Ok(CarbonSummary {
        transport_method,
        distance_km,
        is_local_loop,
        distance_penalty,
        truck_fill_percent,
        co2_per_kg: round_f64(co2_per_kg(factor, distance_km, truck_fill_percent), 4),
        green_certification: is_green_certified(truck_fill_percent, params),
    })
}
