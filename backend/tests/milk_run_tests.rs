//! Milk-run and carbon tests for the Harvest Rescue Engine
//!
//! Route bundling order, truck fill, green certification and the per-kg
//! emission estimate.

use proptest::prelude::*;
use shared::{
    build_milk_run, compute_carbon, plan_milk_run, plan_pickup_cycle, CarbonParams, CropCatalog,
    EngineError, Factory, FactoryDistance, HarvestParams, PickupCandidate, TransportMode,
};

fn factory(id: &str) -> Factory {
    Factory {
        id: id.to_string(),
        name: format!("{} processing unit", id),
        location: "Industrial area".to_string(),
    }
}

fn candidate(farmer: &str, crop_key: &str, quantity_kg: i64, distances: &[(&str, f64)]) -> PickupCandidate {
    PickupCandidate {
        farmer_id: farmer.to_string(),
        farmer_name: format!("Farmer {}", farmer),
        crop_key: crop_key.to_string(),
        crop_name: crop_key.to_string(),
        quantity_kg,
        location: format!("{} village", farmer),
        factory_distances: distances
            .iter()
            .map(|(id, d)| FactoryDistance {
                factory_id: id.to_string(),
                distance_km: *d,
            })
            .collect(),
    }
}

// ============================================================================
// Property 7: Stop order, capacity and fill
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn property_7_route_respects_order_and_capacity(
        stops in prop::collection::vec((1i64..400, 0u32..600), 1..12),
        capacity in 100i64..2_000,
    ) {
        let catalog = CropCatalog::builtin().unwrap();
        let params = HarvestParams::default();
        let candidates: Vec<PickupCandidate> = stops
            .iter()
            .enumerate()
            .map(|(i, (qty, tenths))| {
                candidate(&format!("f{}", i), "tomato", *qty, &[("plant", f64::from(*tenths) / 10.0)])
            })
            .collect();

        let plan = plan_milk_run("mr", &factory("plant"), candidates, capacity, &catalog, &params).unwrap();
        let selected = plan.route.as_ref().map_or(0, |r| r.stops.len());
        prop_assert_eq!(selected + plan.deferred.len(), stops.len());

        if let Some(route) = plan.route {
            prop_assert!(route.total_quantity_kg <= capacity);
            let sum: i64 = route.stops.iter().map(|s| s.quantity_kg).sum();
            prop_assert_eq!(route.total_quantity_kg, sum);
            for pair in route.stops.windows(2) {
                prop_assert!(pair[0].distance_from_factory_km <= pair[1].distance_from_factory_km);
            }
            for stop in &route.stops {
                prop_assert!(stop.distance_from_factory_km <= params.milk_run.max_detour_km);
            }
            prop_assert!(route.truck_fill_percent <= 100.0);
            prop_assert_eq!(route.green_certification, route.truck_fill_percent >= 90.0);
            prop_assert!(route.carbon_saved_kg >= 0.0);
        }
    }
}

#[test]
fn scenario_c_three_stops_green_route() {
    let catalog = CropCatalog::builtin().unwrap();
    let params = HarvestParams::default();
    let candidates = vec![
        candidate("a", "tomato", 150, &[("plant", 10.0)]),
        candidate("b", "tomato", 200, &[("plant", 4.0)]),
        candidate("c", "tomato", 100, &[("plant", 20.0)]),
    ];

    let route =
        build_milk_run("mr-c", &factory("plant"), candidates, 500, &catalog, &params).unwrap();

    assert_eq!(route.total_quantity_kg, 450);
    assert_eq!(route.truck_fill_percent, 90.0);
    assert!(route.green_certification);
    let order: Vec<&str> = route.stops.iter().map(|s| s.farmer_id.as_str()).collect();
    assert_eq!(order, vec!["b", "a", "c"]);
}

#[test]
fn equal_distances_keep_submission_order() {
    let catalog = CropCatalog::builtin().unwrap();
    let params = HarvestParams::default();
    let candidates = vec![
        candidate("first", "onion", 100, &[("plant", 7.0)]),
        candidate("second", "onion", 100, &[("plant", 7.0)]),
    ];
    let route =
        build_milk_run("mr-t", &factory("plant"), candidates, 500, &catalog, &params).unwrap();
    assert_eq!(route.stops[0].farmer_id, "first");
    assert_eq!(route.stops[1].farmer_id, "second");
}

#[test]
fn refrigerated_crop_sets_route_transport() {
    let catalog = CropCatalog::builtin().unwrap();
    let params = HarvestParams::default();
    let candidates = vec![
        candidate("a", "onion", 100, &[("plant", 5.0)]),
        candidate("b", "spinach", 100, &[("plant", 6.0)]),
    ];
    let route =
        build_milk_run("mr-r", &factory("plant"), candidates, 500, &catalog, &params).unwrap();
    assert_eq!(route.transport, TransportMode::Refrigerated);
}

#[test]
fn negative_distance_is_invalid_input() {
    let catalog = CropCatalog::builtin().unwrap();
    let params = HarvestParams::default();
    let candidates = vec![candidate("a", "tomato", 100, &[("plant", -3.0)])];
    assert!(matches!(
        build_milk_run("mr-n", &factory("plant"), candidates, 500, &catalog, &params),
        Err(EngineError::InvalidInput { .. })
    ));
}

#[test]
fn cycle_groups_by_nearest_factory() {
    let catalog = CropCatalog::builtin().unwrap();
    let params = HarvestParams::default();
    let factories = vec![factory("north"), factory("south")];
    let candidates = vec![
        candidate("a", "tomato", 200, &[("north", 5.0), ("south", 25.0)]),
        candidate("b", "tomato", 200, &[("north", 30.0), ("south", 8.0)]),
        candidate("c", "tomato", 200, &[("east", 3.0)]),
    ];

    let plan =
        plan_pickup_cycle("cycle-1", &factories, candidates, 500, &catalog, &params).unwrap();

    assert_eq!(plan.routes.len(), 2);
    assert_eq!(plan.routes[0].id, "cycle-1-north");
    assert_eq!(plan.routes[0].stops[0].farmer_id, "a");
    assert_eq!(plan.routes[1].id, "cycle-1-south");
    assert_eq!(plan.routes[1].stops[0].farmer_id, "b");
    assert_eq!(plan.unassigned.len(), 1);
    assert!(plan.deferred.is_empty());
}

// ============================================================================
// Carbon
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn property_carbon_local_loop_and_penalty(
        distance_tenths in 0u32..5_000,
        fill in 1u32..=100,
    ) {
        let distance = f64::from(distance_tenths) / 10.0;
        let params = CarbonParams::default();
        let summary = compute_carbon(TransportMode::OpenCrate, distance, f64::from(fill), &params).unwrap();

        prop_assert_eq!(summary.is_local_loop, distance <= 50.0);
        if summary.is_local_loop {
            prop_assert_eq!(summary.distance_penalty, 0.0);
        } else {
            prop_assert!(summary.distance_penalty > 0.0);
        }
        prop_assert_eq!(summary.green_certification, f64::from(fill) >= 90.0);
        prop_assert!(summary.co2_per_kg >= 0.0);
    }
}

#[test]
fn refrigerated_emits_more_than_ambient() {
    let params = CarbonParams::default();
    let cold = compute_carbon(TransportMode::Refrigerated, 100.0, 100.0, &params).unwrap();
    for mode in [
        TransportMode::VentilatedVan,
        TransportMode::PaddedBox,
        TransportMode::CrateStackable,
        TransportMode::OpenCrate,
        TransportMode::Sack,
    ] {
        let ambient = compute_carbon(mode, 100.0, 100.0, &params).unwrap();
        assert!(cold.co2_per_kg > ambient.co2_per_kg, "{:?}", mode);
    }
}

#[test]
fn half_full_truck_doubles_per_kg_emissions() {
    let params = CarbonParams::default();
    let full = compute_carbon(TransportMode::Sack, 100.0, 100.0, &params).unwrap();
    let half = compute_carbon(TransportMode::Sack, 100.0, 50.0, &params).unwrap();
    assert!((half.co2_per_kg - 2.0 * full.co2_per_kg).abs() < 1e-9);
}

#[test]
fn zero_fill_is_rejected() {
    assert!(matches!(
        compute_carbon(TransportMode::Sack, 10.0, 0.0, &CarbonParams::default()),
        Err(EngineError::InvalidInput { .. })
    ));
}
