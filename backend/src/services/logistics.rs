//! Milk-run logistics service
//!
//! Holds the pickup queue. A periodic cycle drains the queue, plans one
//! consolidated route per factory and puts deferred lots back for the next
//! cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    build_milk_run, compute_carbon, plan_pickup_cycle, CarbonSummary, CropCatalog, EngineError,
    Factory, HarvestParams, MilkRunRoute, PickupCandidate, PickupCyclePlan, TransportMode,
};
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, AppResult};

/// Outcome of one pickup cycle
#[derive(Debug, Clone, Serialize)]
pub struct PickupCycleReport {
    pub cycle_id: String,
    pub ran_at: DateTime<Utc>,
    pub routes: Vec<MilkRunRoute>,
    pub requeued: usize,
    pub unassigned: Vec<PickupCandidate>,
}

impl PickupCycleReport {
    fn from_plan(cycle_id: String, ran_at: DateTime<Utc>, plan: PickupCyclePlan) -> Self {
        Self {
            cycle_id,
            ran_at,
            routes: plan.routes,
            requeued: plan.deferred.len(),
            unassigned: plan.unassigned,
        }
    }
}

pub struct LogisticsService {
    catalog: Arc<CropCatalog>,
    params: Arc<HarvestParams>,
    factories: Vec<Factory>,
    truck_capacity_kg: i64,
    queue: Mutex<Vec<PickupCandidate>>,
    latest: RwLock<Option<PickupCycleReport>>,
    cycles: AtomicU64,
}

impl LogisticsService {
    /// Create a new LogisticsService instance
    pub fn new(
        catalog: Arc<CropCatalog>,
        params: Arc<HarvestParams>,
        factories: Vec<Factory>,
        truck_capacity_kg: i64,
    ) -> Self {
        Self {
            catalog,
            params,
            factories,
            truck_capacity_kg,
            queue: Mutex::new(Vec::new()),
            latest: RwLock::new(None),
            cycles: AtomicU64::new(0),
        }
    }

    fn factory(&self, factory_id: &str) -> AppResult<&Factory> {
        self.factories
            .iter()
            .find(|f| f.id == factory_id)
            .ok_or_else(|| AppError::NotFound(format!("Factory '{}'", factory_id)))
    }

    /// Build a one-off route to a factory from the given candidates
    pub fn build(
        &self,
        factory_id: &str,
        candidates: Vec<PickupCandidate>,
        truck_capacity_kg: Option<i64>,
    ) -> AppResult<MilkRunRoute> {
        let factory = self.factory(factory_id)?;
        let route_id = format!("mr-{}-{}", factory.id, Utc::now().timestamp_millis());
        let route = build_milk_run(
            &route_id,
            factory,
            candidates,
            truck_capacity_kg.unwrap_or(self.truck_capacity_kg),
            &self.catalog,
            &self.params,
        )?;

        tracing::info!(
            route = %route.id,
            stops = route.stops.len(),
            fill_percent = route.truck_fill_percent,
            green = route.green_certification,
            "Milk run built"
        );
        Ok(route)
    }

    /// Queue a lot for the next pickup cycle
    pub async fn enqueue(&self, candidate: PickupCandidate) -> AppResult<usize> {
        shared::validate_lot_kg("quantity_kg", candidate.quantity_kg)?;
        if candidate.factory_distances.is_empty() {
            return Err(EngineError::invalid(
                "factory_distances",
                "at least one factory distance is required",
            )
            .into());
        }
        for distance in &candidate.factory_distances {
            shared::validate_distance_km("distance_km", distance.distance_km)?;
        }
        self.catalog.lookup(&candidate.crop_key)?;

        // Anything no truck could ever take would sit in the queue forever
        if candidate.quantity_kg > self.truck_capacity_kg {
            return Err(EngineError::invalid(
                "quantity_kg",
                format!(
                    "lot of {} kg exceeds the truck capacity of {} kg",
                    candidate.quantity_kg, self.truck_capacity_kg
                ),
            )
            .into());
        }
        let max_detour_km = self.params.milk_run.max_detour_km;
        let in_range = candidate
            .nearest_factory(&self.factories)
            .and_then(|factory| candidate.distance_to(&factory.id))
            .is_some_and(|distance| distance <= max_detour_km);
        if !in_range {
            return Err(EngineError::invalid(
                "factory_distances",
                format!("no configured factory within {} km", max_detour_km),
            )
            .into());
        }

        let mut queue = self.queue.lock().await;
        tracing::debug!(farmer = %candidate.farmer_id, crop = %candidate.crop_key, "Pickup queued");
        queue.push(candidate);
        Ok(queue.len())
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Latest cycle outcome, if any cycle has run
    pub async fn latest(&self) -> Option<PickupCycleReport> {
        self.latest.read().await.clone()
    }

    /// Run one pickup cycle over everything queued so far
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> AppResult<PickupCycleReport> {
        let mut queue = self.queue.lock().await;
        let candidates = std::mem::take(&mut *queue);
        let seq = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let cycle_id = format!("cycle-{}-{}", now.format("%Y%m%d%H%M"), seq);

        let plan = match plan_pickup_cycle(
            &cycle_id,
            &self.factories,
            candidates.clone(),
            self.truck_capacity_kg,
            &self.catalog,
            &self.params,
        ) {
            Ok(plan) => plan,
            Err(e) => {
                *queue = candidates;
                return Err(e.into());
            }
        };

        queue.extend(plan.deferred.iter().cloned());
        drop(queue);

        let report = PickupCycleReport::from_plan(cycle_id, now, plan);
        tracing::info!(
            cycle = %report.cycle_id,
            routes = report.routes.len(),
            requeued = report.requeued,
            unassigned = report.unassigned.len(),
            "Pickup cycle completed"
        );
        *self.latest.write().await = Some(report.clone());
        Ok(report)
    }

    /// Carbon estimate for a single trip
    pub fn carbon(
        &self,
        transport: TransportMode,
        distance_km: f64,
        truck_fill_percent: f64,
    ) -> AppResult<CarbonSummary> {
        Ok(compute_carbon(
            transport,
            distance_km,
            truck_fill_percent,
            &self.params.carbon,
        )?)
    }

    /// Run pickup cycles on a fixed interval until the runtime shuts down
    pub fn spawn_cycle_job(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if self.queue_len().await == 0 {
                    tracing::debug!("Pickup queue empty, skipping cycle");
                    continue;
                }
                if let Err(e) = self.run_cycle(Utc::now()).await {
                    tracing::error!("Pickup cycle failed: {}", e);
                }
            }
        })
    }
}
