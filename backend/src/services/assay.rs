//! Harvest assay service: scanning, pricing and listing generation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    generate_listings, price_assay, scan, validate_tier_split, verify_assay, CropCatalog,
    CropConfig, DigitalAssay, HarvestParams, ListingSequence, ScanRequest, SplitListing,
    TierSplit, TierSplitStrategy, UniversalPriceResult,
};

use crate::error::{AppError, AppResult};
use crate::external::ai_grading::{AiGradingClient, GradeSampleRequest};

/// Assay service wrapping the tier classifier and its downstream steps
#[derive(Clone)]
pub struct AssayService {
    catalog: Arc<CropCatalog>,
    strategy: Arc<dyn TierSplitStrategy>,
    params: Arc<HarvestParams>,
    listings: Arc<ListingSequence>,
    grading: Option<AiGradingClient>,
    grading_required: bool,
}

/// Scan input after request validation
#[derive(Debug, Clone)]
pub struct ScanInput {
    pub crop_key: String,
    pub total_quantity_kg: Decimal,
    pub override_split: Option<TierSplit>,
    pub sample_image_url: Option<String>,
}

impl AssayService {
    /// Create a new AssayService instance
    pub fn new(
        catalog: Arc<CropCatalog>,
        strategy: Arc<dyn TierSplitStrategy>,
        params: Arc<HarvestParams>,
    ) -> Self {
        Self {
            catalog,
            strategy,
            params,
            listings: Arc::new(ListingSequence::new()),
            grading: None,
            grading_required: false,
        }
    }

    /// Attach the remote grading model
    pub fn with_grading(mut self, client: Option<AiGradingClient>, required: bool) -> Self {
        self.grading = client;
        self.grading_required = required;
        self
    }

    pub fn crop(&self, key: &str) -> AppResult<CropConfig> {
        Ok(self.catalog.lookup(key)?.clone())
    }

    pub fn crop_keys(&self) -> Vec<String> {
        self.catalog.list_keys()
    }

    /// Scan a harvested lot at the current time
    pub async fn scan(&self, input: ScanInput) -> AppResult<DigitalAssay> {
        self.scan_at(input, Utc::now()).await
    }

    /// Scan a harvested lot.
    ///
    /// An explicit split wins. Otherwise a sample photo goes to the remote
    /// grading model when one is configured, falling back to the local
    /// strategy if the model fails and is not marked required.
    pub async fn scan_at(&self, input: ScanInput, scanned_at: DateTime<Utc>) -> AppResult<DigitalAssay> {
        // Resolve the crop before any remote call so an unknown key fails fast
        let crop = self.catalog.lookup(&input.crop_key)?;

        let mut request = ScanRequest::new(crop.key.clone(), input.total_quantity_kg);
        request.override_split = match input.override_split {
            Some(split) => Some(split),
            None => self.remote_split(&crop.key, &input).await?,
        };

        let assay = scan(
            &self.catalog,
            self.strategy.as_ref(),
            &request,
            &self.params,
            scanned_at,
        )?;

        tracing::info!(
            crop = %assay.crop_key,
            quantity_kg = %assay.total_quantity_kg,
            total_value = %assay.total_value,
            rescue_eligible = assay.rescue_eligible,
            "Harvest scanned"
        );

        Ok(assay)
    }

    async fn remote_split(&self, crop_key: &str, input: &ScanInput) -> AppResult<Option<TierSplit>> {
        let (Some(client), Some(image_url)) = (&self.grading, &input.sample_image_url) else {
            return Ok(None);
        };

        let request = GradeSampleRequest {
            crop_key,
            total_quantity_kg: input.total_quantity_kg,
            image_url,
        };
        // A split the model got wrong is a grading failure, not a client error
        let graded = client.grade_sample(request).await.and_then(|split| {
            validate_tier_split(&split).map_err(|e| {
                AppError::AiGradingError(format!("model returned an invalid split: {}", e))
            })?;
            Ok(split)
        });
        match graded {
            Ok(split) => Ok(Some(split)),
            Err(e) if !self.grading_required => {
                tracing::warn!("AI grading failed, using local classifier: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Price an assay with the configured ladder.
    ///
    /// The assay comes from the client, so it is checked against the crop
    /// table first.
    pub fn price(&self, assay: &DigitalAssay) -> AppResult<UniversalPriceResult> {
        let assay = verify_assay(&self.catalog, assay, &self.params)?;
        Ok(price_assay(&assay, &self.params.pricing)?)
    }

    /// Split an assay into independent listings
    pub fn listings(&self, assay: &DigitalAssay) -> AppResult<Vec<SplitListing>> {
        let assay = verify_assay(&self.catalog, assay, &self.params)?;
        Ok(generate_listings(&assay, &self.listings))
    }
}
