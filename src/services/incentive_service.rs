use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::incentive::{IncentiveSlab, IncentiveSlabInput, IncentiveSummary, StaffEarnings};
use crate::models::query::ReportQuery;
use crate::services::api_client::ApiClient;
use crate::services::endpoints::Endpoint;

#[derive(Clone)]
pub struct IncentiveService {
    api: ApiClient,
}

impl IncentiveService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list_slabs(&self) -> AppResult<Vec<IncentiveSlab>> {
        let batch = self
            .api
            .fetch_records(Endpoint::IncentiveSlabs, &ReportQuery::default())
            .await?;
        Ok(batch.records)
    }

    pub async fn create_slab(&self, input: IncentiveSlabInput) -> AppResult<IncentiveSlab> {
        let input = validate_slab_input(input)?;
        let slab: IncentiveSlab = self.api.post_json(Endpoint::IncentiveSlabs, &input).await?;
        info!(target: "app::api", slab_id = slab.id, "incentive slab created");
        Ok(slab)
    }

    pub async fn update_slab(&self, slab_id: i64, input: IncentiveSlabInput) -> AppResult<IncentiveSlab> {
        let input = validate_slab_input(input)?;
        self.api
            .patch_json(Endpoint::IncentiveSlab(slab_id), &input)
            .await
    }

    pub async fn delete_slab(&self, slab_id: i64) -> AppResult<()> {
        self.api.delete(Endpoint::IncentiveSlab(slab_id)).await?;
        info!(target: "app::api", slab_id, "incentive slab deleted");
        Ok(())
    }

    pub async fn staff_earnings(&self, staff_id: i64) -> AppResult<StaffEarnings> {
        if staff_id <= 0 {
            return Err(AppError::validation("Staff id must be positive"));
        }
        let mut earnings: StaffEarnings = self.api.get_object(Endpoint::StaffEarnings(staff_id)).await?;
        earnings.staff_id.get_or_insert(staff_id);
        Ok(earnings)
    }

    /// Earnings for one staff member matched against the current slabs.
    pub async fn staff_incentive(&self, staff_id: i64) -> AppResult<IncentiveSummary> {
        let earnings = self.staff_earnings(staff_id).await?;
        let slabs = self.list_slabs().await?;
        let summary = compute_summary(earnings.total_earn, &slabs);
        debug!(
            target: "app::api",
            staff_id,
            slab = ?summary.slab.as_ref().map(|slab| slab.id),
            "incentive computed"
        );
        Ok(summary)
    }
}

/// Active slab whose `[min_amount, max_amount)` range holds `total_earn`.
/// Overlapping slabs resolve to the one with the highest minimum.
pub fn select_slab(slabs: &[IncentiveSlab], total_earn: f64) -> Option<&IncentiveSlab> {
    if !total_earn.is_finite() {
        return None;
    }

    slabs
        .iter()
        .filter(|slab| slab.is_active && slab.covers(total_earn))
        .max_by(|left, right| left.min_amount.total_cmp(&right.min_amount))
}

pub fn compute_summary(total_earn: f64, slabs: &[IncentiveSlab]) -> IncentiveSummary {
    let slab = select_slab(slabs, total_earn).cloned();
    let incentive_amount = slab
        .as_ref()
        .map(|slab| round_cents(total_earn * slab.incentive_percentage / 100.0))
        .unwrap_or(0.0);

    IncentiveSummary {
        total_earn,
        slab,
        incentive_amount,
    }
}

pub fn validate_slab_input(mut input: IncentiveSlabInput) -> AppResult<IncentiveSlabInput> {
    input.slab_name = input.slab_name.trim().to_string();
    if input.slab_name.is_empty() {
        return Err(AppError::validation("Slab name is required"));
    }

    let amounts = [input.min_amount, input.max_amount, input.incentive_percentage];
    if amounts.iter().any(|value| !value.is_finite()) {
        return Err(AppError::validation("Slab amounts must be numbers"));
    }
    if input.min_amount < 0.0 {
        return Err(AppError::validation("Minimum amount cannot be negative"));
    }
    if input.min_amount >= input.max_amount {
        return Err(AppError::validation_with_details(
            "Minimum amount must be below maximum amount",
            serde_json::json!({
                "minAmount": input.min_amount,
                "maxAmount": input.max_amount,
            }),
        ));
    }
    if !(0.0..=100.0).contains(&input.incentive_percentage) {
        return Err(AppError::validation(
            "Incentive percentage must be between 0 and 100",
        ));
    }

    Ok(input)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
