use sencity_core::{rank_spots, RouteError, SearchArea, Spot, SpotLocator};
use sqlx::PgPool;

use crate::spots::list_nearby_spots;

/// [`SpotLocator`] backed by the `spots` table.
#[derive(Debug, Clone)]
pub struct PgSpotLocator {
    pool: PgPool,
}

impl PgSpotLocator {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SpotLocator for PgSpotLocator {
    async fn find_nearest_spot(
        &self,
        area: SearchArea,
        user_id: i64,
    ) -> Result<Option<Spot>, RouteError> {
        area.center.validate()?;
        let rows = list_nearby_spots(&self.pool, area, user_id).await?;
        tracing::debug!(
            candidates = rows.len(),
            radius_m = area.radius_meters,
            "nearby spots"
        );
        Ok(rank_spots(rows.into_iter().map(Spot::from).collect()))
    }
}
