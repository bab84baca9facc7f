use crate::DomainResult;
use crate::competitors::{Competitor, RatingUpdate};
use crate::ports::BoxFuture;

pub trait CompetitorRepository: Send + Sync {
    fn create(&self, competitor: &Competitor) -> BoxFuture<'_, DomainResult<Competitor>>;

    fn get(&self, competitor_id: &str) -> BoxFuture<'_, DomainResult<Competitor>>;

    fn list(&self) -> BoxFuture<'_, DomainResult<Vec<Competitor>>>;

    fn delete(&self, competitor_id: &str) -> BoxFuture<'_, DomainResult<()>>;

    fn update_rating(
        &self,
        competitor_id: &str,
        update: &RatingUpdate,
    ) -> BoxFuture<'_, DomainResult<Competitor>>;

    /// Drops score bounds for competitors no longer covered by any vote,
    /// resetting their score to the given initial value.
    fn reset_unrated(
        &self,
        rated_ids: &[String],
        initial_score: f64,
    ) -> BoxFuture<'_, DomainResult<usize>>;
}
