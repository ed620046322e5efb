use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters for the match listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListMatchesQuery {
    /// Cap on the number of matches returned; the full ranked set is
    /// returned when absent.
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u16>,
}
