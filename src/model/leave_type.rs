use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Immutable reference data describing one kind of leave.
///
/// `max_days_per_year = NULL` means unlimited; balance rows synthesized
/// for such a type start with an allocation of 0.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Annual Leave")]
    pub name: String,

    #[schema(example = "annual")]
    pub code: String,

    #[schema(example = 20, nullable = true)]
    pub max_days_per_year: Option<i64>,

    #[schema(example = true)]
    pub is_paid: bool,

    #[schema(example = true)]
    pub requires_approval: bool,
}

impl LeaveType {
    /// Allocation used when a balance row has to be synthesized.
    pub fn default_allocation(&self) -> i64 {
        self.max_days_per_year.unwrap_or(0)
    }
}
