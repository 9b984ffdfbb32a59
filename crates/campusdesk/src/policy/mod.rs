//! Pure policy functions: SLA deadlines and technician assignment.
//!
//! Nothing in here touches storage. Callers fetch a snapshot, hand it to
//! these functions and act on the result.

pub mod assignment;
pub mod sla;

pub use assignment::{
    AssignmentPolicy, DEFAULT_MAX_LOAD, TechnicianLoad, active_counts, busiest_first, can_assign,
    rank, suggest,
};
pub use sla::{SlaPolicy, SlaStatus, SlaTone, evaluate, evaluate_now};
