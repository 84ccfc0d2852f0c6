// Store operations
mod operations;
pub use operations::*;

// Models
mod members;
pub use members::*;

mod memberships;
pub use memberships::*;

mod payments;
pub use payments::*;

mod fee_slips;
pub use fee_slips::*;

mod renewals;
pub use renewals::*;

mod email_log;
pub use email_log::*;
