pub mod connection;
pub use connection::Connection;

pub mod results;
pub mod schema;

pub mod email_log;
pub mod fee_slips;
pub mod members;
pub mod memberships;
pub mod payments;
pub mod renewals;
