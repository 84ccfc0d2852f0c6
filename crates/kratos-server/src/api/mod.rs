pub mod auth;
pub mod members;
pub mod memberships;
pub mod slips;
