pub mod asset_metadata;
pub mod policy_grant;
