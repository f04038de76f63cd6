pub mod asset;
pub mod asset_request;
pub mod company;
pub mod ledger;
pub mod role;
pub mod user;
