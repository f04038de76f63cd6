pub mod asset;
pub mod asset_request;
pub mod company;
pub mod report;
pub mod user;
