//! Domain layer - entities, identifiers and validation rules
//!
//! Pure business types with no knowledge of storage or transport.

pub mod advisor;
pub mod advisory;
pub mod company;
pub mod country;
pub mod entity;
pub mod errors;
pub mod hierarchy;
pub mod market_area;
pub mod newtypes;
pub mod seller;

pub use advisor::Advisor;
pub use advisory::{Advisory, AdvisoryStatus};
pub use company::Company;
pub use country::Country;
pub use entity::{normalize_name, Entity, EntityKind, EntityStatus, Record};
pub use errors::DomainError;
pub use hierarchy::RecruitmentForest;
pub use market_area::MarketArea;
pub use newtypes::{
    AdvisorCode, AdvisoryId, CompanyId, CountryId, EntityKey, MarketAreaId, RecordKey,
    RecruitmentId, SellerCode,
};
pub use seller::{Recruitment, Seller};
