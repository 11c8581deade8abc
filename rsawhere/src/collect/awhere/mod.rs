//! Client for the aWhere weather and agronomics API.

pub mod auth;
pub mod awhere_collect;
pub mod endpoint;
pub mod normalize;

pub use auth::{get_oauth_token, valid_credentials};
pub use awhere_collect::{collect_table, AwhereCollect, AwhereConfig, Fetch};
pub use endpoint::{Day, DayRange, Endpoint, Query, Section, Target, TargetKind};
