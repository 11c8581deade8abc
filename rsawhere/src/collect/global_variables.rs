/// EPSG code of the geographic CRS every boundary and grid is expressed in.
pub const WGS84_EPSG: i32 = 4326;

/// aWhere grid cell size in degrees (5 x 5 arc-minutes, roughly 9 x 9 km).
pub const AWHERE_CELL_SIZE: f64 = 0.08;

/// Largest number of lattice cells (or progression values) a grid may span.
pub const MAX_LATTICE_CELLS: usize = 10_000_000;

pub const AWHERE_API_URL: &str = "https://api.awhere.com/v2/";

pub const AWHERE_AUTH_URL: &str = "https://api.awhere.com/oauth/token";

/// Page size used by the API when none is given.
pub const DEFAULT_LIMIT: u32 = 10;

pub const API_KEY_ENV: &str = "AWHERE_API_KEY";

pub const API_SECRET_ENV: &str = "AWHERE_API_SECRET";
