/// Database access layer
///
/// - `pool`: PostgreSQL connection pool construction
/// - `migrations`: schema migration runner

pub mod migrations;
pub mod pool;
