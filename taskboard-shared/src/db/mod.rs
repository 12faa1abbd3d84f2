/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Embedded schema migrations
///
/// Queries live with their models in [`crate::models`]; transactions are
/// opened through [`crate::store`].

pub mod migrations;
pub mod pool;
