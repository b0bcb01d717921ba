/// HTTP middleware
///
/// - `rate_limit`: Redis-backed request limiting for the auth endpoints

pub mod rate_limit;
