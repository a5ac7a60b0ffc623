//! Database access layer
//!
//! Free async functions over the PostgreSQL pool. Functions that must run
//! inside a caller-owned transaction take `&mut PgConnection`; everything
//! else takes `&PgPool` and owns its own transactional scope.

pub mod carts;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod queue;
pub mod wallets;

/// Clamp user-supplied pagination parameters to sane bounds
pub fn page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * limit;
    (page, limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        assert_eq!(page_params(None, None), (1, 10, 0));
    }

    #[test]
    fn test_page_params_clamping() {
        assert_eq!(page_params(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(page_params(Some(-5), Some(1000)), (1, 100, 0));
        assert_eq!(page_params(Some(3), Some(20)), (3, 20, 40));
    }
}
