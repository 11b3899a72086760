use super::ApiError;
use crate::db::SortField;

/// Required request fields: absent and blank both reject.
pub fn required_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::validation(format!("{name} is required"))),
    }
}

/// Filter values: a blank query parameter means "no filter".
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn validate_rating(rating: i32) -> Result<i32, ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::validation(format!(
            "Invalid rating: {}. Rating must be between 1 and 5",
            rating
        )));
    }
    Ok(rating)
}

pub fn validate_price(price: f64) -> Result<f64, ApiError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ApiError::validation(format!(
            "Invalid price: {}. Price must be a positive number",
            price
        )));
    }
    Ok(price)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page < 1 {
        return Err(ApiError::validation(format!(
            "Invalid page: {}. Page must be at least 1",
            page
        )));
    }
    Ok(page)
}

pub fn validate_limit(limit: u64, max: u64) -> Result<u64, ApiError> {
    if !(1..=max).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between 1 and {}",
            limit, max
        )));
    }
    Ok(limit)
}

/// Sort parameters are whitelisted; anything outside the list rejects
/// instead of being passed through to the query builder.
pub fn parse_sort(
    sort_by: Option<&str>,
    sort_order: Option<&str>,
) -> Result<(SortField, bool), ApiError> {
    let field = match sort_by.unwrap_or("createdAt") {
        "createdAt" => SortField::CreatedAt,
        "price" => SortField::Price,
        "title" => SortField::Title,
        other => {
            return Err(ApiError::validation(format!("Unknown sort field: {other}")));
        }
    };

    let descending = match sort_order.unwrap_or("desc") {
        "desc" => true,
        "asc" => false,
        other => {
            return Err(ApiError::validation(format!("Unknown sort order: {other}")));
        }
    };

    Ok((field, descending))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_field() {
        assert!(required_field(Some("ok".to_string()), "title").is_ok());
        assert!(required_field(Some("  ".to_string()), "title").is_err());
        assert!(required_field(Some(String::new()), "title").is_err());
        assert!(required_field(None, "title").is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(
            non_empty(Some("laptops".to_string())),
            Some("laptops".to_string())
        );
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0.01).is_ok());
        assert!(validate_price(0.0).is_err());
        assert!(validate_price(-5.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(20, 100).is_ok());
        assert!(validate_limit(100, 100).is_ok());
        assert!(validate_limit(0, 100).is_err());
        assert!(validate_limit(101, 100).is_err());
    }

    #[test]
    fn test_parse_sort_defaults() {
        let (field, descending) = parse_sort(None, None).unwrap();
        assert_eq!(field, SortField::CreatedAt);
        assert!(descending);
    }

    #[test]
    fn test_parse_sort_whitelist() {
        assert!(parse_sort(Some("price"), Some("asc")).is_ok());
        assert!(parse_sort(Some("title"), Some("desc")).is_ok());
        assert!(parse_sort(Some("sellerId"), None).is_err());
        assert!(parse_sort(Some("price; DROP TABLE products"), None).is_err());
        assert!(parse_sort(None, Some("sideways")).is_err());
    }
}
