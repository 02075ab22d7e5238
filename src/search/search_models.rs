use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const PAGE_SIZE: i64 = 25;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Substring to look for in room names
    pub q: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResult {
    pub id: Uuid,
    #[serde(rename = "Room name")]
    pub room_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub page: i64,
    pub num_pages: i64,
    pub count: i64,
}

/// The page actually served for a requested page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub num_pages: i64,
}

impl PageWindow {
    pub fn offset(&self, per_page: i64) -> i64 {
        (self.page - 1) * per_page
    }
}

/// Resolves a raw page number the way Django's `Paginator.get_page` does:
/// garbage falls back to the first page, out-of-range numbers to the last.
/// There is always at least one page, even with no results.
pub fn page_window(raw: Option<&str>, count: i64, per_page: i64) -> PageWindow {
    let num_pages = if count <= 0 {
        1
    } else {
        (count + per_page - 1) / per_page
    };

    let page = match raw.map(str::trim).map(str::parse::<i64>) {
        None | Some(Err(_)) => 1,
        Some(Ok(n)) if n < 1 || n > num_pages => num_pages,
        Some(Ok(n)) => n,
    };

    PageWindow { page, num_pages }
}

/// Escapes LIKE metacharacters and wraps the term for a substring match.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_garbage_page_is_first() {
        assert_eq!(page_window(None, 60, PAGE_SIZE).page, 1);
        assert_eq!(page_window(Some("abc"), 60, PAGE_SIZE).page, 1);
        assert_eq!(page_window(Some(""), 60, PAGE_SIZE).page, 1);
    }

    #[test]
    fn test_out_of_range_page_is_last() {
        let window = page_window(Some("9"), 60, PAGE_SIZE);
        assert_eq!(window, PageWindow { page: 3, num_pages: 3 });
        assert_eq!(page_window(Some("0"), 60, PAGE_SIZE).page, 3);
        assert_eq!(page_window(Some("-2"), 60, PAGE_SIZE).page, 3);
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let window = page_window(Some("4"), 0, PAGE_SIZE);
        assert_eq!(window, PageWindow { page: 1, num_pages: 1 });
        assert_eq!(window.offset(PAGE_SIZE), 0);
    }

    #[test]
    fn test_offset_of_second_page() {
        let window = page_window(Some("2"), 26, PAGE_SIZE);
        assert_eq!(window.num_pages, 2);
        assert_eq!(window.offset(PAGE_SIZE), 25);
    }

    #[test]
    fn test_like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("demo"), "%demo%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_result_uses_display_key() {
        let result = SearchResult {
            id: Uuid::nil(),
            room_name: "Demo".into(),
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["Room name"], "Demo");
    }
}
