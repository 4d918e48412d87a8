use std::sync::Arc;

use crate::error::ApiError;
use crate::latest::LatestGate;
use crate::session::SessionManager;
use crate::wire::ProductPage;

/// Filter/search/page parameters for the product listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            brand: None,
            category: None,
            page: 1,
            page_size: 50,
        }
    }
}

impl ProductQuery {
    fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(brand) = &self.brand {
            pairs.push(("brand".to_string(), brand.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category".to_string(), category.clone()));
        }
        pairs
    }
}

/// Product listing with latest-request-wins semantics: a fetch superseded
/// by one with newer parameters resolves to `ApiError::Superseded` instead
/// of delivering a stale page.
pub struct CatalogApi {
    session: Arc<SessionManager>,
    gate: LatestGate,
}

impl CatalogApi {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            gate: LatestGate::new(),
        }
    }

    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let token = self.gate.begin();
        let pairs = query.to_pairs();
        let fetch = self
            .session
            .get_json_with_query::<ProductPage>("catalog/products", &pairs);
        tokio::select! {
            _ = token.cancelled() => Err(ApiError::Superseded),
            page = fetch => page,
        }
    }

    /// Cancels any outstanding fetch; call on component teardown.
    pub fn teardown(&self) {
        self.gate.teardown();
    }
}
