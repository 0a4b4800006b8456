//! Product lookup for scope and bonus-target resolution.

use std::collections::HashMap;

use preventa_core::Product;

use crate::normalize::key;

/// Products indexed by normalized id and by normalized code.
///
/// Order lines reference products by either, depending on which screen
/// created them, so both keys resolve to the same product. When two products
/// share a key the first one loaded wins.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        let mut index = HashMap::with_capacity(products.len() * 2);
        for (position, product) in products.iter().enumerate() {
            for raw in [&product.id, &product.code] {
                let k = key(raw);
                if !k.is_empty() {
                    index.entry(k).or_insert(position);
                }
            }
        }
        ProductCatalog { products, index }
    }

    /// Finds a product by id or code.
    pub fn get(&self, id_or_code: &str) -> Option<&Product> {
        self.index
            .get(&key(id_or_code))
            .and_then(|&position| self.products.get(position))
    }

    /// All products, in load order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<Product> for ProductCatalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        ProductCatalog::new(iter.into_iter().collect())
    }
}
