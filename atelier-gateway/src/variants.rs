//! Size/colour variant matrices

use atelier_shared::Variant;
use std::collections::HashSet;

/// Every combination of the given sizes and colours at one price and stock level
#[derive(Debug, Clone, Default)]
pub struct VariantMatrix {
    pub base_sku: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub price: f64,
    pub stock: u32,
}

impl VariantMatrix {
    pub fn new(base_sku: impl Into<String>, price: f64) -> Self {
        Self {
            base_sku: base_sku.into(),
            price,
            ..Default::default()
        }
    }

    pub fn sizes<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sizes = sizes.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.colors = colors.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Sizes outer, colours inner; blank and repeated values are skipped
    pub fn generate(&self) -> Vec<Variant> {
        let sizes = dedup(&self.sizes);
        let colors = dedup(&self.colors);

        sizes
            .iter()
            .flat_map(|size| {
                colors.iter().map(move |color| Variant {
                    sku: format!(
                        "{}-{}-{}",
                        sku_part(&self.base_sku),
                        sku_part(size),
                        sku_part(color)
                    ),
                    size: size.to_string(),
                    color: color.to_string(),
                    price: self.price,
                    stock: self.stock,
                })
            })
            .collect()
    }
}

/// First spelling wins; comparison is case-insensitive beyond ASCII
fn dedup(values: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && seen.insert(v.to_lowercase()))
        .collect()
}

fn sku_part(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase()
}
