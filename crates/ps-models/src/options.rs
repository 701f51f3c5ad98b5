//! Option catalog for the task creation form
//!
//! Served by `GET /options`; read-only on the client.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A vendor company offered for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl VendorOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
        }
    }
}

/// One category with its subtypes and vendors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub category: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub vendors: Vec<VendorOption>,
}

impl OptionGroup {
    fn vendors_only(category: &str, vendors: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            types: vec![],
            vendors: vendors.iter().map(|v| VendorOption::new(*v)).collect(),
        }
    }

    pub fn vendor(&self, name: &str) -> Option<&VendorOption> {
        self.vendors.iter().find(|v| v.name == name)
    }
}

/// Nested catalog: printing methods, post-processing categories, delivery methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionCatalog {
    /// Printing methods; each group's vendors are the selectable options
    pub printing: Vec<OptionGroup>,
    pub post_processing: Vec<OptionGroup>,
    pub delivery_methods: Vec<String>,
}

impl OptionCatalog {
    pub fn printing_group(&self, method: &str) -> Option<&OptionGroup> {
        self.printing.iter().find(|g| g.category == method)
    }

    pub fn post_processing_group(&self, category: &str) -> Option<&OptionGroup> {
        self.post_processing.iter().find(|g| g.category == category)
    }

    /// Phone on record for a post-processing vendor
    pub fn vendor_phone(&self, category: &str, vendor: &str) -> Option<String> {
        self.post_processing_group(category)
            .or_else(|| self.printing_group(category))
            .and_then(|g| g.vendor(vendor))
            .and_then(|v| v.phone.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.printing.is_empty() && self.post_processing.is_empty() && self.delivery_methods.is_empty()
    }
}

static DEFAULT_CATALOG: Lazy<OptionCatalog> = Lazy::new(|| OptionCatalog {
    printing: vec![
        OptionGroup::vendors_only("디지털인쇄", &["내부인쇄", "태산인디고", "기타"]),
        OptionGroup::vendors_only("옵셋인쇄", &["동양인쇄", "114 프린팅", "기타"]),
    ],
    post_processing: vec![
        OptionGroup::vendors_only("코팅", &["자체코팅", "외부코팅", "기타"]),
        OptionGroup::vendors_only("박", &["자체박", "외부박", "기타"]),
        OptionGroup::vendors_only("목형", &["자체목형", "외부목형", "V컷", "기타"]),
    ],
    delivery_methods: ["택배", "퀵", "자가", "방문수령", "기타"]
        .iter()
        .map(|s| s.to_string())
        .collect(),
});

/// Built-in catalog used when the backend catalog cannot be fetched
pub fn default_catalog() -> &'static OptionCatalog {
    &DEFAULT_CATALOG
}
