//! Order Schema Module
//! Maps source column names onto order fields and records which fields a
//! source actually provides.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A column of the orders table the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    OrderDate,
    ShipDate,
    ShipMode,
    Sales,
    Profit,
    Discount,
    ShippingCost,
    Category,
    SubCategory,
    Region,
    State,
    Segment,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::OrderDate,
        Field::ShipDate,
        Field::ShipMode,
        Field::Sales,
        Field::Profit,
        Field::Discount,
        Field::ShippingCost,
        Field::Category,
        Field::SubCategory,
        Field::Region,
        Field::State,
        Field::Segment,
    ];

    /// Canonical column header.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::OrderDate => "Order Date",
            Field::ShipDate => "Ship Date",
            Field::ShipMode => "Ship Mode",
            Field::Sales => "Sales",
            Field::Profit => "Profit",
            Field::Discount => "Discount",
            Field::ShippingCost => "Shipping Cost",
            Field::Category => "Category",
            Field::SubCategory => "Sub-Category",
            Field::Region => "Region",
            Field::State => "State",
            Field::Segment => "Segment",
        }
    }

    /// Resolve a source header to a field.
    ///
    /// Matching ignores case, whitespace, dashes and underscores, so
    /// `Sub-Category`, `sub_category` and `SubCategory` are the same column.
    pub fn from_header(header: &str) -> Option<Field> {
        let key = normalize_header(header);
        Field::ALL
            .into_iter()
            .find(|field| normalize_header(field.column_name()) == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Fields present in a loaded source, computed once at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    fields: BTreeSet<Field>,
}

impl Capabilities {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Every known field available.
    pub fn full() -> Self {
        Self::new(Field::ALL)
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// Required fields that are absent, in declaration order.
    pub fn missing(&self, required: &[Field]) -> Vec<Field> {
        required
            .iter()
            .copied()
            .filter(|field| !self.has(*field))
            .collect()
    }
}
