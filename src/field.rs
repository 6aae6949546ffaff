/// The `Field` enum names the four inputs on the shopping form.  The set is closed and known at
/// startup, so rather than passing raw strings around and hoping everyone spells "quantity" the
/// same way, we let the compiler keep the books.  The [`strum`] derives give us the lowercase
/// string form used for element ids, parsing back from a string (which the csv reader in
/// [`crate::Script`] relies on), and iteration over all four variants when wiring up the till.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Number of items.  Must read as a positive whole number.
    Quantity,
    /// Price per item.
    Price,
    /// Tax rate, as a percentage.
    Tax,
    /// Flat discount subtracted from the total.
    Discount,
}

impl Field {
    /// The id of the input element holding this field's value.
    pub fn input_id(&self) -> String {
        self.to_string()
    }

    /// The id of the label element sitting next to the input.  We keep the convention dumb on
    /// purpose: the label for `quantity` is `quantity-label`.
    pub fn label_id(&self) -> String {
        format!("{self}-label")
    }

    /// The title text a label shows when its field is in good standing.  Also the name used in
    /// validation messages.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Quantity => "Quantity",
            Self::Price => "Price",
            Self::Tax => "Tax (%)",
            Self::Discount => "Discount",
        }
    }
}

/// The id of the element displaying the running total.
pub const TOTAL: &str = "total";

/// The `Readings` struct is a snapshot of the four field values at the moment a recalculation was
/// requested.  The [`crate::Tallyman`] takes the snapshot and hands it to
/// [`crate::Tallyman::recalculate`] as an explicit argument, so the recalculation itself never
/// reaches back into the page and can be tested with plain strings.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, derive_new::new, derive_getters::Getters,
)]
pub struct Readings {
    quantity: String,
    price: String,
    tax: String,
    discount: String,
}

impl Readings {
    /// Look up a reading by its [`Field`].
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Quantity => &self.quantity,
            Field::Price => &self.price,
            Field::Tax => &self.tax,
            Field::Discount => &self.discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn ids_follow_the_lowercase_convention() {
        assert_eq!(Field::Quantity.input_id(), "quantity");
        assert_eq!(Field::Tax.label_id(), "tax-label");
    }

    #[test]
    fn fields_parse_back_from_strings() {
        for field in Field::iter() {
            assert_eq!(Field::from_str(&field.to_string()).unwrap(), field);
        }
        assert!(Field::from_str("postage").is_err());
    }

    #[test]
    fn readings_look_up_by_field() {
        let readings = Readings::new("2".into(), "3.00".into(), "10".into(), "1.00".into());
        assert_eq!(readings.get(Field::Quantity), "2");
        assert_eq!(readings.get(Field::Discount), "1.00");
    }
}
