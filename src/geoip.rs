use crate::mmdb::LocationLookup;

/// Label for addresses that never leave the local network.
pub const LOCAL_LABEL: &str = "Local";

/// Label for tokens the database cannot place.
pub const UNKNOWN_LABEL: &str = "Unknown";

// Databases use "0" for "no value" in some fields
const ZERO_STR: &str = "0";

/// Where an address lives, as far as the database knows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
}

impl Location {
    pub fn new<S: Into<String>>(country: S, province: S, city: S) -> Self {
        Self {
            country: Some(country.into()),
            province: Some(province.into()),
            city: Some(city.into()),
        }
    }

    /// Country, province and city joined with no separator, skipping parts
    /// that are missing, empty or `"0"`. `None` when no part survives.
    pub fn label(&self) -> Option<String> {
        let mut label = String::new();
        for part in [&self.country, &self.province, &self.city] {
            match part.as_deref() {
                None | Some("") | Some(ZERO_STR) => {}
                Some(value) => label.push_str(value),
            }
        }
        if label.is_empty() {
            None
        } else {
            Some(label)
        }
    }
}

/// Turns public address tokens into display labels.
///
/// Every failure collapses into [`UNKNOWN_LABEL`]; a bad token never stops
/// the line it was found in.
#[derive(Debug)]
pub struct Resolver<L> {
    lookup: L,
}

impl<L: LocationLookup> Resolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Resolve a token to a label.
    pub fn label(&self, token: &str) -> String {
        match self.lookup.lookup(token) {
            Ok(Some(location)) => location
                .label()
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            Ok(None) => {
                log::debug!("no record for {}", token);
                UNKNOWN_LABEL.to_string()
            }
            Err(err) => {
                log::debug!("lookup of {} failed: {}", token, err);
                UNKNOWN_LABEL.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};

    struct Fixed(Option<Location>);

    impl LocationLookup for Fixed {
        fn lookup(&self, _token: &str) -> Result<Option<Location>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl LocationLookup for Failing {
        fn lookup(&self, token: &str) -> Result<Option<Location>> {
            Err(Error::InvalidAddress {
                token: token.to_string(),
            })
        }
    }

    #[test]
    fn label_joins_parts_without_separator() {
        let loc = Location::new("China", "Guangdong", "Shenzhen");
        assert_eq!(loc.label().as_deref(), Some("ChinaGuangdongShenzhen"));
    }

    #[test]
    fn label_skips_empty_and_zero_parts() {
        let loc = Location::new("X", "Y", "");
        assert_eq!(loc.label().as_deref(), Some("XY"));

        let loc = Location::new("X", "0", "Z");
        assert_eq!(loc.label().as_deref(), Some("XZ"));

        let loc = Location {
            country: None,
            province: Some("0".into()),
            city: Some("Berlin".into()),
        };
        assert_eq!(loc.label().as_deref(), Some("Berlin"));
    }

    #[test]
    fn label_of_nothing_is_none() {
        assert_eq!(Location::new("0", "0", "0").label(), None);
        assert_eq!(Location::new("", "", "").label(), None);
        assert_eq!(Location::default().label(), None);
    }

    #[test]
    fn zero_only_matches_exactly() {
        let loc = Location::new("10", "00", "0");
        assert_eq!(loc.label().as_deref(), Some("1000"));
    }

    #[test]
    fn resolver_labels_found_locations() {
        let resolver = Resolver::new(Fixed(Some(Location::new("X", "Y", ""))));
        assert_eq!(resolver.label("1.1.1.1"), "XY");
    }

    #[test]
    fn resolver_degrades_to_unknown() {
        assert_eq!(Resolver::new(Fixed(None)).label("1.1.1.1"), UNKNOWN_LABEL);
        assert_eq!(
            Resolver::new(Fixed(Some(Location::new("0", "0", "0")))).label("1.1.1.1"),
            UNKNOWN_LABEL
        );
        assert_eq!(Resolver::new(Failing).label("999.999.999.999"), UNKNOWN_LABEL);
    }
}
