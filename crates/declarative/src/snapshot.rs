//! Snapshots of a resource's values

use crate::diff::diff;
use crate::error::Result;
use crate::resource::Resource;
use crate::types::SnapshotMode;
use crate::value::Value;
use std::collections::BTreeMap;

impl Resource {
    /// Property name to value, selected by `mode`
    ///
    /// `OnlyKnown` and `OnlyExplicit` never load the actual instance (a lazy
    /// value may still read whatever it reads). `OnlyChanged` and `All` may.
    pub fn to_map(&self, mode: SnapshotMode) -> Result<BTreeMap<String, Value>> {
        match mode {
            SnapshotMode::OnlyKnown => {
                let mut map = match self.loaded_actual() {
                    Some(actual) => actual.explicit_map()?,
                    None => BTreeMap::new(),
                };
                map.extend(self.explicit_map()?);
                Ok(map)
            }
            SnapshotMode::OnlyChanged => Ok(diff(self, &[])?
                .map(|changes| {
                    changes
                        .changes
                        .into_iter()
                        .map(|c| (c.name, c.desired))
                        .collect()
                })
                .unwrap_or_default()),
            SnapshotMode::OnlyExplicit => self.explicit_map(),
            SnapshotMode::All => self
                .schema()
                .properties()
                .iter()
                .map(|p| Ok((p.name().to_string(), p.get(self)?)))
                .collect(),
        }
    }

    fn explicit_map(&self) -> Result<BTreeMap<String, Value>> {
        let mut map = BTreeMap::new();
        for property in self.schema().properties() {
            if let Some(stored) = self.explicit_value(property.name()) {
                map.insert(
                    property.name().to_string(),
                    property.coerce_for_read(self, stored)?,
                );
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy::LazyValue;
    use crate::testing::{FakeDriver, person};

    #[test]
    fn test_only_explicit() {
        let schema = person(FakeDriver::absent());
        let mut r = schema.open_positional(vec![5.into()]).unwrap();
        r.set("name", "Ann").unwrap();

        let map = r.to_map(SnapshotMode::OnlyExplicit).unwrap();
        assert_eq!(
            map,
            BTreeMap::from([
                ("id".to_string(), Value::from(5)),
                ("name".to_string(), Value::from("Ann")),
            ])
        );
    }

    #[test]
    fn test_explicit_and_known_never_load() {
        let driver = FakeDriver::present([("name", Value::from("Zed"))]);
        let schema = person(driver.clone());
        let r = schema.open_positional(vec![5.into()]).unwrap();

        let explicit = r.to_map(SnapshotMode::OnlyExplicit).unwrap();
        let known = r.to_map(SnapshotMode::OnlyKnown).unwrap();
        assert_eq!(explicit.keys().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(known, explicit);
        assert_eq!(driver.loads(), 0);
    }

    #[test]
    fn test_only_known_merges_loaded_actual() {
        let driver = FakeDriver::present([("name", Value::from("Zed"))]);
        let schema = person(driver);
        let r = schema.open_positional(vec![5.into()]).unwrap();
        r.resource_exists().unwrap();

        let known = r.to_map(SnapshotMode::OnlyKnown).unwrap();
        assert_eq!(known["name"], Value::from("Zed"));
        assert_eq!(known["id"], Value::from(5));
    }

    #[test]
    fn test_only_changed() {
        let driver = FakeDriver::present([("name", Value::from("Zed"))]);
        let schema = person(driver);
        let mut r = schema.open_positional(vec![5.into()]).unwrap();
        assert!(r.to_map(SnapshotMode::OnlyChanged).unwrap().is_empty());

        r.set("name", "Ann").unwrap();
        let changed = r.to_map(SnapshotMode::OnlyChanged).unwrap();
        assert_eq!(
            changed,
            BTreeMap::from([("name".to_string(), Value::from("Ann"))])
        );
    }

    #[test]
    fn test_all_resolves_every_property() {
        let schema = person(FakeDriver::absent());
        let r = schema.open_positional(vec![5.into()]).unwrap();
        let all = r.to_map(SnapshotMode::All).unwrap();
        assert_eq!(all["name"], Value::from("unknown"));
        assert_eq!(all.len(), schema.properties().len());
    }

    #[test]
    fn test_explicit_is_subset_of_all() {
        let schema = person(FakeDriver::present([("name", Value::from("Zed"))]));
        let mut r = schema.open_positional(vec![5.into()]).unwrap();
        r.set(
            "name",
            LazyValue::receiver(|r| Ok(Value::from(format!("user-{}", r.get("id")?)))),
        )
        .unwrap();

        let explicit = r.to_map(SnapshotMode::OnlyExplicit).unwrap();
        let all = r.to_map(SnapshotMode::All).unwrap();
        for (name, value) in &explicit {
            assert_eq!(all.get(name), Some(value));
        }
        assert_eq!(explicit["name"], Value::from("user-5"));
    }
}
