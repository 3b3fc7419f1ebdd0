use rustc_hash::FxHashMap;

/// Unique names for addresses.
///
/// Every name maps to exactly one address. Registering a name which is
/// already taken does not steal it: an underscore is appended until the name
/// is free, and that name is used instead.
#[derive(Clone, Debug, Default)]
pub struct NameRegistry {
    addresses: FxHashMap<String, u64>,
}

impl NameRegistry {
    pub fn new() -> NameRegistry {
        NameRegistry::default()
    }

    /// Register `name` for `address`, and return the name actually used.
    ///
    /// A taken name is taken even if it belongs to `address` already, so
    /// naming the same address twice with the same name yields `name_`.
    pub fn set_name(&mut self, address: u64, name: &str) -> String {
        let mut name = name.to_string();
        while self.addresses.contains_key(&name) {
            name.push('_');
        }
        self.addresses.insert(name.clone(), address);
        name
    }

    /// Get the address registered under exactly `name`.
    pub fn address_of(&self, name: &str) -> Option<u64> {
        self.addresses.get(name).copied()
    }

    /// Every `(name, address)` pair, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = (&str, u64)> {
        self.addresses
            .iter()
            .map(|(name, address)| (name.as_str(), *address))
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup() {
        let mut names = NameRegistry::new();

        assert_eq!(names.set_name(0xa, "foo"), "foo");
        assert_eq!(names.set_name(0xb, "foo"), "foo_");
        assert_eq!(names.set_name(0xc, "foo"), "foo__");

        assert_eq!(names.address_of("foo"), Some(0xa));
        assert_eq!(names.address_of("foo_"), Some(0xb));
        assert_eq!(names.address_of("foo__"), Some(0xc));
        assert_eq!(names.address_of("bar"), None);
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn suffixed_name_already_taken() {
        let mut names = NameRegistry::new();

        names.set_name(0x1, "foo_");
        names.set_name(0x2, "foo");
        assert_eq!(names.set_name(0x3, "foo"), "foo__");
    }
}
