//! Alias substitution.
//!
//! Mirrors `yash_syntax::alias` and the `mrsh_state` alias callback
//! (`mrsh_parser_set_alias_func`), adapted to the rest of this crate's
//! trait-based, non-async style: the lexer asks a [`Glossary`] whether a
//! word it just scanned names an alias, and if so, splices the
//! replacement text back into the input stream (see [`crate::lexer`]).

use crate::source::Location;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// A single alias definition: `name` expands to `replacement` wherever it
/// appears in command-word position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alias {
    pub name: String,
    pub replacement: String,
    /// Whether the replacement participates in alias substitution even
    /// when it is not the first word of a command (the behavior of
    /// `alias -g` style "global" aliases, which POSIX itself does not
    /// mandate but mrsh exposes as an attribute on the definition).
    pub global: bool,
    /// Where this alias was defined.
    pub origin: Location,
}

/// Wraps [`Alias`] so a [`HashSet`] can look it up and replace entries by
/// `name` alone, ignoring `replacement`/`global`/`origin` for hashing and
/// equality. This is the same trick `yash_syntax::alias::HashEntry` plays
/// to let `AliasSet::insert` overwrite a previous definition with the same
/// name.
#[derive(Clone, Debug)]
pub struct HashEntry(pub Alias);

impl PartialEq for HashEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}
impl Eq for HashEntry {}

impl Hash for HashEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl std::borrow::Borrow<str> for HashEntry {
    fn borrow(&self) -> &str {
        &self.0.name
    }
}

/// A set of currently defined aliases, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct AliasSet(HashSet<HashEntry>);

impl AliasSet {
    #[must_use]
    pub fn new() -> Self {
        AliasSet::default()
    }

    /// Defines or redefines an alias.
    pub fn insert(&mut self, alias: Alias) {
        self.0.replace(HashEntry(alias));
    }

    /// Removes an alias definition, if any.
    pub fn remove(&mut self, name: &str) -> Option<Alias> {
        self.0.take(name).map(|entry| entry.0)
    }

    /// Looks up an alias by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Alias> {
        self.0.get(name).map(|entry| &entry.0)
    }
}

/// The alias-lookup contract the parser depends on, the trait-object
/// equivalent of `mrsh_parser_set_alias_func`'s callback.
///
/// Splitting this into its own trait (rather than requiring a concrete
/// [`AliasSet`]) lets a caller back it with something other than a plain
/// hash set — a layered or dynamically computed alias table, say —
/// without this crate needing to know about it.
pub trait Glossary {
    /// Returns the current replacement text for `name`, if it is defined
    /// as an alias.
    fn lookup(&self, name: &str) -> Option<&Alias>;
}

impl Glossary for AliasSet {
    fn lookup(&self, name: &str) -> Option<&Alias> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Location;

    fn alias(name: &str, replacement: &str) -> Alias {
        Alias {
            name: name.to_owned(),
            replacement: replacement.to_owned(),
            global: false,
            origin: Location::unknown(),
        }
    }

    #[test]
    fn insert_and_lookup() {
        let mut set = AliasSet::new();
        set.insert(alias("ll", "ls -l"));
        assert_eq!(set.get("ll").unwrap().replacement, "ls -l");
        assert!(set.get("missing").is_none());
    }

    #[test]
    fn insert_overwrites_existing_definition() {
        let mut set = AliasSet::new();
        set.insert(alias("ll", "ls -l"));
        set.insert(alias("ll", "ls -la"));
        assert_eq!(set.get("ll").unwrap().replacement, "ls -la");
    }

    #[test]
    fn remove_deletes_definition() {
        let mut set = AliasSet::new();
        set.insert(alias("ll", "ls -l"));
        let removed = set.remove("ll").unwrap();
        assert_eq!(removed.replacement, "ls -l");
        assert!(set.get("ll").is_none());
    }

    #[test]
    fn glossary_trait_object_works() {
        let mut set = AliasSet::new();
        set.insert(alias("ll", "ls -l"));
        let glossary: &dyn Glossary = &set;
        assert_eq!(glossary.lookup("ll").unwrap().replacement, "ls -l");
    }
}
