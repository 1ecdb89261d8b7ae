//! Symbol tables and namespace resolution.
//!
//! Every declared symbol is stored under its *raw* name together with the
//! namespace-mangled *qualified* name it is emitted as. Bare references look
//! the raw name up and are fatal when more than one qualified variant exists.
use std::collections::HashMap;

use crate::types::Type;

/// Join a namespace onto a name, producing the emitted label.
pub fn join_namespace(ns: &str, name: &str) -> String {
    format!("{ns}__{name}")
}

/// The label a definition is emitted under: mangled inside a module,
/// untouched otherwise.
pub fn resolve_definition(current_ns: Option<&str>, name: &str) -> String {
    match current_ns {
        Some(ns) => join_namespace(ns, name),
        None => name.to_owned(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, Vec<String>>,
}

impl SymbolTable {
    /// Register a raw name under a qualified variant. Both translation
    /// passes register data globals, so an identical (raw, qualified) pair
    /// stays a single candidate; only distinct variants count toward
    /// ambiguity.
    pub fn insert(&mut self, raw: &str, qualified: &str) {
        let variants = self.entries.entry(raw.to_owned()).or_default();
        if !variants.iter().any(|q| q == qualified) {
            variants.push(qualified.to_owned());
        }
    }

    /// Look a bare name up. `Err` carries the diagnostic text for an
    /// ambiguous reference; position is attached by the caller.
    pub fn find(&self, raw: &str) -> Result<Option<&str>, String> {
        match self.entries.get(raw) {
            None => Ok(None),
            Some(variants) if variants.len() == 1 => Ok(Some(variants[0].as_str())),
            Some(_) => Err(format!("ambiguous name '{raw}'; use <ns>::<name>")),
        }
    }
}

/// Resolve a reference site to the label it links against.
///
/// Precedence: explicit `NS::name` qualifier, then a unique symbol-table
/// candidate, then the surrounding module, then a sole `#uns` namespace;
/// multiple active `#uns` namespaces are ambiguous, and with none of the
/// above the bare name is used (external linkage).
pub fn resolve_reference(
    table: &SymbolTable,
    current_ns: Option<&str>,
    explicit_ns: Option<&str>,
    using: &[String],
    name: &str,
) -> Result<String, String> {
    if let Some(ns) = explicit_ns {
        return Ok(join_namespace(ns, name));
    }
    if let Some(qualified) = table.find(name)? {
        return Ok(qualified.to_owned());
    }
    if let Some(ns) = current_ns {
        return Ok(join_namespace(ns, name));
    }
    match using {
        [] => Ok(name.to_owned()),
        [ns] => Ok(join_namespace(ns, name)),
        _ => Err(format!(
            "ambiguous namespace reference '{name}'; use <ns>::<name>"
        )),
    }
}

#[derive(Debug, Clone)]
pub struct GlobalVar {
    /// The qualified (emitted) name.
    pub name: String,
    pub ty: Type,
    pub reserve_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct GlobalTable {
    vars: HashMap<String, GlobalVar>,
    pub symbols: SymbolTable,
}

impl GlobalTable {
    pub fn insert(&mut self, raw: &str, qualified: &str, ty: Type, reserve_count: u32) {
        self.vars.insert(
            qualified.to_owned(),
            GlobalVar {
                name: qualified.to_owned(),
                ty,
                reserve_count,
            },
        );
        self.symbols.insert(raw, qualified);
    }

    pub fn get(&self, qualified: &str) -> Option<&GlobalVar> {
        self.vars.get(qualified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> SymbolTable {
        let mut t = SymbolTable::default();
        for (raw, qualified) in pairs {
            t.insert(raw, qualified);
        }
        t
    }

    #[test]
    fn test_explicit_qualifier_wins() {
        let t = table(&[("f", "M1__f"), ("f", "M2__f")]);
        let resolved = resolve_reference(&t, Some("M3"), Some("M1"), &[], "f").unwrap();
        assert_eq!(resolved, "M1__f");
    }

    #[test]
    fn test_unique_candidate_resolves_bare() {
        let t = table(&[("f", "M1__f")]);
        let resolved = resolve_reference(&t, None, None, &[], "f").unwrap();
        assert_eq!(resolved, "M1__f");
    }

    #[test]
    fn test_two_candidates_are_ambiguous() {
        let t = table(&[("f", "M1__f"), ("f", "M2__f")]);
        assert!(resolve_reference(&t, None, None, &[], "f").is_err());
    }

    #[test]
    fn test_duplicate_registration_is_not_ambiguous() {
        let t = table(&[("x", "x"), ("x", "x")]);
        let resolved = resolve_reference(&t, None, None, &[], "x").unwrap();
        assert_eq!(resolved, "x");
    }

    #[test]
    fn test_current_module_fallback() {
        let t = SymbolTable::default();
        let resolved = resolve_reference(&t, Some("M1"), None, &[], "f").unwrap();
        assert_eq!(resolved, "M1__f");
    }

    #[test]
    fn test_single_using_namespace_fallback() {
        let t = SymbolTable::default();
        let using = vec!["M1".to_owned()];
        let resolved = resolve_reference(&t, None, None, &using, "f").unwrap();
        assert_eq!(resolved, "M1__f");
    }

    #[test]
    fn test_multiple_using_namespaces_are_ambiguous() {
        let t = SymbolTable::default();
        let using = vec!["M1".to_owned(), "M2".to_owned()];
        assert!(resolve_reference(&t, None, None, &using, "f").is_err());
    }

    #[test]
    fn test_unqualified_external_linkage() {
        let t = SymbolTable::default();
        let resolved = resolve_reference(&t, None, None, &[], "write").unwrap();
        assert_eq!(resolved, "write");
    }
}
