//! Registry of every type declaration discovered in a run.
//!
//! Declarations live in an arena addressed by [`TypeId`]; lookups go through
//! qualified and short-name indexes plus the `use` bindings of the referring
//! module. A catalog is built fresh for each generation run and must be fully
//! populated before any resolution starts.

use std::collections::HashMap;

use crate::source::{ImportDecl, SourceModule, TypeDecl, absolutize, qualify};

/// Stable handle to a declaration in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// Outcome of looking up a type path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(TypeId),
    /// Several declarations share the name; the first by qualified name is used.
    Ambiguous { chosen: TypeId, candidates: Vec<String> },
    NotFound,
}

#[derive(Debug, Default)]
pub struct Catalog {
    decls: Vec<TypeDecl>,
    by_qualified: HashMap<String, TypeId>,
    by_short: HashMap<String, Vec<TypeId>>,
    imports: HashMap<Vec<String>, Vec<ImportDecl>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every type and `use` binding of a parsed module.
    pub fn add_module(&mut self, module: &SourceModule) {
        for decl in &module.types {
            self.insert(decl.clone());
        }
        for (path, import) in &module.imports {
            self.imports
                .entry(path.clone())
                .or_default()
                .push(import.clone());
        }
    }

    /// Insert a declaration. The first declaration of a qualified name wins.
    pub fn insert(&mut self, decl: TypeDecl) -> TypeId {
        let qualified = decl.qualified_name();
        if let Some(existing) = self.by_qualified.get(&qualified) {
            log::debug!("{qualified} declared more than once, keeping the first");
            return *existing;
        }
        let id = TypeId(self.decls.len());
        self.by_short.entry(decl.name.clone()).or_default().push(id);
        self.by_qualified.insert(qualified, id);
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeDecl {
        &self.decls[id.0]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Name used for the declaration in the definitions table.
    ///
    /// The short name when it is unique across the catalog, otherwise the
    /// qualified name with `.` separators.
    pub fn definition_name(&self, id: TypeId) -> String {
        let decl = self.get(id);
        let shared = self
            .by_short
            .get(&decl.name)
            .is_some_and(|ids| ids.len() > 1);
        if shared && !decl.module_path.is_empty() {
            format!("{}.{}", decl.module_path.join("."), decl.name)
        } else {
            decl.name.clone()
        }
    }

    /// Resolve a type path written inside `from_module`.
    pub fn lookup(&self, path: &[String], from_module: &[String]) -> Lookup {
        let Some(first) = path.first() else {
            return Lookup::NotFound;
        };

        let mut candidates: Vec<Vec<String>> = Vec::new();
        let imports = self.imports.get(from_module).map(Vec::as_slice).unwrap_or(&[]);

        // `use` aliases apply to the first segment.
        for import in imports {
            if let ImportDecl::Name { alias, target } = import {
                if alias == first {
                    let mut full = target.clone();
                    full.extend(path[1..].iter().cloned());
                    candidates.push(full);
                }
            }
        }
        candidates.push(absolutize(path, from_module));
        let mut local = from_module.to_vec();
        local.extend(path.iter().cloned());
        candidates.push(local);
        for import in imports {
            if let ImportDecl::Glob { prefix } = import {
                let mut full = prefix.clone();
                full.extend(path.iter().cloned());
                candidates.push(full);
            }
        }

        for candidate in &candidates {
            let Some((name, module)) = candidate.split_last() else {
                continue;
            };
            if let Some(id) = self.by_qualified.get(&qualify(module, name)) {
                return Lookup::Found(*id);
            }
        }

        self.lookup_by_suffix(path)
    }

    fn lookup_by_suffix(&self, path: &[String]) -> Lookup {
        let Some(name) = path.last() else {
            return Lookup::NotFound;
        };
        let suffix = path.join("::");
        let mut matches: Vec<(String, TypeId)> = self
            .by_short
            .get(name)
            .into_iter()
            .flatten()
            .map(|id| (self.get(*id).qualified_name(), *id))
            .filter(|(qualified, _)| {
                path.len() == 1 || *qualified == suffix || qualified.ends_with(&format!("::{suffix}"))
            })
            .collect();
        matches.sort();

        match matches.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(matches[0].1),
            _ => Lookup::Ambiguous {
                chosen: matches[0].1,
                candidates: matches.into_iter().map(|(q, _)| q).collect(),
            },
        }
    }
}
