//! Per-module table of top-level bindings.
//!
//! A [`ScopeTable`] records, for every module-scope binding, where it is
//! declared and every place it is referenced (as byte spans into the module
//! text). Renaming a binding is a table operation: the name changes here and
//! the linker rewrites every recorded site when it renders the module.
//!
//! Only the module scope is tracked binding-by-binding. Names declared in
//! nested scopes and names referenced without any declaration (globals) are
//! kept as plain name sets; deconfliction must not pick those names for a
//! top-level binding that is referenced from this module.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

/// Index of a binding inside one module's [`ScopeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u32);

impl BindingId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One occurrence of a binding's identifier in the module text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub start: u32,
    pub end: u32,
    /// The identifier is an object shorthand (`{ a }`), so a rename must
    /// expand it to `a: renamed` instead of replacing it.
    pub shorthand: bool,
}

impl Site {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            shorthand: false,
        }
    }

    pub fn shorthand(mut self, shorthand: bool) -> Self {
        self.shorthand = shorthand;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Declared by the module itself (`const`, `function`, `class`, ...).
    Declared,
    /// Introduced by an `import` declaration.
    Import,
    /// Created by the bundler (default-export aliases, namespace objects).
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct Binding {
    /// Current name.
    pub name: String,
    /// Name as written in the source (or first synthesized).
    pub original: String,
    pub kind: BindingKind,
    pub declarations: Vec<Site>,
    pub references: Vec<Site>,
}

impl Binding {
    pub fn is_renamed(&self) -> bool {
        self.name != self.original
    }

    /// Every recorded site, declarations first.
    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.declarations.iter().chain(self.references.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    bindings: Vec<Binding>,
    by_name: FxHashMap<String, BindingId>,
    nested_names: FxHashSet<String>,
    globals: FxHashSet<String>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level binding. Returns the existing id if `name` is already
    /// declared (redeclarations share one binding).
    pub fn declare(&mut self, name: &str, kind: BindingKind) -> BindingId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(Binding {
            name: name.to_string(),
            original: name.to_string(),
            kind,
            declarations: Vec::new(),
            references: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Add a bundler-created binding named `base`, or `base$N` when `base`
    /// is already taken by anything visible in this module.
    pub fn declare_synthetic(&mut self, base: &str) -> BindingId {
        let mut name = base.to_string();
        let mut counter = 0;
        while self.is_taken(&name) {
            counter += 1;
            name = format!("{base}${counter}");
        }
        self.declare(&name, BindingKind::Synthetic)
    }

    pub fn add_declaration(&mut self, id: BindingId, site: Site) {
        self.bindings[id.index()].declarations.push(site);
    }

    pub fn add_reference(&mut self, id: BindingId, site: Site) {
        self.bindings[id.index()].references.push(site);
    }

    pub fn add_nested_name(&mut self, name: &str) {
        self.nested_names.insert(name.to_string());
    }

    pub fn add_global(&mut self, name: &str) {
        self.globals.insert(name.to_string());
    }

    pub fn lookup(&self, name: &str) -> Option<BindingId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub fn name(&self, id: BindingId) -> &str {
        &self.bindings[id.index()].name
    }

    /// Rename a binding, keeping the name index in sync.
    pub fn rename(&mut self, id: BindingId, name: impl Into<String>) {
        let name = name.into();
        let binding = &mut self.bindings[id.index()];
        if binding.name == name {
            return;
        }
        tracing::trace!(from = %binding.name, to = %name, "rename binding");
        if self.by_name.get(&binding.name) == Some(&id) {
            self.by_name.remove(&binding.name);
        }
        binding.name = name.clone();
        self.by_name.insert(name, id);
    }

    /// Whether `name` is declared at top level, in a nested scope, or used
    /// as a global in this module.
    pub fn is_taken(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
            || self.nested_names.contains(name)
            || self.globals.contains(name)
    }

    pub fn is_nested_name(&self, name: &str) -> bool {
        self.nested_names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(index, binding)| (BindingId(index as u32), binding))
    }

    pub fn ids(&self) -> impl Iterator<Item = BindingId> + use<> {
        (0..self.bindings.len() as u32).map(BindingId)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn nested_names(&self) -> impl Iterator<Item = &str> {
        self.nested_names.iter().map(String::as_str)
    }

    pub fn globals(&self) -> impl Iterator<Item = &str> {
        self.globals.iter().map(String::as_str)
    }
}
