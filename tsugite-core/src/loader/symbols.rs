//! Package-wide symbol table.
//!
//! Built once per package from the parsed files; lookups are by bare name
//! because a package shares one namespace for resolution purposes. When two
//! files declare the same name the later (lexicographic) file wins and the
//! collision is logged — the generator only ever resolves names the DSL
//! actually references.

use std::collections::HashMap;

use tracing::debug;

use super::SourceFile;
use crate::error::Location;

/// Declared signature of a free function.
#[derive(Debug, Clone)]
pub struct FnSig {
    pub name: String,
    pub module: String,
    pub location: Location,
    pub is_async: bool,
    pub inputs: Vec<syn::Type>,
    pub output: syn::ReturnType,
}

/// A `const` or `static` item with its initializer.
#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: String,
    pub module: String,
    pub location: Location,
    pub ty: syn::Type,
    pub init: syn::Expr,
}

/// Any type-introducing item: struct, enum, trait, union or type alias.
/// `fields` is populated for named-field structs only.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub module: String,
    pub location: Location,
    pub fields: Option<Vec<FieldDecl>>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: syn::Type,
    pub is_public: bool,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    fns: HashMap<String, FnSig>,
    consts: HashMap<String, ConstDecl>,
    types: HashMap<String, TypeDecl>,
    uses: HashMap<String, String>,
}

impl SymbolTable {
    pub fn build(files: &[SourceFile]) -> Self {
        let mut table = Self::default();
        for file in files {
            table.scan(file);
        }
        table
    }

    pub fn function(&self, name: &str) -> Option<&FnSig> {
        self.fns.get(name)
    }

    pub fn constant(&self, name: &str) -> Option<&ConstDecl> {
        self.consts.get(name)
    }

    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    /// Full path a bare name was imported under, if any.
    pub fn use_path(&self, name: &str) -> Option<&str> {
        self.uses.get(name).map(String::as_str)
    }

    pub fn fn_count(&self) -> usize {
        self.fns.len()
    }

    fn scan(&mut self, file: &SourceFile) {
        let file_name = file.path.display().to_string();
        for item in &file.ast.items {
            match item {
                syn::Item::Fn(item_fn) => {
                    let sig = &item_fn.sig;
                    let inputs = sig
                        .inputs
                        .iter()
                        .filter_map(|arg| match arg {
                            syn::FnArg::Typed(pat) => Some((*pat.ty).clone()),
                            syn::FnArg::Receiver(_) => None,
                        })
                        .collect();
                    self.insert_fn(FnSig {
                        name: sig.ident.to_string(),
                        module: file.module.clone(),
                        location: Location::new(file_name.clone(), sig.ident.span()),
                        is_async: sig.asyncness.is_some(),
                        inputs,
                        output: sig.output.clone(),
                    });
                }
                syn::Item::Static(item) => {
                    self.insert_const(ConstDecl {
                        name: item.ident.to_string(),
                        module: file.module.clone(),
                        location: Location::new(file_name.clone(), item.ident.span()),
                        ty: (*item.ty).clone(),
                        init: (*item.expr).clone(),
                    });
                }
                syn::Item::Const(item) => {
                    self.insert_const(ConstDecl {
                        name: item.ident.to_string(),
                        module: file.module.clone(),
                        location: Location::new(file_name.clone(), item.ident.span()),
                        ty: (*item.ty).clone(),
                        init: (*item.expr).clone(),
                    });
                }
                syn::Item::Struct(item) => {
                    let fields = match &item.fields {
                        syn::Fields::Named(named) => Some(
                            named
                                .named
                                .iter()
                                .map(|field| FieldDecl {
                                    name: field
                                        .ident
                                        .as_ref()
                                        .map(ToString::to_string)
                                        .unwrap_or_default(),
                                    ty: field.ty.clone(),
                                    is_public: is_exported(&field.vis),
                                })
                                .collect(),
                        ),
                        _ => None,
                    };
                    self.insert_type(TypeDecl {
                        name: item.ident.to_string(),
                        module: file.module.clone(),
                        location: Location::new(file_name.clone(), item.ident.span()),
                        fields,
                    });
                }
                syn::Item::Enum(item) => self.insert_type(TypeDecl {
                    name: item.ident.to_string(),
                    module: file.module.clone(),
                    location: Location::new(file_name.clone(), item.ident.span()),
                    fields: None,
                }),
                syn::Item::Trait(item) => self.insert_type(TypeDecl {
                    name: item.ident.to_string(),
                    module: file.module.clone(),
                    location: Location::new(file_name.clone(), item.ident.span()),
                    fields: None,
                }),
                syn::Item::Type(item) => self.insert_type(TypeDecl {
                    name: item.ident.to_string(),
                    module: file.module.clone(),
                    location: Location::new(file_name.clone(), item.ident.span()),
                    fields: None,
                }),
                syn::Item::Union(item) => self.insert_type(TypeDecl {
                    name: item.ident.to_string(),
                    module: file.module.clone(),
                    location: Location::new(file_name.clone(), item.ident.span()),
                    fields: None,
                }),
                syn::Item::Use(item) => {
                    let mut prefix = Vec::new();
                    collect_use_tree(&item.tree, &mut prefix, &mut self.uses);
                }
                _ => {}
            }
        }
    }

    fn insert_fn(&mut self, sig: FnSig) {
        if let Some(previous) = self.fns.insert(sig.name.clone(), sig) {
            debug!(name = %previous.name, "function redeclared in package, keeping the later file");
        }
    }

    fn insert_const(&mut self, decl: ConstDecl) {
        if let Some(previous) = self.consts.insert(decl.name.clone(), decl) {
            debug!(name = %previous.name, "const redeclared in package, keeping the later file");
        }
    }

    fn insert_type(&mut self, decl: TypeDecl) {
        if let Some(previous) = self.types.insert(decl.name.clone(), decl) {
            debug!(name = %previous.name, "type redeclared in package, keeping the later file");
        }
    }
}

fn is_exported(vis: &syn::Visibility) -> bool {
    matches!(vis, syn::Visibility::Public(_) | syn::Visibility::Restricted(_))
}

fn collect_use_tree(
    tree: &syn::UseTree,
    prefix: &mut Vec<String>,
    out: &mut HashMap<String, String>,
) {
    match tree {
        syn::UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use_tree(&path.tree, prefix, out);
            prefix.pop();
        }
        syn::UseTree::Name(name) => {
            let ident = name.ident.to_string();
            if ident == "self" {
                if let Some(last) = prefix.last() {
                    out.insert(last.clone(), prefix.join("::"));
                }
            } else {
                let mut path = prefix.clone();
                path.push(ident.clone());
                out.insert(ident, path.join("::"));
            }
        }
        syn::UseTree::Rename(rename) => {
            let mut path = prefix.clone();
            path.push(rename.ident.to_string());
            out.insert(rename.rename.to_string(), path.join("::"));
        }
        // Globs cannot feed name resolution; they are simply skipped.
        syn::UseTree::Glob(_) => {}
        syn::UseTree::Group(group) => {
            for item in &group.items {
                collect_use_tree(item, prefix, out);
            }
        }
    }
}
