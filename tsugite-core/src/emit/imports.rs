//! Import bookkeeping, path rewriting and identifier hygiene.
//!
//! Imports are derived from the expressions that actually survive into the
//! output, never copied from the input file. Package-local items import as
//! `use super::<module>::<Name>;` (the generated file is a sibling module);
//! everything else imports by the full path the package's `use` table
//! resolves it to. Each path is imported exactly once; when two paths want
//! the same final name the later one is renamed `<name>_<n>`.

use std::collections::{BTreeMap, HashSet};

use lazy_static::lazy_static;
use proc_macro2::Span;

use crate::loader::symbols::SymbolTable;

lazy_static! {
    /// Names that resolve without any import in every module.
    static ref PRELUDE: HashSet<&'static str> = [
        "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32",
        "i64", "i128", "isize", "f32", "f64", "String", "Vec", "Option", "Result", "Box", "Some",
        "None", "Ok", "Err",
    ]
    .into_iter()
    .collect();

    static ref KEYWORDS: HashSet<&'static str> = [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "macro", "match",
        "mod", "move", "mut", "pub", "ref", "return", "self", "static", "struct", "super",
        "trait", "true", "try", "type", "union", "unsafe", "use", "where", "while", "yield",
    ]
    .into_iter()
    .collect();
}

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(name)
}

/// The deduplicated `use` list of one generated file.
#[derive(Debug, Default)]
pub struct ImportSet {
    /// full path -> alias it is imported under
    entries: BTreeMap<String, String>,
    taken: HashSet<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a name so no import alias can claim it (e.g. the file-level
    /// error alias).
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Names every emitted local must avoid.
    pub fn taken_names(&self) -> impl Iterator<Item = &str> {
        self.taken.iter().map(String::as_str)
    }

    /// Imports `full_path` (idempotently) and returns the alias to spell it
    /// with.
    pub fn import(&mut self, full_path: &str) -> syn::Ident {
        if let Some(alias) = self.entries.get(full_path) {
            return syn::Ident::new(alias, Span::call_site());
        }
        let preferred = full_path.rsplit("::").next().unwrap_or(full_path);
        let mut alias = preferred.to_string();
        let mut counter = 1;
        while self.taken.contains(&alias) {
            alias = format!("{preferred}_{counter}");
            counter += 1;
        }
        self.taken.insert(alias.clone());
        self.entries.insert(full_path.to_string(), alias.clone());
        syn::Ident::new(&alias, Span::call_site())
    }

    /// Renders the deduplicated, path-sorted `use` items.
    pub fn render(&self) -> Vec<syn::Item> {
        self.entries
            .iter()
            .map(|(path, alias)| {
                let final_segment = path.rsplit("::").next().unwrap_or(path);
                let text = if alias == final_segment {
                    format!("use {path};")
                } else {
                    format!("use {path} as {alias};")
                };
                syn::parse_str::<syn::Item>(&text)
                    .unwrap_or_else(|_| panic!("generated import does not parse: {text}"))
            })
            .collect()
    }
}

/// Hygienic local-name allocation: sanitized, keyword-safe, unique against
/// the import aliases and every previously claimed name.
#[derive(Debug)]
pub struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn seeded_from(imports: &ImportSet) -> Self {
        Self {
            taken: imports.taken_names().map(str::to_string).collect(),
        }
    }

    pub fn claim(&mut self, preferred: &str) -> syn::Ident {
        let base = sanitize(preferred);
        let mut name = base.clone();
        let mut counter = 2;
        while self.taken.contains(&name) {
            name = format!("{base}_{counter}");
            counter += 1;
        }
        self.taken.insert(name.clone());
        syn::Ident::new(&name, Span::call_site())
    }
}

/// Lowercase snake identifier from arbitrary input; keywords get a trailing
/// underscore, empty input falls back to `value`.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let chars: Vec<char> = raw.chars().collect();
    for (index, ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let prev_lower = index > 0 && chars[index - 1].is_ascii_lowercase();
            let next_lower = index + 1 < chars.len() && chars[index + 1].is_ascii_lowercase();
            if (prev_lower || (index > 0 && next_lower)) && !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_ascii_alphanumeric() || *ch == '_' {
            out.push(*ch);
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    let mut name = if trimmed.is_empty() {
        "value".to_string()
    } else {
        trimmed.to_string()
    };
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if is_keyword(&name) {
        name.push('_');
    }
    name
}

/// Preferred local name for a value of the given type.
pub fn name_for_type(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Reference(reference) => name_for_type(&reference.elem),
        syn::Type::Paren(paren) => name_for_type(&paren.elem),
        syn::Type::Group(group) => name_for_type(&group.elem),
        syn::Type::Slice(_) | syn::Type::Array(_) => "items".to_string(),
        syn::Type::Tuple(_) => "pair".to_string(),
        syn::Type::TraitObject(object) => object
            .bounds
            .iter()
            .find_map(|bound| match bound {
                syn::TypeParamBound::Trait(bound) => bound
                    .path
                    .segments
                    .last()
                    .map(|segment| sanitize(&segment.ident.to_string())),
                _ => None,
            })
            .unwrap_or_else(|| "value".to_string()),
        syn::Type::Path(path) => {
            let Some(segment) = path.path.segments.last() else {
                return "value".to_string();
            };
            let ident = segment.ident.to_string();
            // Smart pointers around a trait object name after the trait.
            if matches!(ident.as_str(), "Arc" | "Rc" | "Box") {
                if let syn::PathArguments::AngleBracketed(generics) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner)) = generics.args.first() {
                        return name_for_type(inner);
                    }
                }
            }
            if PRELUDE.contains(ident.as_str()) && ident.chars().next().is_some_and(|c| c.is_lowercase())
            {
                return "value".to_string();
            }
            sanitize(&ident)
        }
        _ => "value".to_string(),
    }
}

/// Rewrites types, paths and value expressions for the generated module:
/// resolvable names are replaced by import aliases, package-local names by
/// `super::<module>` imports.
pub struct Rewriter<'a> {
    pub symbols: &'a SymbolTable,
    pub imports: &'a mut ImportSet,
}

impl Rewriter<'_> {
    pub fn rewrite_type(&mut self, ty: &syn::Type) -> syn::Type {
        match ty {
            syn::Type::Path(path) if path.qself.is_none() => syn::Type::Path(syn::TypePath {
                qself: None,
                path: self.rewrite_type_path(&path.path),
            }),
            syn::Type::Reference(reference) => {
                let mut reference = reference.clone();
                reference.elem = Box::new(self.rewrite_type(&reference.elem));
                syn::Type::Reference(reference)
            }
            syn::Type::Slice(slice) => {
                let mut slice = slice.clone();
                slice.elem = Box::new(self.rewrite_type(&slice.elem));
                syn::Type::Slice(slice)
            }
            syn::Type::Array(array) => {
                let mut array = array.clone();
                array.elem = Box::new(self.rewrite_type(&array.elem));
                syn::Type::Array(array)
            }
            syn::Type::Tuple(tuple) => {
                let mut tuple = tuple.clone();
                tuple.elems = tuple
                    .elems
                    .iter()
                    .map(|elem| self.rewrite_type(elem))
                    .collect();
                syn::Type::Tuple(tuple)
            }
            syn::Type::Ptr(ptr) => {
                let mut ptr = ptr.clone();
                ptr.elem = Box::new(self.rewrite_type(&ptr.elem));
                syn::Type::Ptr(ptr)
            }
            syn::Type::TraitObject(object) => {
                let mut object = object.clone();
                object.bounds = object
                    .bounds
                    .iter()
                    .map(|bound| match bound {
                        syn::TypeParamBound::Trait(trait_bound) => {
                            let mut trait_bound = trait_bound.clone();
                            trait_bound.path = self.rewrite_type_path(&trait_bound.path);
                            syn::TypeParamBound::Trait(trait_bound)
                        }
                        other => other.clone(),
                    })
                    .collect();
                syn::Type::TraitObject(object)
            }
            syn::Type::Paren(paren) => {
                let mut paren = paren.clone();
                paren.elem = Box::new(self.rewrite_type(&paren.elem));
                syn::Type::Paren(paren)
            }
            syn::Type::Group(group) => self.rewrite_type(&group.elem),
            other => other.clone(),
        }
    }

    /// Rewrites a path in type position.
    pub fn rewrite_type_path(&mut self, path: &syn::Path) -> syn::Path {
        let arguments = path
            .segments
            .last()
            .map(|segment| self.rewrite_arguments(&segment.arguments))
            .unwrap_or(syn::PathArguments::None);
        let resolution = self.resolve(path, NameSpace::Type);
        self.finish_path(path, resolution, arguments)
    }

    /// Rewrites a path in value position (call targets, consts).
    pub fn rewrite_value_path(&mut self, path: &syn::Path) -> syn::Path {
        let arguments = path
            .segments
            .last()
            .map(|segment| self.rewrite_arguments(&segment.arguments))
            .unwrap_or(syn::PathArguments::None);
        let resolution = self.resolve(path, NameSpace::Value);
        self.finish_path(path, resolution, arguments)
    }

    /// Rewrites the leading paths of a value expression; literals and
    /// anything exotic pass through as written.
    pub fn rewrite_expr(&mut self, expr: &syn::Expr) -> syn::Expr {
        match expr {
            syn::Expr::Path(path) if path.qself.is_none() => syn::Expr::Path(syn::ExprPath {
                attrs: path.attrs.clone(),
                qself: None,
                path: self.rewrite_value_path(&path.path),
            }),
            syn::Expr::Struct(expr_struct) => {
                let mut expr_struct = expr_struct.clone();
                expr_struct.path = self.rewrite_type_path(&expr_struct.path);
                for field in &mut expr_struct.fields {
                    field.expr = self.rewrite_expr(&field.expr);
                }
                syn::Expr::Struct(expr_struct)
            }
            syn::Expr::Call(call) => {
                let mut call = call.clone();
                call.func = Box::new(self.rewrite_expr(&call.func));
                call.args = call.args.iter().map(|arg| self.rewrite_expr(arg)).collect();
                syn::Expr::Call(call)
            }
            syn::Expr::MethodCall(method) => {
                let mut method = method.clone();
                method.receiver = Box::new(self.rewrite_expr(&method.receiver));
                method.args = method
                    .args
                    .iter()
                    .map(|arg| self.rewrite_expr(arg))
                    .collect();
                syn::Expr::MethodCall(method)
            }
            syn::Expr::Reference(reference) => {
                let mut reference = reference.clone();
                reference.expr = Box::new(self.rewrite_expr(&reference.expr));
                syn::Expr::Reference(reference)
            }
            syn::Expr::Paren(paren) => {
                let mut paren = paren.clone();
                paren.expr = Box::new(self.rewrite_expr(&paren.expr));
                syn::Expr::Paren(paren)
            }
            syn::Expr::Field(field) => {
                let mut field = field.clone();
                field.base = Box::new(self.rewrite_expr(&field.base));
                syn::Expr::Field(field)
            }
            other => other.clone(),
        }
    }

    fn resolve(&mut self, path: &syn::Path, namespace: NameSpace) -> Resolution {
        let segments: Vec<String> = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        let Some(first) = segments.first() else {
            return Resolution::Keep;
        };
        if matches!(first.as_str(), "crate" | "self" | "super") {
            return Resolution::Keep;
        }
        if segments.len() == 1 {
            let name = first.as_str();
            if PRELUDE.contains(name) {
                return Resolution::Keep;
            }
            if let Some(full) = self.symbols.use_path(name) {
                return Resolution::Import(full.to_string());
            }
            let local_module = match namespace {
                NameSpace::Type => self.symbols.type_decl(name).map(|decl| decl.module.clone()),
                NameSpace::Value => self
                    .symbols
                    .function(name)
                    .map(|sig| sig.module.clone())
                    .or_else(|| self.symbols.constant(name).map(|decl| decl.module.clone())),
            };
            if let Some(module) = local_module {
                return Resolution::Import(format!("super::{module}::{name}"));
            }
            return Resolution::Keep;
        }
        // Multi-segment: splice the first segment through the use table when
        // it names an imported module, otherwise take the path as already
        // absolute.
        let full = match self.symbols.use_path(first) {
            Some(base) => {
                let mut pieces = vec![base.to_string()];
                pieces.extend(segments[1..].iter().cloned());
                pieces.join("::")
            }
            None => segments.join("::"),
        };
        Resolution::Import(full)
    }

    fn finish_path(
        &mut self,
        original: &syn::Path,
        resolution: Resolution,
        arguments: syn::PathArguments,
    ) -> syn::Path {
        match resolution {
            Resolution::Keep => {
                let mut path = original.clone();
                if let Some(last) = path.segments.last_mut() {
                    last.arguments = arguments;
                }
                path
            }
            Resolution::Import(full) => {
                let alias = self.imports.import(&full);
                let mut segment = syn::PathSegment::from(alias);
                segment.arguments = arguments;
                syn::Path {
                    leading_colon: None,
                    segments: std::iter::once(segment).collect(),
                }
            }
        }
    }

    fn rewrite_arguments(&mut self, arguments: &syn::PathArguments) -> syn::PathArguments {
        match arguments {
            syn::PathArguments::AngleBracketed(generics) => {
                let mut generics = generics.clone();
                generics.args = generics
                    .args
                    .iter()
                    .map(|arg| match arg {
                        syn::GenericArgument::Type(ty) => {
                            syn::GenericArgument::Type(self.rewrite_type(ty))
                        }
                        other => other.clone(),
                    })
                    .collect();
                syn::PathArguments::AngleBracketed(generics)
            }
            other => other.clone(),
        }
    }
}

enum NameSpace {
    Type,
    Value,
}

enum Resolution {
    Keep,
    Import(String),
}
