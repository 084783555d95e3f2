//! Canonical type identity.
//!
//! A [`TypeKey`] is the canonical printed form of a type: imported names
//! expanded through the package `use` table, lifetimes erased, structural
//! forms printed recursively. Byte equality of keys is type identity for
//! the whole generator — consumers and producers match on nothing else.
//!
//! Keys are built lazily and cached per injector pipeline; the cache key is
//! the raw token text, so repeated spellings of the same type resolve once.

use std::collections::HashMap;

use quote::ToTokens;

use crate::loader::symbols::SymbolTable;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lazy, caching `TypeKey` factory.
#[derive(Debug, Default)]
pub struct TypeKeys {
    cache: HashMap<String, TypeKey>,
}

impl TypeKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_of(&mut self, ty: &syn::Type, symbols: &SymbolTable) -> TypeKey {
        let raw = ty.to_token_stream().to_string();
        if let Some(key) = self.cache.get(&raw) {
            return key.clone();
        }
        let key = TypeKey(canonical(ty, symbols));
        self.cache.insert(raw, key.clone());
        key
    }
}

fn canonical(ty: &syn::Type, symbols: &SymbolTable) -> String {
    match ty {
        syn::Type::Path(path) => {
            if path.qself.is_some() {
                return flat_tokens(ty);
            }
            canonical_path(&path.path, symbols)
        }
        syn::Type::Reference(reference) => {
            let mutability = if reference.mutability.is_some() {
                "mut "
            } else {
                ""
            };
            format!("&{}{}", mutability, canonical(&reference.elem, symbols))
        }
        syn::Type::Slice(slice) => format!("[{}]", canonical(&slice.elem, symbols)),
        syn::Type::Array(array) => format!(
            "[{}; {}]",
            canonical(&array.elem, symbols),
            flat_tokens(&array.len)
        ),
        syn::Type::Tuple(tuple) => {
            let elems: Vec<String> = tuple
                .elems
                .iter()
                .map(|elem| canonical(elem, symbols))
                .collect();
            if elems.len() == 1 {
                format!("({},)", elems[0])
            } else {
                format!("({})", elems.join(", "))
            }
        }
        syn::Type::Ptr(ptr) => {
            let qualifier = if ptr.mutability.is_some() {
                "*mut "
            } else {
                "*const "
            };
            format!("{}{}", qualifier, canonical(&ptr.elem, symbols))
        }
        syn::Type::TraitObject(object) => {
            let bounds: Vec<String> = object
                .bounds
                .iter()
                .filter_map(|bound| match bound {
                    syn::TypeParamBound::Trait(bound) => {
                        Some(canonical_path(&bound.path, symbols))
                    }
                    _ => None,
                })
                .collect();
            format!("dyn {}", bounds.join(" + "))
        }
        syn::Type::BareFn(bare_fn) => {
            let inputs: Vec<String> = bare_fn
                .inputs
                .iter()
                .map(|input| canonical(&input.ty, symbols))
                .collect();
            let output = match &bare_fn.output {
                syn::ReturnType::Default => String::new(),
                syn::ReturnType::Type(_, ty) => format!(" -> {}", canonical(ty, symbols)),
            };
            format!("fn({}){}", inputs.join(", "), output)
        }
        syn::Type::Paren(paren) => canonical(&paren.elem, symbols),
        syn::Type::Group(group) => canonical(&group.elem, symbols),
        other => flat_tokens(other),
    }
}

fn canonical_path(path: &syn::Path, symbols: &SymbolTable) -> String {
    let mut pieces: Vec<String> = Vec::with_capacity(path.segments.len());
    for (index, segment) in path.segments.iter().enumerate() {
        let ident = segment.ident.to_string();
        let base = if index == 0 {
            // The leading segment is the only one the `use` table can
            // rename; the rest are already absolute relative to it.
            symbols.use_path(&ident).map(str::to_string).unwrap_or(ident)
        } else {
            ident
        };
        pieces.push(format!("{}{}", base, canonical_arguments(segment, symbols)));
    }
    pieces.join("::")
}

fn canonical_arguments(segment: &syn::PathSegment, symbols: &SymbolTable) -> String {
    match &segment.arguments {
        syn::PathArguments::None => String::new(),
        syn::PathArguments::AngleBracketed(generics) => {
            let args: Vec<String> = generics
                .args
                .iter()
                .filter_map(|arg| match arg {
                    syn::GenericArgument::Type(ty) => Some(canonical(ty, symbols)),
                    syn::GenericArgument::AssocType(assoc) => Some(format!(
                        "{} = {}",
                        assoc.ident,
                        canonical(&assoc.ty, symbols)
                    )),
                    syn::GenericArgument::Const(expr) => Some(flat_tokens(expr)),
                    // Lifetimes never participate in identity.
                    _ => None,
                })
                .collect();
            if args.is_empty() {
                String::new()
            } else {
                format!("<{}>", args.join(", "))
            }
        }
        syn::PathArguments::Parenthesized(parenthesized) => {
            let inputs: Vec<String> = parenthesized
                .inputs
                .iter()
                .map(|ty| canonical(ty, symbols))
                .collect();
            let output = match &parenthesized.output {
                syn::ReturnType::Default => String::new(),
                syn::ReturnType::Type(_, ty) => format!(" -> {}", canonical(ty, symbols)),
            };
            format!("({}){}", inputs.join(", "), output)
        }
    }
}

fn flat_tokens(tokens: &impl ToTokens) -> String {
    tokens.to_token_stream().to_string().replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SourceFile;
    use std::path::PathBuf;

    fn symbols() -> SymbolTable {
        SymbolTable::build(&[SourceFile {
            path: PathBuf::from("pkg/types.rs"),
            module: "types".to_string(),
            ast: syn::parse_file(
                r#"
                use std::sync::Arc;
                use std::io;
                pub struct Db;
                pub trait Repo {}
                "#,
            )
            .unwrap(),
        }])
    }

    fn key(source: &str) -> TypeKey {
        let ty: syn::Type = syn::parse_str(source).unwrap();
        TypeKeys::new().key_of(&ty, &symbols())
    }

    #[test]
    fn imported_names_expand_to_full_paths() {
        assert_eq!(key("Arc<Db>").as_str(), "std::sync::Arc<Db>");
        assert_eq!(key("io::Error").as_str(), "std::io::Error");
    }

    #[test]
    fn local_and_unknown_names_stay_bare() {
        assert_eq!(key("Db").as_str(), "Db");
        assert_eq!(key("u16").as_str(), "u16");
    }

    #[test]
    fn lifetimes_are_erased() {
        assert_eq!(key("&'static str").as_str(), "&str");
        assert_eq!(key("&'a mut Db").as_str(), "&mut Db");
    }

    #[test]
    fn spelling_variants_collapse() {
        assert_eq!(key("Arc<dyn Repo>"), key("std::sync::Arc<dyn Repo>"));
        assert_eq!(key("(Db , u8)"), key("(Db, u8)"));
    }

    #[test]
    fn structural_forms_are_recursive() {
        assert_eq!(key("Vec<Arc<Db>>").as_str(), "Vec<std::sync::Arc<Db>>");
        assert_eq!(key("[Db; 4]").as_str(), "[Db; 4]");
        assert_eq!(key("(Db,)").as_str(), "(Db,)");
        assert_eq!(key("fn(Db) -> u8").as_str(), "fn(Db) -> u8");
    }
}
