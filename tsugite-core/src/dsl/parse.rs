//! Marker-call recognition over the syntax tree.

use std::collections::HashSet;

use quote::ToTokens;
use syn::spanned::Spanned;

use super::{DslError, Marker, spec::{InjectorSpec, ProviderSpec}};
use crate::{error::Location, loader::SourceFile};

/// Scans a file's top-level items for `Inject` declarations.
///
/// Only `static`/`const` initializers are inspected; anything else in the
/// file is the user's business. Two injectors with the same name literal in
/// one file would collide in the generated output and are rejected here.
pub fn extract_injectors(file: &SourceFile) -> Result<Vec<InjectorSpec>, DslError> {
    let file_name = file.path.display().to_string();
    let mut specs: Vec<InjectorSpec> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for item in &file.ast.items {
        let init: &syn::Expr = match item {
            syn::Item::Static(item) => &item.expr,
            syn::Item::Const(item) => &item.expr,
            _ => continue,
        };
        let syn::Expr::Call(call) = init else {
            continue;
        };
        let Some((marker, type_args)) = callee_marker(&call.func) else {
            continue;
        };
        if marker != Marker::Inject {
            continue;
        }

        let location = Location::new(file_name.clone(), call.span());
        let spec = parse_inject(call, type_args, location, &file_name, &file.module)?;
        if !seen.insert(spec.fn_name.clone()) {
            return Err(DslError::DuplicateInjector {
                location: spec.location,
                name: spec.fn_name,
            });
        }
        specs.push(spec);
    }
    Ok(specs)
}

fn parse_inject(
    call: &syn::ExprCall,
    type_args: Vec<syn::Type>,
    location: Location,
    file_name: &str,
    module: &str,
) -> Result<InjectorSpec, DslError> {
    let mut type_args = type_args;
    let root_ty = match type_args.len() {
        1 => type_args.remove(0),
        _ => {
            return Err(DslError::MissingTypeArgument {
                location,
                marker: Marker::Inject,
            });
        }
    };

    let mut args = call.args.iter();
    let name_arg = args.next().ok_or_else(|| DslError::BadArity {
        location: location.clone(),
        marker: Marker::Inject,
        expected: "a name literal followed by providers".to_string(),
    })?;
    let fn_name = str_literal(name_arg).ok_or_else(|| DslError::BadName {
        location: Location::new(file_name.to_string(), name_arg.span()),
        marker: Marker::Inject,
    })?;

    let providers = args
        .map(|expr| parse_provider(expr, file_name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InjectorSpec {
        fn_name,
        root_ty,
        providers,
        location,
        module: module.to_string(),
    })
}

/// Parses one provider position. Strict: anything that is not a recognized
/// marker call or a bare set-variable path is a hard error.
pub fn parse_provider(expr: &syn::Expr, file_name: &str) -> Result<ProviderSpec, DslError> {
    let location = Location::new(file_name.to_string(), expr.span());
    match expr {
        syn::Expr::Call(call) => {
            let Some((marker, mut type_args)) = callee_marker(&call.func) else {
                return Err(DslError::UnrecognizedMarker {
                    location,
                    found: call.func.to_token_stream().to_string(),
                });
            };
            let args: Vec<&syn::Expr> = call.args.iter().collect();
            match marker {
                Marker::Inject => Err(DslError::NestedInject { location }),
                Marker::Provide => {
                    if args.len() != 1 {
                        return Err(bad_arity(location, marker, "exactly one function path"));
                    }
                    let syn::Expr::Path(path) = args[0] else {
                        return Err(bad_arity(location, marker, "a function path"));
                    };
                    Ok(ProviderSpec::Provide {
                        path: path.path.clone(),
                        location,
                    })
                }
                Marker::Value => {
                    if args.len() != 1 {
                        return Err(bad_arity(location, marker, "exactly one expression"));
                    }
                    let explicit_ty = if type_args.is_empty() {
                        None
                    } else {
                        Some(type_args.remove(0))
                    };
                    Ok(ProviderSpec::Value {
                        expr: args[0].clone(),
                        explicit_ty,
                        location,
                    })
                }
                Marker::Arg => {
                    let ty = take_type(&mut type_args, &location, marker)?;
                    if args.len() != 1 {
                        return Err(bad_arity(location, marker, "exactly one name literal"));
                    }
                    let name = str_literal(args[0]).ok_or_else(|| DslError::BadName {
                        location: location.clone(),
                        marker,
                    })?;
                    Ok(ProviderSpec::Arg { name, ty, location })
                }
                Marker::Bind | Marker::As => {
                    let target = take_type(&mut type_args, &location, marker)?;
                    if args.len() != 1 {
                        return Err(bad_arity(location, marker, "exactly one inner provider"));
                    }
                    let inner = parse_provider(args[0], file_name)?;
                    Ok(ProviderSpec::Bind {
                        target,
                        concrete: None,
                        inner: Box::new(inner),
                        location,
                    })
                }
                Marker::AsMap => {
                    let target = take_type(&mut type_args, &location, marker)?;
                    let concrete = take_type(&mut type_args, &location, marker)?;
                    if args.len() != 1 {
                        return Err(bad_arity(location, marker, "exactly one inner provider"));
                    }
                    let inner = parse_provider(args[0], file_name)?;
                    Ok(ProviderSpec::Bind {
                        target,
                        concrete: Some(concrete),
                        inner: Box::new(inner),
                        location,
                    })
                }
                Marker::Async => {
                    if args.len() != 1 {
                        return Err(bad_arity(location, marker, "exactly one inner provider"));
                    }
                    let inner = parse_provider(args[0], file_name)?;
                    Ok(ProviderSpec::Async {
                        inner: Box::new(inner),
                        location,
                    })
                }
                Marker::Struct => {
                    let ty = take_type(&mut type_args, &location, marker)?;
                    if !args.is_empty() {
                        return Err(bad_arity(location, marker, "no arguments"));
                    }
                    Ok(ProviderSpec::StructExpand { ty, location })
                }
                Marker::Set => {
                    let items = args
                        .into_iter()
                        .map(|arg| parse_provider(arg, file_name))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(ProviderSpec::SetInline { items, location })
                }
            }
        }
        syn::Expr::Path(path) => {
            let name = path
                .path
                .segments
                .last()
                .map(|segment| segment.ident.to_string())
                .unwrap_or_default();
            Ok(ProviderSpec::SetRef { name, location })
        }
        other => Err(DslError::UnrecognizedMarker {
            location,
            found: other.to_token_stream().to_string(),
        }),
    }
}

/// Resolves the callee of a call expression to a marker plus its turbofish
/// type arguments. `None` when the callee is not a path or not a marker.
fn callee_marker(func: &syn::Expr) -> Option<(Marker, Vec<syn::Type>)> {
    let syn::Expr::Path(expr_path) = func else {
        return None;
    };
    let segment = expr_path.path.segments.last()?;
    let marker = Marker::recognize(&segment.ident.to_string())?;
    let type_args = match &segment.arguments {
        syn::PathArguments::AngleBracketed(generics) => generics
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Some((marker, type_args))
}

fn take_type(
    type_args: &mut Vec<syn::Type>,
    location: &Location,
    marker: Marker,
) -> Result<syn::Type, DslError> {
    if type_args.is_empty() {
        return Err(DslError::MissingTypeArgument {
            location: location.clone(),
            marker,
        });
    }
    Ok(type_args.remove(0))
}

fn bad_arity(location: Location, marker: Marker, expected: &str) -> DslError {
    DslError::BadArity {
        location,
        marker,
        expected: expected.to_string(),
    }
}

fn str_literal(expr: &syn::Expr) -> Option<String> {
    if let syn::Expr::Lit(lit) = expr {
        if let syn::Lit::Str(s) = &lit.lit {
            return Some(s.value());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file_from(source: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("pkg/wiring.rs"),
            module: "wiring".to_string(),
            ast: syn::parse_file(source).unwrap(),
        }
    }

    #[test]
    fn recognizes_an_injector_declaration() {
        let file = file_from(
            r#"
            #[cfg(tsugite)]
            static INIT: Injector = Inject::<App>(
                "init_app",
                Provide(new_db),
                Async(Provide(new_cache)),
                Bind::<Arc<dyn Repo>>(Provide(new_pg_repo)),
                Arg::<u16>("port"),
                Value::<u32>(3),
                Struct::<Opts>(),
                STORAGE,
                Set(Provide(new_a)),
            );
            "#,
        );
        let specs = extract_injectors(&file).unwrap();
        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.fn_name, "init_app");
        assert_eq!(spec.providers.len(), 8);
        assert!(matches!(spec.providers[0], ProviderSpec::Provide { .. }));
        assert!(matches!(spec.providers[1], ProviderSpec::Async { .. }));
        assert!(matches!(spec.providers[2], ProviderSpec::Bind { .. }));
        assert!(matches!(spec.providers[3], ProviderSpec::Arg { .. }));
        assert!(matches!(spec.providers[4], ProviderSpec::Value { .. }));
        assert!(matches!(spec.providers[5], ProviderSpec::StructExpand { .. }));
        assert!(matches!(spec.providers[6], ProviderSpec::SetRef { .. }));
        assert!(matches!(spec.providers[7], ProviderSpec::SetInline { .. }));
    }

    #[test]
    fn unrecognized_call_is_a_hard_error() {
        let file = file_from(
            r#"
            static INIT: Injector = Inject::<App>("init", Frovide(new_db));
            "#,
        );
        let err = extract_injectors(&file).unwrap_err();
        match err {
            DslError::UnrecognizedMarker { found, location } => {
                assert_eq!(found, "Frovide");
                assert_eq!(location.line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn injector_name_must_be_a_literal() {
        let file = file_from("static I: Injector = Inject::<App>(NAME, Provide(f));");
        assert!(matches!(
            extract_injectors(&file),
            Err(DslError::BadName { .. })
        ));
    }

    #[test]
    fn duplicate_injector_names_are_rejected() {
        let file = file_from(
            r#"
            static A: Injector = Inject::<App>("init", Provide(f));
            static B: Injector = Inject::<Db>("init", Provide(g));
            "#,
        );
        assert!(matches!(
            extract_injectors(&file),
            Err(DslError::DuplicateInjector { .. })
        ));
    }

    #[test]
    fn non_injector_items_are_ignored() {
        let file = file_from(
            r#"
            pub fn ordinary() {}
            static LIMIT: usize = 10;
            "#,
        );
        assert!(extract_injectors(&file).unwrap().is_empty());
    }
}
