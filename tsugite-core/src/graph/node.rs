//! Provider nodes and their construction from flattened specs.
//!
//! Construction is where declared signatures get interpreted: a trailing
//! `Result` is the fail channel, a tuple payload is a multi-valued
//! producer, a trailing closure-shaped tuple element is a cleanup slot
//! (recognized, never emitted), and a leading cancellation-handle parameter
//! is threaded rather than resolved. Interface bindings and struct fields
//! synthesize additional nodes so that scheduling and emission treat them
//! like any other producer.

use tracing::warn;

use super::type_key::{TypeKey, TypeKeys};
use crate::{
    dsl::{DslError, ProviderSpec},
    error::{Error, Location},
    loader::symbols::SymbolTable,
};

pub type NodeId = usize;

/// How a consumer takes a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    Owned,
    Ref,
    RefMut,
}

#[derive(Debug, Clone)]
pub struct Dependency {
    pub key: TypeKey,
    pub mode: ParamMode,
}

#[derive(Debug, Clone)]
pub struct Output {
    pub key: TypeKey,
    pub ty: syn::Type,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A function provider; `module` is where the function is declared and
    /// `is_async_fn` whether the declaration itself is `async` (a sync
    /// function can still be async-marked for staging).
    Function {
        path: syn::Path,
        name: String,
        module: String,
        is_async_fn: bool,
    },
    /// A constant-expression provider.
    Value { expr: syn::Expr, ty: syn::Type },
    /// A runtime parameter of the injector.
    Arg { name: String, ty: syn::Type },
    /// One expanded `pub` field of a struct provider.
    StructField {
        owner: syn::Type,
        field: String,
        field_ty: syn::Type,
    },
    /// Synthesized conversion node: exposes an implementation under an
    /// interface type.
    InterfaceBind { target: syn::Type },
}

/// A leading cancellation-handle parameter: threaded from the injector,
/// never resolved through the graph.
#[derive(Debug, Clone)]
pub struct CancelParam {
    pub mode: ParamMode,
    /// Configured full path of the handle type, used for the injector's
    /// own parameter.
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ProviderNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub outputs: Vec<Output>,
    pub inputs: Vec<Dependency>,
    pub returns_error: bool,
    pub is_async: bool,
    /// Interface keys this node additionally produces (each one also has a
    /// synthesized `InterfaceBind` node owning the conversion).
    pub bound_interfaces: Vec<TypeKey>,
    pub has_cleanup: bool,
    pub cancel: Option<CancelParam>,
    pub location: Location,
}

impl ProviderNode {
    /// Primary output, when the node has one.
    pub fn primary(&self) -> Option<&Output> {
        self.outputs.first()
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            NodeKind::Function { name, .. } => format!("provider `{name}`"),
            NodeKind::Value { .. } => "value provider".to_string(),
            NodeKind::Arg { name, .. } => format!("argument `{name}`"),
            NodeKind::StructField { field, .. } => format!("expanded field `{field}`"),
            NodeKind::InterfaceBind { .. } => "interface binding".to_string(),
        }
    }
}

/// Builds the node list for one injector from its flattened provider list.
///
/// Node ids follow the flattened source order; synthesized nodes (struct
/// fields, interface bindings) are numbered immediately after the provider
/// they derive from, which keeps every later tie-break source-ordered.
pub fn build_nodes(
    flat: &[ProviderSpec],
    symbols: &SymbolTable,
    keys: &mut TypeKeys,
    cancel_types: &[String],
) -> Result<Vec<ProviderNode>, Error> {
    let mut nodes: Vec<ProviderNode> = Vec::new();
    // target key -> implementation key, for duplicate-binding detection
    let mut bound_targets: Vec<(TypeKey, TypeKey)> = Vec::new();

    for spec in flat {
        let unwrapped = unwrap_spec(spec)?;
        match unwrapped.leaf {
            ProviderSpec::Provide { path, location } => {
                let id = nodes.len();
                let node = function_node(
                    id,
                    path,
                    location,
                    unwrapped.is_async,
                    symbols,
                    keys,
                    cancel_types,
                )?;
                push_with_bindings(node, &unwrapped.binds, &mut nodes, &mut bound_targets, keys, symbols)?;
            }
            ProviderSpec::Value {
                expr,
                explicit_ty,
                location,
            } => {
                if unwrapped.is_async {
                    return Err(DslError::AsyncOnNonFunction {
                        location: unwrapped.async_location.clone().unwrap_or(location.clone()),
                    }
                    .into());
                }
                let ty = value_type(expr, explicit_ty.as_ref(), location, symbols)?;
                let id = nodes.len();
                let node = ProviderNode {
                    id,
                    kind: NodeKind::Value {
                        expr: expr.clone(),
                        ty: ty.clone(),
                    },
                    outputs: vec![Output {
                        key: keys.key_of(&ty, symbols),
                        ty,
                    }],
                    inputs: Vec::new(),
                    returns_error: false,
                    is_async: false,
                    bound_interfaces: Vec::new(),
                    has_cleanup: false,
                    cancel: None,
                    location: location.clone(),
                };
                push_with_bindings(node, &unwrapped.binds, &mut nodes, &mut bound_targets, keys, symbols)?;
            }
            ProviderSpec::Arg { name, ty, location } => {
                if unwrapped.is_async {
                    return Err(DslError::AsyncOnNonFunction {
                        location: unwrapped.async_location.clone().unwrap_or(location.clone()),
                    }
                    .into());
                }
                if let Some((target, _)) = unwrapped.binds.first() {
                    return Err(DslError::BadBind {
                        location: location.clone(),
                        message: format!(
                            "`Bind` cannot wrap an argument placeholder (binding `{}`)",
                            quote::ToTokens::to_token_stream(target)
                        ),
                    }
                    .into());
                }
                let id = nodes.len();
                nodes.push(ProviderNode {
                    id,
                    kind: NodeKind::Arg {
                        name: name.clone(),
                        ty: ty.clone(),
                    },
                    outputs: vec![Output {
                        key: keys.key_of(ty, symbols),
                        ty: ty.clone(),
                    }],
                    inputs: Vec::new(),
                    returns_error: false,
                    is_async: false,
                    bound_interfaces: Vec::new(),
                    has_cleanup: false,
                    cancel: None,
                    location: location.clone(),
                });
            }
            ProviderSpec::StructExpand { ty, location } => {
                if unwrapped.is_async {
                    return Err(DslError::AsyncOnNonFunction {
                        location: unwrapped.async_location.clone().unwrap_or(location.clone()),
                    }
                    .into());
                }
                if !unwrapped.binds.is_empty() {
                    return Err(DslError::BadBind {
                        location: location.clone(),
                        message: "`Bind` cannot wrap a struct expansion".to_string(),
                    }
                    .into());
                }
                expand_struct(ty, location, symbols, keys, &mut nodes)?;
            }
            // Sets were flattened away before node construction.
            other => {
                return Err(DslError::UnrecognizedMarker {
                    location: other.location().clone(),
                    found: other.describe(),
                }
                .into());
            }
        }
    }
    Ok(nodes)
}

struct Unwrapped<'a> {
    leaf: &'a ProviderSpec,
    /// Bind targets, outermost first, with their locations.
    binds: Vec<(syn::Type, BindInfo)>,
    is_async: bool,
    async_location: Option<Location>,
}

struct BindInfo {
    concrete: Option<syn::Type>,
    location: Location,
}

fn unwrap_spec(spec: &ProviderSpec) -> Result<Unwrapped<'_>, Error> {
    let mut binds = Vec::new();
    let mut is_async = false;
    let mut async_location = None;
    let mut current = spec;
    loop {
        match current {
            ProviderSpec::Bind {
                target,
                concrete,
                inner,
                location,
            } => {
                binds.push((
                    target.clone(),
                    BindInfo {
                        concrete: concrete.clone(),
                        location: location.clone(),
                    },
                ));
                current = inner;
            }
            ProviderSpec::Async { inner, location } => {
                is_async = true;
                async_location.get_or_insert_with(|| location.clone());
                current = inner;
            }
            leaf => {
                return Ok(Unwrapped {
                    leaf,
                    binds,
                    is_async,
                    async_location,
                });
            }
        }
    }
}

fn function_node(
    id: NodeId,
    path: &syn::Path,
    location: &Location,
    async_marked: bool,
    symbols: &SymbolTable,
    keys: &mut TypeKeys,
    cancel_types: &[String],
) -> Result<ProviderNode, Error> {
    let name = path
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
        .unwrap_or_default();
    let sig = symbols
        .function(&name)
        .ok_or_else(|| DslError::UnknownProvider {
            location: location.clone(),
            name: name.clone(),
        })?;

    let mut inputs = Vec::new();
    let mut cancel = None;
    for (index, input) in sig.inputs.iter().enumerate() {
        if index == 0 {
            if let Some(cancel_path) = match_cancel_type(input, cancel_types) {
                let (mode, _) = split_reference(input);
                cancel = Some(CancelParam {
                    mode,
                    path: cancel_path,
                });
                continue;
            }
        }
        let (mode, inner) = split_reference(input);
        inputs.push(Dependency {
            key: keys.key_of(inner, symbols),
            mode,
        });
    }

    let (outputs, returns_error, has_cleanup) = interpret_output(&sig.output, symbols, keys);
    if has_cleanup {
        warn!(
            provider = %name,
            "cleanup-function return recognized but cleanup emission is not supported; the slot is ignored"
        );
    }

    Ok(ProviderNode {
        id,
        kind: NodeKind::Function {
            path: path.clone(),
            name,
            module: sig.module.clone(),
            is_async_fn: sig.is_async,
        },
        outputs,
        inputs,
        returns_error,
        is_async: sig.is_async || async_marked,
        bound_interfaces: Vec::new(),
        has_cleanup,
        cancel,
        location: location.clone(),
    })
}

/// Splits an owned/borrowed parameter into its mode and value type.
fn split_reference(ty: &syn::Type) -> (ParamMode, &syn::Type) {
    match ty {
        syn::Type::Reference(reference) => {
            let mode = if reference.mutability.is_some() {
                ParamMode::RefMut
            } else {
                ParamMode::Ref
            };
            (mode, &reference.elem)
        }
        other => (ParamMode::Owned, other),
    }
}

/// Interprets a declared return type: `(outputs, returns_error, has_cleanup)`.
fn interpret_output(
    output: &syn::ReturnType,
    symbols: &SymbolTable,
    keys: &mut TypeKeys,
) -> (Vec<Output>, bool, bool) {
    let ty = match output {
        syn::ReturnType::Default => return (Vec::new(), false, false),
        syn::ReturnType::Type(_, ty) => ty.as_ref(),
    };
    let (payload, returns_error) = match result_payload(ty) {
        Some(payload) => (payload, true),
        None => (ty, false),
    };
    let mut elements: Vec<&syn::Type> = match payload {
        syn::Type::Tuple(tuple) if !tuple.elems.is_empty() => tuple.elems.iter().collect(),
        syn::Type::Tuple(_) => Vec::new(),
        single => vec![single],
    };
    let mut has_cleanup = false;
    if elements.len() > 1 && is_cleanup_shape(elements[elements.len() - 1]) {
        elements.pop();
        has_cleanup = true;
    }
    let outputs = elements
        .into_iter()
        .map(|element| Output {
            key: keys.key_of(element, symbols),
            ty: element.clone(),
        })
        .collect();
    (outputs, returns_error, has_cleanup)
}

/// `Result<T, E>` / `Result<T>` payload, matched on the final path segment.
fn result_payload(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(generics) = &segment.arguments else {
        return None;
    };
    generics.args.iter().find_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// A trailing tuple element shaped like a deferred-cleanup closure.
fn is_cleanup_shape(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::BareFn(_) => true,
        syn::Type::Path(path) => {
            let Some(segment) = path.path.segments.last() else {
                return false;
            };
            if segment.ident != "Box" {
                return false;
            }
            let syn::PathArguments::AngleBracketed(generics) = &segment.arguments else {
                return false;
            };
            generics.args.iter().any(|arg| match arg {
                syn::GenericArgument::Type(syn::Type::TraitObject(object)) => {
                    object.bounds.iter().any(|bound| match bound {
                        syn::TypeParamBound::Trait(bound) => bound
                            .path
                            .segments
                            .last()
                            .map(|s| {
                                s.ident == "FnOnce" || s.ident == "FnMut" || s.ident == "Fn"
                            })
                            .unwrap_or(false),
                        _ => false,
                    })
                }
                _ => false,
            })
        }
        _ => false,
    }
}

/// The configured handle path a leading parameter matches, if any.
/// Matching is by final path segment so both bare and qualified spellings
/// of the handle type are recognized.
fn match_cancel_type(ty: &syn::Type, cancel_types: &[String]) -> Option<String> {
    let (_, inner) = split_reference(ty);
    let syn::Type::Path(path) = inner else {
        return None;
    };
    let last = path.path.segments.last()?;
    cancel_types
        .iter()
        .find(|full| {
            full.rsplit("::")
                .next()
                .map(|stem| last.ident == stem)
                .unwrap_or(false)
        })
        .cloned()
}

fn value_type(
    expr: &syn::Expr,
    explicit: Option<&syn::Type>,
    location: &Location,
    symbols: &SymbolTable,
) -> Result<syn::Type, Error> {
    if let Some(ty) = explicit {
        return Ok(ty.clone());
    }
    match expr {
        syn::Expr::Path(path) => {
            let name = path
                .path
                .segments
                .last()
                .map(|segment| segment.ident.to_string())
                .unwrap_or_default();
            match symbols.constant(&name) {
                Some(decl) => Ok(decl.ty.clone()),
                None => Err(DslError::UnresolvedValueType {
                    location: location.clone(),
                }
                .into()),
            }
        }
        syn::Expr::Struct(expr_struct) => Ok(syn::Type::Path(syn::TypePath {
            qself: None,
            path: expr_struct.path.clone(),
        })),
        syn::Expr::Lit(lit) => literal_type(&lit.lit).ok_or_else(|| {
            DslError::UnresolvedValueType {
                location: location.clone(),
            }
            .into()
        }),
        _ => Err(DslError::UnresolvedValueType {
            location: location.clone(),
        }
        .into()),
    }
}

fn literal_type(lit: &syn::Lit) -> Option<syn::Type> {
    let ty: syn::Type = match lit {
        syn::Lit::Str(_) => syn::parse_quote!(&'static str),
        syn::Lit::ByteStr(_) => syn::parse_quote!(&'static [u8]),
        syn::Lit::Int(int) => match int.suffix() {
            "" => syn::parse_quote!(i32),
            suffix => syn::parse_str(suffix).ok()?,
        },
        syn::Lit::Float(float) => match float.suffix() {
            "" => syn::parse_quote!(f64),
            suffix => syn::parse_str(suffix).ok()?,
        },
        syn::Lit::Bool(_) => syn::parse_quote!(bool),
        syn::Lit::Char(_) => syn::parse_quote!(char),
        syn::Lit::Byte(_) => syn::parse_quote!(u8),
        _ => return None,
    };
    Some(ty)
}

fn expand_struct(
    ty: &syn::Type,
    location: &Location,
    symbols: &SymbolTable,
    keys: &mut TypeKeys,
    nodes: &mut Vec<ProviderNode>,
) -> Result<(), Error> {
    let name = match ty {
        syn::Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    let decl = symbols
        .type_decl(&name)
        .ok_or_else(|| DslError::UnknownStruct {
            location: location.clone(),
            name: name.clone(),
        })?;
    let fields = decl.fields.as_ref().ok_or_else(|| DslError::NotExpandable {
        location: location.clone(),
        name: name.clone(),
    })?;

    let owner_key = keys.key_of(ty, symbols);
    for field in fields {
        if !field.is_public {
            continue;
        }
        let id = nodes.len();
        nodes.push(ProviderNode {
            id,
            kind: NodeKind::StructField {
                owner: ty.clone(),
                field: field.name.clone(),
                field_ty: field.ty.clone(),
            },
            outputs: vec![Output {
                key: keys.key_of(&field.ty, symbols),
                ty: field.ty.clone(),
            }],
            inputs: vec![Dependency {
                key: owner_key.clone(),
                mode: ParamMode::Owned,
            }],
            returns_error: false,
            is_async: false,
            bound_interfaces: Vec::new(),
            has_cleanup: false,
            cancel: None,
            location: location.clone(),
        });
    }
    Ok(())
}

/// Appends a node, then one synthesized `InterfaceBind` node per bind
/// target. A repeated binding of the same interface to the same
/// implementation is kept once with a warning; conflicting implementations
/// are left for the producers table to reject.
fn push_with_bindings(
    mut node: ProviderNode,
    binds: &[(syn::Type, BindInfo)],
    nodes: &mut Vec<ProviderNode>,
    bound_targets: &mut Vec<(TypeKey, TypeKey)>,
    keys: &mut TypeKeys,
    symbols: &SymbolTable,
) -> Result<(), Error> {
    let Some(primary) = node.primary().cloned() else {
        if let Some((_, info)) = binds.first() {
            return Err(DslError::BadBind {
                location: info.location.clone(),
                message: "the wrapped provider produces nothing to bind".to_string(),
            }
            .into());
        }
        nodes.push(node);
        return Ok(());
    };

    let mut synthesized = Vec::new();
    for (target, info) in binds {
        if matches!(target, syn::Type::TraitObject(_)) {
            return Err(DslError::BadBind {
                location: info.location.clone(),
                message: "bind target must be sized; use `Arc<dyn …>` or `Box<dyn …>`".to_string(),
            }
            .into());
        }
        if let Some(concrete) = &info.concrete {
            let concrete_key = keys.key_of(concrete, symbols);
            if concrete_key != primary.key {
                return Err(DslError::BadBind {
                    location: info.location.clone(),
                    message: format!(
                        "mapping declares implementation `{concrete_key}` but the provider yields `{}`",
                        primary.key
                    ),
                }
                .into());
            }
        }
        let target_key = keys.key_of(target, symbols);
        let duplicate = bound_targets
            .iter()
            .any(|(bound, implementation)| *bound == target_key && *implementation == primary.key);
        if duplicate {
            warn!(
                interface = %target_key,
                implementation = %primary.key,
                "interface bound twice to the same implementation, keeping the first binding"
            );
            continue;
        }
        bound_targets.push((target_key.clone(), primary.key.clone()));
        node.bound_interfaces.push(target_key.clone());
        synthesized.push((target.clone(), target_key, info.location.clone()));
    }

    let implementation_key = primary.key.clone();
    nodes.push(node);
    for (target, target_key, location) in synthesized {
        let id = nodes.len();
        nodes.push(ProviderNode {
            id,
            kind: NodeKind::InterfaceBind {
                target: target.clone(),
            },
            outputs: vec![Output {
                key: target_key,
                ty: target,
            }],
            inputs: vec![Dependency {
                key: implementation_key.clone(),
                mode: ParamMode::Owned,
            }],
            returns_error: false,
            is_async: false,
            bound_interfaces: Vec::new(),
            has_cleanup: false,
            cancel: None,
            location,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dsl, loader::SourceFile};
    use std::path::PathBuf;

    fn nodes_from(source: &str) -> Vec<ProviderNode> {
        let file = SourceFile {
            path: PathBuf::from("pkg/app.rs"),
            module: "app".to_string(),
            ast: syn::parse_file(source).unwrap(),
        };
        let symbols = SymbolTable::build(std::slice::from_ref(&file));
        let specs = dsl::extract_injectors(&file).unwrap();
        let flat = dsl::flatten(&specs[0].providers, &symbols).unwrap();
        let mut keys = TypeKeys::new();
        let cancel_types = vec!["tokio_util::sync::CancellationToken".to_string()];
        build_nodes(&flat, &symbols, &mut keys, &cancel_types).unwrap()
    }

    #[test]
    fn result_returns_mark_the_fail_channel() {
        let nodes = nodes_from(
            r#"
            pub struct Db;
            pub fn new_db() -> Result<Db, std::io::Error> { Ok(Db) }
            static I: Injector = Inject::<Db>("init", Provide(new_db));
            "#,
        );
        assert!(nodes[0].returns_error);
        assert_eq!(nodes[0].outputs.len(), 1);
        assert_eq!(nodes[0].outputs[0].key.as_str(), "Db");
    }

    #[test]
    fn tuple_payloads_are_multi_valued_producers() {
        let nodes = nodes_from(
            r#"
            pub struct Tx;
            pub struct Rx;
            pub fn open() -> (Tx, Rx) { (Tx, Rx) }
            static I: Injector = Inject::<Tx>("init", Provide(open));
            "#,
        );
        let keys: Vec<&str> = nodes[0].outputs.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["Tx", "Rx"]);
        assert!(!nodes[0].returns_error);
    }

    #[test]
    fn trailing_closure_shapes_are_cleanup_slots() {
        let nodes = nodes_from(
            r#"
            pub struct Db;
            pub fn new_db() -> Result<(Db, Box<dyn FnOnce()>), std::io::Error> { unreachable!() }
            static I: Injector = Inject::<Db>("init", Provide(new_db));
            "#,
        );
        assert!(nodes[0].has_cleanup);
        let keys: Vec<&str> = nodes[0].outputs.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["Db"]);
    }

    #[test]
    fn a_leading_cancellation_handle_is_threaded_not_resolved() {
        let nodes = nodes_from(
            r#"
            use tokio_util::sync::CancellationToken;
            pub struct Db;
            pub async fn new_db(cancel: CancellationToken, dsn: String) -> Db { let _ = (cancel, dsn); Db }
            static I: Injector = Inject::<Db>("init", Arg::<String>("dsn"), Provide(new_db));
            "#,
        );
        let db = &nodes[1];
        assert!(db.cancel.is_some());
        assert!(db.is_async);
        // Only the real dependency remains an input.
        assert_eq!(db.inputs.len(), 1);
        assert_eq!(db.inputs[0].key.as_str(), "String");
    }

    #[test]
    fn async_functions_are_async_without_the_marker() {
        let nodes = nodes_from(
            r#"
            pub struct Db;
            pub async fn new_db() -> Db { Db }
            static I: Injector = Inject::<Db>("init", Provide(new_db));
            "#,
        );
        assert!(nodes[0].is_async);
        match &nodes[0].kind {
            NodeKind::Function { is_async_fn, .. } => assert!(*is_async_fn),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn bindings_synthesize_a_conversion_node() {
        let nodes = nodes_from(
            r#"
            use std::sync::Arc;
            pub trait Repo {}
            pub struct PgRepo;
            pub fn new_pg() -> PgRepo { PgRepo }
            static I: Injector = Inject::<PgRepo>("init", Bind::<Arc<dyn Repo>>(Provide(new_pg)));
            "#,
        );
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].bound_interfaces.len(), 1);
        assert!(matches!(nodes[1].kind, NodeKind::InterfaceBind { .. }));
        assert_eq!(nodes[1].inputs[0].key.as_str(), "PgRepo");
        assert_eq!(nodes[1].outputs[0].key.as_str(), "std::sync::Arc<dyn Repo>");
    }

    #[test]
    fn literal_values_type_from_their_suffix() {
        let nodes = nodes_from(
            r#"
            pub struct S;
            pub fn new_s(n: u64) -> S { let _ = n; S }
            static I: Injector = Inject::<S>("init", Value(8u64), Provide(new_s));
            "#,
        );
        assert_eq!(nodes[0].outputs[0].key.as_str(), "u64");
    }

    #[test]
    fn private_fields_are_not_expanded() {
        let nodes = nodes_from(
            r#"
            pub struct Opts { pub host: String, secret: u64 }
            pub fn load() -> Opts { unreachable!() }
            static I: Injector = Inject::<String>("init", Provide(load), Struct::<Opts>());
            "#,
        );
        let fields: Vec<&ProviderNode> = nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::StructField { .. }))
            .collect();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].outputs[0].key.as_str(), "String");
    }
}
