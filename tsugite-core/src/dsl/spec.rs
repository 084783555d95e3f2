//! Parsed shapes of the DSL, prior to graph construction.

use crate::error::Location;

/// One `Inject::<T>("name", providers…)` declaration.
#[derive(Debug, Clone)]
pub struct InjectorSpec {
    /// Function name the injector is emitted under (the name literal).
    pub fn_name: String,
    /// Type the injector produces, as written in the turbofish.
    pub root_ty: syn::Type,
    /// Provider list in source order, sets not yet flattened.
    pub providers: Vec<ProviderSpec>,
    pub location: Location,
    /// Module (file stem) the declaration lives in.
    pub module: String,
}

/// One provider position inside an injector or set.
///
/// Wrappers (`Bind`/`As`/`AsMap`/`Async`) keep their inner provider boxed;
/// the graph stage unwraps them onto the innermost leaf. `Set` forms
/// disappear during normalization.
#[derive(Debug, Clone)]
pub enum ProviderSpec {
    /// `Provide(path)` — a function provider.
    Provide { path: syn::Path, location: Location },
    /// `Value(expr)` / `Value::<T>(expr)` — a constant-expression provider.
    Value {
        expr: syn::Expr,
        explicit_ty: Option<syn::Type>,
        location: Location,
    },
    /// `Arg::<T>("name")` — a runtime parameter of the injector.
    Arg {
        name: String,
        ty: syn::Type,
        location: Location,
    },
    /// `Bind::<I>(inner)` / `As::<I>(inner)` / `AsMap::<I, C>(inner)`.
    Bind {
        target: syn::Type,
        concrete: Option<syn::Type>,
        inner: Box<ProviderSpec>,
        location: Location,
    },
    /// `Async(inner)` — the innermost function provider runs concurrently.
    Async {
        inner: Box<ProviderSpec>,
        location: Location,
    },
    /// `Struct::<T>()` — expands the `pub` fields of `T`.
    StructExpand { ty: syn::Type, location: Location },
    /// `Set(providers…)` written inline.
    SetInline {
        items: Vec<ProviderSpec>,
        location: Location,
    },
    /// A bare path naming a set variable.
    SetRef { name: String, location: Location },
}

impl ProviderSpec {
    pub fn location(&self) -> &Location {
        match self {
            Self::Provide { location, .. }
            | Self::Value { location, .. }
            | Self::Arg { location, .. }
            | Self::Bind { location, .. }
            | Self::Async { location, .. }
            | Self::StructExpand { location, .. }
            | Self::SetInline { location, .. }
            | Self::SetRef { location, .. } => location,
        }
    }

    /// Short description used by diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Provide { path, .. } => {
                let name = path
                    .segments
                    .last()
                    .map(|s| s.ident.to_string())
                    .unwrap_or_default();
                format!("Provide({name})")
            }
            Self::Value { .. } => "Value(…)".to_string(),
            Self::Arg { name, .. } => format!("Arg({name:?})"),
            Self::Bind { inner, .. } => format!("Bind({})", inner.describe()),
            Self::Async { inner, .. } => format!("Async({})", inner.describe()),
            Self::StructExpand { .. } => "Struct(…)".to_string(),
            Self::SetInline { .. } => "Set(…)".to_string(),
            Self::SetRef { name, .. } => name.clone(),
        }
    }
}
