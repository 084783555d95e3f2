//! Set flattening.
//!
//! `Set(...)` groups and named set references inline at their use site,
//! recursively, preserving left-to-right order — that order is what the
//! scheduler later uses for tie-breaking, so it must survive normalization
//! intact. Set references resolve through the package symbol table to a
//! `static`/`const` whose initializer is itself a provider form.

use tracing::debug;

use super::{DslError, parse, spec::ProviderSpec};
use crate::loader::symbols::SymbolTable;

/// Flattens an injector's provider list into leaves (wrappers intact).
pub fn flatten(
    providers: &[ProviderSpec],
    symbols: &SymbolTable,
) -> Result<Vec<ProviderSpec>, DslError> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    for provider in providers {
        flatten_into(provider, symbols, &mut stack, &mut out)?;
    }
    Ok(out)
}

fn flatten_into(
    provider: &ProviderSpec,
    symbols: &SymbolTable,
    stack: &mut Vec<String>,
    out: &mut Vec<ProviderSpec>,
) -> Result<(), DslError> {
    match provider {
        ProviderSpec::SetInline { items, .. } => {
            for item in items {
                flatten_into(item, symbols, stack, out)?;
            }
            Ok(())
        }
        ProviderSpec::SetRef { name, location } => {
            if stack.iter().any(|seen| seen == name) {
                let mut chain = stack.clone();
                chain.push(name.clone());
                return Err(DslError::SetCycle {
                    location: location.clone(),
                    chain: chain.join(" -> "),
                });
            }
            let decl = symbols
                .constant(name)
                .ok_or_else(|| DslError::UnknownSet {
                    location: location.clone(),
                    name: name.clone(),
                })?;
            let parsed = parse::parse_provider(&decl.init, &decl.location.file)?;
            debug!(set = %name, "inlining set reference");
            stack.push(name.clone());
            let result = flatten_into(&parsed, symbols, stack, out);
            stack.pop();
            result
        }
        leaf => {
            out.push(leaf.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{SourceFile, symbols::SymbolTable};
    use std::path::PathBuf;

    fn symbols_from(source: &str) -> SymbolTable {
        SymbolTable::build(&[SourceFile {
            path: PathBuf::from("pkg/sets.rs"),
            module: "sets".to_string(),
            ast: syn::parse_file(source).unwrap(),
        }])
    }

    fn providers(source: &str, symbols: &SymbolTable) -> Result<Vec<ProviderSpec>, DslError> {
        let file = SourceFile {
            path: PathBuf::from("pkg/wiring.rs"),
            module: "wiring".to_string(),
            ast: syn::parse_file(source).unwrap(),
        };
        let specs = parse::extract_injectors(&file).unwrap();
        flatten(&specs[0].providers, symbols)
    }

    #[test]
    fn nested_sets_flatten_in_order() {
        let symbols = symbols_from(
            r#"
            static INNER: ProviderSet = Set(Provide(b), Provide(c));
            static OUTER: ProviderSet = Set(Provide(a), INNER);
            "#,
        );
        let flat = providers(
            r#"static I: Injector = Inject::<App>("init", OUTER, Provide(d));"#,
            &symbols,
        )
        .unwrap();
        let names: Vec<String> = flat.iter().map(|p| p.describe()).collect();
        assert_eq!(
            names,
            vec!["Provide(a)", "Provide(b)", "Provide(c)", "Provide(d)"]
        );
    }

    #[test]
    fn unknown_set_reference_fails() {
        let symbols = symbols_from("");
        let err = providers(
            r#"static I: Injector = Inject::<App>("init", MISSING);"#,
            &symbols,
        )
        .unwrap_err();
        assert!(matches!(err, DslError::UnknownSet { name, .. } if name == "MISSING"));
    }

    #[test]
    fn set_cycle_is_reported_with_the_chain() {
        let symbols = symbols_from(
            r#"
            static A: ProviderSet = Set(B);
            static B: ProviderSet = Set(A);
            "#,
        );
        let err = providers(r#"static I: Injector = Inject::<App>("init", A);"#, &symbols)
            .unwrap_err();
        match err {
            DslError::SetCycle { chain, .. } => assert_eq!(chain, "A -> B -> A"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
