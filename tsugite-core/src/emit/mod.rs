//! # Emitter
//!
//! Fifth stage of the pipeline: renders a scheduled graph as a Rust
//! function inside a generated sibling module.
//!
//! Emission runs a fixed state machine per injector — `Init →
//! ImportsCollected → ParamsResolved → BodyEmitted → Finalized` — because
//! identifier hygiene depends on the order: import aliases are fixed first,
//! parameter names claim against the aliases, local bindings claim against
//! both. An out-of-order transition is an internal error, never silently
//! reordered.
//!
//! The body follows the schedule: one `let` binding per produced value,
//! `?` on fallible calls, one `tokio::try_join!` per concurrent launch
//! block, explicit conversion bindings for interface binds, field
//! extraction for struct expansion, and a final return of the root value.
//! Ownership is resolved statically: borrowing parameters borrow the
//! binding, by-value parameters move it, and every by-value use except the
//! last clones.

pub mod imports;

use std::collections::{HashMap, HashSet};

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::GeneratorConfig,
    error::Error,
    graph::{Graph, NodeId, NodeKind, ParamMode},
    loader::{SourceFile, symbols::SymbolTable},
    schedule::Schedule,
};
use imports::{ImportSet, NameAllocator, Rewriter, is_keyword, name_for_type, sanitize};

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("emission for `{injector}` ran out of order: expected {expected}, found {found}")]
    OutOfOrder {
        injector: String,
        expected: EmitState,
        found: EmitState,
    },

    #[error("injectors `{first}` and `{second}` both emit as `fn {ident}`")]
    NameCollision {
        first: String,
        second: String,
        ident: String,
    },

    #[error("internal emission error in `{injector}`: {message}")]
    Internal { injector: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum EmitState {
    Init,
    ImportsCollected,
    ParamsResolved,
    BodyEmitted,
    Finalized,
}

/// Renders the generated file for one source file: all of its injectors,
/// their merged imports, and the shared error alias when any injector is
/// fallible.
pub fn render_file(
    source: &SourceFile,
    units: &[(Graph, Schedule)],
    symbols: &SymbolTable,
    config: &GeneratorConfig,
) -> Result<String, Error> {
    let mut import_set = ImportSet::new();
    import_set.reserve("BoxError");

    let mut fn_names: HashMap<String, String> = HashMap::new();
    for (graph, _) in units {
        let ident = sanitize(&graph.fn_name);
        if let Some(first) = fn_names.insert(ident.clone(), graph.fn_name.clone()) {
            return Err(EmitError::NameCollision {
                first,
                second: graph.fn_name.clone(),
                ident,
            }
            .into());
        }
        import_set.reserve(&ident);
    }

    let mut functions = Vec::with_capacity(units.len());
    for (graph, schedule) in units {
        let emitter = InjectorEmitter::new(graph, schedule, symbols, &mut import_set);
        functions.push(emitter.emit()?);
    }

    let needs_box_error = units.iter().any(|(graph, _)| graph.returns_error);
    let mut items: Vec<syn::Item> = import_set.render();
    if needs_box_error {
        items.push(syn::parse_quote! {
            type BoxError = Box<dyn std::error::Error + Send + Sync>;
        });
    }
    items.extend(functions.into_iter().map(syn::Item::Fn));

    let file = syn::File {
        shebang: None,
        attrs: Vec::new(),
        items,
    };
    let body = if config.format_output {
        prettyplease::unparse(&file)
    } else {
        file.to_token_stream().to_string()
    };
    debug!(source = %source.path.display(), injectors = units.len(), "file rendered");
    Ok(format!("{}{}", header(source), body))
}

fn header(source: &SourceFile) -> String {
    let name = source
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<source>");
    format!(
        "// @generated by tsugite {}. DO NOT EDIT.\n// Regenerate with `tsugite generate {}`.\n\n",
        env!("CARGO_PKG_VERSION"),
        name
    )
}

/// How a consumer site takes its dependency once fan-out is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgStrategy {
    Borrow,
    BorrowMut,
    Move,
    CloneMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UseMode {
    Borrow,
    BorrowMut,
    Move,
    Extract,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    /// `None` marks the final return of the root value.
    consumer: Option<NodeId>,
    input_idx: usize,
    producer: NodeId,
    out_idx: usize,
    mode: UseMode,
    stage: usize,
    concurrent: bool,
    seq: usize,
}

struct InjectorEmitter<'a> {
    graph: &'a Graph,
    schedule: &'a Schedule,
    symbols: &'a SymbolTable,
    imports: &'a mut ImportSet,
    state: EmitState,

    // ImportsCollected
    call_paths: HashMap<NodeId, syn::Path>,
    value_parts: HashMap<NodeId, (syn::Expr, syn::Type)>,
    bind_parts: HashMap<NodeId, (syn::Type, Option<syn::Path>)>,
    param_tys: HashMap<NodeId, syn::Type>,
    root_ty: Option<syn::Type>,
    cancel_ty: Option<syn::Type>,

    // ParamsResolved
    names: Option<NameAllocator>,
    params: Vec<(syn::Ident, syn::Type)>,
    cancel_ident: Option<syn::Ident>,
    bindings: HashMap<(NodeId, usize), syn::Ident>,

    // strategy plan
    arg_refs: HashMap<(NodeId, usize), (NodeId, usize, ArgStrategy)>,
    extract_clone: HashMap<NodeId, bool>,
    mut_bindings: HashSet<(NodeId, usize)>,
    used_outputs: HashSet<(NodeId, usize)>,

    // BodyEmitted
    stmts: Vec<TokenStream>,
}

impl<'a> InjectorEmitter<'a> {
    fn new(
        graph: &'a Graph,
        schedule: &'a Schedule,
        symbols: &'a SymbolTable,
        imports: &'a mut ImportSet,
    ) -> Self {
        Self {
            graph,
            schedule,
            symbols,
            imports,
            state: EmitState::Init,
            call_paths: HashMap::new(),
            value_parts: HashMap::new(),
            bind_parts: HashMap::new(),
            param_tys: HashMap::new(),
            root_ty: None,
            cancel_ty: None,
            names: None,
            params: Vec::new(),
            cancel_ident: None,
            bindings: HashMap::new(),
            arg_refs: HashMap::new(),
            extract_clone: HashMap::new(),
            mut_bindings: HashSet::new(),
            used_outputs: HashSet::new(),
            stmts: Vec::new(),
        }
    }

    fn emit(mut self) -> Result<syn::ItemFn, Error> {
        self.collect_imports()?;
        self.resolve_params()?;
        self.emit_body()?;
        self.finalize()
    }

    fn advance(&mut self, from: EmitState, to: EmitState) -> Result<(), Error> {
        if self.state != from {
            return Err(EmitError::OutOfOrder {
                injector: self.graph.fn_name.clone(),
                expected: from,
                found: self.state,
            }
            .into());
        }
        self.state = to;
        Ok(())
    }

    fn internal(&self, message: impl Into<String>) -> Error {
        EmitError::Internal {
            injector: self.graph.fn_name.clone(),
            message: message.into(),
        }
        .into()
    }

    /// Rewrites every type and path that survives into the output,
    /// registering imports as a side effect. Walk order is fixed so alias
    /// assignment is deterministic.
    fn collect_imports(&mut self) -> Result<(), Error> {
        self.advance(EmitState::Init, EmitState::ImportsCollected)?;

        let graph = self.graph;
        let order = self.emission_order();
        let cancel_path = if graph.needs_cancel {
            let path = order
                .iter()
                .find_map(|id| graph.node(*id).cancel.as_ref().map(|c| c.path.clone()))
                .ok_or_else(|| self.internal("cancel handle requested but no provider takes one"))?;
            Some(path)
        } else {
            None
        };

        let mut rewriter = Rewriter {
            symbols: self.symbols,
            imports: &mut *self.imports,
        };

        for param in &graph.params {
            let ty = rewriter.rewrite_type(&param.ty);
            self.param_tys.insert(param.node, ty);
        }
        if let Some(path) = cancel_path {
            let alias = rewriter.imports.import(&path);
            self.cancel_ty = Some(syn::Type::Path(syn::TypePath {
                qself: None,
                path: alias.into(),
            }));
        }
        self.root_ty = Some(rewriter.rewrite_type(&graph.root_ty));

        for id in order {
            let node = graph.node(id);
            match &node.kind {
                NodeKind::Function { path, .. } => {
                    let rewritten = rewriter.rewrite_value_path(path);
                    self.call_paths.insert(id, rewritten);
                }
                NodeKind::Value { expr, ty } => {
                    let expr = rewriter.rewrite_expr(expr);
                    let ty = rewriter.rewrite_type(ty);
                    self.value_parts.insert(id, (expr, ty));
                }
                NodeKind::InterfaceBind { target } => {
                    let wrapper_stem = smart_pointer_stem(target);
                    let rewritten = rewriter.rewrite_type(target);
                    let wrapper = wrapper_stem.and_then(|_| constructor_path(&rewritten));
                    self.bind_parts.insert(id, (rewritten, wrapper));
                }
                NodeKind::Arg { .. } | NodeKind::StructField { .. } => {}
            }
        }
        Ok(())
    }

    fn resolve_params(&mut self) -> Result<(), Error> {
        self.advance(EmitState::ImportsCollected, EmitState::ParamsResolved)?;

        let mut names = NameAllocator::seeded_from(self.imports);
        for param in &self.graph.params {
            let ident = names.claim(&param.name);
            let ty = self
                .param_tys
                .get(&param.node)
                .cloned()
                .ok_or_else(|| self.internal("parameter type missed import collection"))?;
            self.bindings.insert((param.node, 0), ident.clone());
            self.params.push((ident, ty));
        }
        if self.graph.needs_cancel {
            self.cancel_ident = Some(names.claim("cancel"));
        }
        self.names = Some(names);
        Ok(())
    }

    fn emit_body(&mut self) -> Result<(), Error> {
        self.advance(EmitState::ParamsResolved, EmitState::BodyEmitted)?;
        self.plan_ownership()?;

        for (stage_idx, stage) in self.schedule.stages.iter().enumerate() {
            for id in &stage.sync {
                if let Some(stmt) = self.sync_stmt(*id)? {
                    self.stmts.push(stmt);
                }
            }
            match stage.concurrent.len() {
                0 => {}
                1 => {
                    let stmt = self.single_concurrent_stmt(stage.concurrent[0])?;
                    self.stmts.push(stmt);
                }
                _ => {
                    let stmt = self.join_stmt(&stage.concurrent, stage_idx)?;
                    self.stmts.push(stmt);
                }
            }
        }
        Ok(())
    }

    fn finalize(mut self) -> Result<syn::ItemFn, Error> {
        self.advance(EmitState::BodyEmitted, EmitState::Finalized)?;

        let fn_ident = syn::Ident::new(&sanitize(&self.graph.fn_name), proc_macro2::Span::call_site());
        let root_ty = self
            .root_ty
            .clone()
            .ok_or_else(|| self.internal("root type missed import collection"))?;

        let mut params: Vec<TokenStream> = self
            .params
            .iter()
            .map(|(ident, ty)| quote! { #ident: #ty })
            .collect();
        if let (Some(cancel), Some(ty)) = (&self.cancel_ident, &self.cancel_ty) {
            params.push(quote! { #cancel: #ty });
        }

        let ret = if self.graph.returns_error {
            quote! { Result<#root_ty, BoxError> }
        } else {
            quote! { #root_ty }
        };
        let asyncness = if self.has_async() {
            quote! { async }
        } else {
            TokenStream::new()
        };

        let root_binding = self
            .bindings
            .get(&(self.graph.root, self.graph.root_output))
            .cloned()
            .ok_or_else(|| self.internal("root value was never bound"))?;
        let final_expr = if self.graph.returns_error {
            quote! { Ok(#root_binding) }
        } else {
            quote! { #root_binding }
        };

        let stmts = &self.stmts;
        let tokens = quote! {
            pub #asyncness fn #fn_ident(#(#params),*) -> #ret {
                #(#stmts)*
                #final_expr
            }
        };
        let item = syn::parse2::<syn::ItemFn>(tokens.clone()).map_err(|e| {
            self.internal(format!("assembled function does not parse: {e}: {tokens}"))
        })?;
        Ok(item)
    }

    fn has_async(&self) -> bool {
        self.graph
            .reachable_ids()
            .any(|id| self.graph.node(id).is_async)
    }

    /// Reachable node ids in the order their statements appear.
    fn emission_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        for stage in &self.schedule.stages {
            order.extend(stage.sync.iter().copied());
            order.extend(stage.concurrent.iter().copied());
        }
        order
    }

    /// Decides, for every consumption site, whether it borrows, moves or
    /// clones — and which bindings need `mut`.
    fn plan_ownership(&mut self) -> Result<(), Error> {
        let mut events: Vec<Event> = Vec::new();
        let mut seq = 0usize;
        for (stage_idx, stage) in self.schedule.stages.iter().enumerate() {
            let sites = stage
                .sync
                .iter()
                .map(|id| (*id, false))
                .chain(stage.concurrent.iter().map(|id| (*id, true)));
            for (consumer, concurrent) in sites {
                let node = self.graph.node(consumer);
                for (input_idx, input) in node.inputs.iter().enumerate() {
                    let producer = *self
                        .graph
                        .edges
                        .get(consumer)
                        .and_then(|deps| deps.get(input_idx))
                        .ok_or_else(|| self.internal("unresolved edge in a validated graph"))?;
                    let out_idx = self
                        .graph
                        .node(producer)
                        .outputs
                        .iter()
                        .position(|output| output.key == input.key)
                        .ok_or_else(|| self.internal("edge output vanished"))?;
                    let mode = if matches!(node.kind, NodeKind::StructField { .. }) {
                        UseMode::Extract
                    } else {
                        match input.mode {
                            ParamMode::Owned => UseMode::Move,
                            ParamMode::Ref => UseMode::Borrow,
                            ParamMode::RefMut => UseMode::BorrowMut,
                        }
                    };
                    events.push(Event {
                        consumer: Some(consumer),
                        input_idx,
                        producer,
                        out_idx,
                        mode,
                        stage: stage_idx,
                        concurrent,
                        seq,
                    });
                    seq += 1;
                }
            }
        }
        events.push(Event {
            consumer: None,
            input_idx: 0,
            producer: self.graph.root,
            out_idx: self.graph.root_output,
            mode: UseMode::Move,
            stage: self.schedule.stages.len(),
            concurrent: false,
            seq,
        });

        for event in &events {
            self.used_outputs.insert((event.producer, event.out_idx));
        }

        let mut groups: HashMap<(NodeId, usize), Vec<Event>> = HashMap::new();
        for event in events {
            groups.entry((event.producer, event.out_idx)).or_default().push(event);
        }

        for group in groups.values() {
            let extracts_only = group.iter().all(|event| event.mode == UseMode::Extract);
            let last_seq = group.iter().map(|event| event.seq).max().unwrap_or(0);
            for event in group {
                let Some(consumer) = event.consumer else {
                    continue;
                };
                match event.mode {
                    UseMode::Extract => {
                        self.extract_clone.insert(consumer, !extracts_only);
                    }
                    UseMode::Borrow => {
                        self.arg_refs.insert(
                            (consumer, event.input_idx),
                            (event.producer, event.out_idx, ArgStrategy::Borrow),
                        );
                    }
                    UseMode::BorrowMut => {
                        self.mut_bindings.insert((event.producer, event.out_idx));
                        self.arg_refs.insert(
                            (consumer, event.input_idx),
                            (event.producer, event.out_idx, ArgStrategy::BorrowMut),
                        );
                    }
                    UseMode::Move => {
                        let shares_launch = event.concurrent
                            && group.iter().any(|other| {
                                other.seq != event.seq
                                    && other.stage == event.stage
                                    && other.concurrent
                            });
                        let strategy = if event.seq == last_seq && !shares_launch {
                            ArgStrategy::Move
                        } else {
                            ArgStrategy::CloneMove
                        };
                        self.arg_refs.insert(
                            (consumer, event.input_idx),
                            (event.producer, event.out_idx, strategy),
                        );
                    }
                }
            }
        }
        // Struct-field extraction also needs the producer binding.
        let extract_inputs: Vec<(NodeId, NodeId, usize)> = groups
            .iter()
            .flat_map(|(_, group)| group.iter())
            .filter_map(|event| match (event.mode, event.consumer) {
                (UseMode::Extract, Some(consumer)) => {
                    Some((consumer, event.producer, event.out_idx))
                }
                _ => None,
            })
            .collect();
        for (consumer, producer, out_idx) in extract_inputs {
            let clone = *self.extract_clone.get(&consumer).unwrap_or(&true);
            let strategy = if clone {
                ArgStrategy::CloneMove
            } else {
                ArgStrategy::Move
            };
            self.arg_refs
                .insert((consumer, 0), (producer, out_idx, strategy));
        }
        Ok(())
    }

    /// Binding pattern for a node's outputs; allocates names on first use.
    fn output_pattern(&mut self, id: NodeId) -> Result<Option<TokenStream>, Error> {
        let node = self.graph.node(id);
        if node.outputs.is_empty() {
            return Ok(None);
        }
        let names = self
            .names
            .as_mut()
            .ok_or_else(|| EmitError::Internal {
                injector: self.graph.fn_name.clone(),
                message: "name allocator missing".to_string(),
            })?;
        let mut pats = Vec::with_capacity(node.outputs.len());
        for (idx, output) in node.outputs.iter().enumerate() {
            if !self.used_outputs.contains(&(id, idx)) {
                pats.push(quote! { _ });
                continue;
            }
            let preferred = match &node.kind {
                NodeKind::StructField { field, .. } => field.clone(),
                _ => name_for_type(&output.ty),
            };
            let ident = names.claim(&preferred);
            self.bindings.insert((id, idx), ident.clone());
            if self.mut_bindings.contains(&(id, idx)) {
                pats.push(quote! { mut #ident });
            } else {
                pats.push(quote! { #ident });
            }
        }
        if pats.len() == 1 {
            Ok(Some(pats.remove(0)))
        } else {
            Ok(Some(quote! { ( #(#pats),* ) }))
        }
    }

    /// Argument expressions of a function call, cancellation handle first.
    fn arg_exprs(&self, id: NodeId) -> Result<Vec<TokenStream>, Error> {
        let node = self.graph.node(id);
        let mut args = Vec::new();
        if let Some(cancel) = &node.cancel {
            let ident = self
                .cancel_ident
                .as_ref()
                .ok_or_else(|| self.internal("cancellation handle was never named"))?;
            args.push(match cancel.mode {
                ParamMode::Owned => quote! { #ident.clone() },
                ParamMode::Ref => quote! { &#ident },
                ParamMode::RefMut => quote! { &mut #ident },
            });
        }
        for input_idx in 0..node.inputs.len() {
            let (producer, out_idx, strategy) = self
                .arg_refs
                .get(&(id, input_idx))
                .copied()
                .ok_or_else(|| self.internal("consumption site missing from ownership plan"))?;
            let binding = self
                .bindings
                .get(&(producer, out_idx))
                .ok_or_else(|| self.internal("argument consumed before it was bound"))?;
            args.push(match strategy {
                ArgStrategy::Borrow => quote! { &#binding },
                ArgStrategy::BorrowMut => quote! { &mut #binding },
                ArgStrategy::Move => quote! { #binding },
                ArgStrategy::CloneMove => quote! { #binding.clone() },
            });
        }
        Ok(args)
    }

    fn call_expr(&self, id: NodeId) -> Result<TokenStream, Error> {
        let path = self
            .call_paths
            .get(&id)
            .ok_or_else(|| self.internal("call path missed import collection"))?;
        let args = self.arg_exprs(id)?;
        Ok(quote! { #path(#(#args),*) })
    }

    /// Statement for a synchronous node; `Arg` nodes bind nothing.
    fn sync_stmt(&mut self, id: NodeId) -> Result<Option<TokenStream>, Error> {
        let node = self.graph.node(id);
        match node.kind.clone() {
            NodeKind::Arg { .. } => Ok(None),
            NodeKind::Function { is_async_fn, .. } => {
                let call = self.call_expr(id)?;
                let call = if is_async_fn { quote! { #call.await } } else { call };
                let call = if node.returns_error {
                    quote! { #call? }
                } else {
                    call
                };
                match self.output_pattern(id)? {
                    Some(pat) => Ok(Some(quote! { let #pat = #call; })),
                    None => Ok(Some(quote! { #call; })),
                }
            }
            NodeKind::Value { .. } => {
                let (expr, ty) = self
                    .value_parts
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| self.internal("value expression missed import collection"))?;
                let pat = self
                    .output_pattern(id)?
                    .ok_or_else(|| self.internal("value provider without output"))?;
                Ok(Some(quote! { let #pat: #ty = #expr; }))
            }
            NodeKind::InterfaceBind { .. } => {
                let (target, wrapper) = self
                    .bind_parts
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| self.internal("bind target missed import collection"))?;
                let inner = self
                    .arg_exprs(id)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.internal("interface binding without input"))?;
                let expr = match wrapper {
                    Some(constructor) => quote! { #constructor::new(#inner) },
                    None => inner,
                };
                let pat = self
                    .output_pattern(id)?
                    .ok_or_else(|| self.internal("interface binding without output"))?;
                Ok(Some(quote! { let #pat: #target = #expr; }))
            }
            NodeKind::StructField { field, .. } => {
                let (producer, out_idx, strategy) = self
                    .arg_refs
                    .get(&(id, 0))
                    .copied()
                    .ok_or_else(|| self.internal("field extraction missing from ownership plan"))?;
                let owner = self
                    .bindings
                    .get(&(producer, out_idx))
                    .cloned()
                    .ok_or_else(|| self.internal("field extracted before its struct was bound"))?;
                let field_ident = if is_keyword(&field) {
                    syn::Ident::new_raw(&field, proc_macro2::Span::call_site())
                } else {
                    syn::Ident::new(&field, proc_macro2::Span::call_site())
                };
                let expr = match strategy {
                    ArgStrategy::Move => quote! { #owner.#field_ident },
                    _ => quote! { #owner.#field_ident.clone() },
                };
                let pat = self
                    .output_pattern(id)?
                    .ok_or_else(|| self.internal("field extraction without output"))?;
                Ok(Some(quote! { let #pat = #expr; }))
            }
        }
    }

    /// A stage with one concurrent node awaits it directly — no launch
    /// block is needed to run a single task.
    fn single_concurrent_stmt(&mut self, id: NodeId) -> Result<TokenStream, Error> {
        let node = self.graph.node(id);
        let NodeKind::Function { is_async_fn, .. } = &node.kind else {
            return Err(self.internal("non-function node scheduled concurrently"));
        };
        if !*is_async_fn {
            return self
                .sync_stmt(id)?
                .ok_or_else(|| self.internal("concurrent node emitted no statement"));
        }
        let call = self.call_expr(id)?;
        let call = if node.returns_error {
            quote! { #call.await? }
        } else {
            quote! { #call.await }
        };
        match self.output_pattern(id)? {
            Some(pat) => Ok(quote! { let #pat = #call; }),
            None => Ok(quote! { #call; }),
        }
    }

    /// The concurrent launch block of a stage: every task starts together,
    /// the join waits for all of them, the first error short-circuits and
    /// drops the in-flight siblings.
    fn join_stmt(&mut self, ids: &[NodeId], stage: usize) -> Result<TokenStream, Error> {
        let mut pats = Vec::with_capacity(ids.len());
        let mut arms = Vec::with_capacity(ids.len());
        for id in ids {
            let node = self.graph.node(*id);
            let NodeKind::Function { is_async_fn, .. } = &node.kind else {
                return Err(self.internal("non-function node scheduled concurrently"));
            };
            let call = self.call_expr(*id)?;
            let arm = match (*is_async_fn, node.returns_error) {
                (true, true) => quote! { async { #call.await.map_err(BoxError::from) } },
                (true, false) => quote! { async { Ok::<_, BoxError>(#call.await) } },
                (false, true) => quote! { async { #call.map_err(BoxError::from) } },
                (false, false) => quote! { async { Ok::<_, BoxError>(#call) } },
            };
            arms.push(arm);
            let pat = self
                .output_pattern(*id)?
                .ok_or_else(|| self.internal("concurrent provider without output"))?;
            pats.push(pat);
        }
        debug!(
            injector = %self.graph.fn_name,
            stage,
            tasks = ids.len(),
            "emitting concurrent launch block"
        );
        Ok(quote! {
            let (#(#pats),*) = tokio::try_join!(#(#arms),*)?;
        })
    }
}

/// `Arc`/`Rc`/`Box` outer constructor of a bind target, if any.
fn smart_pointer_stem(target: &syn::Type) -> Option<&'static str> {
    let syn::Type::Path(path) = target else {
        return None;
    };
    let segment = path.path.segments.last()?;
    match segment.ident.to_string().as_str() {
        "Arc" => Some("Arc"),
        "Rc" => Some("Rc"),
        "Box" => Some("Box"),
        _ => None,
    }
}

/// The rewritten target's path with generics stripped, usable as a
/// constructor (`Arc::new`, `Box::new`).
fn constructor_path(rewritten: &syn::Type) -> Option<syn::Path> {
    let syn::Type::Path(path) = rewritten else {
        return None;
    };
    let mut path = path.path.clone();
    if let Some(last) = path.segments.last_mut() {
        last.arguments = syn::PathArguments::None;
    }
    Some(path)
}
