//! DAG construction and validation for one injector.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use super::{
    GraphError,
    node::{self, NodeId, NodeKind, ProviderNode},
    type_key::{TypeKey, TypeKeys},
};
use crate::{
    dsl::{self, InjectorSpec},
    error::{Error, Location},
    loader::symbols::SymbolTable,
};

/// An injector parameter contributed by a reachable `Arg` node. The name is
/// the raw literal; the emitter makes it a hygienic identifier.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: syn::Type,
    pub key: TypeKey,
    pub node: NodeId,
}

/// The resolved dependency graph of one injector, ready for scheduling.
#[derive(Debug)]
pub struct Graph {
    pub fn_name: String,
    pub module: String,
    pub root_ty: syn::Type,
    pub location: Location,
    pub nodes: Vec<ProviderNode>,
    pub producers: HashMap<TypeKey, NodeId>,
    /// Producer node per input, aligned with each node's `inputs`; filled
    /// for reachable nodes only.
    pub edges: Vec<Vec<NodeId>>,
    pub root: NodeId,
    /// Index into the root node's outputs that carries the root type.
    pub root_output: usize,
    pub reachable: Vec<bool>,
    pub params: Vec<Param>,
    pub returns_error: bool,
    pub needs_cancel: bool,
}

impl Graph {
    pub fn node(&self, id: NodeId) -> &ProviderNode {
        &self.nodes[id]
    }

    pub fn reachable_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|id| self.reachable[*id])
    }
}

/// Builds and validates the graph for one injector.
pub fn build_graph(
    spec: &InjectorSpec,
    symbols: &SymbolTable,
    keys: &mut TypeKeys,
    cancel_types: &[String],
) -> Result<Graph, Error> {
    let flat = dsl::flatten(&spec.providers, symbols)?;
    let nodes = node::build_nodes(&flat, symbols, keys, cancel_types)?;

    let mut producers: HashMap<TypeKey, NodeId> = HashMap::new();
    for provider in &nodes {
        for output in &provider.outputs {
            match producers.entry(output.key.clone()) {
                Entry::Occupied(existing) => {
                    return Err(GraphError::DuplicateProvider {
                        ty: output.key.to_string(),
                        first: nodes[*existing.get()].location.clone(),
                        second: provider.location.clone(),
                    }
                    .into());
                }
                Entry::Vacant(slot) => {
                    slot.insert(provider.id);
                }
            }
        }
    }

    let root_key = keys.key_of(&spec.root_ty, symbols);
    let root = *producers
        .get(&root_key)
        .ok_or_else(|| GraphError::NoRootProvider {
            ty: root_key.to_string(),
            injector: spec.fn_name.clone(),
            location: spec.location.clone(),
        })?;
    let root_output = nodes[root]
        .outputs
        .iter()
        .position(|output| output.key == root_key)
        .unwrap_or(0);

    let mut resolver = Resolver {
        nodes: &nodes,
        producers: &producers,
        edges: vec![Vec::new(); nodes.len()],
        state: vec![Visit::White; nodes.len()],
        stack: Vec::new(),
    };
    resolver.visit(root)?;
    let Resolver { edges, state, .. } = resolver;
    let reachable: Vec<bool> = state.iter().map(|s| *s == Visit::Black).collect();

    for provider in &nodes {
        if reachable[provider.id] {
            continue;
        }
        match &provider.kind {
            NodeKind::Arg { name, .. } => warn!(
                location = %provider.location,
                "argument `{name}` is not reachable from the root; dropping it from the parameter list"
            ),
            NodeKind::InterfaceBind { .. } | NodeKind::StructField { .. } => {}
            _ => warn!(
                location = %provider.location,
                "{} is not reachable from the root and will not be emitted",
                provider.describe()
            ),
        }
    }

    let params: Vec<Param> = nodes
        .iter()
        .filter(|provider| reachable[provider.id])
        .filter_map(|provider| match &provider.kind {
            NodeKind::Arg { name, ty } => Some(Param {
                name: name.clone(),
                ty: ty.clone(),
                key: provider.outputs[0].key.clone(),
                node: provider.id,
            }),
            _ => None,
        })
        .collect();

    let returns_error = nodes
        .iter()
        .any(|p| reachable[p.id] && (p.returns_error || p.is_async));
    let needs_cancel = nodes.iter().any(|p| reachable[p.id] && p.cancel.is_some());

    debug!(
        injector = %spec.fn_name,
        nodes = nodes.len(),
        reachable = reachable.iter().filter(|r| **r).count(),
        returns_error,
        "graph resolved"
    );

    Ok(Graph {
        fn_name: spec.fn_name.clone(),
        module: spec.module.clone(),
        root_ty: spec.root_ty.clone(),
        location: spec.location.clone(),
        nodes,
        producers,
        edges,
        root,
        root_output,
        reachable,
        params,
        returns_error,
        needs_cancel,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    White,
    Gray,
    Black,
}

struct Resolver<'a> {
    nodes: &'a [ProviderNode],
    producers: &'a HashMap<TypeKey, NodeId>,
    edges: Vec<Vec<NodeId>>,
    state: Vec<Visit>,
    stack: Vec<NodeId>,
}

impl Resolver<'_> {
    fn visit(&mut self, id: NodeId) -> Result<(), Error> {
        let nodes = self.nodes;
        self.state[id] = Visit::Gray;
        self.stack.push(id);
        for input in &nodes[id].inputs {
            let producer = *self.producers.get(&input.key).ok_or_else(|| {
                GraphError::MissingProvider {
                    ty: input.key.to_string(),
                    consumer: nodes[id].describe(),
                    location: nodes[id].location.clone(),
                }
            })?;
            self.edges[id].push(producer);
            match self.state[producer] {
                Visit::Gray => {
                    return Err(GraphError::Cycle {
                        chain: self.chain_through(producer),
                        location: self.nodes[producer].location.clone(),
                    }
                    .into());
                }
                Visit::White => self.visit(producer)?,
                Visit::Black => {}
            }
        }
        self.stack.pop();
        self.state[id] = Visit::Black;
        Ok(())
    }

    /// Type chain of the cycle, starting and ending at `offender`.
    fn chain_through(&self, offender: NodeId) -> String {
        let start = self
            .stack
            .iter()
            .position(|id| *id == offender)
            .unwrap_or(0);
        let mut names: Vec<String> = self.stack[start..]
            .iter()
            .map(|id| self.type_name(*id))
            .collect();
        names.push(self.type_name(offender));
        names.join(" -> ")
    }

    fn type_name(&self, id: NodeId) -> String {
        self.nodes[id]
            .primary()
            .map(|output| output.key.to_string())
            .unwrap_or_else(|| self.nodes[id].describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dsl::extract_injectors, loader::SourceFile};
    use std::path::PathBuf;

    fn graph_from(source: &str) -> Graph {
        let file = SourceFile {
            path: PathBuf::from("pkg/app.rs"),
            module: "app".to_string(),
            ast: syn::parse_file(source).unwrap(),
        };
        let symbols = SymbolTable::build(std::slice::from_ref(&file));
        let specs = extract_injectors(&file).unwrap();
        let mut keys = TypeKeys::new();
        build_graph(&specs[0], &symbols, &mut keys, &[]).unwrap()
    }

    #[test]
    fn parameters_follow_flattened_source_order() {
        let graph = graph_from(
            r#"
            pub struct Srv;
            pub fn new_srv(host: String, port: u16) -> Srv { let _ = (host, port); Srv }
            static I: Injector = Inject::<Srv>(
                "init",
                Arg::<u16>("port"),
                Arg::<String>("host"),
                Provide(new_srv),
            );
            "#,
        );
        let names: Vec<&str> = graph.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["port", "host"]);
    }

    #[test]
    fn the_root_may_be_a_secondary_output() {
        let graph = graph_from(
            r#"
            pub struct Tx;
            pub struct Rx;
            pub fn open() -> (Tx, Rx) { (Tx, Rx) }
            static I: Injector = Inject::<Rx>("init", Provide(open));
            "#,
        );
        assert_eq!(graph.root, 0);
        assert_eq!(graph.root_output, 1);
    }

    #[test]
    fn the_error_channel_follows_reachable_fallibility() {
        let infallible = graph_from(
            r#"
            pub struct App;
            pub fn new_app() -> App { App }
            static I: Injector = Inject::<App>("init", Provide(new_app));
            "#,
        );
        assert!(!infallible.returns_error);

        let asynchronous = graph_from(
            r#"
            pub struct App;
            pub async fn new_app() -> App { App }
            static I: Injector = Inject::<App>("init", Provide(new_app));
            "#,
        );
        // Async alone forces the error channel.
        assert!(asynchronous.returns_error);
    }

    #[test]
    fn interface_requests_resolve_to_the_conversion_node() {
        let graph = graph_from(
            r#"
            use std::sync::Arc;
            pub trait Repo {}
            pub struct PgRepo;
            pub struct Svc;
            pub fn new_pg() -> PgRepo { PgRepo }
            pub fn new_svc(repo: Arc<dyn Repo>) -> Svc { let _ = repo; Svc }
            static I: Injector = Inject::<Svc>(
                "init",
                Bind::<Arc<dyn Repo>>(Provide(new_pg)),
                Provide(new_svc),
            );
            "#,
        );
        // Consumer edge points at the synthesized conversion node, which in
        // turn consumes the implementation.
        let svc = graph.root;
        let conversion = graph.edges[svc][0];
        assert!(matches!(
            graph.node(conversion).kind,
            NodeKind::InterfaceBind { .. }
        ));
        assert_eq!(graph.edges[conversion], vec![0]);
    }

    #[test]
    fn edges_follow_input_order() {
        let graph = graph_from(
            r#"
            pub struct A;
            pub struct B;
            pub struct C;
            pub fn new_b() -> B { B }
            pub fn new_c() -> C { C }
            pub fn new_a(b: B, c: C) -> A { let _ = (b, c); A }
            static I: Injector = Inject::<A>(
                "init",
                Provide(new_b),
                Provide(new_c),
                Provide(new_a),
            );
            "#,
        );
        assert_eq!(graph.edges[graph.root], vec![0, 1]);
    }
}
