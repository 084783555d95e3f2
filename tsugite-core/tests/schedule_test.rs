use std::fs;
use std::path::PathBuf;

use tsugite_core::{
    GeneratorConfig,
    dsl::extract_injectors,
    graph::{Graph, build_graph, type_key::TypeKeys},
    loader::load_package,
    schedule::{Schedule, schedule},
};

/// Builds the graph and schedule of the first injector found in `source`.
fn plan(source: &str) -> (Graph, Schedule) {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("app.rs");
    fs::write(&path, source).unwrap();

    let config = GeneratorConfig::default();
    let package = load_package(dir.path(), &config.gen_suffix).unwrap();
    let source_file = package.file(&path).unwrap();
    let specs = extract_injectors(source_file).unwrap();
    let mut keys = TypeKeys::new();
    let graph = build_graph(&specs[0], &package.symbols, &mut keys, &config.cancel_types).unwrap();
    let planned = schedule(&graph);
    (graph, planned)
}

#[test]
fn it_linearizes_synchronous_graphs_into_one_stage() {
    let (graph, planned) = plan(
        r#"
        pub struct A;
        pub struct B;
        pub fn new_b() -> B { B }
        pub fn new_a(b: B) -> A { let _ = b; A }
        static INIT: Injector = Inject::<A>("init", Provide(new_a), Provide(new_b));
        "#,
    );
    assert_eq!(planned.stages.len(), 1);
    let stage = &planned.stages[0];
    assert!(stage.concurrent.is_empty());
    // Producer before consumer, root last.
    let b_position = stage.sync.iter().position(|id| *id == 1).unwrap();
    let a_position = stage.sync.iter().position(|id| *id == graph.root).unwrap();
    assert!(b_position < a_position);
}

#[test]
fn it_stages_an_async_chain_one_barrier_per_link() {
    let (graph, planned) = plan(
        r#"
        pub struct Config;
        pub struct Db;
        pub struct Cache;
        pub struct App;
        pub async fn new_config() -> Config { Config }
        pub async fn new_db(config: Config) -> Db { let _ = config; Db }
        pub async fn new_cache(db: Db) -> Cache { let _ = db; Cache }
        pub fn new_app(cache: Cache) -> App { let _ = cache; App }
        static INIT: Injector = Inject::<App>(
            "init",
            Async(Provide(new_config)),
            Async(Provide(new_db)),
            Async(Provide(new_cache)),
            Provide(new_app),
        );
        "#,
    );
    // Config, Db, Cache each get their own stage; the root closes the
    // schedule on its own.
    assert_eq!(planned.stages.len(), 4);
    for stage in &planned.stages[..3] {
        assert_eq!(stage.concurrent.len(), 1);
        assert!(stage.sync.is_empty());
    }
    assert_eq!(planned.stages[3].sync, vec![graph.root]);
}

#[test]
fn it_places_every_async_node_after_all_of_its_inputs() {
    let (graph, planned) = plan(
        r#"
        pub struct Config;
        pub struct Db;
        pub struct Cache;
        pub struct App;
        pub fn new_config() -> Config { Config }
        pub async fn new_db(config: Config) -> Db { let _ = config; Db }
        pub async fn new_cache(config: Config) -> Cache { let _ = config; Cache }
        pub fn new_app(db: Db, cache: Cache) -> App { let _ = (db, cache); App }
        static INIT: Injector = Inject::<App>(
            "init",
            Provide(new_config),
            Async(Provide(new_db)),
            Async(Provide(new_cache)),
            Provide(new_app),
        );
        "#,
    );
    for id in graph.reachable_ids() {
        if !graph.node(id).is_async {
            continue;
        }
        let stage = planned.stage_of(id).unwrap();
        for producer in &graph.edges[id] {
            let producer_stage = planned.stage_of(*producer).unwrap();
            // A sync input may share the stage (it runs inline before the
            // launch); an async input must be strictly earlier.
            if graph.node(*producer).is_async {
                assert!(producer_stage < stage);
            } else {
                assert!(producer_stage <= stage);
            }
        }
    }
    // The two independent async providers launch in the same stage.
    let db_stage = planned.stage_of(1).unwrap();
    let cache_stage = planned.stage_of(2).unwrap();
    assert_eq!(db_stage, cache_stage);
    assert_eq!(planned.stages[db_stage].concurrent, vec![1, 2]);
}

#[test]
fn it_computes_the_error_channel_from_reachable_nodes_only() {
    let (graph, _) = plan(
        r#"
        pub struct App;
        pub struct Orphan;
        pub fn new_app() -> App { App }
        pub fn new_orphan() -> Result<Orphan, std::io::Error> { Ok(Orphan) }
        static INIT: Injector = Inject::<App>("init", Provide(new_app), Provide(new_orphan));
        "#,
    );
    // The fallible provider is unreachable, so the injector is infallible.
    assert!(!graph.returns_error);
    assert!(!graph.reachable[1]);
}
