use std::fs;

use tsugite_core::{Error, GeneratorConfig, dsl::DslError, generate, graph::GraphError};

fn try_generate(source: &str) -> Result<(), Error> {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("app.rs"), source).unwrap();
    generate(&[dir.path().to_path_buf()], &GeneratorConfig::default()).map(|_| ())
}

#[test]
fn it_rejects_duplicate_providers_with_both_positions() {
    let err = try_generate(
        r#"
        pub struct Db;
        pub fn new_db() -> Db { Db }
        pub fn other_db() -> Db { Db }
        static INIT: Injector = Inject::<Db>(
            "init",
            Provide(new_db),
            Provide(other_db),
        );
        "#,
    )
    .unwrap_err();
    match err {
        Error::Graph(GraphError::DuplicateProvider { ty, first, second }) => {
            assert_eq!(ty, "Db");
            assert!(first.file.ends_with("app.rs"));
            assert!(second.line > first.line);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn it_reports_the_missing_type_and_its_consumer() {
    let err = try_generate(
        r#"
        pub struct Db;
        pub struct App;
        pub fn new_app(db: Db) -> App { let _ = db; App }
        static INIT: Injector = Inject::<App>("init", Provide(new_app));
        "#,
    )
    .unwrap_err();
    match err {
        Error::Graph(GraphError::MissingProvider { ty, consumer, .. }) => {
            assert_eq!(ty, "Db");
            assert!(consumer.contains("new_app"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn it_reports_a_missing_root_provider() {
    let err = try_generate(
        r#"
        pub struct App;
        pub struct Db;
        pub fn new_db() -> Db { Db }
        static INIT: Injector = Inject::<App>("init", Provide(new_db));
        "#,
    )
    .unwrap_err();
    match err {
        Error::Graph(GraphError::NoRootProvider { ty, injector, .. }) => {
            assert_eq!(ty, "App");
            assert_eq!(injector, "init");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn it_reports_dependency_cycles_as_a_type_chain() {
    let err = try_generate(
        r#"
        pub struct A;
        pub struct B;
        pub fn new_a(b: B) -> A { let _ = b; A }
        pub fn new_b(a: A) -> B { let _ = a; B }
        static INIT: Injector = Inject::<A>("init", Provide(new_a), Provide(new_b));
        "#,
    )
    .unwrap_err();
    match err {
        Error::Graph(GraphError::Cycle { chain, .. }) => {
            assert!(chain.contains("A"), "chain was {chain}");
            assert!(chain.contains("B"), "chain was {chain}");
            assert!(chain.contains("->"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn it_rejects_two_implementations_bound_to_one_interface() {
    let err = try_generate(
        r#"
        use std::sync::Arc;
        pub trait Repo {}
        pub struct PgRepo;
        pub struct MemRepo;
        pub struct Svc;
        pub fn new_pg() -> PgRepo { PgRepo }
        pub fn new_mem() -> MemRepo { MemRepo }
        pub fn new_svc(repo: Arc<dyn Repo>) -> Svc { let _ = repo; Svc }
        static INIT: Injector = Inject::<Svc>(
            "init",
            Bind::<Arc<dyn Repo>>(Provide(new_pg)),
            Bind::<Arc<dyn Repo>>(Provide(new_mem)),
            Provide(new_svc),
        );
        "#,
    )
    .unwrap_err();
    match err {
        Error::Graph(GraphError::DuplicateProvider { ty, .. }) => {
            assert_eq!(ty, "std::sync::Arc<dyn Repo>");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn it_rejects_unknown_provider_functions() {
    let err = try_generate(
        r#"
        pub struct App;
        static INIT: Injector = Inject::<App>("init", Provide(vanished));
        "#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Dsl(DslError::UnknownProvider { name, .. }) if name == "vanished"
    ));
}

#[test]
fn it_rejects_async_markers_on_value_providers() {
    let err = try_generate(
        r#"
        pub struct App;
        pub fn new_app(port: u16) -> App { let _ = port; App }
        static INIT: Injector = Inject::<App>("init", Async(Value::<u16>(1)), Provide(new_app));
        "#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Dsl(DslError::AsyncOnNonFunction { .. })
    ));
}

#[test]
fn it_rejects_mismatched_explicit_mappings() {
    let err = try_generate(
        r#"
        use std::sync::Arc;
        pub trait Repo {}
        pub struct PgRepo;
        pub struct MemRepo;
        pub struct Svc;
        pub fn new_pg() -> PgRepo { PgRepo }
        pub fn new_svc(repo: Arc<dyn Repo>) -> Svc { let _ = repo; Svc }
        static INIT: Injector = Inject::<Svc>(
            "init",
            AsMap::<Arc<dyn Repo>, MemRepo>(Provide(new_pg)),
            Provide(new_svc),
        );
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Dsl(DslError::BadBind { .. })));
}

#[test]
fn it_rejects_unsized_bind_targets() {
    let err = try_generate(
        r#"
        pub trait Repo {}
        pub struct PgRepo;
        pub struct Svc;
        pub fn new_pg() -> PgRepo { PgRepo }
        pub fn new_svc(repo: Box<dyn Repo>) -> Svc { let _ = repo; Svc }
        static INIT: Injector = Inject::<Svc>(
            "init",
            Bind::<dyn Repo>(Provide(new_pg)),
            Provide(new_svc),
        );
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Dsl(DslError::BadBind { .. })));
}
