//! Structural properties of loading, compiling and running.

mod common;

use common::{compile, deferred_services, graph, load, run, services, services_with, store};
use std::collections::HashSet;
use std::sync::Arc;
use tranche_core::flow::GraphDefinition;
use tranche_core::node::NodeKind;
use tranche_core::run_state::RunRequest;
use tranche_core::testing::FetchMode;
use tranche_executor::loader::{Loader, LoaderConfig};
use tranche_executor::scheduler::ProgramConfig;

fn article_page() -> GraphDefinition {
    graph(
        r#"{"nodes": [
            {"type": "Component", "root": true,
             "links": {"a": {"node": 2}, "b": {"node": 4}, "c": {"node": 5}}},
            {"type": "Fields", "links": {"input": {"node": 3}},
             "outputs": [{"id": 10, "field": "title"}, {"id": 11, "field": "words"}]},
            {"type": "Content", "links": {"id": {"node": 6}}, "data": {"type": "Article"}},
            {"type": "If", "data": {"operator": "lessThan"},
             "links": {"operanda": {"node": 2, "field": "words"}, "operandb": {"node": 7}},
             "outputs": [{"id": 12, "field": "output"}]},
            {"type": "Count", "links": {"input": {"node": 8}},
             "outputs": [{"id": 13, "field": "output"}]},
            {"type": "Constant", "data": {"value": 6}},
            {"type": "Constant", "data": {"value": 100}},
            {"type": "Constant", "data": {"value": [1, 2]}}
        ]}"#,
    )
}

fn sidebar() -> GraphDefinition {
    graph(
        r#"{"nodes": [
            {"type": "Content", "root": true, "links": {"id": {"node": 2}},
             "data": {"type": "Article"},
             "outputs": [{"id": 20, "field": "slug"}]},
            {"type": "Constant", "data": {"value": 6}}
        ]}"#,
    )
}

#[test]
fn orders_exceed_dependency_orders() {
    let loader = load(&[article_page(), sidebar()]).unwrap();
    for node in loader.nodes() {
        for link in node.links().values() {
            let source = loader.node(link.source).unwrap();
            assert!(node.order() > source.order(), "{} is not after {}", node.id(), source.id());
        }
    }

    let tranches = loader.create_tranches().unwrap();
    for tranche in &tranches {
        let members: HashSet<_> = tranche.nodes().iter().copied().collect();
        for id in tranche.nodes() {
            let node = loader.node(*id).unwrap();
            assert_eq!(node.order(), tranche.order());
            assert!(node.links().values().all(|link| !members.contains(&link.source)));
        }
    }
}

#[test]
fn reloading_a_graph_changes_nothing() {
    let mut loader = Loader::default();
    let first = loader.load_graph(&article_page()).unwrap();
    let count = loader.len();
    let outputs: usize = loader.nodes().iter().map(|node| node.outputs().len()).sum();

    let second = loader.load_graph(&article_page()).unwrap();
    assert_eq!(loader.len(), count);
    assert_eq!(
        loader.nodes().iter().map(|node| node.outputs().len()).sum::<usize>(),
        outputs
    );
    assert!(first.registered().eq(second.registered()));
}

#[test]
fn sidebar_shares_the_article_content() {
    let mut loader = Loader::default();
    let page = loader.load_graph(&article_page()).unwrap();
    let side = loader.load_graph(&sidebar()).unwrap();
    assert_eq!(page.node_id(3), side.root());
    assert_eq!(loader.consumers(side.root().unwrap()).len(), 1);
}

#[test]
fn constants_never_survive_as_links() {
    let loader = load(&[article_page(), sidebar()]).unwrap();
    assert!(loader.nodes().iter().all(|node| node.kind() != NodeKind::Constant));

    let content = loader
        .nodes()
        .iter()
        .find(|node| node.kind() == NodeKind::Content)
        .unwrap();
    assert!(content.link("id").is_none());
    assert_eq!(content.data("id").and_then(|v| v.as_i64()), Some(6));
}

#[tokio::test]
async fn only_first_entry_lacks_a_comma() {
    let program = compile(&[article_page(), sidebar()], services()).await.unwrap();
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert!(out.starts_with(r#"{"id":"#));

    let entries: Vec<serde_json::Value> = serde_json::from_str(&format!("[{}]", out)).unwrap();
    assert_eq!(entries.len(), 5);
    let ids: HashSet<i64> = entries.iter().filter_map(|e| e["id"].as_i64()).collect();
    assert_eq!(ids, HashSet::from([10, 11, 12, 13, 20]));
    assert_eq!(out.matches(r#",{"id":"#).count(), entries.len() - 1);
}

#[tokio::test]
async fn deferred_store_gives_the_same_output() {
    let graphs = [article_page(), sidebar()];
    let immediate = compile(&graphs, services()).await.unwrap();
    let deferred = compile(&graphs, deferred_services()).await.unwrap();

    let expected = run(&immediate, RunRequest::default()).await.unwrap();
    assert_eq!(run(&deferred, RunRequest::default()).await.unwrap(), expected);
    assert!(expected.contains(r#"{"id":12,"c":true}"#));
}

#[tokio::test]
async fn several_pending_lookups_in_one_tranche() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Component", "root": true,
             "links": {"a": {"node": 2}, "b": {"node": 3}, "c": {"node": 4}}},
            {"type": "Content", "data": {"type": "Article", "id": 5}, "outputs": [{"id": 1, "field": "title"}]},
            {"type": "Content", "data": {"type": "Article", "id": 6}, "outputs": [{"id": 2, "field": "title"}]},
            {"type": "Content", "data": {"type": "Article", "id": 7}, "outputs": [{"id": 3, "field": "title"}]}
        ]}"#,
    );
    let program = compile(&[page], deferred_services()).await.unwrap();
    assert_eq!(program.tranches().len(), 1);
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert_eq!(
        out,
        r#"{"id":1,"c":"Hello"},{"id":2,"c":"Tagged"},{"id":3,"c":"Match"}"#
    );
}

#[tokio::test]
async fn concurrent_runs_share_one_program() {
    let program = Arc::new(compile(&[article_page()], deferred_services()).await.unwrap());
    let expected = run(&program, RunRequest::default()).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let program = Arc::clone(&program);
            tokio::spawn(async move {
                let mut out = Vec::new();
                program.run(RunRequest::default(), &mut out).await.map(|()| out)
            })
        })
        .collect();
    for handle in handles {
        let out = handle.await.unwrap().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
    assert_eq!(program.buffers().outstanding(), 0);
}

#[tokio::test]
async fn run_states_are_recycled() {
    let program = compile(&[sidebar()], services()).await.unwrap();
    assert_eq!(program.idle_run_states(), 0);
    for _ in 0..3 {
        run(&program, RunRequest::default()).await.unwrap();
        assert_eq!(program.idle_run_states(), 1);
    }
}

#[tokio::test]
async fn fetch_failure_aborts_the_run() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Component", "root": true, "links": {"a": {"node": 2}, "b": {"node": 3}}},
            {"type": "ContentList", "data": {"type": "Tag"}, "outputs": [{"id": 1, "field": "output"}]},
            {"type": "Content", "data": {"type": "Article", "id": 5}, "outputs": [{"id": 2, "field": "output"}]}
        ]}"#,
    );
    for mode in [FetchMode::Immediate, FetchMode::Deferred(std::time::Duration::from_millis(1))] {
        let store = Arc::new(store(mode));
        store.fail_type("Article");
        let program = load(&[page.clone()])
            .unwrap()
            .compile(services_with(store), ProgramConfig::default())
            .await
            .unwrap();

        let mut out = b"kept".to_vec();
        let err = program.run(RunRequest::default(), &mut out).await.unwrap_err();
        assert_eq!(err.code(), "E301");
        assert!(err.is_runtime_error());
        assert_eq!(out, b"kept");
        assert_eq!(program.buffers().outstanding(), 0);
    }
}

#[tokio::test]
async fn compile_errors_abort_the_program() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Component", "root": true, "links": {"a": {"node": 2}, "b": {"node": 3}}},
            {"type": "Count", "data": {"input": [1]}, "outputs": [{"id": 1, "field": "output"}]},
            {"type": "Content", "data": {"type": "Ghost", "id": 1}}
        ]}"#,
    );
    let err = compile(&[page], services()).await.unwrap_err();
    assert_eq!(err.code(), "E201");
    assert!(err.is_compile_error());

    let mismatch = graph(
        r#"{"nodes": [
            {"type": "If", "root": true, "data": {"operator": "equalTo", "operanda": 1},
             "links": {"operandb": {"node": 2}}},
            {"type": "Constant", "data": {"value": "1"}}
        ]}"#,
    );
    let err = compile(&[mismatch], services()).await.unwrap_err();
    assert_eq!(err.code(), "E202");
}

#[tokio::test]
async fn lenient_loader_skips_unknown_tags_and_bad_links() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Count", "root": true,
             "data": {"input": [1, 2]},
             "links": {"other": {"node": 2}, "extra": {"node": 99}},
             "outputs": [{"id": 1, "field": "output"}]},
            {"type": "Sparkle"}
        ]}"#,
    );
    assert_eq!(load(&[page.clone()]).unwrap_err().code(), "E101");

    let mut loader = Loader::new(LoaderConfig::lenient());
    loader.load_graph(&page).unwrap();
    let program = loader.compile(services(), ProgramConfig::default()).await.unwrap();
    assert_eq!(run(&program, RunRequest::default()).await.unwrap(), r#"{"id":1,"c":2}"#);
}

#[tokio::test]
async fn placeholder_kinds_fail_to_compile() {
    for tag in ["Loop", "ToList", "Tokens"] {
        let page = graph(&format!(r#"{{"nodes": [{{"type": "{}", "root": true}}]}}"#, tag));
        let err = compile(&[page], services()).await.unwrap_err();
        assert_eq!(err.code(), "E203", "{tag}");
    }
}

#[tokio::test]
async fn empty_program_writes_nothing() {
    let page = graph(r#"{"nodes": [{"type": "Component", "root": true}]}"#);
    let program = compile(&[page], services()).await.unwrap();
    assert!(program.tranches().is_empty());
    assert_eq!(run(&program, RunRequest::default()).await.unwrap(), "");
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn program_outlives_the_runtime_it_ran_on() {
    let first = runtime();
    let program = first.block_on(async {
        let program = compile(&[sidebar()], deferred_services()).await.unwrap();
        run(&program, RunRequest::default()).await.unwrap();
        program
    });
    assert_eq!(program.idle_run_states(), 1);
    drop(first);

    let second = runtime();
    let out = second
        .block_on(async {
            tokio::time::timeout(
                std::time::Duration::from_secs(3),
                run(&program, RunRequest::default()),
            )
            .await
        })
        .expect("run finishes on a new runtime")
        .unwrap();
    assert!(out.starts_with(r#"{"id":20,"c":"#));
    assert_eq!(program.idle_run_states(), 1);
    assert_eq!(program.buffers().outstanding(), 0);
}

#[tokio::test]
async fn deferred_runs_recycle_their_state() {
    let program = compile(&[article_page()], deferred_services()).await.unwrap();
    for _ in 0..3 {
        run(&program, RunRequest::default()).await.unwrap();
        assert_eq!(program.idle_run_states(), 1);
    }
}

#[tokio::test]
async fn store_setup_happens_once_per_program() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Component", "root": true,
             "links": {"a": {"node": 2}, "b": {"node": 3}, "c": {"node": 4}}},
            {"type": "Content", "data": {"type": "Article", "id": 5},
             "outputs": [{"id": 1, "field": "title"}]},
            {"type": "Content", "data": {"type": "Article", "id": 6, "includes": ["tags"]},
             "outputs": [{"id": 2, "field": "output"}]},
            {"type": "ContentList", "data": {"type": "Article", "filter": {"section": "sport"}},
             "outputs": [{"id": 3, "field": "output"}]}
        ]}"#,
    );
    let store = Arc::new(store(FetchMode::Immediate));
    let program = load(&[page])
        .unwrap()
        .compile(services_with(Arc::clone(&store)), ProgramConfig::default())
        .await
        .unwrap();
    assert_eq!(store.prepare_count(), 2);
    assert_eq!(store.list_count(), 0);

    for runs in 1..=3 {
        run(&program, RunRequest::default()).await.unwrap();
        assert_eq!(store.list_count(), runs);
    }
    assert_eq!(store.prepare_count(), 2);
}
