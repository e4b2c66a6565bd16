//! End-to-end scenarios: describe, load, compile, run.

mod common;

use common::{compile, graph, load, run, services, services_with, store};
use std::sync::Arc;
use tranche_core::node::NodeKind;
use tranche_core::run_state::RunRequest;
use tranche_core::testing::FetchMode;
use tranche_core::value::Value;

#[tokio::test]
async fn single_content_root() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Content", "root": true,
             "data": {"type": "Article", "id": 5},
             "outputs": [{"id": 17, "field": "output"}]}
        ]}"#,
    );
    let program = compile(&[page], services()).await.unwrap();
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert_eq!(
        out,
        r#"{"id":17,"c":{"id":5,"section":"news","title":"Hello","words":120}}"#
    );
}

#[tokio::test]
async fn identical_nodes_across_graphs_are_shared() {
    let first = graph(
        r#"{"nodes": [
            {"type": "Content", "root": true,
             "data": {"type": "Article", "id": 5},
             "outputs": [{"id": 1, "field": "title"}]}
        ]}"#,
    );
    let second = graph(
        r#"{"nodes": [
            {"type": "Component", "root": true, "links": {"body": {"node": 2}}},
            {"type": "Content", "data": {"type": "Article", "id": 5},
             "outputs": [{"id": 2, "field": "words"}]}
        ]}"#,
    );

    let mut loader = load(&[]).unwrap();
    let a = loader.load_graph(&first).unwrap();
    let b = loader.load_graph(&second).unwrap();
    assert_eq!(loader.len(), 1);
    assert_eq!(a.root(), b.node_id(2));

    let store = Arc::new(store(FetchMode::Immediate));
    let program = loader
        .compile(services_with(Arc::clone(&store)), Default::default())
        .await
        .unwrap();
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert_eq!(out, r#"{"id":1,"c":"Hello"},{"id":2,"c":120}"#);
    assert_eq!(store.get_count(), 1);
}

#[tokio::test]
async fn if_compares_constant_with_count() {
    let page = graph(
        r#"{"nodes": [
            {"type": "If", "root": true,
             "data": {"operator": "moreThan", "operanda": 5},
             "links": {"operandb": {"node": 2}},
             "outputs": [{"id": 3, "field": "output"}]},
            {"type": "Count", "links": {"input": {"node": 3}}},
            {"type": "Constant", "data": {"value": [1, 2, 3]}}
        ]}"#,
    );
    let loader = load(&[page.clone()]).unwrap();
    let compare = loader
        .nodes()
        .iter()
        .find(|node| node.kind() == NodeKind::If)
        .unwrap();
    assert_eq!(compare.data("operanda"), Some(&Value::int(5)));
    assert_eq!(compare.order(), 2);

    let program = compile(&[page], services()).await.unwrap();
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert_eq!(out, r#"{"id":3,"c":true}"#);
}

#[tokio::test]
async fn count_of_empty_array_is_zero() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Count", "root": true,
             "links": {"input": {"node": 2}},
             "outputs": [{"id": 1, "field": "output"}]},
            {"type": "Constant", "data": {"value": []}}
        ]}"#,
    );
    let program = compile(&[page], services()).await.unwrap();
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert_eq!(out, r#"{"id":1,"c":0}"#);
}

#[tokio::test]
async fn component_root_contributes_dependencies() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Component", "root": true, "links": {"article": {"node": 2}}},
            {"type": "Fields", "links": {"input": {"node": 3}},
             "outputs": [{"id": 1, "field": "title"}]},
            {"type": "Content", "data": {"type": "Article", "id": 5}}
        ]}"#,
    );
    let mut loader = load(&[]).unwrap();
    let wired = loader.load_graph(&page).unwrap();
    assert_eq!(loader.len(), 2);
    assert!(wired.root().is_none());
    assert!(loader.nodes().iter().all(|node| node.kind() != NodeKind::Component));

    let a = loader.node(wired.node_id(3).unwrap()).unwrap();
    let b = loader.node(wired.node_id(2).unwrap()).unwrap();
    assert_eq!(b.order(), a.order() + 1);

    let program = loader.compile(services(), Default::default()).await.unwrap();
    assert_eq!(program.tranches().len(), 2);
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert_eq!(out, r#"{"id":1,"c":"Hello"}"#);
}

#[tokio::test]
async fn content_list_with_total_and_includes() {
    let page = graph(
        r#"{"nodes": [
            {"type": "ContentList", "root": true,
             "data": {"type": "Article", "filter": {"section": "news"},
                      "sort": "-words", "total": true, "includes": "tags"},
             "outputs": [{"id": 4, "field": "output"}]}
        ]}"#,
    );
    let program = compile(&[page], services()).await.unwrap();
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert_eq!(
        out,
        concat!(
            r#"{"id":4,"c":{"items":["#,
            r#"{"id":5,"section":"news","title":"Hello","words":120},"#,
            r#"{"id":6,"section":"news","tags":[1,2],"title":"Tagged","words":80}],"#,
            r#""total":2,"includes":{"tags":[{"id":1,"name":"rust"},{"id":2,"name":"graphs"}]}}}"#
        )
    );
    assert_eq!(program.buffers().outstanding(), 0);
}

#[tokio::test]
async fn primary_entity_feeds_fields() {
    let page = graph(
        r#"{"nodes": [
            {"type": "Fields", "root": true, "links": {"input": {"node": 2}},
             "outputs": [{"id": 1, "field": "title"}, {"id": 2, "field": "slug"}]},
            {"type": "Content", "data": {"type": "Article"}}
        ]}"#,
    );
    let program = compile(&[page], services()).await.unwrap();
    let request = RunRequest::default().with_primary(serde_json::json!({"id": 42, "title": "Primary"}));
    let out = run(&program, request).await.unwrap();
    assert_eq!(
        out,
        r#"{"id":1,"c":"Primary"},{"id":2,"c":{"json":{"slug":"article-42"},"select":"slug"}}"#
    );
}

#[tokio::test]
async fn yaml_description() {
    let yaml = r#"
nodes:
  - type: FromList
    root: true
    links:
      index: { node: 3 }
    data:
      input: [a, b, c]
    outputs:
      - { id: 1, field: output }
  - type: Constant
    data: { value: [9] }
  - type: Count
    links:
      input: { node: 2 }
"#;
    let page = tranche_core::flow::GraphDefinition::from_yaml(yaml).unwrap();
    let program = compile(&[page], services()).await.unwrap();
    let out = run(&program, RunRequest::default()).await.unwrap();
    assert_eq!(out, r#"{"id":1,"c":"b"}"#);
}
