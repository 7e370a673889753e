//! End-to-end analyzer scenarios against a scripted backend: build a
//! typed query, assert the program it compiles to, and assert the views
//! hydrated from the scripted rows.

use grapl_core::cmp::{IntCmp, StrCmp};
use grapl_dgraph::StubDgraph;
use grapl_nodes::file::FileQuery;
use grapl_nodes::process::ProcessQuery;
use serde_json::json;

#[test]
fn signature_match_on_process_name() {
    let stub = StubDgraph::new();
    stub.enqueue_json(json!({
        "res": [{
            "uid": "0x1",
            "node_key": "p1",
            "dgraph.type": "Process",
            "process_id": 100,
            "process_name": "word.exe"
        }]
    }));

    let views = ProcessQuery::new()
        .with_process_name(&[StrCmp::eq("word.exe")])
        .unwrap()
        .query(&stub.handle(), 1000)
        .unwrap();

    assert_eq!(views.len(), 1);
    assert_eq!(views[0].node_key(), "p1");
    assert_eq!(views[0].get_process_id(true).unwrap(), Some(100));
    let text = &stub.queries()[0];
    assert!(text.contains("eq(process_name, \"word.exe\")"));
    assert!(text.contains("type(Process)"));
}

#[test]
fn parent_matched_through_suspicious_child() {
    let stub = StubDgraph::new();
    stub.enqueue_json(json!({
        "res": [{
            "uid": "0x1",
            "node_key": "p1",
            "dgraph.type": "Process",
            "process_id": 100,
            "children": [{
                "uid": "0x2",
                "node_key": "p2",
                "dgraph.type": "Process",
                "process_name": "malware.exe"
            }]
        }]
    }));

    let child = ProcessQuery::new()
        .with_process_name(&[StrCmp::eq("malware.exe")])
        .unwrap();
    let view = ProcessQuery::new()
        .with_process_id(&[IntCmp::eq(100)])
        .unwrap()
        .with_children(child)
        .unwrap()
        .query_first(&stub.handle(), None)
        .unwrap()
        .expect("one match");

    assert_eq!(view.get_process_id(true).unwrap(), Some(100));
    let children = view.get_children(true).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].node_key(), "p2");
    assert_eq!(
        children[0].get_process_name(true).unwrap(),
        Some("malware.exe".to_string())
    );

    let text = &stub.queries()[0];
    assert!(text.contains("eq(process_id, 100)"));
    assert!(text.contains("children"));
    assert!(text.contains("eq(process_name, \"malware.exe\")"));
}

#[test]
fn unmatched_pattern_yields_no_views() {
    let stub = StubDgraph::new();
    stub.enqueue_json(json!({ "res": [] }));

    let child = ProcessQuery::new()
        .with_process_name(&[StrCmp::eq("absent.exe")])
        .unwrap();
    let result = ProcessQuery::new()
        .with_process_id(&[IntCmp::eq(100)])
        .unwrap()
        .with_children(child)
        .unwrap()
        .query_first(&stub.handle(), None)
        .unwrap();

    assert!(result.is_none());
    // The whole pattern must hold: partial matches are cascaded away
    // server-side rather than filtered here.
    let text = &stub.queries()[0];
    assert!(text.contains("@cascade"));
    assert!(text.contains("eq(process_name, \"absent.exe\")"));
}

#[test]
fn reverse_traversal_materializes_the_parent() {
    let stub = StubDgraph::new();
    stub.enqueue_json(json!({
        "res": [{
            "uid": "0x2",
            "node_key": "p2",
            "dgraph.type": "Process",
            "process_name": "malware.exe",
            "~children": {
                "uid": "0x1",
                "node_key": "p1",
                "dgraph.type": "Process",
                "process_name": "explorer.exe"
            }
        }]
    }));

    let parent = ProcessQuery::new()
        .with_process_name(&[StrCmp::eq("explorer.exe")])
        .unwrap();
    let view = ProcessQuery::new()
        .with_process_name(&[StrCmp::eq("malware.exe")])
        .unwrap()
        .with_parent(parent)
        .unwrap()
        .query_first(&stub.handle(), None)
        .unwrap()
        .expect("one match");

    // The program traverses the declared forward predicate backwards.
    assert!(stub.queries()[0].contains("~children"));

    let parent_view = view.get_parent(true).unwrap().expect("parent attached");
    assert_eq!(parent_view.node_key(), "p1");
    assert_eq!(
        parent_view.get_process_name(true).unwrap(),
        Some("explorer.exe".to_string())
    );
}

#[test]
fn query_first_pins_the_root_to_one_node_key() {
    let stub = StubDgraph::new();
    stub.enqueue_json(json!({
        "res": [{ "uid": "0x1", "node_key": "target", "dgraph.type": "Process" }]
    }));

    let view = ProcessQuery::new()
        .query_first(&stub.handle(), Some("target"))
        .unwrap()
        .expect("one match");

    assert_eq!(view.node_key(), "target");
    let text = &stub.queries()[0];
    assert!(text.contains("eq(node_key, \"target\")"));
    assert!(text.contains("first: 1)"));
}

#[test]
fn counting_tmp_files_without_materializing() {
    let stub = StubDgraph::new();
    stub.enqueue_json(json!({ "res": [{ "count": 5 }] }));

    let count = FileQuery::new()
        .with_file_path(&[StrCmp::contains("/tmp/")])
        .unwrap()
        .get_count(&stub.handle())
        .unwrap();

    assert_eq!(count, 5);
    let text = &stub.queries()[0];
    assert!(text.contains("regexp(file_path, /.*\\/tmp\\/.*/)"));
    assert!(text.contains("count(uid)"));
}
