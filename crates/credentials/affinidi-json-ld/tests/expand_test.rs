use affinidi_json_ld::{JsonLdOptions, expand};
use serde_json::{Value, json};

fn expanded(doc: Value) -> Value {
    expand(doc, &JsonLdOptions::default().with_ordered(true)).unwrap()
}

#[test]
fn schema_org_person() {
    let doc = json!({
        "@context": {"@vocab": "http://schema.org/"},
        "@type": "Person",
        "name": "Jane Doe",
        "knows": {"@id": "http://example.org/bob"}
    });
    assert_eq!(
        expanded(doc),
        json!([{
            "@type": ["http://schema.org/Person"],
            "http://schema.org/name": [{"@value": "Jane Doe"}],
            "http://schema.org/knows": [{"@id": "http://example.org/bob"}]
        }])
    );
}

#[test]
fn relative_ids_use_context_base() {
    let doc = json!({
        "@context": {"@base": "http://example.org/base/"},
        "@id": "../other",
        "http://example.org/p": "v"
    });
    assert_eq!(expanded(doc)[0]["@id"], json!("http://example.org/other"));
}

#[test]
fn language_maps() {
    let doc = json!({
        "@context": {"label": {"@id": "http://example.org/label", "@container": "@language"}},
        "@id": "http://example.org/x",
        "label": {"en": "Hello", "de": ["Hallo"]}
    });
    assert_eq!(
        expanded(doc),
        json!([{
            "@id": "http://example.org/x",
            "http://example.org/label": [
                {"@value": "Hallo", "@language": "de"},
                {"@value": "Hello", "@language": "en"}
            ]
        }])
    );
}

#[test]
fn list_containers() {
    let doc = json!({
        "@context": {"items": {"@id": "http://example.org/items", "@container": "@list"}},
        "items": [1, 2]
    });
    assert_eq!(
        expanded(doc),
        json!([{"http://example.org/items": [{"@list": [{"@value": 1}, {"@value": 2}]}]}])
    );
}

#[test]
fn reverse_properties() {
    let doc = json!({
        "@context": {"children": {"@reverse": "http://example.org/parent"}},
        "@id": "http://example.org/p",
        "children": [{"@id": "http://example.org/c"}]
    });
    assert_eq!(
        expanded(doc),
        json!([{
            "@id": "http://example.org/p",
            "@reverse": {"http://example.org/parent": [{"@id": "http://example.org/c"}]}
        }])
    );
}

#[test]
fn nested_properties() {
    let doc = json!({
        "@context": {"@vocab": "http://example.org/", "meta": "@nest"},
        "@id": "http://example.org/x",
        "meta": {"size": 3}
    });
    assert_eq!(
        expanded(doc),
        json!([{"@id": "http://example.org/x", "http://example.org/size": [{"@value": 3}]}])
    );
}

#[test]
fn json_literals_are_kept_verbatim() {
    let doc = json!({
        "@context": {"data": {"@id": "http://example.org/data", "@type": "@json"}},
        "data": {"b": [1, {"c": null}]}
    });
    assert_eq!(
        expanded(doc),
        json!([{"http://example.org/data": [{"@value": {"b": [1, {"c": null}]}, "@type": "@json"}]}])
    );
}

#[test]
fn type_scoped_contexts() {
    let doc = json!({
        "@context": {
            "@vocab": "http://example.org/",
            "Person": {"@context": {"name": "http://xmlns.com/foaf/0.1/name"}}
        },
        "@type": "Person",
        "name": "Ann"
    });
    assert_eq!(
        expanded(doc),
        json!([{
            "@type": ["http://example.org/Person"],
            "http://xmlns.com/foaf/0.1/name": [{"@value": "Ann"}]
        }])
    );
}

#[test]
fn id_maps() {
    let doc = json!({
        "@context": {"@vocab": "http://example.org/", "people": {"@container": "@id"}},
        "people": {"http://example.org/a": {"name": "A"}}
    });
    assert_eq!(
        expanded(doc),
        json!([{
            "http://example.org/people": [{
                "@id": "http://example.org/a",
                "http://example.org/name": [{"@value": "A"}]
            }]
        }])
    );
}

#[test]
fn nulls_and_free_floating_values_are_dropped() {
    let doc = json!({
        "@context": {"@vocab": "http://example.org/"},
        "@graph": [
            {"@value": "free"},
            {"@id": "http://example.org/only-id"},
            {"a": null, "b": "kept"}
        ]
    });
    assert_eq!(expanded(doc), json!([{"http://example.org/b": [{"@value": "kept"}]}]));
}

#[test]
fn null_document_expands_to_empty_array() {
    assert_eq!(expanded(Value::Null), json!([]));
    assert_eq!(expanded(json!({"@context": {"@vocab": "http://example.org/"}})), json!([]));
}

#[test]
fn expansion_is_idempotent() {
    let doc = json!({
        "@context": {
            "@vocab": "http://schema.org/",
            "knows": {"@type": "@id"},
            "tags": {"@container": "@list"},
            "label": {"@container": "@language"}
        },
        "@id": "http://example.org/jane",
        "@type": "Person",
        "knows": "http://example.org/bob",
        "tags": ["a", "b"],
        "label": {"en": "Jane", "fr": "Jeanne"},
        "address": {"streetAddress": "1 Main St"}
    });
    let once = expanded(doc);
    assert_eq!(expanded(once.clone()), once);
}
