use affinidi_json_ld::{JsonLdOptions, compact, expand};
use serde_json::json;

#[test]
fn schema_org_person() {
    let input = json!([{
        "@id": "http://example.org/jane",
        "@type": ["http://schema.org/Person"],
        "http://schema.org/name": [{"@value": "Jane"}]
    }]);
    let context = json!({"@vocab": "http://schema.org/"});
    let compacted = compact(input, &context, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        compacted,
        json!({
            "@context": {"@vocab": "http://schema.org/"},
            "@id": "http://example.org/jane",
            "@type": "Person",
            "name": "Jane"
        })
    );
}

#[test]
fn compact_iris_and_keyword_aliases() {
    let input = json!([{
        "@id": "http://example.org/x",
        "@type": ["http://example.org/vocab#Thing"],
        "http://example.org/vocab#name": [{"@value": "x"}]
    }]);
    let context = json!({"ex": "http://example.org/vocab#", "id": "@id", "type": "@type"});
    let compacted = compact(input, &context, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        compacted,
        json!({
            "@context": {"ex": "http://example.org/vocab#", "id": "@id", "type": "@type"},
            "id": "http://example.org/x",
            "type": "ex:Thing",
            "ex:name": "x"
        })
    );
}

#[test]
fn containers() {
    let input = json!([{
        "@id": "http://example.org/x",
        "http://example.org/tags": [{"@value": "a"}],
        "http://example.org/label": [{"@value": "Hello", "@language": "en"}],
        "http://example.org/items": [{"@list": [{"@value": 1}, {"@value": 2}]}],
        "http://xmlns.com/foaf/0.1/knows": [{"@id": "http://example.org/b"}]
    }]);
    let context = json!({
        "tags": {"@id": "http://example.org/tags", "@container": "@set"},
        "label": {"@id": "http://example.org/label", "@container": "@language"},
        "items": {"@id": "http://example.org/items", "@container": "@list"},
        "knows": {"@id": "http://xmlns.com/foaf/0.1/knows", "@type": "@id"}
    });
    let compacted = compact(input, &context, &JsonLdOptions::default()).unwrap();
    assert_eq!(compacted["tags"], json!(["a"]));
    assert_eq!(compacted["label"], json!({"en": "Hello"}));
    assert_eq!(compacted["items"], json!([1, 2]));
    assert_eq!(compacted["knows"], json!("http://example.org/b"));
}

#[test]
fn relative_iris_against_base() {
    let input = json!([{"@id": "http://example.org/docs/1", "http://example.org/p": [{"@value": "v"}]}]);
    let context = json!({"p": "http://example.org/p"});

    let options = JsonLdOptions::default().with_base("http://example.org/");
    let relative = compact(input.clone(), &context, &options).unwrap();
    assert_eq!(relative["@id"], json!("docs/1"));

    let absolute = compact(input, &context, &options.with_compact_to_relative(false)).unwrap();
    assert_eq!(absolute["@id"], json!("http://example.org/docs/1"));
}

#[test]
fn compact_arrays_off_keeps_arrays() {
    let input = json!([{"@id": "http://example.org/x", "http://example.org/p": [{"@value": "v"}]}]);
    let context = json!({"p": "http://example.org/p"});
    let options = JsonLdOptions::default().with_compact_arrays(false);
    let compacted = compact(input, &context, &options).unwrap();
    assert_eq!(
        compacted,
        json!({
            "@context": {"p": "http://example.org/p"},
            "@graph": [{"@id": "http://example.org/x", "p": ["v"]}]
        })
    );
}

#[test]
fn expansion_round_trip() {
    let doc = json!({
        "@context": {
            "@vocab": "http://schema.org/",
            "knows": {"@type": "@id"}
        },
        "@id": "http://example.org/jane",
        "name": "Jane",
        "knows": "http://example.org/bob"
    });
    let context = doc["@context"].clone();
    let options = JsonLdOptions::default();

    let compacted = compact(doc.clone(), &context, &options).unwrap();
    assert_eq!(compacted, doc);
    assert_eq!(expand(compacted, &options).unwrap(), expand(doc, &options).unwrap());
}

#[test]
fn property_context_defined_in_type_scoped_context() {
    let context = json!({
        "@vocab": "http://example.org/",
        "Foo": {"@context": {"bar": {"@id": "http://example.org/bar", "@context": {"qux": "http://example.org/baz"}}}}
    });
    let doc = json!({"@context": context.clone(), "@type": "Foo", "bar": {"qux": "x"}});
    let options = JsonLdOptions::default();

    let expanded = expand(doc.clone(), &options).unwrap();
    assert_eq!(expanded[0]["http://example.org/bar"][0]["http://example.org/baz"], json!([{"@value": "x"}]));

    let compacted = compact(expanded, &context, &options).unwrap();
    assert_eq!(compacted["bar"], json!({"qux": "x"}));
    assert_eq!(compacted, doc);
}
