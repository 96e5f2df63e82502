use std::sync::Arc;

use affinidi_json_ld::{
    Dataset, ErrorCode, JsonLdOptions, ProcessingMode, StaticDocumentLoader, expand, frame, from_rdf, nquads,
};
use serde_json::{Value, json};

fn expand_error(doc: Value, options: &JsonLdOptions) -> ErrorCode {
    expand(doc, options).unwrap_err().code()
}

#[test]
fn context_errors() {
    let options = JsonLdOptions::default();
    assert_eq!(
        expand_error(json!({"@context": {"@type": "http://example.org/t"}}), &options),
        ErrorCode::KeywordRedefinition
    );
    assert_eq!(
        expand_error(json!({"@context": {"a": {"@id": "b:x"}, "b": {"@id": "a:y"}}, "a": 1}), &options),
        ErrorCode::CyclicIriMapping
    );
    assert_eq!(
        expand_error(
            json!({"@context": [{"@protected": true, "name": "http://a.example/name"}, {"name": "http://b.example/name"}]}),
            &options
        ),
        ErrorCode::ProtectedTermRedefinition
    );
    assert_eq!(
        expand_error(
            json!({"@context": {"@version": 1.1}}),
            &JsonLdOptions::default().with_processing_mode(ProcessingMode::JsonLd10)
        ),
        ErrorCode::ProcessingModeConflict
    );
}

#[test]
fn remote_context_errors() {
    let doc = json!({"@context": "https://example.org/context.jsonld", "name": "x"});
    assert_eq!(
        expand_error(doc.clone(), &JsonLdOptions::default()),
        ErrorCode::LoadingRemoteContextFailed
    );

    let loader = StaticDocumentLoader::new().with_document("https://example.org/context.jsonld", json!({"name": "x"}));
    let options = JsonLdOptions::default().with_document_loader(Arc::new(loader));
    assert_eq!(expand_error(doc, &options), ErrorCode::InvalidRemoteContext);
}

#[test]
fn node_and_value_errors() {
    let options = JsonLdOptions::default();
    assert_eq!(
        expand_error(json!({"@context": {"id": "@id"}, "id": "http://a.example/", "@id": "http://b.example/"}), &options),
        ErrorCode::CollidingKeywords
    );
    assert_eq!(
        expand_error(json!({"http://example.org/p": {"@value": "x", "@id": "http://example.org/y"}}), &options),
        ErrorCode::InvalidValueObject
    );
    assert_eq!(
        expand_error(json!({"http://example.org/p": {"@value": "x", "@language": 5}}), &options),
        ErrorCode::InvalidLanguageTaggedString
    );
}

#[test]
fn framing_errors() {
    let input = json!({"@id": "http://example.org/a", "http://example.org/p": "v"});
    let options = JsonLdOptions::default();

    let err = frame(input.clone(), json!({"@embed": "@sometimes"}), &options).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidKeywordEmbedValue);

    let err = frame(input, json!({"@explicit": "maybe"}), &options).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidFrame);
}

#[test]
fn invalid_json_literal() {
    let dataset: Dataset = nquads::parse(
        "<http://example.org/s> <http://example.org/p> \"{oops\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON> .\n",
    )
    .unwrap();
    let err = from_rdf(dataset, &JsonLdOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidJsonLiteral);
    assert!(err.to_string().starts_with("invalid JSON literal: "));
}

#[test]
fn malformed_nquads_fail_to_load() {
    let err = StaticDocumentLoader::new()
        .with_nquads("https://example.org/bad.nq", "<http://example.org/s> <http://example.org/p> .\n")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LoadingDocumentFailed);
}
