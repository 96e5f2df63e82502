use std::fmt;

/// The closed set of JSON-LD processing error codes.
///
/// Conformance tests assert on these codes, so each failing algorithm step
/// reports exactly one of them. The `Display` form is the JSON-LD error string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CollidingKeywords,
    ConflictingIndexes,
    ContextOverflow,
    CyclicIriMapping,
    InvalidKeywordIdValue,
    InvalidKeywordImportValue,
    InvalidKeywordIncludedValue,
    InvalidKeywordIndexValue,
    InvalidKeywordNestValue,
    InvalidKeywordPrefixValue,
    InvalidKeywordPropagateValue,
    InvalidKeywordProtectedValue,
    InvalidKeywordReverseValue,
    InvalidKeywordVersionValue,
    InvalidBaseDirection,
    InvalidBaseIri,
    InvalidContainerMapping,
    InvalidContextEntry,
    InvalidContextNullification,
    InvalidDefaultLanguage,
    InvalidIriMapping,
    InvalidJsonLiteral,
    InvalidKeywordAlias,
    InvalidLanguageMapValue,
    InvalidLanguageMapping,
    InvalidLanguageTaggedString,
    InvalidLanguageTaggedValue,
    InvalidLocalContext,
    InvalidRemoteContext,
    InvalidReversePropertyMap,
    InvalidReversePropertyValue,
    InvalidReverseProperty,
    InvalidScopedContext,
    InvalidScriptElement,
    InvalidSetOrListObject,
    InvalidTermDefinition,
    InvalidTypeMapping,
    InvalidTypeValue,
    InvalidTypedValue,
    InvalidValueObjectValue,
    InvalidValueObject,
    InvalidVocabMapping,
    IriConfusedWithPrefix,
    KeywordRedefinition,
    LoadingDocumentFailed,
    LoadingRemoteContextFailed,
    MultipleContextLinkHeaders,
    ProcessingModeConflict,
    ProtectedTermRedefinition,
    InvalidFrame,
    InvalidKeywordEmbedValue,
    Unspecified,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CollidingKeywords => "colliding keywords",
            Self::ConflictingIndexes => "conflicting indexes",
            Self::ContextOverflow => "context overflow",
            Self::CyclicIriMapping => "cyclic IRI mapping",
            Self::InvalidKeywordIdValue => "invalid @id value",
            Self::InvalidKeywordImportValue => "invalid @import value",
            Self::InvalidKeywordIncludedValue => "invalid @included value",
            Self::InvalidKeywordIndexValue => "invalid @index value",
            Self::InvalidKeywordNestValue => "invalid @nest value",
            Self::InvalidKeywordPrefixValue => "invalid @prefix value",
            Self::InvalidKeywordPropagateValue => "invalid @propagate value",
            Self::InvalidKeywordProtectedValue => "invalid @protected value",
            Self::InvalidKeywordReverseValue => "invalid @reverse value",
            Self::InvalidKeywordVersionValue => "invalid @version value",
            Self::InvalidBaseDirection => "invalid base direction",
            Self::InvalidBaseIri => "invalid base IRI",
            Self::InvalidContainerMapping => "invalid container mapping",
            Self::InvalidContextEntry => "invalid context entry",
            Self::InvalidContextNullification => "invalid context nullification",
            Self::InvalidDefaultLanguage => "invalid default language",
            Self::InvalidIriMapping => "invalid IRI mapping",
            Self::InvalidJsonLiteral => "invalid JSON literal",
            Self::InvalidKeywordAlias => "invalid keyword alias",
            Self::InvalidLanguageMapValue => "invalid language map value",
            Self::InvalidLanguageMapping => "invalid language mapping",
            Self::InvalidLanguageTaggedString => "invalid language-tagged string",
            Self::InvalidLanguageTaggedValue => "invalid language-tagged value",
            Self::InvalidLocalContext => "invalid local context",
            Self::InvalidRemoteContext => "invalid remote context",
            Self::InvalidReversePropertyMap => "invalid reverse property map",
            Self::InvalidReversePropertyValue => "invalid reverse property value",
            Self::InvalidReverseProperty => "invalid reverse property",
            Self::InvalidScopedContext => "invalid scoped context",
            Self::InvalidScriptElement => "invalid script element",
            Self::InvalidSetOrListObject => "invalid set or list object",
            Self::InvalidTermDefinition => "invalid term definition",
            Self::InvalidTypeMapping => "invalid type mapping",
            Self::InvalidTypeValue => "invalid type value",
            Self::InvalidTypedValue => "invalid typed value",
            Self::InvalidValueObjectValue => "invalid value object value",
            Self::InvalidValueObject => "invalid value object",
            Self::InvalidVocabMapping => "invalid vocab mapping",
            Self::IriConfusedWithPrefix => "IRI confused with prefix",
            Self::KeywordRedefinition => "keyword redefinition",
            Self::LoadingDocumentFailed => "loading document failed",
            Self::LoadingRemoteContextFailed => "loading remote context failed",
            Self::MultipleContextLinkHeaders => "multiple context link headers",
            Self::ProcessingModeConflict => "processing mode conflict",
            Self::ProtectedTermRedefinition => "protected term redefinition",
            Self::InvalidFrame => "invalid frame",
            Self::InvalidKeywordEmbedValue => "invalid @embed value",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON-LD processing failure. The code is the stable contract, the message is not.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct JsonLdError {
    code: ErrorCode,
    message: String,
}

impl JsonLdError {
    pub fn new(code: ErrorCode, message: impl fmt::Display) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn loading_document(msg: impl fmt::Display) -> Self {
        Self::new(ErrorCode::LoadingDocumentFailed, msg)
    }

    pub fn invalid_frame(msg: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidFrame, msg)
    }
}

/// Result type alias for JSON-LD operations.
pub type Result<T> = std::result::Result<T, JsonLdError>;

/// Errors raised by the RDF layer (N-Quads and dataset normalization).
#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    #[error("N-Quads parse error: {0}")]
    NQuadsParseError(String),

    #[error("unsupported normalization algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("permutation limit of {0} exceeded while hashing blank nodes")]
    PermutationLimitExceeded(usize),

    #[error("unsupported RDF content type: {0}")]
    UnsupportedContent(String),
}

/// Result type alias for RDF operations.
pub type RdfResult<T> = std::result::Result<T, RdfError>;

impl RdfError {
    pub fn parse(msg: impl fmt::Display) -> Self {
        Self::NQuadsParseError(msg.to_string())
    }
}

impl From<RdfError> for JsonLdError {
    fn from(err: RdfError) -> Self {
        let code = match err {
            RdfError::NQuadsParseError(_) | RdfError::UnsupportedContent(_) => {
                ErrorCode::LoadingDocumentFailed
            }
            RdfError::UnsupportedAlgorithm(_) | RdfError::PermutationLimitExceeded(_) => {
                ErrorCode::Unspecified
            }
        };
        Self::new(code, err)
    }
}
