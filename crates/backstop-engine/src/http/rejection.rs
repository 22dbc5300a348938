use axum::extract::path::ErrorKind;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use backstop_classify::{FrameworkError, ParameterLocation};
use http::{HeaderMap, Uri, header};

const QUERY_REJECTION_PREFIX: &str = "Failed to deserialize query string: ";

/// Conversion of axum extractor rejections into [`FrameworkError`]
///
/// Take the extractor as `Result<Json<T>, JsonRejection>` and map the error
/// with this trait so the classifiers see what actually went wrong.
pub trait IntoFrameworkError {
    fn into_framework_error(self) -> FrameworkError;
}

/// Conversion for rejections that drop request detail the handler still has
///
/// `Query` rejections lose the offending raw value and `Json` rejections lose
/// the Content-Type they refused; pass the request's `Uri` or `HeaderMap`
/// back in to recover them.
pub trait IntoFrameworkErrorWith<C: ?Sized> {
    fn into_framework_error_with(self, context: &C) -> FrameworkError;
}

impl IntoFrameworkError for JsonRejection {
    fn into_framework_error(self) -> FrameworkError {
        match self {
            Self::MissingJsonContentType(_) => FrameworkError::UnsupportedMediaType { content_type: None },
            Self::JsonSyntaxError(error) => FrameworkError::body_unreadable(error),
            Self::JsonDataError(error) => FrameworkError::body_unreadable(error),
            Self::BytesRejection(error) => FrameworkError::body_unreadable(error),
            other => FrameworkError::BadRequest {
                message: other.body_text(),
            },
        }
    }
}

impl IntoFrameworkErrorWith<HeaderMap> for JsonRejection {
    fn into_framework_error_with(self, headers: &HeaderMap) -> FrameworkError {
        match self {
            Self::MissingJsonContentType(_) => FrameworkError::UnsupportedMediaType {
                content_type: headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(ToOwned::to_owned),
            },
            other => other.into_framework_error(),
        }
    }
}

impl IntoFrameworkError for QueryRejection {
    fn into_framework_error(self) -> FrameworkError {
        query_failure(self.body_text(), None)
    }
}

impl IntoFrameworkErrorWith<Uri> for QueryRejection {
    fn into_framework_error_with(self, uri: &Uri) -> FrameworkError {
        query_failure(self.body_text(), uri.query())
    }
}

fn query_failure(message: String, query: Option<&str>) -> FrameworkError {
    if let Some(name) = missing_field(&message) {
        return FrameworkError::MissingParameter {
            name: name.to_owned(),
            location: ParameterLocation::Query,
            required_type: String::new(),
        };
    }

    match failed_field(&message) {
        Some((property, reason)) => FrameworkError::TypeMismatch {
            property: property.to_owned(),
            value: query.and_then(|query| raw_value(query, property)).unwrap_or_default(),
            required_type: parse_target(reason).to_owned(),
        },
        None => FrameworkError::BadRequest { message },
    }
}

impl IntoFrameworkError for PathRejection {
    fn into_framework_error(self) -> FrameworkError {
        let Self::FailedToDeserializePathParams(error) = &self else {
            return FrameworkError::BadRequest {
                message: self.body_text(),
            };
        };

        match error.kind() {
            ErrorKind::ParseErrorAtKey {
                key,
                value,
                expected_type,
                ..
            } => FrameworkError::TypeMismatch {
                property: key.clone(),
                value: value.clone(),
                required_type: (*expected_type).to_owned(),
            },
            ErrorKind::ParseErrorAtIndex {
                index,
                value,
                expected_type,
                ..
            } => FrameworkError::TypeMismatch {
                property: index.to_string(),
                value: value.clone(),
                required_type: (*expected_type).to_owned(),
            },
            ErrorKind::ParseError {
                value,
                expected_type,
                ..
            } => FrameworkError::TypeMismatch {
                property: "path".to_owned(),
                value: value.clone(),
                required_type: (*expected_type).to_owned(),
            },
            _ => FrameworkError::BadRequest {
                message: self.body_text(),
            },
        }
    }
}

/// Field name from serde's "missing field `name`" message
fn missing_field(message: &str) -> Option<&str> {
    let start = message.find("missing field `")? + "missing field `".len();
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}

/// Field and reason from a rejection reading "<prefix><field>: <reason>"
fn failed_field(message: &str) -> Option<(&str, &str)> {
    let (field, reason) = message.strip_prefix(QUERY_REJECTION_PREFIX)?.split_once(": ")?;
    (!field.is_empty() && !field.contains(char::is_whitespace)).then_some((field, reason))
}

/// First decoded value of `key` in a raw query string
fn raw_value(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

/// Type name implied by a standard library parse failure
///
/// Integer widths are indistinguishable from the message alone, so every
/// integer failure reports as `i32`. Anything unrecognised yields an empty
/// name.
fn parse_target(reason: &str) -> &'static str {
    match reason {
        "invalid digit found in string"
        | "cannot parse integer from empty string"
        | "number too large to fit in target type"
        | "number too small to fit in target type" => "i32",
        "invalid float literal" => "f64",
        "provided string was not `true` or `false`" => "bool",
        "too many characters in string" | "cannot parse char from empty string" => "char",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::body::Body;
    use axum::extract::{FromRequest, Query};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Search {
        #[allow(dead_code)]
        limit: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Flag {
        #[allow(dead_code)]
        archived: bool,
    }

    fn query_rejection<T: serde::de::DeserializeOwned + std::fmt::Debug>(uri: &Uri) -> QueryRejection {
        Query::<T>::try_from_uri(uri).unwrap_err()
    }

    #[test]
    fn query_type_mismatch_carries_the_raw_value() {
        let uri: Uri = "/search?limit=abc&sort=asc".parse().unwrap();
        let error = query_rejection::<Search>(&uri).into_framework_error_with(&uri);

        let FrameworkError::TypeMismatch {
            property,
            value,
            required_type,
        } = error
        else {
            panic!("expected a type mismatch, got {error:?}");
        };
        assert_eq!(property, "limit");
        assert_eq!(value, "abc");
        assert_eq!(required_type, "i32");
    }

    #[test]
    fn query_type_mismatch_without_the_uri_has_no_value() {
        let uri: Uri = "/search?archived=maybe".parse().unwrap();
        let error = query_rejection::<Flag>(&uri).into_framework_error();

        assert!(
            matches!(&error, FrameworkError::TypeMismatch { property, value, required_type }
                if property == "archived" && value.is_empty() && required_type == "bool"),
            "{error:?}"
        );
    }

    #[test]
    fn missing_query_field_is_a_missing_parameter() {
        let uri: Uri = "/search".parse().unwrap();
        let error = query_rejection::<Search>(&uri).into_framework_error_with(&uri);

        assert!(
            matches!(&error, FrameworkError::MissingParameter { name, location: ParameterLocation::Query, .. } if name == "limit"),
            "{error:?}"
        );
    }

    #[tokio::test]
    async fn refused_content_type_is_kept() {
        let request = http::Request::post("/orders")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(r#"{"count": 2}"#))
            .unwrap();
        let headers = request.headers().clone();
        let rejection = Json::<serde_json::Value>::from_request(request, &()).await.unwrap_err();

        let error = rejection.into_framework_error_with(&headers);
        assert!(
            matches!(&error, FrameworkError::UnsupportedMediaType { content_type: Some(content_type) } if content_type == "text/plain"),
            "{error:?}"
        );
    }

    #[test]
    fn parse_failures_name_their_target() {
        assert_eq!(parse_target("invalid digit found in string"), "i32");
        assert_eq!(parse_target("invalid float literal"), "f64");
        assert_eq!(parse_target("something else"), "");
    }

    #[test]
    fn failed_field_needs_a_field_name() {
        assert_eq!(
            failed_field("Failed to deserialize query string: limit: invalid digit found in string"),
            Some(("limit", "invalid digit found in string"))
        );
        assert_eq!(failed_field("Failed to deserialize query string: missing field `limit`"), None);
        assert_eq!(failed_field("limit: invalid digit found in string"), None);
    }

    #[test]
    fn extracts_missing_field_names() {
        assert_eq!(
            missing_field("Failed to deserialize query string: missing field `limit`"),
            Some("limit")
        );
        assert_eq!(missing_field("invalid digit found in string"), None);
        assert_eq!(missing_field("missing field `unterminated"), None);
    }
}
