//! RFC 9457 Problem for routing and link errors (pure data).
//!
//! The host HTTP layer attaches the instance path and trace id before turning
//! the Problem into a response.

use http::StatusCode;
use serde::{Serialize, Serializer};

use crate::error::{Error, ErrorKind};

/// Problem body produced for an [`Error`].
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: &'static str,
    pub title: &'static str,
    #[serde(serialize_with = "status_as_u16")]
    pub status: StatusCode,
    pub detail: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instance: String,
    /// Machine-readable code, e.g. `odata.routing.invalid_operation`.
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn status_as_u16<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

/// Status, title and code shared by one error family.
#[derive(Debug, Clone, Copy)]
struct ErrDef {
    status: StatusCode,
    title: &'static str,
    code: &'static str,
}

const PRECONDITION: ErrDef = ErrDef {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    title: "Missing Argument",
    code: "odata.routing.argument_null",
};

const INVALID_OPERATION: ErrDef = ErrDef {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    title: "Invalid Operation",
    code: "odata.routing.invalid_operation",
};

const INVALID_INPUT: ErrDef = ErrDef {
    status: StatusCode::BAD_REQUEST,
    title: "Invalid Request",
    code: "odata.routing.invalid_input",
};

impl From<Error> for Problem {
    fn from(err: Error) -> Self {
        let def = match err.kind() {
            ErrorKind::PreconditionViolation => PRECONDITION,
            ErrorKind::InvalidOperation => INVALID_OPERATION,
            ErrorKind::InvalidInput => INVALID_INPUT,
        };
        Problem {
            type_url: "about:blank",
            title: def.title,
            status: def.status,
            detail: err.to_string(),
            instance: String::new(),
            code: def.code,
            trace_id: None,
        }
    }
}

/// Returns a contextualized Problem for a routing or link error.
pub fn error_to_problem(err: &Error, instance: &str, trace_id: Option<String>) -> Problem {
    if err.kind() != ErrorKind::InvalidInput {
        tracing::error!(error = %err, instance, "OData routing failure");
    }

    Problem {
        instance: instance.to_owned(),
        trace_id,
        ..Problem::from(err.clone())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operation_maps_to_500() {
        let problem: Problem = Error::IdLinkUnavailable {
            navigation_source: "Cars".to_owned(),
        }
        .into();

        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(problem.code, "odata.routing.invalid_operation");
        assert!(problem.detail.contains("Cars"));
    }

    #[test]
    fn test_invalid_path_maps_to_400() {
        let problem: Problem = Error::InvalidPath("$count must be last".to_owned()).into();
        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
        assert_eq!(problem.title, "Invalid Request");
    }

    #[test]
    fn test_error_to_problem_adds_context() {
        let problem = error_to_problem(
            &Error::MissingRouteName,
            "/odata/Cars",
            Some("trace-1".to_owned()),
        );
        assert_eq!(problem.instance, "/odata/Cars");
        assert_eq!(problem.trace_id.as_deref(), Some("trace-1"));
    }

    #[test]
    fn test_problem_serializes_status_as_u16() {
        let problem: Problem = Error::InvalidPageSize.into();
        let json = serde_json::to_string(&problem).unwrap();
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"type\":\"about:blank\""));
        assert!(!json.contains("instance"));
        assert!(!json.contains("trace_id"));
    }
}
