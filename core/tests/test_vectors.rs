//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and either the expected parse result or the expected error. Comparing
//! parsed JSON (not raw strings) avoids false negatives from field-ordering
//! differences.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde_json::Value;
use testimonios_core::{
    ApiError, AttachmentSet, CategoryUpdate, Credentials, HttpMethod, HttpRequest, HttpResponse, NewCategory,
    NewTestimonial, TestimonialClient, TestimonialStatus, UserCollection,
};

const BASE_URL: &str = "http://localhost:3000";

fn client() -> TestimonialClient {
    TestimonialClient::new(BASE_URL)
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

/// Compare a parse outcome with `expected_result` or `expected_error`.
fn assert_outcome<T: DeserializeOwned + PartialEq + Debug>(name: &str, result: Result<T, ApiError>, case: &Value) {
    match case.get("expected_error") {
        Some(expected) => {
            let err = result.expect_err(name);
            assert_eq!(
                err.status_code().map(u64::from),
                expected["status"].as_u64(),
                "{name}: error status"
            );
            assert_eq!(err.to_string(), expected["message"].as_str().unwrap(), "{name}: error message");
        }
        None => {
            let parsed = result.unwrap_or_else(|e| panic!("{name}: {e}"));
            let expected: T = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(parsed, expected, "{name}: parsed result");
        }
    }
}

fn id(case: &Value) -> u64 {
    case["id"].as_u64().unwrap()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[test]
fn auth_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/auth.json")) {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];
        match case["operation"].as_str().unwrap() {
            "login" => {
                let input: Credentials = serde_json::from_value(case["input"].clone()).unwrap();
                assert_request(name, &c.build_login(&input).unwrap(), expected_req);
                assert_outcome(name, c.parse_login(simulated(&case)), &case);
            }
            "refresh_token" => {
                let refresh = case["input"].as_str().unwrap();
                assert_request(name, &c.build_refresh_token(refresh).unwrap(), expected_req);
                assert_outcome(name, c.parse_refresh_token(simulated(&case)), &case);
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[test]
fn category_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/categories.json")) {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];
        match case["operation"].as_str().unwrap() {
            "list" => {
                assert_request(name, &c.build_list_categories(), expected_req);
                assert_outcome(name, c.parse_list_categories(simulated(&case)), &case);
            }
            "get" => {
                assert_request(name, &c.build_get_category(id(&case)), expected_req);
                assert_outcome(name, c.parse_get_category(simulated(&case)), &case);
            }
            "create" => {
                let input: NewCategory = serde_json::from_value(case["input"].clone()).unwrap();
                assert_request(name, &c.build_create_category(&input).unwrap(), expected_req);
                assert_outcome(name, c.parse_create_category(simulated(&case)), &case);
            }
            "update" => {
                let input: CategoryUpdate = serde_json::from_value(case["input"].clone()).unwrap();
                assert_request(name, &c.build_update_category(id(&case), &input).unwrap(), expected_req);
                assert_outcome(name, c.parse_update_category(simulated(&case)), &case);
            }
            "delete" => {
                assert_request(name, &c.build_delete_category(id(&case)), expected_req);
                assert_outcome(name, c.parse_delete_category(simulated(&case)), &case);
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Organizations and users
// ---------------------------------------------------------------------------

fn collection(case: &Value) -> UserCollection {
    match case["collection"].as_str().unwrap() {
        "visitantes" => UserCollection::Visitors,
        "editores" => UserCollection::Editors,
        "administradores" => UserCollection::Admins,
        other => panic!("unknown collection: {other}"),
    }
}

#[test]
fn organization_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/organizations.json")) {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];
        match case["operation"].as_str().unwrap() {
            "approved_testimonials" => {
                assert_request(name, &c.build_approved_testimonials(id(&case)), expected_req);
                assert_outcome(name, c.parse_approved_testimonials(simulated(&case)), &case);
            }
            "add_editors" => {
                let members: Vec<u64> = serde_json::from_value(case["members"].clone()).unwrap();
                assert_request(name, &c.build_add_editors(id(&case), &members).unwrap(), expected_req);
                assert_outcome(name, c.parse_add_editors(simulated(&case)), &case);
            }
            "get_user" => {
                assert_request(name, &c.build_get_user(collection(&case), id(&case)), expected_req);
                assert_outcome(name, c.parse_get_user(simulated(&case)), &case);
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Testimonials
// ---------------------------------------------------------------------------

#[test]
fn testimonial_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/testimonials.json")) {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];
        match case["operation"].as_str().unwrap() {
            "create" => {
                let input: NewTestimonial = serde_json::from_value(case["input"].clone()).unwrap();
                let req = c.build_create_testimonial(&input, &AttachmentSet::new()).unwrap();
                assert_request(name, &req, expected_req);
                assert_outcome(name, c.parse_create_testimonial(simulated(&case)), &case);
            }
            "list" => {
                assert_request(name, &c.build_list_testimonials(), expected_req);
                assert_outcome(name, c.parse_list_testimonials(simulated(&case)), &case);
            }
            "approve" => {
                assert_request(name, &c.build_approve_testimonial(id(&case)), expected_req);
                assert_outcome(name, c.parse_approve_testimonial(simulated(&case)), &case);
            }
            "reject" => {
                let feedback = case["feedback"].as_str().unwrap();
                let req = c.build_reject_testimonial(id(&case), feedback).unwrap();
                assert_request(name, &req, expected_req);
                assert_outcome(name, c.parse_reject_testimonial(simulated(&case)), &case);
            }
            "change_status" => {
                let status: TestimonialStatus = case["status"].as_str().unwrap().parse().unwrap();
                let req = c
                    .build_change_status(id(&case), status, case["feedback"].as_str())
                    .unwrap();
                assert_request(name, &req, expected_req);
                assert_outcome(name, c.parse_change_status(simulated(&case)), &case);
            }
            "statistics" => {
                assert_request(name, &c.build_testimonial_statistics(), expected_req);
                assert_outcome(name, c.parse_testimonial_statistics(simulated(&case)), &case);
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}

#[test]
fn blank_feedback_builds_nothing() {
    let c = client();
    for feedback in ["", "   ", "\n\t"] {
        let err = c.build_reject_testimonial(2, feedback).unwrap_err();
        assert!(err.is_validation(), "{feedback:?}");
        let err = c
            .build_change_status(2, TestimonialStatus::Rejected, Some(feedback))
            .unwrap_err();
        assert!(err.is_validation(), "{feedback:?}");
    }
    assert!(c
        .build_change_status(2, TestimonialStatus::Rejected, None)
        .unwrap_err()
        .is_validation());
}
