use serde_json::json;

use super::{parse_json, TestimonialClient};
use crate::error::{ApiError, ValidationError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Ack, Credentials, LoginResponse, NewUser, RefreshResponse, User};

impl TestimonialClient {
    /// Rejects blank credentials before anything is sent.
    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        if credentials.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        if credentials.password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }
        self.json_request(HttpMethod::Post, "/login/", credentials)
    }

    pub fn build_logout(&self) -> HttpRequest {
        self.request(HttpMethod::Post, "/logout/")
    }

    pub fn build_refresh_token(&self, refresh: &str) -> Result<HttpRequest, ApiError> {
        if refresh.is_empty() {
            return Err(ValidationError::MissingField("refresh token").into());
        }
        self.json_request(HttpMethod::Post, "/token/refresh/", &json!({ "refresh": refresh }))
    }

    /// Registration creates a visitor.
    pub fn build_register(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/visitantes/", input)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        parse_json(response, 200)
    }

    /// The logout body is optional; an empty 200 counts as success.
    pub fn parse_logout(&self, response: HttpResponse) -> Result<Ack, ApiError> {
        if response.status == 200 && response.body.trim().is_empty() {
            return Ok(Ack {
                success: true,
                message: None,
            });
        }
        parse_json(response, 200)
    }

    pub fn parse_refresh_token(&self, response: HttpResponse) -> Result<RefreshResponse, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response, 201)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TestimonialClient {
        TestimonialClient::new("http://localhost:3000")
    }

    #[test]
    fn build_login_posts_credentials() {
        let req = client()
            .build_login(&Credentials {
                email: "ana@example.com".to_string(),
                password: "secret".to_string(),
            })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/app/login/");
        let body: serde_json::Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
        assert_eq!(body["email"], "ana@example.com");
        assert_eq!(body["password"], "secret");
    }

    #[test]
    fn build_login_rejects_blank_email() {
        let err = client()
            .build_login(&Credentials {
                email: "  ".to_string(),
                password: "secret".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::MissingField("email"))));
    }

    #[test]
    fn parse_login_reads_role_claim() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"user_id":4,"rol":"editor","access":"a","refresh":"r"}"#.to_string(),
        };
        let login = client().parse_login(response).unwrap();
        assert_eq!(login.user_id, 4);
        assert_eq!(login.rol.as_deref(), Some("editor"));
        assert_eq!(login.refresh.as_deref(), Some("r"));
    }

    #[test]
    fn build_refresh_token_sends_refresh_field() {
        let req = client().build_refresh_token("r-1").unwrap();
        assert_eq!(req.path, "http://localhost:3000/app/token/refresh/");
        let body: serde_json::Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
        assert_eq!(body, json!({ "refresh": "r-1" }));
    }

    #[test]
    fn parse_logout_accepts_empty_body() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(client().parse_logout(response).unwrap().success);
    }

    #[test]
    fn parse_register_expects_created() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"id":1,"username":"ana","email":"ana@example.com"}"#.to_string(),
        };
        let err = client().parse_register(response).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 200, expected: 201, .. }));
    }
}
