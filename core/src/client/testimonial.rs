use serde_json::json;

use super::{parse_empty, parse_json, TestimonialClient};
use crate::error::{ApiError, ValidationError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
use crate::types::{NewTestimonial, Testimonial, TestimonialStatistics, TestimonialStatus, TestimonialUpdate};
use crate::validation::{validate_feedback, validate_rating, AttachmentSet};

/// Multipart field name repeated once per attached file.
pub const ATTACHMENT_FIELD: &str = "archivos";

impl TestimonialClient {
    /// Public listing (approved and published testimonials).
    pub fn build_list_testimonials(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/testimonios/")
    }

    pub fn build_get_testimonial(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/testimonios/{id}/"))
    }

    /// JSON when `attachments` is empty, multipart otherwise.
    pub fn build_create_testimonial(
        &self,
        input: &NewTestimonial,
        attachments: &AttachmentSet,
    ) -> Result<HttpRequest, ApiError> {
        if input.comment.trim().is_empty() {
            return Err(ValidationError::MissingField("comment").into());
        }
        validate_rating(&input.rating)?;

        if attachments.is_empty() {
            return self.json_request(HttpMethod::Post, "/testimonios/", input);
        }

        let mut form = MultipartForm::new();
        for (name, value) in input.form_fields() {
            form = form.text(name, value);
        }
        for file in attachments.files() {
            form = form.file(ATTACHMENT_FIELD, &file.name, &file.mime_type, file.data.clone());
        }
        let body = RequestBody::Multipart(form);
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url("/testimonios/"),
            headers: vec![("content-type".to_string(), body.content_type())],
            body: Some(body),
        })
    }

    pub fn build_update_testimonial(&self, id: u64, input: &TestimonialUpdate) -> Result<HttpRequest, ApiError> {
        if let Some(rating) = &input.rating {
            validate_rating(rating)?;
        }
        self.json_request(HttpMethod::Patch, &format!("/testimonios/{id}/"), input)
    }

    pub fn build_delete_testimonial(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/testimonios/{id}/"))
    }

    /// Testimonials scoped to the caller: a visitor's own, an editor's
    /// organizations', or all of them for an admin.
    pub fn build_list_own_testimonials(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/testimonios-totales/")
    }

    pub fn build_get_own_testimonial(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/testimonios-totales/{id}/"))
    }

    pub fn build_testimonial_statistics(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/testimonios-totales/estadisticas/")
    }

    pub fn build_approve_testimonial(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Post, &format!("/testimonio/{id}/aprobar/"))
    }

    /// Fails validation, without building anything, when `feedback` is blank.
    pub fn build_reject_testimonial(&self, id: u64, feedback: &str) -> Result<HttpRequest, ApiError> {
        let feedback = validate_feedback(feedback)?;
        self.json_request(
            HttpMethod::Post,
            &format!("/testimonio/{id}/rechazar/"),
            &json!({ "feedback": feedback }),
        )
    }

    /// Feedback is sent only when `status` is `Rejected`, where it is
    /// required; for every other target it is ignored.
    pub fn build_change_status(
        &self,
        id: u64,
        status: TestimonialStatus,
        feedback: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let body = match status {
            TestimonialStatus::Rejected => {
                let feedback = validate_feedback(feedback.unwrap_or_default())?;
                json!({ "estado": status.code(), "feedback": feedback })
            }
            _ => json!({ "estado": status.code() }),
        };
        self.json_request(HttpMethod::Patch, &format!("/testimonios-cambiar-estado/{id}/"), &body)
    }

    /// The service moves the testimonial to `Rejected` when feedback is added.
    pub fn build_add_feedback(&self, id: u64, feedback: &str) -> Result<HttpRequest, ApiError> {
        let feedback = validate_feedback(feedback)?;
        self.json_request(
            HttpMethod::Patch,
            &format!("/testimonios-feedback/{id}/"),
            &json!({ "feedback": feedback }),
        )
    }

    pub fn parse_list_testimonials(&self, response: HttpResponse) -> Result<Vec<Testimonial>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_testimonial(&self, response: HttpResponse) -> Result<Testimonial, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_testimonial(&self, response: HttpResponse) -> Result<Testimonial, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_update_testimonial(&self, response: HttpResponse) -> Result<Testimonial, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_delete_testimonial(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response, 204)
    }

    pub fn parse_list_own_testimonials(&self, response: HttpResponse) -> Result<Vec<Testimonial>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_own_testimonial(&self, response: HttpResponse) -> Result<Testimonial, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_testimonial_statistics(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<TestimonialStatistics>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_approve_testimonial(&self, response: HttpResponse) -> Result<Testimonial, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_reject_testimonial(&self, response: HttpResponse) -> Result<Testimonial, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_change_status(&self, response: HttpResponse) -> Result<Testimonial, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_add_feedback(&self, response: HttpResponse) -> Result<Testimonial, ApiError> {
        parse_json(response, 200)
    }
}
