use serde_json::json;

use super::{parse_empty, parse_json, TestimonialClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{MembershipResponse, NewOrganization, Organization, OrganizationUpdate, Testimonial};

impl TestimonialClient {
    pub fn build_list_organizations(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/organizacion/")
    }

    pub fn build_get_organization(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/organizacion/{id}/"))
    }

    pub fn build_create_organization(&self, input: &NewOrganization) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/organizacion/", input)
    }

    pub fn build_update_organization(
        &self,
        id: u64,
        input: &OrganizationUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, &format!("/organizacion/{id}/"), input)
    }

    pub fn build_delete_organization(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/organizacion/{id}/"))
    }

    pub fn build_add_editors(&self, organization_id: u64, editor_ids: &[u64]) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Post,
            &format!("/organizacion/{organization_id}/agregar-editores/"),
            &json!({ "editores": editor_ids }),
        )
    }

    pub fn build_add_visitors(&self, organization_id: u64, visitor_ids: &[u64]) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Post,
            &format!("/organizacion/{organization_id}/agregar-visitantes/"),
            &json!({ "visitantes": visitor_ids }),
        )
    }

    /// Public listing used by the landing pages.
    pub fn build_approved_testimonials(&self, organization_id: u64) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/organizacion/{organization_id}/testimonios-aprobados/"),
        )
    }

    pub fn parse_list_organizations(&self, response: HttpResponse) -> Result<Vec<Organization>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_organization(&self, response: HttpResponse) -> Result<Organization, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_organization(&self, response: HttpResponse) -> Result<Organization, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_update_organization(&self, response: HttpResponse) -> Result<Organization, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_delete_organization(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response, 204)
    }

    pub fn parse_add_editors(&self, response: HttpResponse) -> Result<MembershipResponse, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_add_visitors(&self, response: HttpResponse) -> Result<MembershipResponse, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_approved_testimonials(&self, response: HttpResponse) -> Result<Vec<Testimonial>, ApiError> {
        parse_json(response, 200)
    }
}
