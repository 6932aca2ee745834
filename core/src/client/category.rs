use super::{parse_empty, parse_json, TestimonialClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Category, CategoryUpdate, NewCategory};

impl TestimonialClient {
    pub fn build_list_categories(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/categorias/")
    }

    pub fn build_get_category(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/categorias/{id}/"))
    }

    pub fn build_create_category(&self, input: &NewCategory) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/categorias/", input)
    }

    pub fn build_update_category(&self, id: u64, input: &CategoryUpdate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, &format!("/categorias/{id}/"), input)
    }

    pub fn build_delete_category(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/categorias/{id}/"))
    }

    pub fn parse_list_categories(&self, response: HttpResponse) -> Result<Vec<Category>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_category(&self, response: HttpResponse) -> Result<Category, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_category(&self, response: HttpResponse) -> Result<Category, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_update_category(&self, response: HttpResponse) -> Result<Category, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_delete_category(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response, 204)
    }
}
