use super::{parse_empty, parse_json, TestimonialClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{NewUser, User, UserCollection, UserUpdate};

impl TestimonialClient {
    pub fn build_list_users(&self, collection: UserCollection) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/{}/", collection.path_segment()))
    }

    pub fn build_get_user(&self, collection: UserCollection, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/{}/{id}/", collection.path_segment()))
    }

    pub fn build_create_user(&self, collection: UserCollection, input: &NewUser) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &format!("/{}/", collection.path_segment()), input)
    }

    pub fn build_update_user(
        &self,
        collection: UserCollection,
        id: u64,
        input: &UserUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/{}/{id}/", collection.path_segment()),
            input,
        )
    }

    pub fn build_delete_user(&self, collection: UserCollection, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/{}/{id}/", collection.path_segment()))
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<Vec<User>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_empty(response, 204)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_paths_follow_collection() {
        let client = TestimonialClient::new("http://localhost:3000");
        assert_eq!(
            client.build_get_user(UserCollection::Visitors, 5).path,
            "http://localhost:3000/app/visitantes/5/"
        );
        assert_eq!(
            client.build_list_users(UserCollection::Editors).path,
            "http://localhost:3000/app/editores/"
        );
        let req = client.build_delete_user(UserCollection::Admins, 1);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://localhost:3000/app/administradores/1/");
    }

    #[test]
    fn build_update_user_omits_unset_fields() {
        let client = TestimonialClient::new("http://localhost:3000");
        let input = UserUpdate {
            username: Some("ana2".to_string()),
            ..Default::default()
        };
        let req = client.build_update_user(UserCollection::Editors, 2, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        let body: serde_json::Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "username": "ana2" }));
    }
}
