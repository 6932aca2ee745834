use super::ActionStatus;
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::session::SessionStorage;
use crate::transport::Transport;
use crate::types::{Category, CategoryUpdate, NewCategory};

/// Categories change rarely; `ensure_loaded` fetches them once per session.
#[derive(Debug, Clone, Default)]
pub struct CategoryStore {
    pub categories: Vec<Category>,
    pub current: Option<Category>,
    pub status: ActionStatus,
    loaded: bool,
}

impl CategoryStore {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn fetch_categories<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
    ) -> Result<&[Category], ApiError> {
        self.categories = self.status.run("fetch_categories", || api.list_categories())?;
        self.loaded = true;
        Ok(&self.categories)
    }

    /// Fetch only when nothing has been loaded yet.
    pub fn ensure_loaded<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
    ) -> Result<&[Category], ApiError> {
        if self.loaded {
            return Ok(&self.categories);
        }
        self.fetch_categories(api)
    }

    pub fn fetch_category<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        id: u64,
    ) -> Result<Category, ApiError> {
        let category = self.status.run("fetch_category", || api.get_category(id))?;
        self.current = Some(category.clone());
        Ok(category)
    }

    pub fn create<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        input: &NewCategory,
    ) -> Result<Category, ApiError> {
        let category = self.status.run("create_category", || api.create_category(input))?;
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn update<T: Transport, S: SessionStorage>(
        &mut self,
        api: &ApiClient<T, S>,
        id: u64,
        input: &CategoryUpdate,
    ) -> Result<Category, ApiError> {
        let category = self.status.run("update_category", || api.update_category(id, input))?;
        if let Some(slot) = self.categories.iter_mut().find(|c| c.id == id) {
            *slot = category.clone();
        }
        if self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = Some(category.clone());
        }
        Ok(category)
    }

    pub fn delete<T: Transport, S: SessionStorage>(&mut self, api: &ApiClient<T, S>, id: u64) -> Result<(), ApiError> {
        self.status.run("delete_category", || api.delete_category(id))?;
        self.categories.retain(|c| c.id != id);
        if self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::session::MemoryStorage;
    use crate::transport::fake::{response, RecordingTransport};

    const LIST: &str = r##"[{"id":1,"nombre_categoria":"Food","icono":"utensils","color":"#f00"},
                            {"id":2,"nombre_categoria":"Travel","icono":"plane","color":"#00f"}]"##;

    fn api() -> ApiClient<RecordingTransport, MemoryStorage> {
        let transport = RecordingTransport::new(|req| {
            let path = req.path.trim_start_matches("http://localhost:3000/app");
            let reply = match (req.method, path) {
                (HttpMethod::Get, "/categorias/") => response(200, LIST),
                (HttpMethod::Get, "/categorias/2/") => {
                    response(200, r##"{"id":2,"nombre_categoria":"Travel","icono":"plane","color":"#00f"}"##)
                }
                (HttpMethod::Post, "/categorias/") => {
                    response(201, r##"{"id":3,"nombre_categoria":"Tech","icono":"chip","color":"#0f0"}"##)
                }
                (HttpMethod::Patch, "/categorias/2/") => {
                    response(200, r##"{"id":2,"nombre_categoria":"Trips","icono":"plane","color":"#00f"}"##)
                }
                (HttpMethod::Delete, "/categorias/2/") => response(204, ""),
                _ => response(404, ""),
            };
            Ok(reply)
        });
        ApiClient::new("http://localhost:3000", transport, MemoryStorage::new())
    }

    #[test]
    fn ensure_loaded_fetches_once() {
        let api = api();
        let mut store = CategoryStore::default();
        assert!(!store.is_loaded());
        assert_eq!(store.ensure_loaded(&api).unwrap().len(), 2);
        assert_eq!(store.ensure_loaded(&api).unwrap().len(), 2);
        assert_eq!(api.transport().count(), 1);

        store.fetch_categories(&api).unwrap();
        assert_eq!(api.transport().count(), 2);
    }

    #[test]
    fn update_and_delete_keep_list_and_current_in_sync() {
        let api = api();
        let mut store = CategoryStore::default();
        store.fetch_categories(&api).unwrap();
        store.fetch_category(&api, 2).unwrap();

        let update = CategoryUpdate {
            name: Some("Trips".to_string()),
            ..CategoryUpdate::default()
        };
        store.update(&api, 2, &update).unwrap();
        assert_eq!(store.categories[1].name, "Trips");
        assert_eq!(store.current.as_ref().unwrap().name, "Trips");

        store.delete(&api, 2).unwrap();
        assert_eq!(store.categories.len(), 1);
        assert!(store.current.is_none());
    }

    #[test]
    fn create_appends() {
        let api = api();
        let mut store = CategoryStore::default();
        store.fetch_categories(&api).unwrap();
        let created = store
            .create(
                &api,
                &NewCategory {
                    name: "Tech".to_string(),
                    icon: "chip".to_string(),
                    color: "#0f0".to_string(),
                },
            )
            .unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(store.categories.last().map(|c| c.id), Some(3));
    }

    #[test]
    fn failed_fetch_is_not_marked_loaded() {
        let api = ApiClient::new(
            "http://localhost:3000",
            RecordingTransport::fixed(500, r#"{"error":"boom"}"#),
            MemoryStorage::new(),
        );
        let mut store = CategoryStore::default();
        assert!(store.ensure_loaded(&api).is_err());
        assert!(!store.is_loaded());
        assert_eq!(store.status.error.as_deref(), Some("[fetch_categories] HTTP 500: boom"));
    }
}
