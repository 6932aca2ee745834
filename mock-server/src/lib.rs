//! In-memory implementation of the testimonial service's REST contract.
//!
//! Serves every route under `/app/` that the client consumes, with `JWT`
//! token authentication and the group rules the client relies on: role
//! collections answer 404 for users outside them, moderation is limited to
//! admins and the editors of the testimonial's organization, and
//! `/testimonios-totales/` is scoped to the caller.
//!
//! `app()` starts from a small seeded dataset (see `seed`).

mod auth;
mod catalog;
pub mod model;
mod testimonials;
mod users;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use model::{Account, Category, Group, OrganizationRecord, Status, Testimonial};

/// Credentials and ids of the seeded dataset.
pub mod seed {
    pub const PASSWORD: &str = "password123";

    pub const ADMIN_ID: u64 = 1;
    pub const ADMIN_EMAIL: &str = "admin@example.com";
    pub const EDITOR_ID: u64 = 2;
    pub const EDITOR_EMAIL: &str = "editor@example.com";
    pub const VISITOR_ID: u64 = 3;
    pub const VISITOR_EMAIL: &str = "visitor@example.com";
    pub const UNGROUPED_ID: u64 = 4;
    pub const UNGROUPED_EMAIL: &str = "nobody@example.com";

    pub const CATEGORY_ID: u64 = 1;
    pub const ORGANIZATION_ID: u64 = 1;
    pub const ORGANIZATION_API_KEY: &str = "acme-api-key";

    /// Approved, written by the seeded visitor.
    pub const APPROVED_TESTIMONIAL_ID: u64 = 1;
    /// Waiting for moderation, anonymous.
    pub const PENDING_TESTIMONIAL_ID: u64 = 2;
}

/// Largest request body accepted, enough for four 5 MiB attachments.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug)]
pub struct Store {
    accounts: BTreeMap<u64, Account>,
    access_tokens: HashMap<String, u64>,
    refresh_tokens: HashMap<String, u64>,
    categories: BTreeMap<u64, Category>,
    organizations: BTreeMap<u64, OrganizationRecord>,
    testimonials: BTreeMap<u64, Testimonial>,
    next_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

impl Store {
    pub fn empty() -> Self {
        Self {
            accounts: BTreeMap::new(),
            access_tokens: HashMap::new(),
            refresh_tokens: HashMap::new(),
            categories: BTreeMap::new(),
            organizations: BTreeMap::new(),
            testimonials: BTreeMap::new(),
            next_id: 100,
        }
    }

    pub fn seeded() -> Self {
        let mut store = Self::empty();
        for (id, username, email, group) in [
            (seed::ADMIN_ID, "admin", seed::ADMIN_EMAIL, Group::Admin),
            (seed::EDITOR_ID, "editor", seed::EDITOR_EMAIL, Group::Editor),
            (seed::VISITOR_ID, "visitor", seed::VISITOR_EMAIL, Group::Visitor),
            (seed::UNGROUPED_ID, "nobody", seed::UNGROUPED_EMAIL, Group::Ungrouped),
        ] {
            store.accounts.insert(
                id,
                Account {
                    id,
                    username: username.to_string(),
                    email: email.to_string(),
                    password: seed::PASSWORD.to_string(),
                    group,
                },
            );
        }
        store.categories.insert(
            seed::CATEGORY_ID,
            Category {
                id: seed::CATEGORY_ID,
                nombre_categoria: "Servicio".to_string(),
                icono: "star".to_string(),
                color: "#f59e0b".to_string(),
                fecha_registro: None,
            },
        );
        store.organizations.insert(
            seed::ORGANIZATION_ID,
            OrganizationRecord {
                id: seed::ORGANIZATION_ID,
                name: "Acme".to_string(),
                domain: "acme.example.com".to_string(),
                api_key: seed::ORGANIZATION_API_KEY.to_string(),
                editors: vec![seed::EDITOR_ID],
                visitors: vec![seed::VISITOR_ID],
            },
        );
        let base = Testimonial {
            id: seed::APPROVED_TESTIMONIAL_ID,
            organizacion: seed::ORGANIZATION_ID,
            organizacion_nombre: "Acme".to_string(),
            usuario_registrado: Some("visitor".to_string()),
            usuario_anonimo_email: None,
            usuario_anonimo_username: None,
            categoria: seed::CATEGORY_ID,
            categoria_nombre: "Servicio".to_string(),
            comentario: "Excellent support".to_string(),
            enlace: None,
            archivos: Vec::new(),
            ranking: "5.0".to_string(),
            estado: Status::Approved,
            feedback: None,
        };
        let pending = Testimonial {
            id: seed::PENDING_TESTIMONIAL_ID,
            usuario_registrado: None,
            usuario_anonimo_email: Some("guest@example.com".to_string()),
            usuario_anonimo_username: Some("guest".to_string()),
            comentario: "Delivery was slow".to_string(),
            ranking: "2.5".to_string(),
            estado: Status::Wait,
            ..base.clone()
        };
        store.testimonials.insert(base.id, base);
        store.testimonials.insert(pending.id, pending);
        store
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Admins moderate everything, editors the organizations they belong to.
    fn can_moderate(&self, caller: &Account, organization_id: u64) -> bool {
        match caller.group {
            Group::Admin => true,
            Group::Editor => self
                .organizations
                .get(&organization_id)
                .is_some_and(|org| org.editors.contains(&caller.id)),
            _ => false,
        }
    }

    fn is_author(caller: &Account, testimonial: &Testimonial) -> bool {
        testimonial.usuario_registrado.as_deref() == Some(caller.username.as_str())
    }

    fn visible_to(&self, caller: &Account, testimonial: &Testimonial) -> bool {
        Self::is_author(caller, testimonial) || self.can_moderate(caller, testimonial.organizacion)
    }
}

/// An error reply: a status and a JSON body shaped like the real service's.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    body: Value,
}

impl Failure {
    pub fn detail(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            body: json!({ "detail": detail }),
        }
    }

    /// A field validation error, `{"field": ["message"]}`.
    pub fn field(field: &str, message: &str) -> Self {
        let mut body = serde_json::Map::new();
        body.insert(field.to_string(), json!([message]));
        Self {
            status: StatusCode::BAD_REQUEST,
            body: Value::Object(body),
        }
    }

    pub fn not_found() -> Self {
        Self::detail(StatusCode::NOT_FOUND, "Not found.")
    }

    pub fn forbidden() -> Self {
        Self::detail(
            StatusCode::FORBIDDEN,
            "You do not have permission to perform this action.",
        )
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn app() -> Router {
    app_with_store(Store::seeded())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let router = Router::new()
        .route("/app/login/", post(auth::login))
        .route("/app/logout/", post(auth::logout))
        .route("/app/token/refresh/", post(auth::refresh))
        .route("/app/categorias/", get(catalog::list_categories).post(catalog::create_category))
        .route(
            "/app/categorias/{id}/",
            get(catalog::get_category)
                .patch(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route(
            "/app/organizacion/",
            get(catalog::list_organizations).post(catalog::create_organization),
        )
        .route(
            "/app/organizacion/{id}/",
            get(catalog::get_organization)
                .patch(catalog::update_organization)
                .delete(catalog::delete_organization),
        )
        .route("/app/organizacion/{id}/agregar-editores/", post(catalog::add_editors))
        .route("/app/organizacion/{id}/agregar-visitantes/", post(catalog::add_visitors))
        .route(
            "/app/organizacion/{id}/testimonios-aprobados/",
            get(testimonials::approved_for_organization),
        )
        .route(
            "/app/testimonios/",
            get(testimonials::list_public).post(testimonials::create),
        )
        .route(
            "/app/testimonios/{id}/",
            get(testimonials::get_one)
                .patch(testimonials::update)
                .delete(testimonials::delete),
        )
        .route("/app/testimonios-totales/", get(testimonials::list_own))
        .route("/app/testimonios-totales/estadisticas/", get(testimonials::statistics))
        .route("/app/testimonios-totales/{id}/", get(testimonials::get_own))
        .route("/app/testimonio/{id}/aprobar/", post(testimonials::approve))
        .route("/app/testimonio/{id}/rechazar/", post(testimonials::reject))
        .route("/app/testimonios-cambiar-estado/{id}/", patch(testimonials::change_status))
        .route("/app/testimonios-feedback/{id}/", patch(testimonials::add_feedback));

    users::routes(router)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Resolve the caller from the `authorization: JWT <token>` header.
pub(crate) fn caller(store: &Store, headers: &HeaderMap) -> Result<Account, Failure> {
    optional_caller(store, headers)?.ok_or_else(|| {
        Failure::detail(
            StatusCode::UNAUTHORIZED,
            "Authentication credentials were not provided.",
        )
    })
}

/// Like `caller`, but an absent header is anonymous rather than an error.
/// A header that is present must still be valid.
pub(crate) fn optional_caller(store: &Store, headers: &HeaderMap) -> Result<Option<Account>, Failure> {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("JWT "))
        .ok_or_else(|| Failure::detail(StatusCode::UNAUTHORIZED, "Authorization header must use the JWT scheme."))?;
    let account = store
        .access_tokens
        .get(token)
        .and_then(|id| store.accounts.get(id))
        .ok_or_else(|| Failure::detail(StatusCode::UNAUTHORIZED, "Given token not valid for any token type"))?;
    Ok(Some(account.clone()))
}

pub(crate) fn require_admin(caller: &Account) -> Result<(), Failure> {
    if caller.group == Group::Admin {
        Ok(())
    } else {
        Err(Failure::forbidden())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_editor_moderates_only_their_organization() {
        let mut store = Store::seeded();
        let editor = store.accounts[&seed::EDITOR_ID].clone();
        assert!(store.can_moderate(&editor, seed::ORGANIZATION_ID));

        store.organizations.get_mut(&seed::ORGANIZATION_ID).unwrap().editors.clear();
        assert!(!store.can_moderate(&editor, seed::ORGANIZATION_ID));
    }

    #[test]
    fn visitor_sees_only_own_testimonials() {
        let store = Store::seeded();
        let visitor = store.accounts[&seed::VISITOR_ID].clone();
        let own = &store.testimonials[&seed::APPROVED_TESTIMONIAL_ID];
        let other = &store.testimonials[&seed::PENDING_TESTIMONIAL_ID];
        assert!(store.visible_to(&visitor, own));
        assert!(!store.visible_to(&visitor, other));
    }

    #[test]
    fn field_failure_body_lists_message() {
        let failure = Failure::field("feedback", "This field is required.");
        assert_eq!(failure.status, StatusCode::BAD_REQUEST);
        assert_eq!(failure.body, json!({ "feedback": ["This field is required."] }));
    }

    #[test]
    fn status_codes_parse() {
        assert_eq!(Status::from_code("R"), Some(Status::Rejected));
        assert_eq!(Status::from_code("X"), None);
        assert!(Status::Published.is_public());
        assert!(!Status::Hidden.is_public());
    }
}
