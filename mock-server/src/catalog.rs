//! Categories and organizations. Reads of categories are public; every
//! write is admin-only.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::model::{
    AddEditors, AddVisitors, Category, CategoryUpdate, Editor, Group, NewCategory, NewOrganization, Organization,
    OrganizationRecord, OrganizationUpdate,
};
use crate::{caller, require_admin, Db, Failure, Store};

fn validate_color(color: &str) -> Result<(), Failure> {
    let hex = color.strip_prefix('#').unwrap_or_default();
    if matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(Failure::field("color", "Enter a valid hex color."))
    }
}

pub async fn list_categories(State(db): State<Db>) -> Json<Vec<Category>> {
    let store = db.read().await;
    Json(store.categories.values().cloned().collect())
}

pub async fn get_category(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Category>, Failure> {
    let store = db.read().await;
    store.categories.get(&id).cloned().map(Json).ok_or_else(Failure::not_found)
}

pub async fn create_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    if input.nombre_categoria.trim().is_empty() {
        return Err(Failure::field("nombre_categoria", "This field may not be blank."));
    }
    if store
        .categories
        .values()
        .any(|c| c.nombre_categoria.eq_ignore_ascii_case(&input.nombre_categoria))
    {
        return Err(Failure::field("nombre_categoria", "category with this name already exists."));
    }
    validate_color(&input.color)?;

    let category = Category {
        id: store.next_id(),
        nombre_categoria: input.nombre_categoria,
        icono: input.icono,
        color: input.color,
        fecha_registro: None,
    };
    store.categories.insert(category.id, category.clone());
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<CategoryUpdate>,
) -> Result<Json<Category>, Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    if let Some(color) = &input.color {
        validate_color(color)?;
    }
    let category = store.categories.get_mut(&id).ok_or_else(Failure::not_found)?;
    if let Some(name) = input.nombre_categoria {
        category.nombre_categoria = name;
    }
    if let Some(icon) = input.icono {
        category.icono = icon;
    }
    if let Some(color) = input.color {
        category.color = color;
    }
    Ok(Json(category.clone()))
}

pub async fn delete_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    store
        .categories
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(Failure::not_found)
}

impl Store {
    fn render_organization(&self, record: &OrganizationRecord) -> Organization {
        let editores = record
            .editors
            .iter()
            .filter_map(|id| self.accounts.get(id))
            .map(|a| Editor {
                id: a.id,
                email: a.email.clone(),
                username: a.username.clone(),
            })
            .collect();
        Organization {
            id: record.id,
            organizacion_nombre: record.name.clone(),
            dominio: record.domain.clone(),
            api_key: record.api_key.clone(),
            editores,
        }
    }

    /// Every id must name an account of `group`.
    fn check_members(&self, ids: &[u64], group: Group, field: &str) -> Result<(), Failure> {
        match ids
            .iter()
            .find(|id| !self.accounts.get(*id).is_some_and(|a| a.group == group))
        {
            Some(id) => Err(Failure::field(field, &format!("Invalid pk \"{id}\" - object does not exist."))),
            None => Ok(()),
        }
    }
}

pub async fn list_organizations(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Organization>>, Failure> {
    let store = db.read().await;
    let caller = caller(&store, &headers)?;
    let organizations = store
        .organizations
        .values()
        .filter(|org| {
            caller.group == Group::Admin || org.editors.contains(&caller.id) || org.visitors.contains(&caller.id)
        })
        .map(|org| store.render_organization(org))
        .collect();
    Ok(Json(organizations))
}

pub async fn get_organization(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Organization>, Failure> {
    let store = db.read().await;
    caller(&store, &headers)?;
    let record = store.organizations.get(&id).ok_or_else(Failure::not_found)?;
    Ok(Json(store.render_organization(record)))
}

pub async fn create_organization(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewOrganization>,
) -> Result<(StatusCode, Json<Organization>), Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    if input.organizacion_nombre.trim().is_empty() {
        return Err(Failure::field("organizacion_nombre", "This field may not be blank."));
    }
    if store.organizations.values().any(|o| o.domain == input.dominio) {
        return Err(Failure::field("dominio", "organization with this domain already exists."));
    }
    let record = OrganizationRecord {
        id: store.next_id(),
        name: input.organizacion_nombre,
        domain: input.dominio,
        api_key: Uuid::new_v4().simple().to_string(),
        editors: Vec::new(),
        visitors: Vec::new(),
    };
    let organization = store.render_organization(&record);
    store.organizations.insert(record.id, record);
    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn update_organization(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<OrganizationUpdate>,
) -> Result<Json<Organization>, Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    let record = store.organizations.get_mut(&id).ok_or_else(Failure::not_found)?;
    if let Some(name) = input.organizacion_nombre {
        record.name = name;
    }
    if let Some(domain) = input.dominio {
        record.domain = domain;
    }
    let record = record.clone();
    Ok(Json(store.render_organization(&record)))
}

pub async fn delete_organization(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    store.organizations.remove(&id).ok_or_else(Failure::not_found)?;
    store.testimonials.retain(|_, t| t.organizacion != id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_editors(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<AddEditors>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    store.check_members(&input.editores, Group::Editor, "editores")?;
    let record = store.organizations.get_mut(&id).ok_or_else(Failure::not_found)?;
    for editor in &input.editores {
        if !record.editors.contains(editor) {
            record.editors.push(*editor);
        }
    }
    Ok(Json(json!({
        "success": true,
        "message": "Editors added",
        "editores": record.editors,
    })))
}

pub async fn add_visitors(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<AddVisitors>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    store.check_members(&input.visitantes, Group::Visitor, "visitantes")?;
    let record = store.organizations.get_mut(&id).ok_or_else(Failure::not_found)?;
    for visitor in &input.visitantes {
        if !record.visitors.contains(visitor) {
            record.visitors.push(*visitor);
        }
    }
    Ok(Json(json!({
        "success": true,
        "message": "Visitors added",
        "visitantes": record.visitors,
    })))
}
