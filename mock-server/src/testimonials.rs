//! Testimonial submission, caller-scoped listings and moderation.

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;

use crate::model::{
    Feedback, Group, NewTestimonial, Statistics, Status, StatusChange, StatusCounts, Testimonial, TestimonialUpdate,
};
use crate::{caller, optional_caller, Db, Failure, Store};

const MAX_FILES: usize = 4;
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;
const ATTACHMENT_FIELD: &str = "archivos";
const CDN_BASE: &str = "https://cdn.example.com/testimonios";

struct Upload {
    file_name: String,
    content_type: String,
    size: usize,
}

fn bad_request(text: String) -> Failure {
    Failure::detail(StatusCode::BAD_REQUEST, &text)
}

fn validate_rating(ranking: &str) -> Result<(), Failure> {
    match ranking.trim().parse::<f32>() {
        Ok(value) if (0.0..=5.0).contains(&value) => Ok(()),
        _ => Err(Failure::field("ranking", "Ensure this value is between 0 and 5.")),
    }
}

fn required_feedback(feedback: Option<String>) -> Result<String, Failure> {
    feedback
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| Failure::field("feedback", "This field is required."))
}

fn validate_uploads(uploads: &[Upload]) -> Result<(), Failure> {
    if uploads.len() > MAX_FILES {
        return Err(Failure::field(ATTACHMENT_FIELD, "Ensure this field has no more than 4 files."));
    }
    for upload in uploads {
        if upload.size > MAX_FILE_SIZE {
            return Err(Failure::field(
                ATTACHMENT_FIELD,
                &format!("{} exceeds the 5 MB limit.", upload.file_name),
            ));
        }
        if !(upload.content_type.starts_with("image/") || upload.content_type.starts_with("video/")) {
            return Err(Failure::field(
                ATTACHMENT_FIELD,
                &format!("{} is not an image or video.", upload.file_name),
            ));
        }
    }
    Ok(())
}

/// Reverses the percent-encoding clients apply to quotes and line breaks
/// in `Content-Disposition` parameters.
fn unescape_file_name(raw: &str) -> String {
    raw.replace("%22", "\"").replace("%0D", "\r").replace("%0A", "\n")
}

async fn read_multipart(mut multipart: Multipart) -> Result<(NewTestimonial, Vec<Upload>), Failure> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| bad_request(e.body_text()))? {
        let name = field.name().unwrap_or_default().to_string();
        if name == ATTACHMENT_FIELD {
            let file_name = unescape_file_name(field.file_name().unwrap_or("upload"));
            let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            let data = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
            uploads.push(Upload {
                file_name,
                content_type,
                size: data.len(),
            });
        } else {
            let value = field.text().await.map_err(|e| bad_request(e.body_text()))?;
            fields.insert(name, value);
        }
    }

    let number = |key: &str| {
        fields
            .get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| Failure::field(key, "A valid integer is required."))
    };
    let organizacion = number("organizacion")?;
    let categoria = number("categoria")?;
    let mut text = |key: &str| -> Option<String> { fields.remove(key) };
    let input = NewTestimonial {
        organizacion,
        categoria,
        comentario: text("comentario").unwrap_or_default(),
        ranking: text("ranking").unwrap_or_default(),
        usuario_anonimo_email: text("usuario_anonimo_email"),
        usuario_anonimo_username: text("usuario_anonimo_username"),
        api_key: text("api_key"),
        enlace: text("enlace"),
    };
    Ok((input, uploads))
}

/// Accepts a JSON body, or a multipart form when attachments are sent.
pub async fn create(State(db): State<Db>, request: Request) -> Result<(StatusCode, Json<Testimonial>), Failure> {
    let headers = request.headers().clone();
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let (input, uploads) = if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let Json(input) = Json::<NewTestimonial>::from_request(request, &())
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        (input, Vec::new())
    };

    let mut store = db.write().await;
    let author = optional_caller(&store, &headers)?;
    let organization = store
        .organizations
        .get(&input.organizacion)
        .ok_or_else(|| Failure::field("organizacion", "Invalid pk - object does not exist."))?;
    if author.is_none() && input.api_key.as_deref() != Some(organization.api_key.as_str()) {
        return Err(Failure::detail(StatusCode::FORBIDDEN, "Invalid API key."));
    }
    let organizacion_nombre = organization.name.clone();
    let categoria_nombre = store
        .categories
        .get(&input.categoria)
        .map(|c| c.nombre_categoria.clone())
        .ok_or_else(|| Failure::field("categoria", "Invalid pk - object does not exist."))?;
    if input.comentario.trim().is_empty() {
        return Err(Failure::field("comentario", "This field may not be blank."));
    }
    validate_rating(&input.ranking)?;
    validate_uploads(&uploads)?;

    let id = store.next_id();
    let archivos = uploads
        .iter()
        .map(|u| format!("{CDN_BASE}/{id}/{}", u.file_name))
        .collect();
    let testimonial = Testimonial {
        id,
        organizacion: input.organizacion,
        organizacion_nombre,
        usuario_registrado: author.map(|a| a.username),
        usuario_anonimo_email: input.usuario_anonimo_email,
        usuario_anonimo_username: input.usuario_anonimo_username,
        categoria: input.categoria,
        categoria_nombre,
        comentario: input.comentario,
        enlace: input.enlace,
        archivos,
        ranking: input.ranking,
        estado: Status::Wait,
        feedback: None,
    };
    store.testimonials.insert(id, testimonial.clone());
    tracing::info!(id, files = uploads.len(), "testimonial created");
    Ok((StatusCode::CREATED, Json(testimonial)))
}

pub async fn list_public(State(db): State<Db>) -> Json<Vec<Testimonial>> {
    let store = db.read().await;
    Json(
        store
            .testimonials
            .values()
            .filter(|t| t.estado.is_public())
            .cloned()
            .collect(),
    )
}

/// Public testimonials are readable by anyone, others by those who may see them.
pub async fn get_one(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Testimonial>, Failure> {
    let store = db.read().await;
    let viewer = optional_caller(&store, &headers)?;
    let testimonial = store.testimonials.get(&id).ok_or_else(Failure::not_found)?;
    let visible = testimonial.estado.is_public() || viewer.is_some_and(|v| store.visible_to(&v, testimonial));
    if !visible {
        return Err(Failure::not_found());
    }
    Ok(Json(testimonial.clone()))
}

pub async fn update(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<TestimonialUpdate>,
) -> Result<Json<Testimonial>, Failure> {
    let mut store = db.write().await;
    let caller = caller(&store, &headers)?;
    let testimonial = store.testimonials.get(&id).ok_or_else(Failure::not_found)?;
    if !store.visible_to(&caller, testimonial) {
        return Err(Failure::forbidden());
    }
    if let Some(ranking) = &input.ranking {
        validate_rating(ranking)?;
    }
    let categoria_nombre = match input.categoria {
        Some(categoria) => Some(
            store
                .categories
                .get(&categoria)
                .map(|c| c.nombre_categoria.clone())
                .ok_or_else(|| Failure::field("categoria", "Invalid pk - object does not exist."))?,
        ),
        None => None,
    };

    let testimonial = store.testimonials.get_mut(&id).ok_or_else(Failure::not_found)?;
    if let (Some(categoria), Some(nombre)) = (input.categoria, categoria_nombre) {
        testimonial.categoria = categoria;
        testimonial.categoria_nombre = nombre;
    }
    if let Some(comentario) = input.comentario {
        testimonial.comentario = comentario;
    }
    if let Some(ranking) = input.ranking {
        testimonial.ranking = ranking;
    }
    if let Some(enlace) = input.enlace {
        testimonial.enlace = Some(enlace);
    }
    Ok(Json(testimonial.clone()))
}

pub async fn delete(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    let caller = caller(&store, &headers)?;
    let testimonial = store.testimonials.get(&id).ok_or_else(Failure::not_found)?;
    if !store.visible_to(&caller, testimonial) {
        return Err(Failure::forbidden());
    }
    store.testimonials.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// Admins see everything, editors their organizations', visitors their own.
pub async fn list_own(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Testimonial>>, Failure> {
    let store = db.read().await;
    let caller = caller(&store, &headers)?;
    let testimonials = store
        .testimonials
        .values()
        .filter(|t| store.visible_to(&caller, t))
        .cloned()
        .collect();
    Ok(Json(testimonials))
}

pub async fn get_own(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Testimonial>, Failure> {
    let store = db.read().await;
    let caller = caller(&store, &headers)?;
    store
        .testimonials
        .get(&id)
        .filter(|t| store.visible_to(&caller, t))
        .cloned()
        .map(Json)
        .ok_or_else(Failure::not_found)
}

pub async fn statistics(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Statistics>>, Failure> {
    let store = db.read().await;
    let caller = caller(&store, &headers)?;
    if !matches!(caller.group, Group::Admin | Group::Editor) {
        return Err(Failure::forbidden());
    }
    let statistics = store
        .organizations
        .values()
        .filter(|org| store.can_moderate(&caller, org.id))
        .map(|org| {
            let of_org: Vec<_> = store
                .testimonials
                .values()
                .filter(|t| t.organizacion == org.id)
                .collect();
            let count = |status: Status| of_org.iter().filter(|t| t.estado == status).count() as u64;
            Statistics {
                organizacion_id: org.id,
                organizacion_nombre: org.name.clone(),
                estadisticas: StatusCounts {
                    total_testimonios: of_org.len() as u64,
                    aprobados: count(Status::Approved),
                    en_espera: count(Status::Wait),
                    rechazados: count(Status::Rejected),
                },
            }
        })
        .collect();
    Ok(Json(statistics))
}

pub async fn approved_for_organization(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Testimonial>>, Failure> {
    let store = db.read().await;
    if !store.organizations.contains_key(&id) {
        return Err(Failure::not_found());
    }
    Ok(Json(
        store
            .testimonials
            .values()
            .filter(|t| t.organizacion == id && t.estado == Status::Approved)
            .cloned()
            .collect(),
    ))
}

/// Apply a moderation change on behalf of an admin or an editor of the
/// testimonial's organization.
fn moderate(
    store: &mut Store,
    headers: &HeaderMap,
    id: u64,
    apply: impl FnOnce(&mut Testimonial) -> Result<(), Failure>,
) -> Result<Json<Testimonial>, Failure> {
    let caller = caller(store, headers)?;
    let organization = store.testimonials.get(&id).ok_or_else(Failure::not_found)?.organizacion;
    if !store.can_moderate(&caller, organization) {
        return Err(Failure::forbidden());
    }
    let testimonial = store.testimonials.get_mut(&id).ok_or_else(Failure::not_found)?;
    apply(testimonial)?;
    tracing::info!(id, estado = ?testimonial.estado, moderator = caller.id, "testimonial moderated");
    Ok(Json(testimonial.clone()))
}

pub async fn approve(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<Testimonial>, Failure> {
    let mut store = db.write().await;
    moderate(&mut store, &headers, id, |t| {
        t.estado = Status::Approved;
        t.feedback = None;
        Ok(())
    })
}

pub async fn reject(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<Feedback>,
) -> Result<Json<Testimonial>, Failure> {
    let mut store = db.write().await;
    moderate(&mut store, &headers, id, |t| {
        t.feedback = Some(required_feedback(input.feedback)?);
        t.estado = Status::Rejected;
        Ok(())
    })
}

pub async fn change_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<StatusChange>,
) -> Result<Json<Testimonial>, Failure> {
    let mut store = db.write().await;
    moderate(&mut store, &headers, id, |t| {
        let status = Status::from_code(&input.estado)
            .ok_or_else(|| Failure::field("estado", &format!("\"{}\" is not a valid choice.", input.estado)))?;
        t.feedback = match status {
            Status::Rejected => Some(required_feedback(input.feedback)?),
            _ => None,
        };
        t.estado = status;
        Ok(())
    })
}

/// Adding feedback rejects the testimonial.
pub async fn add_feedback(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<Feedback>,
) -> Result<Json<Testimonial>, Failure> {
    let mut store = db.write().await;
    moderate(&mut store, &headers, id, |t| {
        t.feedback = Some(required_feedback(input.feedback)?);
        t.estado = Status::Rejected;
        Ok(())
    })
}
