//! Wire records of the mock service, named the way the real service names
//! its fields.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Group {
    Visitor,
    Editor,
    Admin,
    /// Authenticated but outside every group.
    Ungrouped,
}

impl Group {
    pub fn rol(self) -> &'static str {
        match self {
            Group::Visitor => "visitante",
            Group::Editor => "editor",
            Group::Admin => "administrador",
            Group::Ungrouped => "sin_grupo",
        }
    }

    pub fn segment(self) -> &'static str {
        match self {
            Group::Visitor => "visitantes",
            Group::Editor => "editores",
            Group::Admin => "administradores",
            Group::Ungrouped => "",
        }
    }
}

/// A user account with its credentials. Only `User` leaves the server.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub group: Group,
}

impl Account {
    pub fn user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            date_joined: None,
            profile_picture_url: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

#[derive(Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: u64,
    pub rol: String,
    pub access: String,
    pub refresh: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub nombre_categoria: String,
    pub icono: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_registro: Option<String>,
}

#[derive(Deserialize)]
pub struct NewCategory {
    pub nombre_categoria: String,
    pub icono: String,
    pub color: String,
}

#[derive(Deserialize)]
pub struct CategoryUpdate {
    pub nombre_categoria: Option<String>,
    pub icono: Option<String>,
    pub color: Option<String>,
}

/// Stored organization; editors and visitors are user ids.
#[derive(Clone, Debug)]
pub struct OrganizationRecord {
    pub id: u64,
    pub name: String,
    pub domain: String,
    pub api_key: String,
    pub editors: Vec<u64>,
    pub visitors: Vec<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Editor {
    pub id: u64,
    pub email: String,
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: u64,
    pub organizacion_nombre: String,
    pub dominio: String,
    pub api_key: String,
    pub editores: Vec<Editor>,
}

#[derive(Deserialize)]
pub struct NewOrganization {
    pub organizacion_nombre: String,
    pub dominio: String,
}

#[derive(Deserialize)]
pub struct OrganizationUpdate {
    pub organizacion_nombre: Option<String>,
    pub dominio: Option<String>,
}

#[derive(Deserialize)]
pub struct AddEditors {
    pub editores: Vec<u64>,
}

#[derive(Deserialize)]
pub struct AddVisitors {
    pub visitantes: Vec<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "E")]
    Wait,
    #[serde(rename = "A")]
    Approved,
    #[serde(rename = "R")]
    Rejected,
    #[serde(rename = "P")]
    Published,
    #[serde(rename = "B")]
    Draft,
    #[serde(rename = "O")]
    Hidden,
}

impl Status {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "E" => Some(Status::Wait),
            "A" => Some(Status::Approved),
            "R" => Some(Status::Rejected),
            "P" => Some(Status::Published),
            "B" => Some(Status::Draft),
            "O" => Some(Status::Hidden),
            _ => None,
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Status::Approved | Status::Published)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: u64,
    pub organizacion: u64,
    pub organizacion_nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario_registrado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario_anonimo_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario_anonimo_username: Option<String>,
    pub categoria: u64,
    pub categoria_nombre: String,
    pub comentario: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enlace: Option<String>,
    pub archivos: Vec<String>,
    pub ranking: String,
    pub estado: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Submission fields, from a JSON body or from multipart text parts.
#[derive(Debug, Default, Deserialize)]
pub struct NewTestimonial {
    pub organizacion: u64,
    pub categoria: u64,
    pub comentario: String,
    pub ranking: String,
    pub usuario_anonimo_email: Option<String>,
    pub usuario_anonimo_username: Option<String>,
    pub api_key: Option<String>,
    pub enlace: Option<String>,
}

#[derive(Deserialize)]
pub struct TestimonialUpdate {
    pub categoria: Option<u64>,
    pub comentario: Option<String>,
    pub ranking: Option<String>,
    pub enlace: Option<String>,
}

#[derive(Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub estado: String,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total_testimonios: u64,
    pub aprobados: u64,
    pub en_espera: u64,
    pub rechazados: u64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub organizacion_id: u64,
    pub organizacion_nombre: String,
    pub estadisticas: StatusCounts,
}
