//! Domain DTOs for the testimonial API.
//!
//! # Design
//! Wire field names are the service's; Rust field names are English and
//! mapped with `#[serde(rename)]`. These types mirror the mock-server's
//! schema but are defined independently; integration tests catch drift.
//!
//! Boundary normalization happens here: `Organization::editors` accepts
//! either a list of editor objects or a comma-separated string, and
//! `Testimonial::attachments` accepts the legacy `archivos_urls` key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "visitante")]
    Visitor,
    #[serde(rename = "editor")]
    Editor,
    #[serde(rename = "administrador", alias = "admin")]
    Admin,
    #[serde(rename = "sin_grupo")]
    None,
}

impl Role {
    /// Role-scoped user collection, `None` for users outside every group.
    pub fn collection(&self) -> Option<UserCollection> {
        match self {
            Role::Visitor => Some(UserCollection::Visitors),
            Role::Editor => Some(UserCollection::Editors),
            Role::Admin => Some(UserCollection::Admins),
            Role::None => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Visitor => "visitante",
            Role::Editor => "editor",
            Role::Admin => "administrador",
            Role::None => "sin_grupo",
        }
    }
}

/// The three disjoint role-scoped user collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserCollection {
    Visitors,
    Editors,
    Admins,
}

impl UserCollection {
    pub fn path_segment(&self) -> &'static str {
        match self {
            UserCollection::Visitors => "visitantes",
            UserCollection::Editors => "editores",
            UserCollection::Admins => "administradores",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            UserCollection::Visitors => Role::Visitor,
            UserCollection::Editors => Role::Editor,
            UserCollection::Admins => Role::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visitante" => Ok(Role::Visitor),
            "editor" => Ok(Role::Editor),
            "administrador" | "admin" => Ok(Role::Admin),
            "sin_grupo" => Ok(Role::None),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user record as returned by the role-scoped collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

/// Payload for registering a visitor or creating a user in a role collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial update of a user. Omitted fields stay unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: u64,
    /// Role claim declared by the server, when it sends one.
    #[serde(default)]
    pub rol: Option<String>,
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Generic acknowledgement body (`{"success": true, "message": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// An organization that collects testimonials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: u64,
    #[serde(rename = "organizacion_nombre")]
    pub name: String,
    #[serde(rename = "dominio")]
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "editores", default, deserialize_with = "deserialize_editors")]
    pub editors: Vec<Editor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Editor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub username: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EditorsWire {
    List(Vec<Editor>),
    Text(String),
}

fn deserialize_editors<'de, D>(deserializer: D) -> Result<Vec<Editor>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Option::<EditorsWire>::deserialize(deserializer)?;
    Ok(match wire {
        None => Vec::new(),
        Some(EditorsWire::List(editors)) => editors,
        Some(EditorsWire::Text(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Editor {
                id: None,
                email: None,
                username: name.to_string(),
            })
            .collect(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganization {
    #[serde(rename = "organizacion_nombre")]
    pub name: String,
    #[serde(rename = "dominio")]
    pub domain: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    #[serde(rename = "organizacion_nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "dominio", skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Reply of the add-editors / add-visitors organization actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(alias = "editores", alias = "visitantes", default)]
    pub members: Vec<u64>,
}

/// A testimonial category. The list is static reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    #[serde(rename = "nombre_categoria")]
    pub name: String,
    #[serde(rename = "icono")]
    pub icon: String,
    pub color: String,
    #[serde(rename = "fecha_registro", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    #[serde(rename = "nombre_categoria")]
    pub name: String,
    #[serde(rename = "icono")]
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(rename = "nombre_categoria", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "icono", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Moderation status of a testimonial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestimonialStatus {
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

impl TestimonialStatus {
    pub const ALL: [TestimonialStatus; 6] = [
        TestimonialStatus::Wait,
        TestimonialStatus::Approved,
        TestimonialStatus::Rejected,
        TestimonialStatus::Published,
        TestimonialStatus::Draft,
        TestimonialStatus::Hidden,
    ];

    /// Single-letter wire code.
    pub fn code(&self) -> &'static str {
        match self {
            TestimonialStatus::Wait => "E",
            TestimonialStatus::Approved => "A",
            TestimonialStatus::Rejected => "R",
            TestimonialStatus::Published => "P",
            TestimonialStatus::Draft => "B",
            TestimonialStatus::Hidden => "O",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestimonialStatus::Wait => "wait",
            TestimonialStatus::Approved => "approved",
            TestimonialStatus::Rejected => "rejected",
            TestimonialStatus::Published => "published",
            TestimonialStatus::Draft => "draft",
            TestimonialStatus::Hidden => "hidden",
        }
    }

    /// Statuses under which a testimonial is shown on public pages.
    pub fn is_public(&self) -> bool {
        matches!(self, TestimonialStatus::Approved | TestimonialStatus::Published)
    }
}

impl FromStr for TestimonialStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestimonialStatus::ALL
            .into_iter()
            .find(|status| status.code() == s || status.label() == s)
            .ok_or_else(|| format!("unknown testimonial status: {s}"))
    }
}

impl fmt::Display for TestimonialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A testimonial as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Absent from the public approved-testimonials listing.
    #[serde(rename = "organizacion", default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<u64>,
    #[serde(rename = "organizacion_nombre", default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(rename = "usuario_registrado", default, skip_serializing_if = "Option::is_none")]
    pub registered_user: Option<String>,
    #[serde(rename = "usuario_anonimo_email", default, skip_serializing_if = "Option::is_none")]
    pub anonymous_email: Option<String>,
    #[serde(rename = "usuario_anonimo_username", default, skip_serializing_if = "Option::is_none")]
    pub anonymous_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "categoria")]
    pub category: u64,
    #[serde(rename = "categoria_nombre", default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(rename = "comentario", default)]
    pub comment: String,
    #[serde(rename = "enlace", default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(rename = "archivos", alias = "archivos_urls", default)]
    pub attachments: Vec<String>,
    #[serde(rename = "fecha_comentario", default, skip_serializing_if = "Option::is_none")]
    pub commented_at: Option<String>,
    /// Decimal rating encoded as a string, e.g. `"4.5"`.
    #[serde(rename = "ranking", default)]
    pub rating: String,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TestimonialStatus>,
    /// Moderation feedback, only meaningful for rejected testimonials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Who wrote a testimonial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commenter {
    Registered(String),
    Anonymous {
        email: Option<String>,
        username: Option<String>,
    },
}

impl Commenter {
    pub fn display_name(&self) -> &str {
        match self {
            Commenter::Registered(username) => username,
            Commenter::Anonymous {
                username: Some(username),
                ..
            } => username,
            Commenter::Anonymous { .. } => "Anonymous",
        }
    }
}

impl Testimonial {
    pub fn commenter(&self) -> Commenter {
        match &self.registered_user {
            Some(username) if !username.is_empty() => Commenter::Registered(username.clone()),
            _ => Commenter::Anonymous {
                email: self.anonymous_email.clone(),
                username: self.anonymous_username.clone(),
            },
        }
    }

    /// Rating as a number, `None` when the server sent something unparsable.
    pub fn rating_value(&self) -> Option<f32> {
        self.rating.trim().parse().ok()
    }

    /// Feedback is only shown while the testimonial is rejected.
    pub fn visible_feedback(&self) -> Option<&str> {
        match self.status {
            Some(TestimonialStatus::Rejected) => self.feedback.as_deref(),
            _ => None,
        }
    }
}

/// Payload for submitting a testimonial. Either `registered_user` is set by
/// the server from the token, or the anonymous fields are supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTestimonial {
    #[serde(rename = "organizacion")]
    pub organization: u64,
    #[serde(rename = "categoria")]
    pub category: u64,
    #[serde(rename = "comentario")]
    pub comment: String,
    #[serde(rename = "ranking")]
    pub rating: String,
    #[serde(rename = "usuario_anonimo_email", skip_serializing_if = "Option::is_none")]
    pub anonymous_email: Option<String>,
    #[serde(rename = "usuario_anonimo_username", skip_serializing_if = "Option::is_none")]
    pub anonymous_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "enlace", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl NewTestimonial {
    /// Scalar fields as `(wire name, value)` pairs, in serialization order.
    /// Used for multipart submissions.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("organizacion", self.organization.to_string()),
            ("categoria", self.category.to_string()),
            ("comentario", self.comment.clone()),
            ("ranking", self.rating.clone()),
        ];
        let optional = [
            ("usuario_anonimo_email", &self.anonymous_email),
            ("usuario_anonimo_username", &self.anonymous_username),
            ("api_key", &self.api_key),
            ("enlace", &self.link),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.push((name, value.clone()));
            }
        }
        fields
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestimonialUpdate {
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<u64>,
    #[serde(rename = "comentario", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "ranking", skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(rename = "enlace", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestimonialStatistics {
    #[serde(rename = "organizacion_id")]
    pub organization_id: u64,
    #[serde(rename = "organizacion_nombre")]
    pub organization_name: String,
    #[serde(rename = "estadisticas")]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "total_testimonios")]
    pub total: u64,
    #[serde(rename = "aprobados")]
    pub approved: u64,
    #[serde(rename = "en_espera")]
    pub waiting: u64,
    #[serde(rename = "rechazados")]
    pub rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editors_accept_object_list() {
        let org: Organization = serde_json::from_str(
            r#"{"id":1,"organizacion_nombre":"Acme","dominio":"acme.io",
                "editores":[{"id":7,"email":"e@acme.io","username":"eve"}]}"#,
        )
        .unwrap();
        assert_eq!(org.editors.len(), 1);
        assert_eq!(org.editors[0].id, Some(7));
    }

    #[test]
    fn editors_accept_comma_separated_string() {
        let org: Organization = serde_json::from_str(
            r#"{"id":1,"organizacion_nombre":"Acme","dominio":"acme.io","editores":"eve, mallory,"}"#,
        )
        .unwrap();
        let names: Vec<_> = org.editors.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["eve", "mallory"]);
        assert!(org.editors.iter().all(|e| e.id.is_none()));
    }

    #[test]
    fn editors_default_to_empty() {
        let org: Organization =
            serde_json::from_str(r#"{"id":1,"organizacion_nombre":"Acme","dominio":"acme.io","editores":null}"#)
                .unwrap();
        assert!(org.editors.is_empty());
    }

    #[test]
    fn status_uses_single_letter_codes() {
        assert_eq!(serde_json::to_string(&TestimonialStatus::Draft).unwrap(), r#""B""#);
        let parsed: TestimonialStatus = serde_json::from_str(r#""O""#).unwrap();
        assert_eq!(parsed, TestimonialStatus::Hidden);
        assert_eq!("rejected".parse::<TestimonialStatus>(), Ok(TestimonialStatus::Rejected));
        assert!("X".parse::<TestimonialStatus>().is_err());
    }

    #[test]
    fn testimonial_accepts_legacy_attachment_key() {
        let t: Testimonial = serde_json::from_str(
            r#"{"id":3,"organizacion":1,"categoria":2,"comentario":"ok","ranking":"4.5",
                "archivos_urls":["https://cdn/x.png"],"estado":"A"}"#,
        )
        .unwrap();
        assert_eq!(t.attachments, ["https://cdn/x.png"]);
        assert_eq!(t.rating_value(), Some(4.5));
        assert_eq!(t.status, Some(TestimonialStatus::Approved));
    }

    #[test]
    fn commenter_prefers_registered_user() {
        let mut t: Testimonial = serde_json::from_str(
            r#"{"organizacion":1,"categoria":2,"comentario":"ok","ranking":"5.0",
                "usuario_anonimo_username":"guest"}"#,
        )
        .unwrap();
        assert_eq!(t.commenter().display_name(), "guest");
        t.registered_user = Some("ana".to_string());
        assert_eq!(t.commenter(), Commenter::Registered("ana".to_string()));
        t.registered_user = None;
        t.anonymous_username = None;
        assert_eq!(t.commenter().display_name(), "Anonymous");
    }

    #[test]
    fn feedback_only_visible_when_rejected() {
        let mut t: Testimonial = serde_json::from_str(
            r#"{"organizacion":1,"categoria":2,"comentario":"ok","ranking":"1.0",
                "estado":"R","feedback":"spam"}"#,
        )
        .unwrap();
        assert_eq!(t.visible_feedback(), Some("spam"));
        t.status = Some(TestimonialStatus::Approved);
        assert_eq!(t.visible_feedback(), None);
    }

    #[test]
    fn role_parses_both_admin_spellings() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("administrador".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::None.collection(), None);
        assert_eq!(Role::Editor.collection(), Some(UserCollection::Editors));
        assert_eq!(UserCollection::Admins.path_segment(), "administradores");
    }

    #[test]
    fn new_testimonial_form_fields_skip_absent_values() {
        let input = NewTestimonial {
            organization: 1,
            category: 2,
            comment: "Nice".to_string(),
            rating: "5.0".to_string(),
            anonymous_email: None,
            anonymous_username: Some("guest".to_string()),
            api_key: None,
            link: None,
        };
        let names: Vec<_> = input.form_fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            ["organizacion", "categoria", "comentario", "ranking", "usuario_anonimo_username"]
        );
    }
}
